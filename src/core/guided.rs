//! Guided capture: a fixed sequence of questions whose answers become a
//! small tree of linked thoughts around a new trunk.

use super::error::{Result, ThinktreeError};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GuidedQuestion {
    pub step: &'static str,
    pub question: &'static str,
    pub hint: &'static str,
    /// Tag appended to the answer when it is saved.
    pub tag: &'static str,
}

pub const GUIDED_QUESTIONS: [GuidedQuestion; 6] = [
    GuidedQuestion {
        step: "The Spark",
        question: "What's the idea or problem on your mind?",
        hint: "Don't overthink it. Just describe what you're noodling on, even if it's messy.",
        tag: "spark",
    },
    GuidedQuestion {
        step: "The Problem",
        question: "What problem does this solve?",
        hint: "Who is struggling, and with what? What's broken or missing?",
        tag: "problem",
    },
    GuidedQuestion {
        step: "The Audience",
        question: "Who is this for?",
        hint: "Describe the person who needs this. Could be you, a specific group, or everyone.",
        tag: "audience",
    },
    GuidedQuestion {
        step: "What You Know",
        question: "What do you already know about this?",
        hint: "What pieces of the puzzle do you have? What have you seen or experienced that relates?",
        tag: "knowledge",
    },
    GuidedQuestion {
        step: "What You Don't Know",
        question: "What are you unsure about or stuck on?",
        hint: "Where are the gaps? What questions don't have answers yet?",
        tag: "question",
    },
    GuidedQuestion {
        step: "The Trunk",
        question: "In one sentence, what is the core idea?",
        hint: "Try to distill everything above into a single clear statement. This becomes your trunk.",
        tag: "core",
    },
];

/// Progress through the guided questions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GuidedSession {
    answers: Vec<String>,
}

impl GuidedSession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The question waiting for an answer, or `None` once all are answered.
    #[must_use]
    pub fn current(&self) -> Option<&'static GuidedQuestion> {
        GUIDED_QUESTIONS.get(self.answers.len())
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.answers.len() >= GUIDED_QUESTIONS.len()
    }

    #[must_use]
    pub fn is_last_step(&self) -> bool {
        self.answers.len() + 1 == GUIDED_QUESTIONS.len()
    }

    /// Records an answer to the current question.
    ///
    /// # Errors
    /// Returns `empty_answer` for a blank answer and `guided_complete` once
    /// every question has been answered.
    pub fn answer(&mut self, text: &str) -> Result<()> {
        if self.is_complete() {
            return Err(complete_error("guided:answer"));
        }
        let text = text.trim();
        if text.is_empty() {
            return Err(ThinktreeError::user(
                "empty_answer",
                "An answer cannot be empty",
                "guided:answer",
            )
            .with_hint("Type an answer, or skip the step if it is not the last one"));
        }
        self.answers.push(text.to_string());
        Ok(())
    }

    /// Skips the current question. The final (core idea) question cannot be
    /// skipped.
    ///
    /// # Errors
    /// Returns `cannot_skip_core` on the last step and `guided_complete`
    /// once every question has been answered.
    pub fn skip(&mut self) -> Result<()> {
        if self.is_complete() {
            return Err(complete_error("guided:skip"));
        }
        if self.is_last_step() {
            return Err(ThinktreeError::user(
                "cannot_skip_core",
                "The core idea step cannot be skipped",
                "guided:skip",
            ));
        }
        self.answers.push(String::new());
        Ok(())
    }

    /// Feeds a full answer list: blank entries skip their step.
    ///
    /// # Errors
    /// Propagates [`answer`](Self::answer) and [`skip`](Self::skip) errors.
    pub fn answer_all<S: AsRef<str>>(&mut self, answers: &[S]) -> Result<()> {
        for answer in answers {
            let answer = answer.as_ref();
            if answer.trim().is_empty() {
                self.skip()?;
            } else {
                self.answer(answer)?;
            }
        }
        Ok(())
    }

    /// Idea texts to create, one per question, each tagged with its step tag.
    /// Skipped steps yield an empty string.
    ///
    /// # Errors
    /// Returns `guided_incomplete` when questions remain unanswered.
    pub fn finish(&self) -> Result<Vec<String>> {
        if !self.is_complete() {
            return Err(ThinktreeError::user(
                "guided_incomplete",
                format!(
                    "Answered {} of {} questions",
                    self.answers.len(),
                    GUIDED_QUESTIONS.len()
                ),
                "guided:finish",
            )
            .with_hint("Provide one answer per question; use an empty answer to skip"));
        }
        Ok(self
            .answers
            .iter()
            .zip(GUIDED_QUESTIONS.iter())
            .map(|(answer, question)| {
                if answer.is_empty() {
                    String::new()
                } else {
                    format!("{answer} #{}", question.tag)
                }
            })
            .collect())
    }
}

fn complete_error(origin: &str) -> ThinktreeError {
    ThinktreeError::user(
        "guided_complete",
        "All questions are already answered",
        origin,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walks_questions_in_order() {
        let mut session = GuidedSession::new();
        assert_eq!(session.current().unwrap().tag, "spark");
        session.answer("an idea").unwrap();
        session.skip().unwrap();
        assert_eq!(session.current().unwrap().tag, "audience");
    }

    #[test]
    fn blank_answers_are_rejected() {
        let mut session = GuidedSession::new();
        let err = session.answer("   ").unwrap_err();
        assert_eq!(err.code, "empty_answer");
        assert_eq!(session.current().unwrap().tag, "spark");
    }

    #[test]
    fn core_step_cannot_be_skipped() {
        let mut session = GuidedSession::new();
        for _ in 0..5 {
            session.skip().unwrap();
        }
        assert!(session.is_last_step());
        assert_eq!(session.skip().unwrap_err().code, "cannot_skip_core");
        session.answer("the core").unwrap();
        assert!(session.is_complete());
        assert_eq!(session.answer("more").unwrap_err().code, "guided_complete");
    }

    #[test]
    fn finish_tags_answers_and_keeps_skips_empty() {
        let mut session = GuidedSession::new();
        session
            .answer_all(&["spark", "", "people", "", "", "core idea"])
            .unwrap();
        let texts = session.finish().unwrap();
        assert_eq!(
            texts,
            vec![
                "spark #spark",
                "",
                "people #audience",
                "",
                "",
                "core idea #core"
            ]
        );
    }

    #[test]
    fn finish_requires_every_step() {
        let mut session = GuidedSession::new();
        session.answer("spark").unwrap();
        assert_eq!(session.finish().unwrap_err().code, "guided_incomplete");
    }
}
