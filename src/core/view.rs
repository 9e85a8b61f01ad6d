//! View state and the pure render step that turns an idea set into what a
//! renderer displays.
//!
//! `ViewState` is a value: every transition returns a new state and nothing
//! is shared between renders.

use super::config::ThinktreeConfig;
use super::graph_query::{branch_count, parent_of};
use super::idea::Idea;
use super::layout::{layout_forest, ForestLayout};
use super::project::ProjectId;
use super::tags::{all_tags, preview};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    List,
    Tree,
}

/// Which ideas are shown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "tag", rename_all = "lowercase")]
pub enum TagFilter {
    #[default]
    All,
    Tag(String),
}

impl TagFilter {
    /// Builds a filter from user input; `None`, blank and `all` mean no filter.
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Self::All;
        };
        let tag = raw.trim().trim_start_matches('#').to_lowercase();
        if tag.is_empty() || tag == "all" {
            Self::All
        } else {
            Self::Tag(tag)
        }
    }

    #[must_use]
    pub fn matches(&self, idea: &Idea) -> bool {
        match self {
            Self::All => true,
            Self::Tag(tag) => idea.has_tag(tag),
        }
    }
}

impl fmt::Display for TagFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::Tag(tag) => write!(f, "#{tag}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewState {
    pub project: ProjectId,
    pub filter: TagFilter,
    pub mode: ViewMode,
}

impl ViewState {
    #[must_use]
    pub fn new(project: ProjectId) -> Self {
        Self {
            project,
            filter: TagFilter::All,
            mode: ViewMode::List,
        }
    }

    #[must_use]
    pub fn with_filter(self, filter: TagFilter) -> Self {
        Self { filter, ..self }
    }

    #[must_use]
    pub fn with_mode(self, mode: ViewMode) -> Self {
        Self { mode, ..self }
    }

    /// Moves to another project; the tag filter does not carry over.
    #[must_use]
    pub fn switch_project(self, project: ProjectId) -> Self {
        Self {
            project,
            filter: TagFilter::All,
            ..self
        }
    }
}

/// One card of the list view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListEntry {
    pub idea: Idea,
    /// Preview of the idea this one builds on, when the link resolves.
    pub builds_on: Option<String>,
    pub branches: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum ViewBody {
    List { entries: Vec<ListEntry> },
    Tree { forest: ForestLayout },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedView {
    pub state: ViewState,
    /// Every tag of the project, for filter options.
    pub tags: Vec<String>,
    /// Ideas that pass the filter, laid out or not.
    pub matched: usize,
    #[serde(flatten)]
    pub body: ViewBody,
}

impl RenderedView {
    /// Text to show when nothing matches, `None` otherwise.
    #[must_use]
    pub fn empty_message(&self) -> Option<String> {
        let empty = match &self.body {
            ViewBody::List { entries } => entries.is_empty(),
            ViewBody::Tree { forest } => forest.is_empty(),
        };
        if !empty {
            return None;
        }
        if self.matched > 0 {
            return Some(
                "No tree roots: every idea here builds on another in a loop. Unlink one to start a tree."
                    .to_string(),
            );
        }
        Some(match &self.state.filter {
            TagFilter::Tag(tag) if self.state.mode == ViewMode::List => {
                format!("No thoughts tagged #{tag} yet.")
            }
            _ => "No ideas yet. Start by adding one.".to_string(),
        })
    }
}

/// List order: the trunk first, then newest to oldest.
#[must_use]
pub fn list_order(ideas: &[Idea]) -> Vec<&Idea> {
    let mut sorted: Vec<&Idea> = ideas.iter().collect();
    sorted.sort_by(|a, b| b.is_trunk.cmp(&a.is_trunk).then_with(|| b.id.cmp(&a.id)));
    sorted
}

/// Renders `ideas` (the full set of the state's project) for `state`.
#[must_use]
pub fn render(state: &ViewState, ideas: &[Idea], config: &ThinktreeConfig) -> RenderedView {
    let visible: Vec<Idea> = ideas
        .iter()
        .filter(|idea| state.filter.matches(idea))
        .cloned()
        .collect();

    let body = match state.mode {
        ViewMode::List => ViewBody::List {
            entries: list_order(&visible)
                .into_iter()
                .map(|idea| ListEntry {
                    builds_on: parent_of(idea, ideas)
                        .map(|parent| preview(&parent.text, config.parent_preview_chars)),
                    branches: branch_count(idea.id, ideas),
                    idea: idea.clone(),
                })
                .collect(),
        },
        ViewMode::Tree => ViewBody::Tree {
            forest: layout_forest(&visible, &config.layout),
        },
    };

    RenderedView {
        state: state.clone(),
        tags: all_tags(ideas),
        matched: visible.len(),
        body,
    }
}
