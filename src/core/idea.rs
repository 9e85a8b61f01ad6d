//! The idea record: a captured thought with tags, an optional parent link and
//! the trunk flag.

use super::tags::extract_tags;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of an idea, unique within its project and ordered by creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdeaId(pub i64);

impl IdeaId {
    #[must_use]
    pub const fn as_i64(self) -> i64 {
        self.0
    }
}

impl fmt::Display for IdeaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for IdeaId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

/// A single captured thought.
///
/// Field names on the wire are camelCase so idea files written by earlier
/// versions load unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Idea {
    pub id: IdeaId,
    pub text: String,
    /// Lowercase tokens derived from `text`; never edited directly.
    #[serde(default)]
    pub tags: Vec<String>,
    pub timestamp: DateTime<Utc>,
    /// The idea this one builds on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_to: Option<IdeaId>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_trunk: bool,
}

impl Idea {
    /// Creates an unlinked, non-trunk idea with tags derived from `text`.
    #[must_use]
    pub fn new(id: IdeaId, text: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        let text = text.into();
        let tags = extract_tags(&text);
        Self {
            id,
            text,
            tags,
            timestamp,
            linked_to: None,
            is_trunk: false,
        }
    }

    /// Replaces the text and re-derives the tags together.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.tags = extract_tags(&self.text);
    }

    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}
