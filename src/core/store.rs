//! In-memory idea set for one project.
//!
//! The store owns the ideas of the active project and applies every
//! mutation to the full set. It performs no I/O: the registry loads a set
//! through the storage layer, applies one mutation and flushes the whole set
//! back when the mutation reports [`Mutation::Applied`].

use super::idea::{Idea, IdeaId};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;

/// Why a mutation left the set untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "idea", rename_all = "snake_case")]
pub enum NoopReason {
    /// The text was empty after trimming.
    EmptyText,
    /// No idea with this id exists in the set.
    UnknownIdea(IdeaId),
    /// An idea cannot build on itself.
    SelfLink(IdeaId),
    /// The idea had no link to clear.
    NotLinked(IdeaId),
}

/// Outcome of a store mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum Mutation {
    Applied,
    Unchanged(NoopReason),
}

impl Mutation {
    #[must_use]
    pub const fn is_applied(self) -> bool {
        matches!(self, Self::Applied)
    }
}

/// The ideas of one project plus the maintained trunk reference.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdeaStore {
    ideas: Vec<Idea>,
    trunk: Option<IdeaId>,
}

impl IdeaStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adopts a loaded idea set.
    ///
    /// If several ideas claim to be the trunk, the first one keeps the flag.
    #[must_use]
    pub fn from_ideas(mut ideas: Vec<Idea>) -> Self {
        let mut trunk = None;
        for idea in &mut ideas {
            if !idea.is_trunk {
                continue;
            }
            if trunk.is_none() {
                trunk = Some(idea.id);
            } else {
                tracing::warn!(idea = %idea.id, "clearing duplicate trunk flag");
                idea.is_trunk = false;
            }
        }
        Self { ideas, trunk }
    }

    #[must_use]
    pub fn ideas(&self) -> &[Idea] {
        &self.ideas
    }

    #[must_use]
    pub fn into_ideas(self) -> Vec<Idea> {
        self.ideas
    }

    #[must_use]
    pub fn trunk(&self) -> Option<IdeaId> {
        self.trunk
    }

    #[must_use]
    pub fn get(&self, id: IdeaId) -> Option<&Idea> {
        self.ideas.iter().find(|idea| idea.id == id)
    }

    #[must_use]
    pub fn contains(&self, id: IdeaId) -> bool {
        self.get(id).is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ideas.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ideas.is_empty()
    }

    fn get_mut(&mut self, id: IdeaId) -> Option<&mut Idea> {
        self.ideas.iter_mut().find(|idea| idea.id == id)
    }

    /// Next id: wall-clock milliseconds, bumped past the largest existing id.
    ///
    /// When the largest id is `i64::MAX` the lowest unused id is taken.
    fn next_id(&self, now: DateTime<Utc>) -> IdeaId {
        let clock = now.timestamp_millis();
        let Some(largest) = self.ideas.iter().map(|idea| idea.id.as_i64()).max() else {
            return IdeaId(clock);
        };
        match largest.checked_add(1) {
            Some(floor) => IdeaId(clock.max(floor)),
            None => {
                let taken: HashSet<i64> =
                    self.ideas.iter().map(|idea| idea.id.as_i64()).collect();
                IdeaId((0..).find(|id| !taken.contains(id)).unwrap_or(0))
            }
        }
    }

    /// Captures a new thought. Returns `None` when `text` is blank.
    pub fn create(&mut self, text: &str) -> Option<Idea> {
        self.create_at(text, Utc::now())
    }

    /// Same as [`create`](Self::create) with an explicit creation time.
    pub fn create_at(&mut self, text: &str, now: DateTime<Utc>) -> Option<Idea> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        let idea = Idea::new(self.next_id(now), text, now);
        self.ideas.push(idea.clone());
        Some(idea)
    }

    /// Replaces an idea's text and re-derives its tags.
    pub fn update_text(&mut self, id: IdeaId, text: &str) -> Mutation {
        let text = text.trim();
        if text.is_empty() {
            return Mutation::Unchanged(NoopReason::EmptyText);
        }
        match self.get_mut(id) {
            Some(idea) => {
                idea.set_text(text);
                Mutation::Applied
            }
            None => Mutation::Unchanged(NoopReason::UnknownIdea(id)),
        }
    }

    /// Records that `child` builds on `parent`.
    ///
    /// Self-links and unknown ids are refused. Longer cycles are accepted;
    /// the layout engine truncates them.
    pub fn set_link(&mut self, child: IdeaId, parent: IdeaId) -> Mutation {
        if child == parent {
            return Mutation::Unchanged(NoopReason::SelfLink(child));
        }
        if !self.contains(parent) {
            return Mutation::Unchanged(NoopReason::UnknownIdea(parent));
        }
        match self.get_mut(child) {
            Some(idea) => {
                idea.linked_to = Some(parent);
                Mutation::Applied
            }
            None => Mutation::Unchanged(NoopReason::UnknownIdea(child)),
        }
    }

    pub fn clear_link(&mut self, id: IdeaId) -> Mutation {
        match self.get_mut(id) {
            Some(idea) if idea.linked_to.is_some() => {
                idea.linked_to = None;
                Mutation::Applied
            }
            Some(_) => Mutation::Unchanged(NoopReason::NotLinked(id)),
            None => Mutation::Unchanged(NoopReason::UnknownIdea(id)),
        }
    }

    /// Toggles the trunk designation.
    ///
    /// On the current trunk this clears it, leaving no trunk. On any other
    /// idea it becomes the only trunk.
    pub fn set_trunk(&mut self, id: IdeaId) -> Mutation {
        if !self.contains(id) {
            return Mutation::Unchanged(NoopReason::UnknownIdea(id));
        }
        let next = if self.trunk == Some(id) { None } else { Some(id) };
        for idea in &mut self.ideas {
            idea.is_trunk = Some(idea.id) == next;
        }
        self.trunk = next;
        Mutation::Applied
    }

    /// Removes an idea; ideas that built on it become roots.
    pub fn delete(&mut self, id: IdeaId) -> Mutation {
        let before = self.ideas.len();
        self.ideas.retain(|idea| idea.id != id);
        if self.ideas.len() == before {
            return Mutation::Unchanged(NoopReason::UnknownIdea(id));
        }
        for idea in &mut self.ideas {
            if idea.linked_to == Some(id) {
                idea.linked_to = None;
            }
        }
        if self.trunk == Some(id) {
            self.trunk = None;
        }
        Mutation::Applied
    }

    /// Adds a batch of thoughts where the last one becomes the trunk and
    /// every other one builds on it. Any previous trunk is cleared.
    pub fn add_guided(&mut self, texts: &[String], now: DateTime<Utc>) -> Vec<Idea> {
        let texts: Vec<&str> = texts
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .collect();
        let Some((core, rest)) = texts.split_last() else {
            return Vec::new();
        };

        for idea in &mut self.ideas {
            idea.is_trunk = false;
        }

        let mut created_ids = Vec::with_capacity(texts.len());
        for text in rest {
            let idea = Idea::new(self.next_id(now), *text, now);
            created_ids.push(idea.id);
            self.ideas.push(idea);
        }

        let mut trunk = Idea::new(self.next_id(now), *core, now);
        trunk.is_trunk = true;
        let trunk_id = trunk.id;
        self.ideas.push(trunk);
        self.trunk = Some(trunk_id);

        for idea in &mut self.ideas {
            if created_ids.contains(&idea.id) {
                idea.linked_to = Some(trunk_id);
            }
        }

        created_ids.push(trunk_id);
        self.ideas
            .iter()
            .filter(|idea| created_ids.contains(&idea.id))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn at(millis: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(millis).unwrap()
    }

    fn store_with(texts: &[&str]) -> (IdeaStore, Vec<IdeaId>) {
        let mut store = IdeaStore::new();
        let ids = texts
            .iter()
            .map(|t| store.create_at(t, at(1_000)).unwrap().id)
            .collect();
        (store, ids)
    }

    fn trunk_count(store: &IdeaStore) -> usize {
        store.ideas().iter().filter(|i| i.is_trunk).count()
    }

    #[test]
    fn create_trims_and_tags() {
        let mut store = IdeaStore::new();
        let idea = store.create_at("  Build a #Widget  ", at(5)).unwrap();
        assert_eq!(idea.text, "Build a #Widget");
        assert_eq!(idea.tags, vec!["widget"]);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn create_rejects_blank_text() {
        let mut store = IdeaStore::new();
        assert!(store.create("   ").is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn ids_stay_unique_within_the_same_millisecond() {
        let (store, ids) = store_with(&["a", "b", "c"]);
        assert_eq!(ids, vec![IdeaId(1_000), IdeaId(1_001), IdeaId(1_002)]);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn ids_follow_the_clock_when_it_is_ahead() {
        let mut store = IdeaStore::new();
        store.create_at("a", at(10)).unwrap();
        let later = store.create_at("b", at(500)).unwrap();
        assert_eq!(later.id, IdeaId(500));
    }

    #[test]
    fn ids_stay_unique_after_the_largest_possible_id() {
        let mut store = IdeaStore::from_ideas(vec![Idea::new(IdeaId(i64::MAX), "a", at(1))]);
        let next = store.create_at("b", at(1_000)).unwrap();
        assert_eq!(next.id, IdeaId(0));
        let after = store.create_at("c", at(1_000)).unwrap();
        assert_eq!(after.id, IdeaId(1));
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn update_text_rederives_tags() {
        let (mut store, ids) = store_with(&["old #a"]);
        assert_eq!(store.update_text(ids[0], "new #b"), Mutation::Applied);
        let idea = store.get(ids[0]).unwrap();
        assert_eq!(idea.text, "new #b");
        assert_eq!(idea.tags, vec!["b"]);
    }

    #[test]
    fn update_text_with_blank_is_a_noop() {
        let (mut store, ids) = store_with(&["keep #a"]);
        let before = store.clone();
        assert_eq!(
            store.update_text(ids[0], "  "),
            Mutation::Unchanged(NoopReason::EmptyText)
        );
        assert_eq!(store, before);
    }

    #[test]
    fn set_and_clear_link() {
        let (mut store, ids) = store_with(&["parent", "child"]);
        assert!(store.set_link(ids[1], ids[0]).is_applied());
        assert_eq!(store.get(ids[1]).unwrap().linked_to, Some(ids[0]));

        assert!(store.clear_link(ids[1]).is_applied());
        assert!(store.get(ids[1]).unwrap().linked_to.is_none());
        assert_eq!(
            store.clear_link(ids[1]),
            Mutation::Unchanged(NoopReason::NotLinked(ids[1]))
        );
    }

    #[test]
    fn set_link_refuses_self_and_unknown() {
        let (mut store, ids) = store_with(&["only"]);
        assert_eq!(
            store.set_link(ids[0], ids[0]),
            Mutation::Unchanged(NoopReason::SelfLink(ids[0]))
        );
        assert_eq!(
            store.set_link(ids[0], IdeaId(9)),
            Mutation::Unchanged(NoopReason::UnknownIdea(IdeaId(9)))
        );
        assert_eq!(
            store.set_link(IdeaId(9), ids[0]),
            Mutation::Unchanged(NoopReason::UnknownIdea(IdeaId(9)))
        );
    }

    #[test]
    fn set_link_accepts_longer_cycles() {
        let (mut store, ids) = store_with(&["a", "b"]);
        assert!(store.set_link(ids[0], ids[1]).is_applied());
        assert!(store.set_link(ids[1], ids[0]).is_applied());
    }

    #[test]
    fn moving_the_trunk_clears_the_previous_one() {
        let (mut store, ids) = store_with(&["x", "y"]);
        store.set_trunk(ids[0]);
        assert!(store.get(ids[0]).unwrap().is_trunk);

        store.set_trunk(ids[1]);
        assert!(!store.get(ids[0]).unwrap().is_trunk);
        assert!(store.get(ids[1]).unwrap().is_trunk);
        assert_eq!(store.trunk(), Some(ids[1]));
    }

    #[test]
    fn set_trunk_on_current_trunk_toggles_off() {
        let (mut store, ids) = store_with(&["x"]);
        store.set_trunk(ids[0]);
        store.set_trunk(ids[0]);
        assert_eq!(trunk_count(&store), 0);
        assert_eq!(store.trunk(), None);
    }

    #[test]
    fn delete_orphans_children() {
        let (mut store, ids) = store_with(&["a", "b", "c"]);
        store.set_link(ids[1], ids[0]);
        store.set_link(ids[2], ids[1]);

        assert!(store.delete(ids[0]).is_applied());
        assert!(store.get(ids[0]).is_none());
        assert!(store.get(ids[1]).unwrap().linked_to.is_none());
        assert_eq!(store.get(ids[2]).unwrap().linked_to, Some(ids[1]));
    }

    #[test]
    fn delete_trunk_clears_reference() {
        let (mut store, ids) = store_with(&["a"]);
        store.set_trunk(ids[0]);
        store.delete(ids[0]);
        assert_eq!(store.trunk(), None);
        assert_eq!(
            store.delete(ids[0]),
            Mutation::Unchanged(NoopReason::UnknownIdea(ids[0]))
        );
    }

    #[test]
    fn from_ideas_keeps_first_trunk_only() {
        let mut a = Idea::new(IdeaId(1), "a", at(1));
        let mut b = Idea::new(IdeaId(2), "b", at(2));
        a.is_trunk = true;
        b.is_trunk = true;

        let store = IdeaStore::from_ideas(vec![a, b]);
        assert_eq!(store.trunk(), Some(IdeaId(1)));
        assert_eq!(trunk_count(&store), 1);
    }

    #[test]
    fn add_guided_links_everything_to_the_core() {
        let (mut store, ids) = store_with(&["existing"]);
        store.set_trunk(ids[0]);

        let texts = vec![
            "spark #spark".to_string(),
            String::new(),
            "who #audience".to_string(),
            "core #core".to_string(),
        ];
        let created = store.add_guided(&texts, at(1_000));

        assert_eq!(created.len(), 3);
        let trunk = created.last().unwrap();
        assert!(trunk.is_trunk);
        assert!(trunk.linked_to.is_none());
        assert_eq!(store.trunk(), Some(trunk.id));
        assert!(!store.get(ids[0]).unwrap().is_trunk);
        for idea in &created[..2] {
            assert_eq!(idea.linked_to, Some(trunk.id));
        }
        assert!(created.windows(2).all(|w| w[0].id < w[1].id));
    }

    #[test]
    fn add_guided_without_answers_changes_nothing() {
        let (mut store, ids) = store_with(&["existing"]);
        store.set_trunk(ids[0]);
        assert!(store.add_guided(&[String::new()], at(1)).is_empty());
        assert_eq!(store.trunk(), Some(ids[0]));
    }

    proptest! {
        #[test]
        fn trunk_is_exclusive_under_any_toggle_sequence(
            picks in prop::collection::vec(0usize..5, 1..40)
        ) {
            let (mut store, ids) = store_with(&["a", "b", "c", "d", "e"]);
            for pick in picks {
                let id = ids[pick];
                let was_trunk = store.trunk() == Some(id);
                store.set_trunk(id);

                let flagged: Vec<IdeaId> = store
                    .ideas()
                    .iter()
                    .filter(|i| i.is_trunk)
                    .map(|i| i.id)
                    .collect();
                prop_assert!(flagged.len() <= 1);
                prop_assert_eq!(flagged.first().copied(), store.trunk());
                if was_trunk {
                    prop_assert!(flagged.is_empty());
                } else {
                    prop_assert_eq!(flagged, vec![id]);
                }
            }
        }

        #[test]
        fn delete_never_leaves_links_to_the_deleted_idea(
            links in prop::collection::vec((0usize..6, 0usize..6), 0..12),
            victim in 0usize..6
        ) {
            let (mut store, ids) = store_with(&["a", "b", "c", "d", "e", "f"]);
            for (child, parent) in links {
                store.set_link(ids[child], ids[parent]);
            }
            store.delete(ids[victim]);
            prop_assert!(store.ideas().iter().all(|i| i.linked_to != Some(ids[victim])));
        }
    }
}
