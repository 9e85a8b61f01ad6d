//! Read-only views over the `linkedTo` relation.
//!
//! Every query works on a plain slice of ideas and tolerates dangling links
//! (treated as "no parent") and cycles (never followed twice).

use super::idea::{Idea, IdeaId};
use std::collections::HashSet;

/// First idea with the given id.
#[must_use]
pub fn find_by_id(id: IdeaId, ideas: &[Idea]) -> Option<&Idea> {
    ideas.iter().find(|idea| idea.id == id)
}

/// Ideas that build on `parent`, in insertion order.
#[must_use]
pub fn children_of(parent: IdeaId, ideas: &[Idea]) -> Vec<&Idea> {
    ideas
        .iter()
        .filter(|idea| idea.linked_to == Some(parent))
        .collect()
}

/// Number of ideas directly linking to `id`.
#[must_use]
pub fn branch_count(id: IdeaId, ideas: &[Idea]) -> usize {
    ideas
        .iter()
        .filter(|idea| idea.linked_to == Some(id))
        .count()
}

/// The resolved parent of `idea`, if its link points at an idea in the set.
#[must_use]
pub fn parent_of<'a>(idea: &Idea, ideas: &'a [Idea]) -> Option<&'a Idea> {
    idea.linked_to.and_then(|parent| find_by_id(parent, ideas))
}

/// Ideas with no parent, or whose parent is missing from the set.
#[must_use]
pub fn root_set(ideas: &[Idea]) -> Vec<&Idea> {
    let ids: HashSet<IdeaId> = ideas.iter().map(|idea| idea.id).collect();
    ideas
        .iter()
        .filter(|idea| idea.linked_to.map_or(true, |parent| !ids.contains(&parent)))
        .collect()
}

/// Parent, grandparent, ... of `id`, nearest first.
///
/// Stops at a root, at a dangling link, or before revisiting an idea.
#[must_use]
pub fn ancestor_chain(id: IdeaId, ideas: &[Idea]) -> Vec<&Idea> {
    let mut chain = Vec::new();
    let mut seen = HashSet::from([id]);
    let mut current = find_by_id(id, ideas);

    while let Some(parent) = current.and_then(|idea| parent_of(idea, ideas)) {
        if !seen.insert(parent.id) {
            break;
        }
        chain.push(parent);
        current = Some(parent);
    }
    chain
}
