//! Forest layout: turns the `linkedTo` relation into positioned nodes and
//! parent-to-child connectors.
//!
//! Layout runs in three passes over a tree rooted at a chosen idea:
//!
//! 1. **Width** (bottom-up): a leaf is one unit wide, an inner node is as
//!    wide as the sum of its children. Every leaf therefore owns its own
//!    horizontal band and sibling subtrees can never overlap.
//! 2. **Coordinates** (top-down, left-to-right): a node is centered over its
//!    band; children split the band in order, one level lower.
//! 3. **Connectors**: one edge per non-root node, from the parent's
//!    bottom-center to the child's top-center.
//!
//! Links are not validated against cycles when written, so descent keeps the
//! set of ideas on the current path. An idea met again on its own path is
//! laid out as a leaf and reported in [`TreeLayout::truncated`].

use super::graph_query::root_set;
use super::idea::{Idea, IdeaId};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Pixel geometry of the layout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub node_width: f64,
    pub node_height: f64,
    /// Horizontal gap between neighbouring leaf bands.
    pub horizontal_gap: f64,
    /// Vertical gap between levels.
    pub vertical_gap: f64,
    /// Padding added to the right and bottom of each canvas.
    pub margin: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_width: 180.0,
            node_height: 80.0,
            horizontal_gap: 20.0,
            vertical_gap: 60.0,
            margin: 20.0,
        }
    }
}

impl LayoutConfig {
    /// Horizontal space consumed by one width unit.
    #[must_use]
    pub fn unit(&self) -> f64 {
        self.node_width + self.horizontal_gap
    }

    /// Pixel width of a band `width` units wide (no trailing gap).
    #[must_use]
    pub fn band_width(&self, width: usize) -> f64 {
        width as f64 * self.unit() - self.horizontal_gap
    }

    fn level_step(&self) -> f64 {
        self.node_height + self.vertical_gap
    }
}

/// Children of every idea in insertion order, built once per layout.
struct ChildIndex<'a> {
    children: HashMap<IdeaId, Vec<&'a Idea>>,
}

impl<'a> ChildIndex<'a> {
    fn new(ideas: &'a [Idea]) -> Self {
        let mut children: HashMap<IdeaId, Vec<&'a Idea>> = HashMap::new();
        for idea in ideas {
            if let Some(parent) = idea.linked_to {
                children.entry(parent).or_default().push(idea);
            }
        }
        Self { children }
    }

    fn of(&self, id: IdeaId) -> &[&'a Idea] {
        self.children.get(&id).map(Vec::as_slice).unwrap_or_default()
    }

    fn has_children(&self, id: IdeaId) -> bool {
        !self.of(id).is_empty()
    }
}

/// Result of the width pass: a tree of ideas with subtree widths.
#[derive(Debug, Clone)]
pub struct LayoutTree<'a> {
    pub idea: &'a Idea,
    pub children: Vec<LayoutTree<'a>>,
    /// Width in leaf units.
    pub width: usize,
    /// True when descent stopped here because the idea was already on the path.
    pub truncated: bool,
}

impl LayoutTree<'_> {
    /// Number of nodes in the tree, truncated re-entries included.
    #[must_use]
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(LayoutTree::node_count).sum::<usize>()
    }
}

/// Width pass for the tree rooted at `root`.
#[must_use]
pub fn build_layout_tree<'a>(root: &'a Idea, ideas: &'a [Idea]) -> LayoutTree<'a> {
    let index = ChildIndex::new(ideas);
    let mut path = HashSet::new();
    build_subtree(root, &index, &mut path)
}

// Recursion depth is bounded by the number of distinct ideas: an idea is
// never entered twice on the same path.
fn build_subtree<'a>(
    idea: &'a Idea,
    index: &ChildIndex<'a>,
    path: &mut HashSet<IdeaId>,
) -> LayoutTree<'a> {
    if !path.insert(idea.id) {
        return LayoutTree {
            idea,
            children: Vec::new(),
            width: 1,
            truncated: true,
        };
    }

    let children: Vec<LayoutTree<'a>> = index
        .of(idea.id)
        .iter()
        .map(|&child| build_subtree(child, index, path))
        .collect();
    path.remove(&idea.id);

    let width = if children.is_empty() {
        1
    } else {
        children.iter().map(|c| c.width).sum()
    };

    LayoutTree {
        idea,
        children,
        width,
        truncated: false,
    }
}

/// An idea placed on the canvas. `x`/`y` are the node's top-left corner.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionedNode {
    pub idea: Idea,
    pub x: f64,
    pub y: f64,
    pub depth: usize,
    /// Subtree width in leaf units.
    pub width: usize,
    /// Left edge of the horizontal band reserved for this subtree.
    pub band_left: f64,
    /// Right edge of that band.
    pub band_right: f64,
}

impl PositionedNode {
    #[must_use]
    pub fn center_x(&self, config: &LayoutConfig) -> f64 {
        self.x + config.node_width / 2.0
    }
}

/// Straight connector from a parent's bottom-center to a child's top-center.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Connector {
    pub from: IdeaId,
    pub to: IdeaId,
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl Connector {
    /// Vertical midpoint between the two anchors.
    #[must_use]
    pub fn mid_y(&self) -> f64 {
        self.y1 + (self.y2 - self.y1) / 2.0
    }

    /// Start, two control points and end of a cubic curve bending through
    /// the vertical midpoint.
    #[must_use]
    pub fn cubic_points(&self) -> [(f64, f64); 4] {
        let mid = self.mid_y();
        [
            (self.x1, self.y1),
            (self.x1, mid),
            (self.x2, mid),
            (self.x2, self.y2),
        ]
    }
}

/// One laid-out tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeLayout {
    pub root: IdeaId,
    /// Nodes in depth-first, left-to-right order; the root comes first.
    pub nodes: Vec<PositionedNode>,
    pub edges: Vec<Connector>,
    pub canvas_width: f64,
    pub canvas_height: f64,
    /// Ideas where descent stopped because of a link cycle.
    pub truncated: Vec<IdeaId>,
    pub node_width: f64,
    pub node_height: f64,
}

impl TreeLayout {
    /// The node whose box contains the point, if any.
    #[must_use]
    pub fn node_at(&self, x: f64, y: f64) -> Option<&PositionedNode> {
        self.nodes.iter().find(|node| {
            x >= node.x
                && x <= node.x + self.node_width
                && y >= node.y
                && y <= node.y + self.node_height
        })
    }

    #[must_use]
    pub fn node(&self, id: IdeaId) -> Option<&PositionedNode> {
        self.nodes.iter().find(|node| node.idea.id == id)
    }
}

/// Coordinate and connector passes over a width-annotated tree.
#[must_use]
pub fn position_tree(tree: &LayoutTree<'_>, config: &LayoutConfig) -> TreeLayout {
    let mut nodes = Vec::with_capacity(tree.node_count());
    let mut edges = Vec::new();
    let mut truncated = Vec::new();
    place(tree, config, (0.0, 0.0), 0, None, &mut nodes, &mut edges, &mut truncated);

    let (max_right, max_bottom) = nodes.iter().fold((0.0_f64, 0.0_f64), |(r, b), n| {
        (
            r.max(n.x + config.node_width),
            b.max(n.y + config.node_height),
        )
    });

    TreeLayout {
        root: tree.idea.id,
        nodes,
        edges,
        canvas_width: max_right + config.margin,
        canvas_height: max_bottom + config.margin,
        truncated,
        node_width: config.node_width,
        node_height: config.node_height,
    }
}

#[allow(clippy::too_many_arguments)]
fn place(
    tree: &LayoutTree<'_>,
    config: &LayoutConfig,
    (x, y): (f64, f64),
    depth: usize,
    parent_anchor: Option<(IdeaId, f64, f64)>,
    nodes: &mut Vec<PositionedNode>,
    edges: &mut Vec<Connector>,
    truncated: &mut Vec<IdeaId>,
) {
    let band = config.band_width(tree.width);
    let center_x = x + band / 2.0;

    nodes.push(PositionedNode {
        idea: tree.idea.clone(),
        x: center_x - config.node_width / 2.0,
        y,
        depth,
        width: tree.width,
        band_left: x,
        band_right: x + band,
    });
    if tree.truncated {
        truncated.push(tree.idea.id);
    }

    if let Some((parent, parent_center_x, parent_bottom_y)) = parent_anchor {
        edges.push(Connector {
            from: parent,
            to: tree.idea.id,
            x1: parent_center_x,
            y1: parent_bottom_y,
            x2: center_x,
            y2: y,
        });
    }

    let anchor = Some((tree.idea.id, center_x, y + config.node_height));
    let child_y = y + config.level_step();
    let mut child_x = x;
    for child in &tree.children {
        place(child, config, (child_x, child_y), depth + 1, anchor, nodes, edges, truncated);
        child_x += child.width as f64 * config.unit();
    }
}

/// Width, coordinate and connector passes for the tree rooted at `root`.
#[must_use]
pub fn layout_tree(root: &Idea, ideas: &[Idea], config: &LayoutConfig) -> TreeLayout {
    let tree = build_layout_tree(root, ideas);
    let layout = position_tree(&tree, config);
    if !layout.truncated.is_empty() {
        tracing::warn!(
            root = %root.id,
            truncated = ?layout.truncated,
            "link cycle reachable from layout root; descent truncated"
        );
    }
    layout
}

/// Everything the tree view shows: laid-out trees plus unconnected thoughts.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ForestLayout {
    /// Trunk tree first (if any), then other multi-node trees in set order.
    pub trees: Vec<TreeLayout>,
    /// Roots with no children, other than the trunk. No coordinates.
    pub loose: Vec<Idea>,
}

impl ForestLayout {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.trees.is_empty() && self.loose.is_empty()
    }
}

/// Chooses tree roots and lays out each one.
///
/// The trunk is always a tree root. Other roots with children get their own
/// tree; childless roots become loose thoughts. A trunk that builds on another
/// idea also appears inside that idea's tree.
#[must_use]
pub fn layout_forest(ideas: &[Idea], config: &LayoutConfig) -> ForestLayout {
    let index = ChildIndex::new(ideas);
    let trunk = ideas.iter().find(|idea| idea.is_trunk);
    let trunk_id = trunk.map(|idea| idea.id);

    let mut tree_roots: Vec<&Idea> = trunk.into_iter().collect();
    let mut loose = Vec::new();
    for root in root_set(ideas) {
        if Some(root.id) == trunk_id {
            continue;
        }
        if index.has_children(root.id) {
            tree_roots.push(root);
        } else {
            loose.push(root.clone());
        }
    }

    let trees = tree_roots
        .into_iter()
        .map(|root| layout_tree(root, ideas, config))
        .collect();

    tracing::debug!(ideas = ideas.len(), loose = loose.len(), "forest laid out");
    ForestLayout { trees, loose }
}
