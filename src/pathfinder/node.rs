//! Search-graph vertices.

use crate::models::{Position, View};

/// Index of a node in the search arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// A cursor position reached during the search.
///
/// `incoming` lists every motion (by index into the search's motion list)
/// that reaches this node from `parent` at cost `g`. Which one is emitted is
/// decided during refinement, once the motions after it are known.
#[derive(Debug, Clone)]
pub struct Node {
    pub view: View,
    /// Cumulative cost from the start.
    pub g: u32,
    pub parent: Option<NodeId>,
    pub incoming: Vec<usize>,
    /// Finalized: the cost is optimal and the node is no longer updated.
    pub closed: bool,
}

impl Node {
    /// A start node: no cost, no parent, no incoming motion.
    pub fn new(view: View) -> Self {
        Self {
            view,
            g: 0,
            parent: None,
            incoming: Vec::new(),
            closed: false,
        }
    }

    /// A node reached from `parent` through `motion`.
    pub fn child(view: View, g: u32, parent: NodeId, motion: usize) -> Self {
        Self {
            view,
            g,
            parent: Some(parent),
            incoming: vec![motion],
            closed: false,
        }
    }

    pub fn position(&self) -> Position {
        self.view.position()
    }

    /// Replace the route to this node with a cheaper one.
    pub(crate) fn relax(&mut self, view: View, g: u32, parent: NodeId, motion: usize) {
        debug_assert!(!self.closed, "closed nodes are final");
        self.view = view;
        self.g = g;
        self.parent = Some(parent);
        self.incoming.clear();
        self.incoming.push(motion);
    }

    /// Record another motion reaching this node from the same parent at the
    /// same cost.
    pub(crate) fn add_alternative(&mut self, motion: usize) {
        debug_assert!(!self.closed, "closed nodes are final");
        if !self.incoming.contains(&motion) {
            self.incoming.push(motion);
        }
    }
}
