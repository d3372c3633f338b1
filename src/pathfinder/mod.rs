//! Shortest motion sequence between two cursor positions.
//!
//! Cursor positions are the vertices of an implicit graph; each configured
//! [`Motion`] is an edge weighted by its cost. [`PathFinder`] runs Dijkstra
//! over that graph, expanding only what it reaches, then refines the path so
//! equal-cost choices are made with the keystrokes after them in view.
//!
//! # Module layout
//!
//! | Module     | Contents                                   |
//! |------------|--------------------------------------------|
//! | `node`     | `Node`, `NodeId`                           |
//! | `queue`    | `OpenQueue`, indexed heap with decrease-key |
//! | `refine`   | tie resolution, `Step`                      |
//! | `error`    | `SearchError`, `SearchResult<T>`            |

mod error;
mod node;
mod queue;
mod refine;

#[cfg(test)]
mod tests;

use rustc_hash::FxHashMap;

use crate::document::Document;
use crate::models::{PathRequest, Position, ResolvedMotion, View};
use crate::motion::{Combine, CountPrefix, Motion, VimMotion};

pub use error::{SearchError, SearchResult};
pub use node::{Node, NodeId};
pub use queue::OpenQueue;
pub use refine::Step;

/// A found path: refined steps from start to target and their total cost.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub steps: Vec<Step>,
    pub total_cost: u32,
}

impl Route {
    /// `true` if start and target are the same position.
    pub fn is_trivial(&self) -> bool {
        self.steps.is_empty()
    }

    /// Name each step with the keys of its motion.
    pub fn resolve<M: Motion>(&self, motions: &[M]) -> Vec<ResolvedMotion> {
        self.steps
            .iter()
            .map(|step| ResolvedMotion::new(motions[step.motion].name(), step.count))
            .collect()
    }

    /// Apply every step to `start`. `None` if a step cannot be applied.
    pub fn replay<M: Motion>(
        &self,
        start: View,
        motions: &[M],
        document: &Document,
    ) -> Option<View> {
        let mut view = document.scroll_to(start);
        for step in &self.steps {
            for _ in 0..step.count {
                view = motions[step.motion].apply(&view, document)?;
            }
        }
        Some(view)
    }
}

/// One search over a fixed document and motion list.
///
/// Holds the node table and open queue of the most recent run so callers can
/// inspect what was explored.
pub struct PathFinder<'a, M> {
    document: &'a Document,
    motions: &'a [M],
    nodes: Vec<Node>,
    index: FxHashMap<Position, NodeId>,
    open: OpenQueue,
}

impl<'a, M: Motion> PathFinder<'a, M> {
    pub fn new(document: &'a Document, motions: &'a [M]) -> Self {
        Self {
            document,
            motions,
            nodes: Vec::new(),
            index: FxHashMap::default(),
            open: OpenQueue::new(),
        }
    }

    /// Every node created by the last run.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Node for `pos` from the last run, if it was reached.
    pub fn node_at(&self, pos: Position) -> Option<&Node> {
        self.index.get(&pos).map(|id| &self.nodes[id.index()])
    }

    /// Find the cheapest motion sequence from `start` to `target`.
    pub fn find_path<C: Combine<M>>(
        &mut self,
        start: View,
        target: Position,
        combine: &C,
    ) -> SearchResult<Route> {
        let from = start.position();
        for pos in [from, target] {
            if !self.document.contains(pos) {
                return Err(SearchError::OutOfBounds(pos));
            }
        }

        // The window sent with the start view may not fit this document.
        let start = self.document.scroll_to(start);

        self.nodes.clear();
        self.index.clear();
        self.open = OpenQueue::new();

        let start_id = self.insert(Node::new(start));
        self.open.push(start_id, 0);

        while let Some(current) = self.open.pop() {
            self.nodes[current.index()].closed = true;

            if self.nodes[current.index()].position() == target {
                tracing::debug!(
                    "Reached {} at cost {} after creating {} nodes",
                    target,
                    self.nodes[current.index()].g,
                    self.nodes.len()
                );
                let steps = refine::refine(&self.nodes, current, self.motions, combine);
                return Ok(Route {
                    steps,
                    total_cost: self.nodes[current.index()].g,
                });
            }

            self.expand(current);
        }

        tracing::debug!(
            "Exhausted {} positions without reaching {}",
            self.nodes.len(),
            target
        );
        Err(SearchError::NoPathFound { from, to: target })
    }

    /// Relax every edge out of `current`.
    fn expand(&mut self, current: NodeId) {
        let view = self.nodes[current.index()].view;
        let g = self.nodes[current.index()].g;
        let (motions, document) = (self.motions, self.document);

        for (motion_index, motion) in motions.iter().enumerate() {
            let Some(child_view) = motion.apply(&view, document) else {
                continue;
            };
            let child_g = g.saturating_add(motion.cost());

            let Some(&existing) = self.index.get(&child_view.position()) else {
                let id = self.insert(Node::child(child_view, child_g, current, motion_index));
                self.open.push(id, child_g);
                continue;
            };

            let node = &mut self.nodes[existing.index()];
            if node.closed {
                continue;
            }
            if child_g == node.g && node.parent == Some(current) {
                node.add_alternative(motion_index);
            } else if child_g < node.g {
                node.relax(child_view, child_g, current, motion_index);
                self.open.decrease_key(existing, child_g);
            }
        }
    }

    fn insert(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.index.insert(node.position(), id);
        self.nodes.push(node);
        id
    }
}

/// Search with a throwaway [`PathFinder`].
pub fn find_path<M: Motion, C: Combine<M>>(
    document: &Document,
    start: View,
    target: Position,
    motions: &[M],
    combine: &C,
) -> SearchResult<Route> {
    PathFinder::new(document, motions).find_path(start, target, combine)
}

/// Run a complete request with the built-in motion catalog.
pub fn solve(request: &PathRequest) -> SearchResult<Vec<ResolvedMotion>> {
    let motions = VimMotion::from_specs(&request.motions)?;
    let (width, height) = request.size;
    let document = Document::new(&request.buffer)
        .with_window(width, height)
        .with_scrolloff(request.scrolloff);

    let route = find_path(
        &document,
        request.start,
        request.target.position(),
        &motions,
        &CountPrefix,
    )?;
    Ok(route.resolve(&motions))
}
