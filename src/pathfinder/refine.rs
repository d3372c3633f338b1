//! Resolve equal-cost alternatives once the whole path is known.
//!
//! During the search a node may be reached from its parent by several
//! motions at the same cost. Which one is best depends on what follows it:
//! `l l l` types as `3l`, so an `l` in front of another `l` is nearly free.
//! The walk goes from the target back to the start so that the step after
//! each node is already fixed when the node is resolved.

use super::node::{Node, NodeId};
use crate::motion::Combine;

/// One emitted step: `motion` (index into the search's motion list)
/// performed `count` times.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub motion: usize,
    pub count: u32,
}

/// Walk the parent chain from `target` and pick one incoming motion per node.
///
/// Returns the steps in start → target order.
pub(crate) fn refine<M, C>(
    nodes: &[Node],
    target: NodeId,
    motions: &[M],
    combine: &C,
) -> Vec<Step>
where
    C: Combine<M>,
{
    // Steps closest to the target come first while walking.
    let mut steps: Vec<Step> = Vec::new();
    let mut current = Some(target);

    while let Some(id) = current {
        let node = &nodes[id.index()];
        if node.parent.is_some() {
            let head = steps.last().copied();
            let chosen = node
                .incoming
                .iter()
                .copied()
                .min_by_key(|&candidate| added_keystrokes(candidate, head, motions, combine))
                .expect("a node with a parent has an incoming motion");

            match steps.last_mut() {
                Some(next) if combine.mergeable(&motions[chosen], &motions[next.motion]) => {
                    next.count += 1;
                }
                _ => steps.push(Step {
                    motion: chosen,
                    count: 1,
                }),
            }
        }
        current = node.parent;
    }

    steps.reverse();
    steps
}

/// Keystrokes emitting `candidate` adds in front of `next`.
fn added_keystrokes<M, C>(candidate: usize, next: Option<Step>, motions: &[M], combine: &C) -> usize
where
    C: Combine<M>,
{
    match next {
        Some(next) if combine.mergeable(&motions[candidate], &motions[next.motion]) => {
            let head = &motions[next.motion];
            combine
                .keystrokes(head, next.count + 1)
                .saturating_sub(combine.keystrokes(head, next.count))
        }
        _ => combine.keystrokes(&motions[candidate], 1),
    }
}
