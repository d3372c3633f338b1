//! Indexed binary min-heap of open nodes.
//!
//! Each entry remembers where it sits in the heap, so a node whose cost
//! drops can be sifted up in place instead of rebuilding the heap or leaving
//! stale duplicates behind.

use super::node::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Key {
    g: u32,
    /// Insertion sequence; equal costs pop in the order they were pushed.
    seq: u64,
}

#[derive(Debug, Default)]
pub struct OpenQueue {
    heap: Vec<NodeId>,
    /// `keys[node]` is the node's current priority.
    keys: Vec<Option<Key>>,
    /// `slots[node]` is the node's index in `heap` while it is queued.
    slots: Vec<Option<usize>>,
    next_seq: u64,
}

impl OpenQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.slots.get(node.index()).is_some_and(Option::is_some)
    }

    /// Queue `node` with cost `g`.
    pub fn push(&mut self, node: NodeId, g: u32) {
        debug_assert!(!self.contains(node), "node pushed twice");
        let i = node.index();
        if self.keys.len() <= i {
            self.keys.resize(i + 1, None);
            self.slots.resize(i + 1, None);
        }
        self.keys[i] = Some(self.next_key(g));
        self.heap.push(node);
        let slot = self.heap.len() - 1;
        self.slots[i] = Some(slot);
        self.sift_up(slot);
    }

    /// Remove and return the node with the lowest cost.
    pub fn pop(&mut self) -> Option<NodeId> {
        if self.heap.is_empty() {
            return None;
        }
        let last = self.heap.len() - 1;
        self.swap(0, last);
        let node = self.heap.pop()?;
        self.slots[node.index()] = None;
        self.keys[node.index()] = None;
        if !self.heap.is_empty() {
            self.sift_down(0);
        }
        Some(node)
    }

    /// Lower the cost of a queued node.
    ///
    /// The node is re-sequenced, so among equal costs it now pops after the
    /// nodes already waiting.
    pub fn decrease_key(&mut self, node: NodeId, g: u32) {
        let Some(slot) = self.slots.get(node.index()).copied().flatten() else {
            debug_assert!(false, "decrease_key on a node that is not queued");
            return;
        };
        let key = self.next_key(g);
        debug_assert!(
            self.keys[node.index()].is_some_and(|old| g <= old.g),
            "decrease_key must not raise the cost"
        );
        self.keys[node.index()] = Some(key);
        self.sift_up(slot);
    }

    fn next_key(&mut self, g: u32) -> Key {
        let seq = self.next_seq;
        self.next_seq += 1;
        Key { g, seq }
    }

    fn key_at(&self, slot: usize) -> Key {
        self.keys[self.heap[slot].index()].unwrap_or(Key {
            g: u32::MAX,
            seq: u64::MAX,
        })
    }

    fn swap(&mut self, a: usize, b: usize) {
        self.heap.swap(a, b);
        self.slots[self.heap[a].index()] = Some(a);
        self.slots[self.heap[b].index()] = Some(b);
    }

    fn sift_up(&mut self, mut slot: usize) {
        while slot > 0 {
            let parent = (slot - 1) / 2;
            if self.key_at(slot) >= self.key_at(parent) {
                break;
            }
            self.swap(slot, parent);
            slot = parent;
        }
    }

    fn sift_down(&mut self, mut slot: usize) {
        let len = self.heap.len();
        loop {
            let left = 2 * slot + 1;
            let right = left + 1;
            let mut smallest = slot;
            if left < len && self.key_at(left) < self.key_at(smallest) {
                smallest = left;
            }
            if right < len && self.key_at(right) < self.key_at(smallest) {
                smallest = right;
            }
            if smallest == slot {
                break;
            }
            self.swap(slot, smallest);
            slot = smallest;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn drain(queue: &mut OpenQueue) -> Vec<usize> {
        std::iter::from_fn(|| queue.pop()).map(NodeId::index).collect()
    }

    #[test]
    fn test_pops_in_cost_order() {
        let mut q = OpenQueue::new();
        for (i, g) in [5, 1, 4, 2, 3].into_iter().enumerate() {
            q.push(NodeId(i), g);
        }
        assert_eq!(q.len(), 5);
        assert_eq!(drain(&mut q), vec![1, 3, 4, 2, 0]);
        assert!(q.is_empty());
    }

    #[test]
    fn test_equal_costs_pop_in_insertion_order() {
        let mut q = OpenQueue::new();
        for i in [3, 0, 2, 1] {
            q.push(NodeId(i), 7);
        }
        assert_eq!(drain(&mut q), vec![3, 0, 2, 1]);
    }

    #[test]
    fn test_decrease_key_moves_node_forward() {
        let mut q = OpenQueue::new();
        q.push(NodeId(0), 3);
        q.push(NodeId(1), 4);
        q.push(NodeId(2), 10);
        q.decrease_key(NodeId(2), 1);
        assert_eq!(drain(&mut q), vec![2, 0, 1]);
    }

    #[test]
    fn test_decrease_key_to_tie_goes_after_waiting_nodes() {
        let mut q = OpenQueue::new();
        q.push(NodeId(0), 2);
        q.push(NodeId(1), 9);
        q.decrease_key(NodeId(1), 2);
        assert_eq!(drain(&mut q), vec![0, 1]);
    }

    #[test]
    fn test_contains_tracks_membership() {
        let mut q = OpenQueue::new();
        q.push(NodeId(4), 1);
        assert!(q.contains(NodeId(4)));
        assert!(!q.contains(NodeId(0)));
        assert!(!q.contains(NodeId(99)));
        q.pop();
        assert!(!q.contains(NodeId(4)));
    }

    #[test]
    fn test_interleaved_push_pop() {
        let mut q = OpenQueue::new();
        q.push(NodeId(0), 0);
        assert_eq!(q.pop(), Some(NodeId(0)));
        q.push(NodeId(1), 2);
        q.push(NodeId(2), 1);
        assert_eq!(q.pop(), Some(NodeId(2)));
        q.push(NodeId(3), 1);
        assert_eq!(drain(&mut q), vec![3, 1]);
    }
}
