//! Per-weight sibling-block bookkeeping for the adaptive Huffman tree.
//!
//! A *block* is the set of tree nodes sharing one weight. The update
//! algorithm repeatedly needs the block *leader* (the member with the
//! largest id), so each block keeps its members in a max-heap keyed by id,
//! with a position map for O(log n) removal of arbitrary members. Node ids
//! change when the tree swaps nodes; the affected block is restored with a
//! full reheapify, which is cheap because blocks are touched a constant
//! number of times per update step.

use std::collections::HashMap;

use ahash::RandomState;

use crate::adaptive::Node;

/// Blocks whose single member drains at or below this weight keep their
/// empty heap allocated; hot small-weight blocks refill immediately.
const RETAIN_WEIGHT: u64 = 1000;

/// Max-heap of arena indices ordered by node id.
struct IdHeap {
    heap: Vec<usize>,
    pos: HashMap<usize, usize, RandomState>,
}

impl IdHeap {
    fn new() -> Self {
        Self {
            heap: Vec::new(),
            pos: HashMap::with_hasher(RandomState::new()),
        }
    }

    fn len(&self) -> usize {
        self.heap.len()
    }

    fn top(&self) -> usize {
        self.heap[0]
    }

    fn contains(&self, node: usize) -> bool {
        self.pos.contains_key(&node)
    }

    fn insert(&mut self, nodes: &[Node], node: usize) {
        self.heap.push(node);
        let idx = self.heap.len() - 1;
        self.pos.insert(node, idx);
        self.sift_up(nodes, idx);
    }

    fn remove(&mut self, nodes: &[Node], node: usize) {
        let idx = self.pos[&node];
        let last = self.heap.len() - 1;

        self.heap.swap(idx, last);
        self.pos.insert(self.heap[idx], idx);
        self.heap.pop();
        self.pos.remove(&node);

        if idx < self.heap.len() {
            self.sift_up(nodes, idx);
            self.sift_down(nodes, idx);
        }
    }

    fn reheapify(&mut self, nodes: &[Node]) {
        for idx in (0..self.heap.len() / 2).rev() {
            self.sift_down(nodes, idx);
        }
    }

    fn clear(&mut self) {
        self.heap.clear();
        self.pos.clear();
    }

    fn sift_up(&mut self, nodes: &[Node], mut idx: usize) {
        while idx > 0 {
            let parent = (idx - 1) / 2;
            if nodes[self.heap[idx]].id <= nodes[self.heap[parent]].id {
                break;
            }
            self.swap_slots(idx, parent);
            idx = parent;
        }
    }

    fn sift_down(&mut self, nodes: &[Node], mut idx: usize) {
        loop {
            let left = idx * 2 + 1;
            if left >= self.heap.len() {
                break;
            }
            let right = left + 1;
            let mut largest = left;
            if right < self.heap.len() && nodes[self.heap[right]].id > nodes[self.heap[left]].id {
                largest = right;
            }
            if nodes[self.heap[largest]].id <= nodes[self.heap[idx]].id {
                break;
            }
            self.swap_slots(idx, largest);
            idx = largest;
        }
    }

    fn swap_slots(&mut self, a: usize, b: usize) {
        self.heap.swap(a, b);
        self.pos.insert(self.heap[a], a);
        self.pos.insert(self.heap[b], b);
    }
}

/// The weight -> block mapping.
pub(crate) struct BlockIndex {
    blocks: HashMap<u64, IdHeap, RandomState>,
}

impl BlockIndex {
    pub(crate) fn new() -> Self {
        Self {
            blocks: HashMap::with_hasher(RandomState::new()),
        }
    }

    /// Insert `node` into the block of its current weight.
    pub(crate) fn insert(&mut self, nodes: &[Node], node: usize) {
        let block = self.blocks.entry(nodes[node].weight).or_insert_with(IdHeap::new);
        debug_assert!(!block.contains(node));
        block.insert(nodes, node);
    }

    /// The leader (largest id) of `node`'s block.
    pub(crate) fn leader(&self, nodes: &[Node], node: usize) -> usize {
        let block = &self.blocks[&nodes[node].weight];
        debug_assert!(nodes[block.top()].id >= nodes[node].id);
        block.top()
    }

    /// Restore heap order in `node`'s block after an id exchange.
    pub(crate) fn reheapify(&mut self, nodes: &[Node], node: usize) {
        if let Some(block) = self.blocks.get_mut(&nodes[node].weight) {
            block.reheapify(nodes);
        }
    }

    /// Remove `node` from the block of its current weight, retaining the
    /// emptied heap for small weights.
    pub(crate) fn remove(&mut self, nodes: &[Node], node: usize) {
        let weight = nodes[node].weight;
        let Some(block) = self.blocks.get_mut(&weight) else {
            debug_assert!(false, "removal from a missing block");
            return;
        };
        debug_assert!(block.contains(node));

        if block.len() == 1 {
            if weight < RETAIN_WEIGHT {
                block.clear();
            } else {
                self.blocks.remove(&weight);
            }
        } else {
            block.remove(nodes, node);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(id: u128, weight: u64) -> Node {
        Node {
            id,
            weight,
            tag: None,
            parent: None,
            left: None,
            right: None,
        }
    }

    #[test]
    fn leader_is_largest_id_in_block() {
        let nodes = vec![leaf(3, 1), leaf(9, 1), leaf(5, 1), leaf(12, 2)];
        let mut blocks = BlockIndex::new();
        for i in 0..nodes.len() {
            blocks.insert(&nodes, i);
        }

        assert_eq!(blocks.leader(&nodes, 0), 1); // id 9 leads weight 1
        assert_eq!(blocks.leader(&nodes, 3), 3); // alone in weight 2
    }

    #[test]
    fn removal_keeps_leader_correct() {
        let nodes = vec![leaf(3, 1), leaf(9, 1), leaf(5, 1), leaf(7, 1)];
        let mut blocks = BlockIndex::new();
        for i in 0..nodes.len() {
            blocks.insert(&nodes, i);
        }

        blocks.remove(&nodes, 1);
        assert_eq!(blocks.leader(&nodes, 0), 3); // id 7 leads now
        blocks.remove(&nodes, 3);
        assert_eq!(blocks.leader(&nodes, 0), 2); // id 5
    }

    #[test]
    fn reheapify_recovers_from_id_exchange() {
        let mut nodes = vec![leaf(3, 1), leaf(9, 1), leaf(5, 1)];
        let mut blocks = BlockIndex::new();
        for i in 0..nodes.len() {
            blocks.insert(&nodes, i);
        }

        // Swap ids of nodes 1 and 0 behind the heap's back, then reheapify.
        nodes[1].id = 3;
        nodes[0].id = 9;
        blocks.reheapify(&nodes, 0);

        assert_eq!(blocks.leader(&nodes, 2), 0);
    }
}
