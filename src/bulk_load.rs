//! Bulk construction from a pre-sorted sequence of entries.
//!
//! Building leaf-by-leaf via repeated `insert` is correct but does a full
//! root-to-leaf descent per key. Since the input is already sorted, each
//! new entry belongs at the end of the most-recently-built leaf, so this
//! keeps a cached handle to that leaf and appends directly into it,
//! splitting and propagating up through the right spine only when it
//! actually fills — the same shape as appending to a sorted run rather
//! than inserting into an arbitrary position.

use crate::arena::NodeId;
use crate::error::{BPlusTreeError, InitResult};
use crate::types::{BPlusTreeMap, BranchNode, LeafNode, NodeRef};

impl<K: Ord + Clone, V: Clone> BPlusTreeMap<K, V> {
    /// Build a tree from `items`, which must already be sorted in strictly
    /// ascending key order (caller-verified — checked here, since building
    /// on unsorted input would silently produce a tree violating every
    /// ordering invariant).
    ///
    /// # Errors
    ///
    /// Returns `BPlusTreeError::InvalidCapacity` for an invalid capacity,
    /// or `BPlusTreeError::Bug` if `items` is not strictly ascending.
    pub fn bulk_load(capacity: usize, items: Vec<(K, V)>) -> InitResult<Self> {
        let mut tree = Self::new(capacity)?;
        if items.is_empty() {
            return Ok(tree);
        }

        if !items.windows(2).all(|w| w[0].0 < w[1].0) {
            return Err(BPlusTreeError::bug(
                "bulk_load",
                "input was not strictly ascending by key",
            ));
        }

        tree.bulk_load_sorted(items);
        Ok(tree)
    }

    /// Alias for [`bulk_load`](Self::bulk_load): build a tree from a
    /// sorted `Vec` of entries.
    pub fn from_sorted_items(capacity: usize, items: Vec<(K, V)>) -> InitResult<Self> {
        Self::bulk_load(capacity, items)
    }

    fn bulk_load_sorted(&mut self, items: Vec<(K, V)>) {
        let first_leaf_id = self.first_leaf_id().expect("fresh tree always has a root leaf");
        self.leaf_arena.get_mut(first_leaf_id).unwrap().keys.clear();
        self.leaf_arena.get_mut(first_leaf_id).unwrap().values.clear();

        let mut rightmost_leaf = first_leaf_id;
        // Path of (branch_id) from root to `rightmost_leaf`, innermost last,
        // kept current so a full rightmost leaf can propagate its split
        // straight up the right spine instead of re-descending from the root.
        let mut right_spine: Vec<NodeId> = Vec::new();

        for (key, value) in items {
            let leaf = self.leaf_arena.get_mut(rightmost_leaf).unwrap();
            if leaf.len() < leaf.capacity {
                leaf.keys.push(key);
                leaf.values.push(value);
                continue;
            }

            let new_leaf_id = self.leaf_arena.allocate(LeafNode::new(self.capacity));
            self.leaf_arena.get_mut(new_leaf_id).unwrap().keys.push(key);
            self.leaf_arena
                .get_mut(new_leaf_id)
                .unwrap()
                .values
                .push(value);
            let separator = self.leaf_arena.get(new_leaf_id).unwrap().keys()[0].clone();
            self.leaf_arena.get_mut(rightmost_leaf).unwrap().next = new_leaf_id;

            self.attach_to_right_spine(&mut right_spine, separator, NodeRef::leaf(new_leaf_id));
            rightmost_leaf = new_leaf_id;
        }

        self.fix_underfull_tail(rightmost_leaf, &right_spine);
    }

    /// Appending stops as soon as the input runs out, so the last leaf built
    /// can be smaller than `min_keys` even though every other leaf along the
    /// way was split at a sound threshold. Borrow from (or merge into) its
    /// left sibling the same way a deletion would, cascading up the right
    /// spine if that merge underflows an ancestor in turn.
    fn fix_underfull_tail(&mut self, tail_leaf: NodeId, right_spine: &[NodeId]) {
        if right_spine.is_empty() {
            return;
        }
        if !self.leaf_arena.get(tail_leaf).unwrap().is_underfull() {
            return;
        }

        for &branch_id in right_spine.iter().rev() {
            let last_index = self.branch_arena.get(branch_id).unwrap().children.len() - 1;
            self.rebalance_child(branch_id, last_index);
            if !self.branch_arena.get(branch_id).unwrap().is_underfull() {
                break;
            }
        }
        self.collapse_root_if_needed();
    }

    /// Append `new_child` (with separator `key`) onto the rightmost branch
    /// at each level of `right_spine`, growing the spine (and the root)
    /// when a level fills up.
    fn attach_to_right_spine(
        &mut self,
        right_spine: &mut Vec<NodeId>,
        key: K,
        new_child: NodeRef<K, V>,
    ) {
        if right_spine.is_empty() {
            // First ever split: build the first branch level over the
            // previous root (now the leftmost leaf) and the new child.
            let old_root = self.root;
            let mut root_branch = BranchNode::new(self.capacity);
            root_branch.keys.push(key);
            root_branch.children.push(old_root);
            root_branch.children.push(new_child);
            let root_id = self.branch_arena.allocate(root_branch);
            self.root = NodeRef::branch(root_id);
            right_spine.push(root_id);
            return;
        }

        let mut pending_key = key;
        let mut pending_child = new_child;
        // `right_spine` always has exactly as many entries as the tree has
        // branch levels; this loop only ever overwrites entries in place
        // (when a level splits) or leaves them untouched (when it doesn't).
        // It never shrinks the vector — every level from `right_spine.last()`
        // up to the root stays a real, live ancestor of the tail leaf.
        for level in (0..right_spine.len()).rev() {
            let branch_id = right_spine[level];
            let branch = self.branch_arena.get_mut(branch_id).unwrap();
            branch.keys.push(pending_key.clone());
            branch.children.push(pending_child);

            if branch.len() <= branch.capacity {
                return;
            }

            // This level overflowed too: split it, promoting its middle
            // key up to the next level (or creating a new root). `branch_id`
            // (the left half) no longer holds the rightmost child —
            // `new_branch_id` does — so the spine entry must follow it.
            let mid = branch.min_keys();
            let promoted = branch.keys[mid].clone();
            let right_keys = branch.keys.split_off(mid + 1);
            let right_children = branch.children.split_off(mid + 1);
            branch.keys.pop();
            let new_branch = BranchNode {
                capacity: self.capacity,
                keys: right_keys,
                children: right_children,
            };
            let new_branch_id = self.branch_arena.allocate(new_branch);
            right_spine[level] = new_branch_id;
            pending_key = promoted;
            pending_child = NodeRef::branch(new_branch_id);
        }

        // Every existing level overflowed: grow a new root.
        let old_root = self.root;
        let mut root_branch = BranchNode::new(self.capacity);
        root_branch.keys.push(pending_key);
        root_branch.children.push(old_root);
        root_branch.children.push(pending_child);
        let root_id = self.branch_arena.allocate(root_branch);
        self.root = NodeRef::branch(root_id);
        right_spine.insert(0, root_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_sorted_items_builds_equivalent_tree() {
        let items: Vec<_> = (0..500).map(|i| (i, i * 2)).collect();
        let tree = BPlusTreeMap::from_sorted_items(4, items).unwrap();
        assert_eq!(tree.len(), 500);
        assert!(tree.check_invariants_detailed().is_empty(), "{:?}", tree.check_invariants_detailed());
        for i in 0..500 {
            assert_eq!(tree.get(&i), Some(&(i * 2)));
        }
    }

    #[test]
    fn from_sorted_items_rejects_unsorted_input() {
        let items = vec![(2, "b"), (1, "a")];
        let result = BPlusTreeMap::from_sorted_items(4, items);
        assert!(result.is_err());
    }

    #[test]
    fn from_sorted_items_empty_input_is_empty_tree() {
        let tree: BPlusTreeMap<i32, i32> = BPlusTreeMap::from_sorted_items(4, vec![]).unwrap();
        assert!(tree.is_empty());
    }

    #[test]
    fn from_sorted_items_keeps_tail_leaf_above_minimum() {
        // capacity 4 => min_keys 2; 9 items over-fills leaf 1 and leaf 2
        // (4 each) and would leave a final leaf of just 1 key if nothing
        // corrected it. The range runs well past 25 and 37 (capacity-4
        // counts at which a stale right-spine entry used to misroute a
        // freshly split branch and produce uneven leaf depth).
        for count in 1..=100 {
            let items: Vec<_> = (0..count).map(|i| (i, i * 10)).collect();
            let tree = BPlusTreeMap::from_sorted_items(4, items).unwrap();
            let violations = tree.check_invariants_detailed();
            assert!(violations.is_empty(), "count={count}: {violations:?}");
            assert_eq!(tree.len(), count as usize);
            for i in 0..count {
                assert_eq!(tree.get(&i), Some(&(i * 10)), "count={count}, key={i}");
            }
        }
    }

    #[test]
    fn from_sorted_items_matches_incremental_insert() {
        let items: Vec<_> = (0..237).map(|i| (i, i)).collect();
        let bulk = BPlusTreeMap::from_sorted_items(6, items.clone()).unwrap();

        let mut incremental: BPlusTreeMap<i32, i32> = BPlusTreeMap::new(6).unwrap();
        for (k, v) in items {
            incremental.insert(k, v);
        }

        let bulk_items: Vec<_> = bulk.items().map(|(k, v)| (*k, *v)).collect();
        let incremental_items: Vec<_> = incremental.items().map(|(k, v)| (*k, *v)).collect();
        assert_eq!(bulk_items, incremental_items);
    }
}
