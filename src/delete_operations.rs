//! Recursive remove with sibling redistribution and merge on underflow.
//!
//! Mirrors `insert_operations.rs`'s shape: underflow, like a split,
//! propagates back up through return values, and the parent at each level
//! decides whether to borrow from a sibling or merge with one.

use crate::error::{BPlusTreeError, BTreeResult};
use crate::types::{BPlusTreeMap, NodeRef};

/// Outcome of removing from a subtree.
struct Removed<V> {
    old_value: Option<V>,
    /// Whether this subtree's root node is now below its minimum key
    /// count and needs the parent to rebalance it.
    underflow: bool,
}

impl<K: Ord + Clone, V: Clone> BPlusTreeMap<K, V> {
    /// Remove `key`, returning its value if it was present.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.bump_mod_count();
        let result = self.remove_from(self.root, key);
        if result.old_value.is_some() {
            self.collapse_root_if_needed();
        }
        result.old_value
    }

    /// Like [`remove`](Self::remove), but errors instead of silently
    /// returning `None` when the key is absent.
    pub fn remove_item(&mut self, key: &K) -> BTreeResult<V> {
        self.remove(key).ok_or(BPlusTreeError::KeyNotFound)
    }

    /// Remove and return the smallest entry.
    pub fn pop_first(&mut self) -> Option<(K, V)> {
        let leaf_id = self.first_leaf_id()?;
        let key = self.leaf_arena.get(leaf_id)?.keys().first()?.clone();
        let value = self.remove(&key)?;
        Some((key, value))
    }

    /// Like [`pop_first`](Self::pop_first), but errors rather than
    /// returning `None` on an empty tree.
    pub fn pop_first_item(&mut self) -> BTreeResult<(K, V)> {
        self.pop_first().ok_or(BPlusTreeError::Empty)
    }

    /// Remove and return the largest entry.
    pub fn pop_last(&mut self) -> Option<(K, V)> {
        let leaf_id = self.last_leaf_id()?;
        let key = self.leaf_arena.get(leaf_id)?.keys().last()?.clone();
        let value = self.remove(&key)?;
        Some((key, value))
    }

    /// Remove `key`, returning the full `(key, value)` entry.
    pub fn remove_entry(&mut self, key: &K) -> Option<(K, V)> {
        let value = self.remove(key)?;
        Some((key.clone(), value))
    }

    fn remove_from(&mut self, node: NodeRef<K, V>, key: &K) -> Removed<V> {
        match node {
            NodeRef::Leaf(id, _) => {
                let leaf = self
                    .leaf_arena
                    .get_mut(id)
                    .expect("live NodeRef must point at an allocated leaf");
                let old_value = leaf.remove(key);
                let underflow = old_value.is_some() && leaf.is_underfull();
                Removed {
                    old_value,
                    underflow,
                }
            }
            NodeRef::Branch(id, _) => {
                let branch = self
                    .branch_arena
                    .get(id)
                    .expect("live NodeRef must point at an allocated branch");
                let child_index = branch.route(key);
                let child = branch.children[child_index];

                let result = self.remove_from(child, key);
                if result.underflow {
                    self.rebalance_child(id, child_index);
                }

                let underflow = self
                    .branch_arena
                    .get(id)
                    .expect("branch was not deallocated by its own rebalance")
                    .is_underfull();
                Removed {
                    old_value: result.old_value,
                    underflow,
                }
            }
        }
    }

    /// Fix underflow at `parent.children[child_index]` by borrowing from a
    /// sibling that can spare a key, or merging with one otherwise.
    ///
    /// Also used by bulk load to fix up a too-small tail leaf after
    /// appending, which is exactly the same "no sibling can donate, so
    /// merge" situation a deletion can leave behind.
    pub(crate) fn rebalance_child(&mut self, parent_id: crate::arena::NodeId, child_index: usize) {
        let parent = self.branch_arena.get(parent_id).unwrap();
        let child = parent.children[child_index];
        let left_sib = (child_index > 0).then(|| parent.children[child_index - 1]);
        let right_sib = (child_index + 1 < parent.children.len())
            .then(|| parent.children[child_index + 1]);

        match child {
            NodeRef::Leaf(child_id, _) => {
                self.rebalance_leaf_child(parent_id, child_index, child_id, left_sib, right_sib)
            }
            NodeRef::Branch(child_id, _) => self.rebalance_branch_child(
                parent_id, child_index, child_id, left_sib, right_sib,
            ),
        }
    }

    fn rebalance_leaf_child(
        &mut self,
        parent_id: crate::arena::NodeId,
        child_index: usize,
        child_id: crate::arena::NodeId,
        left_sib: Option<NodeRef<K, V>>,
        right_sib: Option<NodeRef<K, V>>,
    ) {
        if let Some(NodeRef::Leaf(left_id, _)) = left_sib {
            if self.leaf_arena.get(left_id).unwrap().can_donate() {
                let (left, child) = self.leaf_arena.get2_mut(left_id, child_id);
                left.borrow_back_of(child);
                let new_separator = child.keys()[0].clone();
                self.branch_arena.get_mut(parent_id).unwrap().keys[child_index - 1] =
                    new_separator;
                return;
            }
        }
        if let Some(NodeRef::Leaf(right_id, _)) = right_sib {
            if self.leaf_arena.get(right_id).unwrap().can_donate() {
                let (right, child) = self.leaf_arena.get2_mut(right_id, child_id);
                right.borrow_front_of(child);
                let new_separator = right.keys()[0].clone();
                self.branch_arena.get_mut(parent_id).unwrap().keys[child_index] = new_separator;
                return;
            }
        }
        if let Some(NodeRef::Leaf(left_id, _)) = left_sib {
            let mut orphan = self.leaf_arena.deallocate(child_id).unwrap();
            self.leaf_arena
                .get_mut(left_id)
                .unwrap()
                .merge_with_right(&mut orphan);
            let parent = self.branch_arena.get_mut(parent_id).unwrap();
            parent.keys.remove(child_index - 1);
            parent.children.remove(child_index);
            return;
        }
        if let Some(NodeRef::Leaf(right_id, _)) = right_sib {
            let mut orphan = self.leaf_arena.deallocate(right_id).unwrap();
            self.leaf_arena
                .get_mut(child_id)
                .unwrap()
                .merge_with_right(&mut orphan);
            let parent = self.branch_arena.get_mut(parent_id).unwrap();
            parent.keys.remove(child_index);
            parent.children.remove(child_index + 1);
        }
        // Neither sibling exists: the parent has a single child, which can
        // only happen at the root and is resolved by `collapse_root_if_needed`.
    }

    fn rebalance_branch_child(
        &mut self,
        parent_id: crate::arena::NodeId,
        child_index: usize,
        child_id: crate::arena::NodeId,
        left_sib: Option<NodeRef<K, V>>,
        right_sib: Option<NodeRef<K, V>>,
    ) {
        if let Some(NodeRef::Branch(left_id, _)) = left_sib {
            if self.branch_arena.get(left_id).unwrap().can_donate() {
                let separator = self.branch_arena.get(parent_id).unwrap().keys[child_index - 1]
                    .clone();
                let (left, child) = self.branch_arena.get2_mut(left_id, child_id);
                let new_separator = child.borrow_from_left(left, separator);
                self.branch_arena.get_mut(parent_id).unwrap().keys[child_index - 1] =
                    new_separator;
                return;
            }
        }
        if let Some(NodeRef::Branch(right_id, _)) = right_sib {
            if self.branch_arena.get(right_id).unwrap().can_donate() {
                let separator = self.branch_arena.get(parent_id).unwrap().keys[child_index]
                    .clone();
                let (right, child) = self.branch_arena.get2_mut(right_id, child_id);
                let new_separator = child.borrow_from_right(right, separator);
                self.branch_arena.get_mut(parent_id).unwrap().keys[child_index] = new_separator;
                return;
            }
        }
        if let Some(NodeRef::Branch(left_id, _)) = left_sib {
            let separator = self.branch_arena.get(parent_id).unwrap().keys[child_index - 1]
                .clone();
            let mut orphan = self.branch_arena.deallocate(child_id).unwrap();
            self.branch_arena
                .get_mut(left_id)
                .unwrap()
                .merge_with_right(separator, &mut orphan);
            let parent = self.branch_arena.get_mut(parent_id).unwrap();
            parent.keys.remove(child_index - 1);
            parent.children.remove(child_index);
            return;
        }
        if let Some(NodeRef::Branch(right_id, _)) = right_sib {
            let separator = self.branch_arena.get(parent_id).unwrap().keys[child_index].clone();
            let mut orphan = self.branch_arena.deallocate(right_id).unwrap();
            self.branch_arena
                .get_mut(child_id)
                .unwrap()
                .merge_with_right(separator, &mut orphan);
            let parent = self.branch_arena.get_mut(parent_id).unwrap();
            parent.keys.remove(child_index);
            parent.children.remove(child_index + 1);
        }
    }

    /// If the root has collapsed down to a branch with no keys left (one
    /// child only), replace it with that child.
    pub(crate) fn collapse_root_if_needed(&mut self) {
        if let NodeRef::Branch(id, _) = self.root {
            let branch = self.branch_arena.get(id).unwrap();
            if branch.keys.is_empty() {
                let only_child = branch.children[0];
                self.branch_arena.deallocate(id);
                self.root = only_child;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remove_absent_key_returns_none() {
        let mut tree: BPlusTreeMap<i32, i32> = BPlusTreeMap::new(4).unwrap();
        tree.insert(1, 1);
        assert_eq!(tree.remove(&2), None);
    }

    #[test]
    fn remove_every_key_leaves_empty_sound_tree() {
        let mut tree: BPlusTreeMap<i32, i32> = BPlusTreeMap::new(4).unwrap();
        for i in 0..300 {
            tree.insert(i, i);
        }
        for i in 0..300 {
            assert_eq!(tree.remove(&i), Some(i));
            assert!(tree.check_invariants(), "invariant broke removing {}", i);
        }
        assert!(tree.is_empty());
        assert!(tree.is_leaf_root());
    }

    #[test]
    fn remove_interleaved_with_insert_stays_sound() {
        let mut tree: BPlusTreeMap<i32, i32> = BPlusTreeMap::new(4).unwrap();
        for i in 0..200 {
            tree.insert(i, i);
        }
        for i in (0..200).step_by(2) {
            tree.remove(&i);
        }
        assert!(tree.check_invariants_detailed().is_empty());
        for i in (1..200).step_by(2) {
            assert_eq!(tree.get(&i), Some(&i));
        }
        for i in (0..200).step_by(2) {
            assert_eq!(tree.get(&i), None);
        }
    }

    #[test]
    fn remove_reverse_order_stays_sound() {
        let mut tree: BPlusTreeMap<i32, i32> = BPlusTreeMap::new(4).unwrap();
        for i in 0..150 {
            tree.insert(i, i);
        }
        for i in (0..150).rev() {
            tree.remove(&i);
            assert!(tree.check_invariants());
        }
    }

    #[test]
    fn pop_first_and_pop_last_return_ascending_bounds() {
        let mut tree: BPlusTreeMap<i32, i32> = BPlusTreeMap::new(4).unwrap();
        for i in 0..10 {
            tree.insert(i, i);
        }
        assert_eq!(tree.pop_first(), Some((0, 0)));
        assert_eq!(tree.pop_last(), Some((9, 9)));
        assert_eq!(tree.len(), 8);
    }

    #[test]
    fn pop_first_on_empty_tree_is_none() {
        let mut tree: BPlusTreeMap<i32, i32> = BPlusTreeMap::new(4).unwrap();
        assert_eq!(tree.pop_first(), None);
    }

    #[test]
    fn pop_first_item_surfaces_empty_error() {
        let mut tree: BPlusTreeMap<i32, i32> = BPlusTreeMap::new(4).unwrap();
        assert_eq!(tree.pop_first_item(), Err(BPlusTreeError::Empty));
        tree.insert(1, 1);
        assert_eq!(tree.pop_first_item(), Ok((1, 1)));
    }
}
