//! Whole-tree bookkeeping: size, emptiness, clearing, and the leaf-locating
//! descent shared by get/insert/remove/range.

use crate::arena::NodeId;
use crate::types::{BPlusTreeMap, NodeRef};

impl<K: Ord + Clone, V: Clone> BPlusTreeMap<K, V> {
    /// Total number of key-value pairs in the tree.
    pub fn len(&self) -> usize {
        self.len_of(self.root)
    }

    fn len_of(&self, node: NodeRef<K, V>) -> usize {
        match node {
            NodeRef::Leaf(id, _) => self.leaf_arena.get(id).map_or(0, |l| l.len()),
            NodeRef::Branch(id, _) => self
                .branch_arena
                .get(id)
                .map_or(0, |b| b.children.iter().map(|&c| self.len_of(c)).sum()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of leaves currently in the tree.
    pub fn leaf_count(&self) -> usize {
        self.leaf_count_of(self.root)
    }

    fn leaf_count_of(&self, node: NodeRef<K, V>) -> usize {
        match node {
            NodeRef::Leaf(_, _) => 1,
            NodeRef::Branch(id, _) => self.branch_arena.get(id).map_or(0, |b| {
                b.children.iter().map(|&c| self.leaf_count_of(c)).sum()
            }),
        }
    }

    /// Drop every node and reset to a single empty root leaf.
    pub fn clear(&mut self) {
        self.leaf_arena.clear();
        self.branch_arena.clear();
        let root_id = self.leaf_arena.allocate(crate::types::LeafNode::new(self.capacity));
        self.root = NodeRef::leaf(root_id);
        self.bump_mod_count();
    }

    /// `true` if the root is itself a leaf (the tree has no branch levels).
    pub fn is_leaf_root(&self) -> bool {
        self.root.is_leaf()
    }

    pub(crate) fn first_leaf_id(&self) -> Option<NodeId> {
        let mut current = self.root;
        loop {
            match current {
                NodeRef::Leaf(id, _) => return Some(id),
                NodeRef::Branch(id, _) => {
                    let branch = self.branch_arena.get(id)?;
                    current = *branch.children.first()?;
                }
            }
        }
    }

    pub(crate) fn last_leaf_id(&self) -> Option<NodeId> {
        let mut current = self.root;
        loop {
            match current {
                NodeRef::Leaf(id, _) => return Some(id),
                NodeRef::Branch(id, _) => {
                    let branch = self.branch_arena.get(id)?;
                    current = *branch.children.last()?;
                }
            }
        }
    }

    /// Descend from the root to the leaf that would contain `key`.
    pub(crate) fn find_leaf_for_key(&self, key: &K) -> NodeId {
        let mut current = self.root;
        loop {
            match current {
                NodeRef::Leaf(id, _) => return id,
                NodeRef::Branch(id, _) => {
                    let branch = self
                        .branch_arena
                        .get(id)
                        .expect("branch referenced by a live NodeRef must be allocated");
                    let child_index = branch.route(key);
                    current = branch.children[child_index];
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn len_and_is_empty_track_insertions() {
        let mut tree: BPlusTreeMap<i32, i32> = BPlusTreeMap::new(4).unwrap();
        assert!(tree.is_empty());
        for i in 0..10 {
            tree.insert(i, i);
        }
        assert_eq!(tree.len(), 10);
        assert!(!tree.is_empty());
    }

    #[test]
    fn clear_resets_to_single_empty_leaf_root() {
        let mut tree: BPlusTreeMap<i32, i32> = BPlusTreeMap::new(4).unwrap();
        for i in 0..50 {
            tree.insert(i, i);
        }
        tree.clear();
        assert_eq!(tree.len(), 0);
        assert!(tree.is_leaf_root());
    }

    #[test]
    fn leaf_count_grows_as_tree_splits() {
        let mut tree: BPlusTreeMap<i32, i32> = BPlusTreeMap::new(4).unwrap();
        assert_eq!(tree.leaf_count(), 1);
        for i in 0..100 {
            tree.insert(i, i);
        }
        assert!(tree.leaf_count() > 1);
    }
}
