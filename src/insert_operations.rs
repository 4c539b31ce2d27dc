//! Top-down recursive insert, with splits propagating back up as return
//! values rather than through parent pointers.

use crate::types::{BPlusTreeMap, BranchNode, InsertResult, NodeRef, SplitNodeData};

/// Outcome of inserting into a subtree, once any split has already been
/// allocated into the arena. Distinct from `node::InsertResult`, which is
/// node-local and produces split data the caller still has to allocate.
enum Grown<K, V> {
    Updated(Option<V>),
    Split {
        old_value: Option<V>,
        separator_key: K,
        new_child: NodeRef<K, V>,
    },
}

impl<K: Ord + Clone, V: Clone> BPlusTreeMap<K, V> {
    /// Insert `key`/`value`, returning the previous value if the key was
    /// already present.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        self.bump_mod_count();
        match self.insert_into(self.root, key, value) {
            Grown::Updated(old) => old,
            Grown::Split {
                old_value,
                separator_key,
                new_child,
            } => {
                self.grow_root(separator_key, new_child);
                old_value
            }
        }
    }

    fn insert_into(&mut self, node: NodeRef<K, V>, key: K, value: V) -> Grown<K, V> {
        match node {
            NodeRef::Leaf(id, _) => {
                let leaf = self
                    .leaf_arena
                    .get_mut(id)
                    .expect("live NodeRef must point at an allocated leaf");
                match leaf.insert(key, value) {
                    InsertResult::Updated(old) => Grown::Updated(old),
                    InsertResult::Split {
                        old_value,
                        new_node_data: SplitNodeData::Leaf(mut new_leaf),
                        separator_key,
                    } => {
                        new_leaf.next = leaf.next;
                        let new_id = self.leaf_arena.allocate(new_leaf);
                        self.leaf_arena.get_mut(id).unwrap().next = new_id;
                        Grown::Split {
                            old_value,
                            separator_key,
                            new_child: NodeRef::leaf(new_id),
                        }
                    }
                    InsertResult::Split { .. } => {
                        unreachable!("leaf split always yields leaf split data")
                    }
                }
            }
            NodeRef::Branch(id, _) => {
                let branch = self
                    .branch_arena
                    .get(id)
                    .expect("live NodeRef must point at an allocated branch");
                let child_index = branch.route(&key);
                let child = branch.children[child_index];

                match self.insert_into(child, key, value) {
                    Grown::Updated(old) => Grown::Updated(old),
                    Grown::Split {
                        old_value,
                        separator_key,
                        new_child,
                    } => {
                        let branch = self.branch_arena.get_mut(id).unwrap();
                        match branch.insert_child_after(child_index, separator_key, new_child) {
                            InsertResult::Updated(_) => Grown::Updated(old_value),
                            InsertResult::Split {
                                new_node_data: SplitNodeData::Branch(new_branch),
                                separator_key,
                                ..
                            } => {
                                let new_id = self.branch_arena.allocate(new_branch);
                                Grown::Split {
                                    old_value,
                                    separator_key,
                                    new_child: NodeRef::branch(new_id),
                                }
                            }
                            InsertResult::Split { .. } => {
                                unreachable!("branch split always yields branch split data")
                            }
                        }
                    }
                }
            }
        }
    }

    /// The root split: replace the root with a fresh branch routing
    /// between the old root and the already-allocated new sibling.
    fn grow_root(&mut self, separator_key: K, new_sibling: NodeRef<K, V>) {
        let old_root = self.root;

        let mut new_root = BranchNode::new(self.capacity);
        new_root.keys.push(separator_key);
        new_root.children.push(old_root);
        new_root.children.push(new_sibling);

        let new_root_id = self.branch_arena.allocate(new_root);
        self.root = NodeRef::branch(new_root_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_returns_previous_value_on_overwrite() {
        let mut tree: BPlusTreeMap<i32, &str> = BPlusTreeMap::new(4).unwrap();
        assert_eq!(tree.insert(1, "a"), None);
        assert_eq!(tree.insert(1, "b"), Some("a"));
        assert_eq!(tree.get(&1), Some(&"b"));
    }

    #[test]
    fn many_inserts_grow_tree_past_one_level() {
        let mut tree: BPlusTreeMap<i32, i32> = BPlusTreeMap::new(4).unwrap();
        for i in 0..500 {
            tree.insert(i, i);
        }
        assert_eq!(tree.len(), 500);
        assert!(!tree.is_leaf_root());
        for i in 0..500 {
            assert_eq!(tree.get(&i), Some(&i));
        }
    }

    #[test]
    fn descending_inserts_also_keep_tree_sound() {
        let mut tree: BPlusTreeMap<i32, i32> = BPlusTreeMap::new(4).unwrap();
        for i in (0..300).rev() {
            tree.insert(i, i);
        }
        assert!(tree.check_invariants());
        assert_eq!(tree.len(), 300);
    }

    #[test]
    fn insert_bumps_mod_count() {
        let mut tree: BPlusTreeMap<i32, i32> = BPlusTreeMap::new(4).unwrap();
        let before = tree.mod_count;
        tree.insert(1, 1);
        assert_ne!(tree.mod_count, before);
    }
}
