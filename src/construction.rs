//! Construction and capacity validation for `BPlusTreeMap`.

use crate::arena::CompactArena;
use crate::error::{BPlusTreeError, InitResult};
use crate::types::{BPlusTreeMap, LeafNode, MIN_CAPACITY};

/// Reject capacities below the minimum a node needs to support split,
/// merge, and redistribution without ever going empty.
pub(crate) fn validate_capacity(capacity: usize) -> InitResult<()> {
    if capacity < MIN_CAPACITY {
        return Err(BPlusTreeError::invalid_capacity(capacity, MIN_CAPACITY));
    }
    Ok(())
}

impl<K: Ord + Clone, V: Clone> BPlusTreeMap<K, V> {
    /// Create a new empty tree with the given per-node capacity.
    ///
    /// # Errors
    ///
    /// Returns `BPlusTreeError::InvalidCapacity` if `capacity < 4`: a node
    /// needs at least that many slots for split/merge/redistribute to leave
    /// both halves above the minimum.
    pub fn new(capacity: usize) -> InitResult<Self> {
        validate_capacity(capacity)?;

        let mut leaf_arena = CompactArena::new();
        let branch_arena = CompactArena::new();
        let root_id = leaf_arena.allocate(LeafNode::new(capacity));

        Ok(Self {
            capacity,
            root: crate::types::NodeRef::leaf(root_id),
            leaf_arena,
            branch_arena,
            mod_count: 0,
        })
    }

    /// Create a new empty tree using `DEFAULT_CAPACITY`.
    pub fn with_default_capacity() -> Self {
        Self::new(crate::types::DEFAULT_CAPACITY).expect("DEFAULT_CAPACITY is always valid")
    }

    pub(crate) fn bump_mod_count(&mut self) {
        self.mod_count = self.mod_count.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_capacity_below_minimum() {
        let result: InitResult<BPlusTreeMap<i32, i32>> = BPlusTreeMap::new(2);
        assert!(matches!(result, Err(BPlusTreeError::InvalidCapacity(_))));
    }

    #[test]
    fn new_accepts_minimum_capacity() {
        let tree: BPlusTreeMap<i32, i32> = BPlusTreeMap::new(MIN_CAPACITY).unwrap();
        assert!(tree.is_empty());
    }

    #[test]
    fn with_default_capacity_produces_empty_tree() {
        let tree: BPlusTreeMap<i32, i32> = BPlusTreeMap::with_default_capacity();
        assert_eq!(tree.len(), 0);
    }
}
