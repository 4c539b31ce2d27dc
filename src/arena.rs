//! Compact arena allocator for tree nodes.
//!
//! Backs both the leaf and branch storage for `BPlusTreeMap`. Nodes are
//! addressed by a small integer `NodeId` rather than by pointer, which keeps
//! the parent-less, leaf-chained tree representable without `Rc`/`RefCell`
//! or unsafe self-references: a split returns a *value*, the parent
//! allocates it, and the only thing anyone stores is its id.

use std::convert::TryFrom;

/// Node id type for arena-based allocation.
pub type NodeId = u32;

/// Sentinel id meaning "no node" (used for `next` links and absent children).
pub const NULL_NODE: NodeId = u32::MAX;

/// Point-in-time statistics about an arena's occupancy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArenaStats {
    pub allocated_count: usize,
    pub free_count: usize,
    pub capacity: usize,
}

/// Arena storage for one node type, with a bounded free list doubling as the
/// optional node pool described in the spec's resource model.
#[derive(Debug)]
pub struct CompactArena<T> {
    storage: Vec<T>,
    free_list: Vec<usize>,
    allocated_mask: Vec<bool>,
    /// Maximum number of freed slots retained for reuse. `None` means
    /// unbounded retention (the default); bounding it only affects
    /// allocator churn, never correctness.
    max_pool_size: Option<usize>,
}

impl<T> CompactArena<T> {
    /// Create a new empty arena with unbounded slot reuse.
    pub fn new() -> Self {
        Self {
            storage: Vec::new(),
            free_list: Vec::new(),
            allocated_mask: Vec::new(),
            max_pool_size: None,
        }
    }

    /// Create a new empty arena that retains at most `max_pool_size` freed
    /// slots for reuse; additional freed slots are dropped instead of
    /// pooled.
    pub fn with_max_pool(max_pool_size: usize) -> Self {
        Self {
            max_pool_size: Some(max_pool_size),
            ..Self::new()
        }
    }

    /// Allocate a new item in the arena, returning its id.
    #[inline]
    pub fn allocate(&mut self, item: T) -> NodeId {
        let index = if let Some(free_index) = self.free_list.pop() {
            self.storage[free_index] = item;
            self.allocated_mask[free_index] = true;
            free_index
        } else {
            let index = self.storage.len();
            self.storage.push(item);
            self.allocated_mask.push(true);
            index
        };

        NodeId::try_from(index).expect("arena index overflowed u32")
    }

    /// Remove an item from the arena and return it, reclaiming its slot for
    /// reuse (subject to `max_pool_size`).
    #[inline]
    pub fn deallocate(&mut self, id: NodeId) -> Option<T>
    where
        T: Default,
    {
        let index = self.allocated_index(id)?;
        self.allocated_mask[index] = false;
        let taken = std::mem::take(&mut self.storage[index]);

        let keep = match self.max_pool_size {
            Some(cap) => self.free_list.len() < cap,
            None => true,
        };
        if keep {
            self.free_list.push(index);
        }
        Some(taken)
    }

    /// Get a reference to an allocated item, or `None` if `id` is
    /// `NULL_NODE` or not currently allocated.
    #[inline]
    pub fn get(&self, id: NodeId) -> Option<&T> {
        let index = self.allocated_index(id)?;
        Some(&self.storage[index])
    }

    /// Get a mutable reference to an allocated item.
    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut T> {
        let index = self.allocated_index(id)?;
        Some(&mut self.storage[index])
    }

    /// Get mutable references to two distinct allocated items at once.
    /// Needed by sibling redistribution/merge, which must touch two nodes
    /// simultaneously. Panics if either id is unallocated or they're equal.
    #[inline]
    pub fn get2_mut(&mut self, a: NodeId, b: NodeId) -> (&mut T, &mut T) {
        let ia = self.allocated_index(a).expect("get2_mut: `a` not allocated");
        let ib = self.allocated_index(b).expect("get2_mut: `b` not allocated");
        assert_ne!(ia, ib, "get2_mut: `a` and `b` must be distinct nodes");
        if ia < ib {
            let (left, right) = self.storage.split_at_mut(ib);
            (&mut left[ia], &mut right[0])
        } else {
            let (left, right) = self.storage.split_at_mut(ia);
            (&mut right[0], &mut left[ib])
        }
    }

    /// Drop every allocated item and reset the arena to empty.
    pub fn clear(&mut self) {
        self.storage.clear();
        self.free_list.clear();
        self.allocated_mask.clear();
    }

    /// Current occupancy statistics.
    pub fn stats(&self) -> ArenaStats {
        ArenaStats {
            allocated_count: self.allocated_mask.iter().filter(|b| **b).count(),
            free_count: self.free_list.len(),
            capacity: self.storage.len(),
        }
    }

    fn allocated_index(&self, id: NodeId) -> Option<usize> {
        if id == NULL_NODE {
            return None;
        }
        let index = usize::try_from(id).ok()?;
        if index < self.storage.len() && self.allocated_mask[index] {
            Some(index)
        } else {
            None
        }
    }
}

impl<T> Default for CompactArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Clone for CompactArena<T> {
    fn clone(&self) -> Self {
        Self {
            storage: self.storage.clone(),
            free_list: self.free_list.clone(),
            allocated_mask: self.allocated_mask.clone(),
            max_pool_size: self.max_pool_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_and_get_roundtrip() {
        let mut arena: CompactArena<i32> = CompactArena::new();
        let id = arena.allocate(42);
        assert_eq!(arena.get(id), Some(&42));
    }

    #[test]
    fn null_node_is_never_allocated() {
        let arena: CompactArena<i32> = CompactArena::new();
        assert_eq!(arena.get(NULL_NODE), None);
    }

    #[test]
    fn deallocate_reclaims_slot() {
        let mut arena: CompactArena<i32> = CompactArena::new();
        let a = arena.allocate(1);
        let b = arena.allocate(2);
        arena.deallocate(a);
        assert_eq!(arena.get(a), None);
        assert_eq!(arena.get(b), Some(&2));

        let c = arena.allocate(3);
        assert_eq!(c, a, "freed slot should be reused before growing storage");
        assert_eq!(arena.stats().allocated_count, 2);
    }

    #[test]
    fn max_pool_size_bounds_retained_free_slots() {
        let mut arena: CompactArena<i32> = CompactArena::with_max_pool(1);
        let ids: Vec<_> = (0..3).map(|i| arena.allocate(i)).collect();
        for id in &ids {
            arena.deallocate(*id);
        }
        assert_eq!(arena.stats().free_count, 1);
    }

    #[test]
    fn get2_mut_returns_distinct_references_regardless_of_order() {
        let mut arena: CompactArena<i32> = CompactArena::new();
        let a = arena.allocate(1);
        let b = arena.allocate(2);
        {
            let (ra, rb) = arena.get2_mut(b, a);
            *ra += 10;
            *rb += 100;
        }
        assert_eq!(arena.get(a), Some(&101));
        assert_eq!(arena.get(b), Some(&12));
    }

    #[test]
    fn clear_empties_arena() {
        let mut arena: CompactArena<i32> = CompactArena::new();
        let id = arena.allocate(1);
        arena.clear();
        assert_eq!(arena.get(id), None);
        assert_eq!(arena.stats().allocated_count, 0);
    }
}
