//! Structural invariant checking.
//!
//! Generalizes a boolean "is this tree okay" check into a list of specific
//! `Violation`s, each naming the offending node, so callers (and tests) can
//! assert on *which* invariant broke rather than just that something did.

use crate::arena::NodeId;
use crate::types::{BPlusTreeMap, NodeRef};

/// A single structural invariant violation, naming the offending node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// A leaf's keys are not strictly ascending.
    LeafKeysUnordered(NodeId),
    /// A branch's keys are not strictly ascending.
    BranchKeysUnordered(NodeId),
    /// A branch has `children.len() != keys.len() + 1`.
    BranchArity(NodeId),
    /// A non-root node has fewer than `min_keys()` keys.
    Underflow(NodeId),
    /// A node has more than `capacity` keys.
    Overflow(NodeId),
    /// A key in a child subtree falls outside the range implied by its
    /// parent's separators.
    KeyOutOfRange(NodeId),
    /// The leaf chain is not a single ascending sequence covering every
    /// leaf exactly once (broken link, cycle, or an orphaned leaf).
    LeafChainBroken(NodeId),
    /// All leaves are not at the same depth.
    UnevenLeafDepth(NodeId),
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Violation::LeafKeysUnordered(id) => write!(f, "leaf {} keys not strictly ascending", id),
            Violation::BranchKeysUnordered(id) => {
                write!(f, "branch {} keys not strictly ascending", id)
            }
            Violation::BranchArity(id) => write!(f, "branch {} has children.len() != keys.len() + 1", id),
            Violation::Underflow(id) => write!(f, "node {} has fewer than the minimum number of keys", id),
            Violation::Overflow(id) => write!(f, "node {} exceeds its capacity", id),
            Violation::KeyOutOfRange(id) => write!(f, "node {} holds a key outside its parent's range", id),
            Violation::LeafChainBroken(id) => write!(f, "leaf chain broken at or before node {}", id),
            Violation::UnevenLeafDepth(id) => write!(f, "leaf {} is not at the same depth as its siblings", id),
        }
    }
}

impl<K: Ord + Clone, V: Clone> BPlusTreeMap<K, V> {
    /// `true` iff the tree currently satisfies every structural invariant.
    pub fn check_invariants(&self) -> bool {
        self.check_invariants_detailed().is_empty()
    }

    /// Full list of structural invariant violations, empty if the tree is
    /// sound. Walks the tree once for arity/ordering/underflow/overflow and
    /// once more over the leaf chain.
    pub fn check_invariants_detailed(&self) -> Vec<Violation> {
        let mut violations = Vec::new();
        let mut depths = Vec::new();
        self.check_node(self.root, true, None, None, 0, &mut depths, &mut violations);

        if let Some(first_depth) = depths.first() {
            for &(id, depth) in &depths {
                if depth != *first_depth {
                    violations.push(Violation::UnevenLeafDepth(id));
                }
            }
        }

        violations.extend(self.check_leaf_chain());
        violations
    }

    #[allow(clippy::too_many_arguments)]
    fn check_node(
        &self,
        node: NodeRef<K, V>,
        is_root: bool,
        lower: Option<&K>,
        upper: Option<&K>,
        depth: usize,
        leaf_depths: &mut Vec<(NodeId, usize)>,
        violations: &mut Vec<Violation>,
    ) {
        match node {
            NodeRef::Leaf(id, _) => {
                let Some(leaf) = self.leaf_arena.get(id) else {
                    return;
                };
                if !leaf.keys.windows(2).all(|w| w[0] < w[1]) {
                    violations.push(Violation::LeafKeysUnordered(id));
                }
                if !is_root && leaf.keys.len() < leaf.min_keys() {
                    violations.push(Violation::Underflow(id));
                }
                if leaf.keys.len() > leaf.capacity {
                    violations.push(Violation::Overflow(id));
                }
                if leaf.keys.iter().any(|k| {
                    lower.map(|lo| k < lo).unwrap_or(false) || upper.map(|hi| k >= hi).unwrap_or(false)
                }) {
                    violations.push(Violation::KeyOutOfRange(id));
                }
                leaf_depths.push((id, depth));
            }
            NodeRef::Branch(id, _) => {
                let Some(branch) = self.branch_arena.get(id) else {
                    return;
                };
                if !branch.keys.windows(2).all(|w| w[0] < w[1]) {
                    violations.push(Violation::BranchKeysUnordered(id));
                }
                if branch.children.len() != branch.keys.len() + 1 {
                    violations.push(Violation::BranchArity(id));
                }
                if !is_root && branch.keys.len() < branch.min_keys() {
                    violations.push(Violation::Underflow(id));
                }
                if branch.keys.len() > branch.capacity {
                    violations.push(Violation::Overflow(id));
                }

                for (i, &child) in branch.children.iter().enumerate() {
                    let child_lower = if i == 0 { lower } else { Some(&branch.keys[i - 1]) };
                    let child_upper = if i == branch.keys.len() {
                        upper
                    } else {
                        Some(&branch.keys[i])
                    };
                    self.check_node(
                        child,
                        false,
                        child_lower,
                        child_upper,
                        depth + 1,
                        leaf_depths,
                        violations,
                    );
                }
            }
        }
    }

    /// Walk the leaf chain from the first leaf and confirm it visits every
    /// leaf in the arena, in ascending order, exactly once.
    fn check_leaf_chain(&self) -> Vec<Violation> {
        let mut violations = Vec::new();
        let mut visited = std::collections::HashSet::new();

        let mut current = self.first_leaf_id();
        let mut prev_key: Option<&K> = None;
        while let Some(id) = current {
            if !visited.insert(id) {
                violations.push(Violation::LeafChainBroken(id));
                break;
            }
            let Some(leaf) = self.leaf_arena.get(id) else {
                violations.push(Violation::LeafChainBroken(id));
                break;
            };
            if let (Some(prev), Some(first)) = (prev_key, leaf.keys.first()) {
                if first <= prev {
                    violations.push(Violation::LeafChainBroken(id));
                }
            }
            prev_key = leaf.keys.last();
            current = (leaf.next != crate::arena::NULL_NODE).then_some(leaf.next);
        }

        let total_leaves = self.leaf_arena.stats().allocated_count;
        if visited.len() != total_leaves {
            violations.push(Violation::LeafChainBroken(crate::arena::NULL_NODE));
        }
        violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_empty_tree_has_no_violations() {
        let tree: BPlusTreeMap<i32, i32> = BPlusTreeMap::new(8).unwrap();
        assert!(tree.check_invariants());
    }

    #[test]
    fn populated_tree_holds_invariants() {
        let mut tree: BPlusTreeMap<i32, i32> = BPlusTreeMap::new(4).unwrap();
        for i in 0..200 {
            tree.insert(i, i * 2);
        }
        assert!(
            tree.check_invariants_detailed().is_empty(),
            "{:?}",
            tree.check_invariants_detailed()
        );
    }

    #[test]
    fn tree_survives_interleaved_insert_and_remove() {
        let mut tree: BPlusTreeMap<i32, i32> = BPlusTreeMap::new(4).unwrap();
        for i in 0..100 {
            tree.insert(i, i);
        }
        for i in (0..100).step_by(3) {
            tree.remove(&i);
        }
        assert!(tree.check_invariants_detailed().is_empty());
    }
}
