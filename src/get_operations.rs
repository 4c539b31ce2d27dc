//! Read-only lookups: `get`, `get_mut`, `contains_key`, and friends.

use crate::error::{BPlusTreeError, KeyResult};
use crate::types::BPlusTreeMap;

impl<K: Ord + Clone, V: Clone> BPlusTreeMap<K, V> {
    /// Look up `key`, returning a reference to its value if present.
    ///
    /// # Examples
    ///
    /// ```
    /// use bplustree::BPlusTreeMap;
    /// let mut tree = BPlusTreeMap::new(8).unwrap();
    /// tree.insert("a", 1);
    /// assert_eq!(tree.get("a"), Some(&1));
    /// assert_eq!(tree.get("b"), None);
    /// ```
    pub fn get(&self, key: &K) -> Option<&V> {
        let leaf_id = self.find_leaf_for_key(key);
        self.leaf_arena.get(leaf_id).and_then(|leaf| leaf.get(key))
    }

    /// Like [`get`](Self::get), but returns an error rather than `None` so
    /// callers can use `?` when absence should short-circuit.
    pub fn get_item(&self, key: &K) -> KeyResult<&V> {
        self.get(key).ok_or(BPlusTreeError::KeyNotFound)
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let leaf_id = self.find_leaf_for_key(key);
        self.leaf_arena
            .get_mut(leaf_id)
            .and_then(|leaf| leaf.get_mut(key))
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// `get`, falling back to `default` when the key is absent.
    pub fn get_or_default<'a>(&'a self, key: &K, default: &'a V) -> &'a V {
        self.get(key).unwrap_or(default)
    }
}
