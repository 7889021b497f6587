//! Ordered associative container
//!
//! An `OrderedMap` keeps unique keys in first-insertion order and offers both
//! key-based (`get`) and positional (`at`, `key`) access. All transform
//! operators (`map`, `select`, `sort`, `intersect`, `union`) return a new map
//! and leave their receiver and argument untouched.

use super::store::{GraphError, GraphResult};
use super::types::Key;
use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::hash::Hash;

/// Insertion-ordered map with set-algebra and functional operators
#[derive(Clone)]
pub struct OrderedMap<K, V> {
    entries: IndexMap<K, V>,
}

impl<K: Hash + Eq, V> OrderedMap<K, V> {
    /// Create an empty map
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: IndexMap::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert at the end, or overwrite in place when the key exists
    pub fn set(&mut self, key: impl Into<K>, value: V) {
        self.entries.insert(key.into(), value);
    }

    /// Like `set`, but `None` is the absence marker and is ignored
    ///
    /// Returns whether the entry was stored.
    pub fn set_maybe(&mut self, key: Option<K>, value: V) -> bool {
        match key {
            Some(key) => {
                self.entries.insert(key, value);
                true
            }
            None => false,
        }
    }

    /// Key-based lookup
    pub fn get(&self, key: impl Into<K>) -> Option<&V> {
        self.entries.get(&key.into())
    }

    pub fn get_mut(&mut self, key: impl Into<K>) -> Option<&mut V> {
        self.entries.get_mut(&key.into())
    }

    pub fn contains_key(&self, key: impl Into<K>) -> bool {
        self.entries.contains_key(&key.into())
    }

    /// Value at a 0-based position
    pub fn at(&self, index: usize) -> GraphResult<&V> {
        self.entries
            .get_index(index)
            .map(|(_, v)| v)
            .ok_or(GraphError::IndexOutOfRange {
                index,
                len: self.entries.len(),
            })
    }

    /// Key at a 0-based position
    pub fn key(&self, index: usize) -> GraphResult<&K> {
        self.entries
            .get_index(index)
            .map(|(k, _)| k)
            .ok_or(GraphError::IndexOutOfRange {
                index,
                len: self.entries.len(),
            })
    }

    /// Position of a key
    pub fn index_of(&self, key: impl Into<K>) -> Option<usize> {
        self.entries.get_index_of(&key.into())
    }

    /// Remove a key, keeping the order of the remaining entries
    pub fn del(&mut self, key: impl Into<K>) -> Option<V> {
        self.entries.shift_remove(&key.into())
    }

    /// Visit `(value, key, index)` in insertion order
    pub fn each<F>(&self, mut f: F)
    where
        F: FnMut(&V, &K, usize),
    {
        for (index, (key, value)) in self.entries.iter().enumerate() {
            f(value, key, index);
        }
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, K, V> {
        self.entries.iter()
    }

    pub fn keys(&self) -> indexmap::map::Keys<'_, K, V> {
        self.entries.keys()
    }

    /// Values in insertion order
    pub fn values(&self) -> indexmap::map::Values<'_, K, V> {
        self.entries.values()
    }

    pub fn first(&self) -> Option<&V> {
        self.entries.first().map(|(_, v)| v)
    }

    pub fn last(&self) -> Option<&V> {
        self.entries.last().map(|(_, v)| v)
    }
}

impl<K: Hash + Eq + Clone, V: Clone> OrderedMap<K, V> {
    /// New map with the same entries reordered by `compare` over values
    pub fn sort<F>(&self, mut compare: F) -> Self
    where
        F: FnMut(&V, &V) -> Ordering,
    {
        let mut entries = self.entries.clone();
        entries.sort_by(|_, a, _, b| compare(a, b));
        Self { entries }
    }

    /// New map containing only entries where `predicate` holds
    pub fn select<F>(&self, mut predicate: F) -> Self
    where
        F: FnMut(&V, &K) -> bool,
    {
        let entries = self
            .entries
            .iter()
            .filter(|(k, v)| predicate(*v, *k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Self { entries }
    }

    /// Entries whose key is also in `other`; values and order from `self`
    pub fn intersect<W>(&self, other: &OrderedMap<K, W>) -> Self {
        self.select(|_, key| other.entries.contains_key(key))
    }

    /// All of `self`, then the entries of `other` whose key is new
    pub fn union(&self, other: &Self) -> Self {
        let mut entries = self.entries.clone();
        for (key, value) in &other.entries {
            if !entries.contains_key(key) {
                entries.insert(key.clone(), value.clone());
            }
        }
        Self { entries }
    }
}

impl<K: Hash + Eq + Clone, V> OrderedMap<K, V> {
    /// Move the entry under `old` to `new` without changing its position
    ///
    /// Leaves the map as it was and returns false when `old` is missing or
    /// `new` already names another entry.
    pub fn rekey(&mut self, old: impl Into<K>, new: impl Into<K>) -> bool {
        let (old, new) = (old.into(), new.into());
        let Some(index) = self.entries.get_index_of(&old) else {
            return false;
        };
        if old == new {
            return true;
        }
        if self.entries.contains_key(&new) {
            return false;
        }
        let entries = std::mem::take(&mut self.entries);
        self.entries = entries
            .into_iter()
            .enumerate()
            .map(|(i, (k, v))| {
                if i == index {
                    (new.clone(), v)
                } else {
                    (k, v)
                }
            })
            .collect();
        true
    }

    /// New map with the same keys and order and transformed values
    pub fn map<W, F>(&self, mut f: F) -> OrderedMap<K, W>
    where
        F: FnMut(&V) -> W,
    {
        OrderedMap {
            entries: self.entries.iter().map(|(k, v)| (k.clone(), f(v))).collect(),
        }
    }
}

/// Comparators for `OrderedMap::sort`
pub mod comparators {
    use std::cmp::Ordering;

    /// Natural ascending order; incomparable values are treated as equal
    pub fn asc<V: PartialOrd>(a: &V, b: &V) -> Ordering {
        a.partial_cmp(b).unwrap_or(Ordering::Equal)
    }

    /// Natural descending order
    pub fn desc<V: PartialOrd>(a: &V, b: &V) -> Ordering {
        asc(b, a)
    }
}

impl<K: Hash + Eq, V> Default for OrderedMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Order-sensitive equality
impl<K: Hash + Eq, V: PartialEq> PartialEq for OrderedMap<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.entries.iter().eq(other.entries.iter())
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for OrderedMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries.iter()).finish()
    }
}

/// Keys are positions: the i-th value is stored under `Key::Int(i)`
impl<V> From<Vec<V>> for OrderedMap<Key, V> {
    fn from(values: Vec<V>) -> Self {
        Self {
            entries: values
                .into_iter()
                .enumerate()
                .map(|(i, v)| (Key::from(i), v))
                .collect(),
        }
    }
}

impl<K: Hash + Eq, V> FromIterator<(K, V)> for OrderedMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<'a, K, V> IntoIterator for &'a OrderedMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = indexmap::map::Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl<K, V> IntoIterator for OrderedMap<K, V> {
    type Item = (K, V);
    type IntoIter = indexmap::map::IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Serialized as a JSON object keyed by each key's display form
impl<K: fmt::Display, V: Serialize> Serialize for OrderedMap<K, V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.entries.iter().map(|(k, v)| (k.to_string(), v)))
    }
}
