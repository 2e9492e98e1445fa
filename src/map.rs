use core::fmt::Debug;

use crate::comparer::EqualityComparer;
use crate::hash_table::HashTable;
use crate::hash_table::IntoIter;
use crate::hash_table::Iter;
use crate::runtime::Equatable;
use crate::runtime::Hashable;

/// A lenient key-value map in insertion order.
///
/// `Map<K, V>` never errors: [`set`](Self::set) inserts or updates,
/// [`get`](Self::get) returns `None` for a missing key and
/// [`delete`](Self::delete) reports whether anything was removed.
///
/// ```rust
/// use hashlinq::Map;
/// use hashlinq::Value;
///
/// let mut map = Map::new();
/// map.set(Value::from(1), "number").set(Value::from("1"), "string");
/// assert_eq!(map.size(), 2);
/// assert_eq!(map.get(&Value::from(1.0)), Some(&"number"));
/// ```
#[derive(Clone)]
pub struct Map<K, V> {
    table: HashTable<K, V>,
}

impl<K: Debug, V: Debug> Debug for Map<K, V> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_map().entries(self.entries()).finish()
    }
}

impl<K, V> Map<K, V>
where
    K: Hashable + Equatable + 'static,
{
    /// Creates an empty map using the runtime kernel for keys.
    pub fn new() -> Self {
        Self::with_comparer(EqualityComparer::default())
    }
}

impl<K, V> Default for Map<K, V>
where
    K: Hashable + Equatable + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Map<K, V> {
    /// Creates an empty map with the given key comparer.
    pub fn with_comparer(comparer: EqualityComparer<K>) -> Self {
        Self {
            table: HashTable::with_comparer(comparer),
        }
    }

    /// Inserts or updates `key`. Returns `self` for chaining.
    pub fn set(&mut self, key: K, value: V) -> &mut Self {
        self.table.insert(key, value);
        self
    }

    /// The value for `key`, if present.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.table.get(key)
    }

    /// The value for `key`, mutably.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        self.table.get_mut(key)
    }

    /// Returns `true` if `key` is present.
    pub fn has(&self, key: &K) -> bool {
        self.table.contains(key)
    }

    /// Removes `key`, returning `true` if it was present.
    pub fn delete(&mut self, key: &K) -> bool {
        self.table.remove(key)
    }

    /// The number of entries.
    pub fn size(&self) -> usize {
        self.table.len()
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.table.clear();
    }

    /// Iterates `(key, value)` pairs in insertion order.
    pub fn entries(&self) -> Iter<'_, K, V> {
        self.table.iter()
    }

    /// Iterates keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.table.keys()
    }

    /// Iterates values in insertion order.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.table.values()
    }

    /// Calls `f` with each value and key in insertion order.
    pub fn for_each(&self, mut f: impl FnMut(&V, &K)) {
        for (k, v) in self.table.iter() {
            f(v, k);
        }
    }
}

impl<K, V> Extend<(K, V)> for Map<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        self.table.extend(iter);
    }
}

impl<K, V> FromIterator<(K, V)> for Map<K, V>
where
    K: Hashable + Equatable + 'static,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Map::new();
        map.extend(iter);
        map
    }
}

impl<'a, K, V> IntoIterator for &'a Map<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries()
    }
}

impl<K, V> IntoIterator for Map<K, V> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.table.into_iter()
    }
}
