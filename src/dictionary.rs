use core::fmt::Debug;
use core::ops::Index;

use crate::comparer::EqualityComparer;
use crate::error::Error;
use crate::error::Result;
use crate::hash_table::Drain;
use crate::hash_table::Entry;
use crate::hash_table::HashTable;
use crate::hash_table::IntoIter;
use crate::hash_table::Iter;
use crate::hash_table::IterMut;
use crate::runtime;
use crate::runtime::Equatable;
use crate::runtime::Hashable;

/// A key-value dictionary with strict insertion and lookup.
///
/// `Dictionary<K, V>` stores its entries in a [`HashTable`] and decides key
/// identity with an [`EqualityComparer`], by default the runtime kernel. It
/// iterates in insertion order, with slots freed by removal reused by later
/// insertions.
///
/// [`add`](Self::add) refuses duplicate keys and [`get`](Self::get) refuses
/// missing ones, both with an [`Error`]. Use [`set`](Self::set) and
/// [`try_get`](Self::try_get) for the lenient forms.
#[derive(Clone)]
pub struct Dictionary<K, V> {
    table: HashTable<K, V>,
}

impl<K, V> Debug for Dictionary<K, V>
where
    K: Debug,
    V: Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V> Dictionary<K, V>
where
    K: Hashable + Equatable + 'static,
{
    /// Creates an empty dictionary using the runtime kernel for keys.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use hashlinq::Dictionary;
    /// #
    /// let dictionary: Dictionary<i32, String> = Dictionary::new();
    /// assert!(dictionary.is_empty());
    /// ```
    pub fn new() -> Self {
        Self::with_comparer(EqualityComparer::default())
    }

    /// Creates an empty dictionary with room for `capacity` entries.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` exceeds [`MAX_CAPACITY`](crate::hash_table::MAX_CAPACITY).
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_comparer(capacity, EqualityComparer::default())
    }
}

impl<K, V> Default for Dictionary<K, V>
where
    K: Hashable + Equatable + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Dictionary<K, V> {
    /// Creates an empty dictionary with the given key comparer.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use hashlinq::Dictionary;
    /// # use hashlinq::EqualityComparer;
    /// #
    /// let mut dictionary = Dictionary::with_comparer(EqualityComparer::new(
    ///     |k: &i32| (k % 10) as u32,
    ///     |a: &i32, b: &i32| a % 10 == b % 10,
    /// ));
    /// dictionary.add(3, "three").unwrap();
    /// assert!(dictionary.add(13, "thirteen").is_err());
    /// ```
    pub fn with_comparer(comparer: EqualityComparer<K>) -> Self {
        Self {
            table: HashTable::with_comparer(comparer),
        }
    }

    /// Creates an empty dictionary with the given capacity and key comparer.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` exceeds [`MAX_CAPACITY`](crate::hash_table::MAX_CAPACITY).
    pub fn with_capacity_and_comparer(capacity: usize, comparer: EqualityComparer<K>) -> Self {
        Self {
            table: HashTable::with_capacity_and_comparer(capacity, comparer),
        }
    }

    /// The comparer used for keys.
    pub fn comparer(&self) -> &EqualityComparer<K> {
        self.table.comparer()
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` if the dictionary contains no entries.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Returns the number of entries the dictionary holds before growing.
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    /// Removes all entries, keeping the allocated capacity.
    pub fn clear(&mut self) {
        self.table.clear();
    }

    /// Shrinks the capacity as much as possible.
    pub fn shrink_to_fit(&mut self) {
        self.table.shrink_to_fit();
    }

    /// Reserves capacity for at least `additional` more entries.
    ///
    /// # Panics
    ///
    /// Panics if the new capacity exceeds [`MAX_CAPACITY`](crate::hash_table::MAX_CAPACITY).
    pub fn reserve(&mut self, additional: usize) {
        self.table.reserve(additional);
    }

    /// Adds a new entry.
    ///
    /// Fails with [`Error::DuplicateKey`] and leaves the dictionary unchanged
    /// if the key is already present.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use hashlinq::Dictionary;
    /// # use hashlinq::Error;
    /// #
    /// let mut dictionary = Dictionary::new();
    /// assert!(dictionary.add("a", 1).is_ok());
    /// assert_eq!(dictionary.add("a", 2), Err(Error::DuplicateKey));
    /// assert_eq!(dictionary.get(&"a"), Ok(&1));
    /// ```
    pub fn add(&mut self, key: K, value: V) -> Result<()> {
        if self.table.add(key, value, false) {
            Ok(())
        } else {
            Err(Error::DuplicateKey)
        }
    }

    /// Inserts or updates an entry, returning the previous value.
    ///
    /// An update keeps the entry's position in iteration order.
    pub fn set(&mut self, key: K, value: V) -> Option<V> {
        self.table.insert(key, value)
    }

    /// Returns the value for `key`, or [`Error::KeyNotFound`].
    pub fn get(&self, key: &K) -> Result<&V> {
        self.table.get(key).ok_or(Error::KeyNotFound)
    }

    /// Returns the value for `key`, if present.
    pub fn try_get(&self, key: &K) -> Option<&V> {
        self.table.get(key)
    }

    /// Returns the stored key and value for `key`, if present.
    pub fn get_key_value(&self, key: &K) -> Option<(&K, &V)> {
        self.table.get_key_value(key)
    }

    /// Returns a mutable reference to the value for `key`, if present.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        self.table.get_mut(key)
    }

    /// Returns `true` if the dictionary contains `key`.
    pub fn contains_key(&self, key: &K) -> bool {
        self.table.contains(key)
    }

    /// Returns `true` if any value equals `value` under the runtime kernel.
    ///
    /// This is a linear scan.
    pub fn contains_value(&self, value: &V) -> bool
    where
        V: Equatable,
    {
        self.table.values().any(|v| runtime::equals(v, value))
    }

    /// Removes `key`, returning its value if it was present.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.table.take(key).map(|(_, v)| v)
    }

    /// Removes `key`, returning the stored key and value if it was present.
    pub fn remove_entry(&mut self, key: &K) -> Option<(K, V)> {
        self.table.take(key)
    }

    /// Gets the entry for `key` for in-place insertion or update.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use hashlinq::Dictionary;
    /// #
    /// let mut letters = Dictionary::new();
    /// for ch in "hello".chars() {
    ///     *letters.entry(ch).or_insert(0) += 1;
    /// }
    /// assert_eq!(letters.get(&'l'), Ok(&2));
    /// ```
    pub fn entry(&mut self, key: K) -> Entry<'_, K, V> {
        self.table.entry(key)
    }

    /// Keeps only the entries for which `keep` returns `true`.
    pub fn retain(&mut self, keep: impl FnMut(&K, &mut V) -> bool) {
        self.table.retain(keep);
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        self.table.iter()
    }

    /// Iterates entries in insertion order with mutable values.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        self.table.iter_mut()
    }

    /// Iterates keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.table.keys()
    }

    /// Iterates values in insertion order.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.table.values()
    }

    /// Iterates values in insertion order, mutably.
    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut V> {
        self.table.iter_mut().map(|(_, v)| v)
    }

    /// Removes and yields every entry in insertion order.
    pub fn drain(&mut self) -> Drain<'_, K, V> {
        self.table.drain()
    }
}

impl<K, V> Index<&K> for Dictionary<K, V> {
    type Output = V;

    /// # Panics
    ///
    /// Panics if `key` is not present.
    fn index(&self, key: &K) -> &V {
        match self.table.get(key) {
            Some(value) => value,
            None => panic!("{}", Error::KeyNotFound),
        }
    }
}

impl<K, V> Extend<(K, V)> for Dictionary<K, V> {
    /// Inserts or updates every pair; later duplicates win.
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        self.table.extend(iter);
    }
}

impl<K, V> FromIterator<(K, V)> for Dictionary<K, V>
where
    K: Hashable + Equatable + 'static,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut dictionary = Dictionary::new();
        dictionary.extend(iter);
        dictionary
    }
}

impl<'a, K, V> IntoIterator for &'a Dictionary<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, V> IntoIterator for Dictionary<K, V> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.table.into_iter()
    }
}

impl<K, V> PartialEq for Dictionary<K, V>
where
    V: Equatable,
{
    /// Same keys under this dictionary's comparer, with kernel-equal values.
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self.iter().all(|(k, v)| {
                other
                    .try_get(k)
                    .is_some_and(|other_value| runtime::equals(v, other_value))
            })
    }
}
