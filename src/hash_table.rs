use alloc::vec::Vec;
use core::fmt::Debug;

use log::trace;

use crate::comparer::EqualityComparer;
use crate::error::Error;
use crate::error::Result;
use crate::runtime::Equatable;
use crate::runtime::Hashable;

/// Marks the end of a bucket chain or of the free list.
pub(crate) const NONE: usize = usize::MAX;

/// Hash value marking a freed entry.
///
/// Live hashes are masked to 31 bits, so this value never collides with one.
const EMPTY_HASH: u32 = u32::MAX;

/// Bucket counts, the first prime above each power of four.
const PRIMES: [usize; 14] = [
    17, 67, 257, 1031, 4099, 16411, 65537, 262147, 1048583, 4194319, 16777259, 67108879,
    268435459, 1073741827,
];

/// The largest number of buckets (and therefore entries) a table can hold.
pub const MAX_CAPACITY: usize = 0x7FEF_FFFD;

fn is_prime(candidate: usize) -> bool {
    if candidate < 2 {
        return false;
    }
    if candidate % 2 == 0 {
        return candidate == 2;
    }
    let mut divisor = 3;
    while divisor * divisor <= candidate {
        if candidate % divisor == 0 {
            return false;
        }
        divisor += 2;
    }
    true
}

/// Table sizing along the prime sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Capacity {
    pub(crate) buckets: usize,
}

impl From<usize> for Capacity {
    /// The smallest prime size that holds `value` entries. Zero stays zero so
    /// empty tables do not allocate.
    fn from(value: usize) -> Self {
        if value == 0 {
            return Capacity { buckets: 0 };
        }
        Capacity::above(value - 1)
    }
}

impl Capacity {
    /// The first prime size strictly greater than `count`.
    pub(crate) fn above(count: usize) -> Self {
        if let Some(&prime) = PRIMES.iter().find(|&&p| p > count) {
            return Capacity { buckets: prime };
        }

        let mut candidate = (count + 1) | 1;
        while candidate < MAX_CAPACITY {
            if is_prime(candidate) {
                return Capacity { buckets: candidate };
            }
            candidate += 2;
        }
        Capacity {
            buckets: MAX_CAPACITY,
        }
    }

    pub(crate) fn checked(value: usize) -> Result<Self> {
        if value > MAX_CAPACITY {
            return Err(Error::invalid_argument(alloc::format!(
                "capacity {value} exceeds the maximum of {MAX_CAPACITY}"
            )));
        }
        Ok(value.into())
    }
}

/// Debug statistics for hash table analysis.
#[cfg(any(test, feature = "stats"))]
#[derive(Debug, Clone)]
pub struct DebugStats {
    /// Number of live entries
    pub populated: usize,
    /// Number of buckets
    pub capacity: usize,
    /// Entries ever allocated, including freed ones
    pub total_slots: usize,
    /// Freed entries waiting to be reused
    pub free_slots: usize,
    /// Buckets with at least one entry
    pub used_buckets: usize,
    /// Length of the longest bucket chain
    pub longest_chain: usize,
    /// Load factor (populated / capacity)
    pub load_factor: f64,
    /// Average chain length over non-empty buckets
    pub average_chain: f64,
}

#[cfg(any(test, feature = "stats"))]
impl DebugStats {
    /// Pretty-print the debug statistics.
    pub fn print(&self) {
        println!("=== Hash Table Debug Statistics ===");
        println!(
            "Population: {}/{} ({:.2}% load factor)",
            self.populated,
            self.capacity,
            self.load_factor * 100.0
        );
        println!(
            "Slots: {} allocated, {} free",
            self.total_slots, self.free_slots
        );
        println!(
            "Chains: {} buckets used, longest {}, average {:.2}",
            self.used_buckets, self.longest_chain, self.average_chain
        );
    }
}

#[derive(Clone)]
struct HashEntry<K, V> {
    hash: u32,
    next: usize,
    slot: Option<(K, V)>,
}

/// A chained hash table keyed through an [`EqualityComparer`].
///
/// Entries live in a dense array in insertion order. Each bucket holds the
/// index of the first entry of its collision chain. Removing an entry marks
/// it free and threads it onto a free list, and the next insertion reuses
/// it, so indices stay stable and iteration order is the dense order with
/// freed slots skipped.
///
/// The bucket count is always a prime from a fixed ascending sequence. The
/// table grows only when an insertion finds no free slot and the dense array
/// is full.
///
/// ## Example
///
/// ```rust
/// use hashlinq::HashTable;
///
/// let mut table = HashTable::new();
/// assert!(table.add("alice", 1, false));
/// assert!(!table.add("alice", 2, false));
/// assert!(table.add("alice", 3, true));
/// assert_eq!(table.get(&"alice"), Some(&3));
/// ```
#[derive(Clone)]
pub struct HashTable<K, V> {
    buckets: Vec<usize>,
    entries: Vec<HashEntry<K, V>>,
    free_head: usize,
    free_count: usize,
    comparer: EqualityComparer<K>,
}

impl<K: Debug, V: Debug> Debug for HashTable<K, V> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        if self.buckets.is_empty() {
            return f
                .debug_struct("HashTable")
                .field("entries", &"empty")
                .field("capacity", &0)
                .finish();
        }

        f.debug_struct("HashTable")
            .field(
                "entries",
                &self
                    .entries
                    .iter()
                    .map(|entry| match &entry.slot {
                        Some((k, v)) => alloc::format!("{:08x} {:?} => {:?}", entry.hash, k, v),
                        None => "..".into(),
                    })
                    .collect::<Vec<_>>(),
            )
            .field("populated", &self.len())
            .field("free", &self.free_count)
            .field("capacity", &self.buckets.len())
            .finish()
    }
}

impl<K, V> HashTable<K, V>
where
    K: Hashable + Equatable + 'static,
{
    /// Creates an empty table using the runtime kernel for keys.
    ///
    /// No memory is allocated until the first insertion.
    pub fn new() -> Self {
        Self::with_comparer(EqualityComparer::default())
    }

    /// Creates a table that holds at least `capacity` entries before
    /// resizing.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` exceeds [`MAX_CAPACITY`].
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use hashlinq::HashTable;
    /// #
    /// let table: HashTable<u32, String> = HashTable::with_capacity(100);
    /// assert!(table.capacity() >= 100);
    /// ```
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_comparer(capacity, EqualityComparer::default())
    }
}

impl<K, V> Default for HashTable<K, V>
where
    K: Hashable + Equatable + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> HashTable<K, V> {
    /// Creates an empty table with the given key comparer.
    pub fn with_comparer(comparer: EqualityComparer<K>) -> Self {
        Self {
            buckets: Vec::new(),
            entries: Vec::new(),
            free_head: NONE,
            free_count: 0,
            comparer,
        }
    }

    /// Creates a table with the given capacity and key comparer.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` exceeds [`MAX_CAPACITY`].
    pub fn with_capacity_and_comparer(capacity: usize, comparer: EqualityComparer<K>) -> Self {
        match Self::try_with_capacity_and_comparer(capacity, comparer) {
            Ok(table) => table,
            Err(error) => panic!("{error}"),
        }
    }

    /// Creates a table with the given capacity and key comparer, failing with
    /// [`Error::InvalidArgument`] if `capacity` exceeds [`MAX_CAPACITY`].
    pub fn try_with_capacity_and_comparer(
        capacity: usize,
        comparer: EqualityComparer<K>,
    ) -> Result<Self> {
        let capacity = Capacity::checked(capacity)?;
        let mut table = Self::with_comparer(comparer);
        if capacity.buckets > 0 {
            table.buckets = alloc::vec![NONE; capacity.buckets];
            table.entries = Vec::with_capacity(capacity.buckets);
        }
        Ok(table)
    }

    /// The comparer used for keys.
    pub fn comparer(&self) -> &EqualityComparer<K> {
        &self.comparer
    }

    /// Returns the number of live entries.
    ///
    /// This is the number of entries ever allocated minus the number
    /// currently freed.
    pub fn len(&self) -> usize {
        self.entries.len() - self.free_count
    }

    /// Returns `true` if the table contains no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of buckets, which is also the number of entries the
    /// table holds before it must grow.
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    /// Entries ever allocated in the dense array, including freed ones.
    pub fn slot_count(&self) -> usize {
        self.entries.len()
    }

    /// Freed entries waiting on the free list.
    pub fn free_slot_count(&self) -> usize {
        self.free_count
    }

    #[inline]
    fn bucket_of(&self, hash: u32) -> usize {
        hash as usize % self.buckets.len()
    }

    fn find_index(&self, hash: u32, key: &K) -> Option<usize> {
        if self.buckets.is_empty() {
            return None;
        }

        let mut index = self.buckets[self.bucket_of(hash)];
        while index != NONE {
            let entry = &self.entries[index];
            if entry.hash == hash {
                if let Some((k, _)) = &entry.slot {
                    if self.comparer.equals(k, key) {
                        return Some(index);
                    }
                }
            }
            index = entry.next;
        }
        None
    }

    /// Stores a new entry, reusing a freed slot if one exists.
    fn insert_new(&mut self, hash: u32, key: K, value: V) -> usize {
        let index = if self.free_count > 0 {
            let index = self.free_head;
            self.free_head = self.entries[index].next;
            self.free_count -= 1;
            index
        } else {
            if self.entries.len() == self.buckets.len() {
                self.resize();
            }
            self.entries.push(HashEntry {
                hash: EMPTY_HASH,
                next: NONE,
                slot: None,
            });
            self.entries.len() - 1
        };

        let bucket = self.bucket_of(hash);
        let entry = &mut self.entries[index];
        entry.hash = hash;
        entry.next = self.buckets[bucket];
        entry.slot = Some((key, value));
        self.buckets[bucket] = index;
        index
    }

    fn resize(&mut self) {
        let capacity = Capacity::above(self.entries.len());
        self.rehash(capacity);
    }

    /// Rebuilds every bucket chain for `capacity` buckets. The dense order of
    /// entries is unchanged.
    fn rehash(&mut self, capacity: Capacity) {
        debug_assert!(capacity.buckets >= self.entries.len());
        trace!(
            "rehashing table from {} to {} buckets ({} entries)",
            self.buckets.len(),
            capacity.buckets,
            self.len()
        );

        self.buckets.clear();
        self.buckets.resize(capacity.buckets, NONE);
        self.entries
            .reserve_exact(capacity.buckets.saturating_sub(self.entries.len()));

        for (index, entry) in self.entries.iter_mut().enumerate() {
            if entry.hash == EMPTY_HASH {
                continue;
            }
            let bucket = entry.hash as usize % capacity.buckets;
            entry.next = self.buckets[bucket];
            self.buckets[bucket] = index;
        }
    }

    /// Unlinks the entry at `index` from its chain and frees it.
    fn unlink(&mut self, bucket: usize, previous: usize, index: usize) -> Option<(K, V)> {
        let next = self.entries[index].next;
        if previous == NONE {
            self.buckets[bucket] = next;
        } else {
            self.entries[previous].next = next;
        }

        let entry = &mut self.entries[index];
        entry.hash = EMPTY_HASH;
        entry.next = self.free_head;
        self.free_head = index;
        self.free_count += 1;
        entry.slot.take()
    }

    fn remove_at(&mut self, index: usize) -> (K, V) {
        let bucket = self.bucket_of(self.entries[index].hash);
        let mut previous = NONE;
        let mut current = self.buckets[bucket];
        while current != index {
            previous = current;
            current = self.entries[current].next;
        }
        match self.unlink(bucket, previous, index) {
            Some(pair) => pair,
            None => unreachable!("live entry without a payload"),
        }
    }

    fn pair_at_mut(&mut self, index: usize) -> (&K, &mut V) {
        match &mut self.entries[index].slot {
            Some((k, v)) => (k, v),
            None => unreachable!("live entry without a payload"),
        }
    }

    /// Adds `key` with `value`.
    ///
    /// If the key is already present and `overwrite` is `false`, nothing
    /// changes and `false` is returned. With `overwrite` the value is
    /// replaced in place. Otherwise a new entry is stored.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use hashlinq::HashTable;
    /// #
    /// let mut table = HashTable::new();
    /// assert!(table.add(1, "one", false));
    /// assert!(!table.add(1, "uno", false));
    /// assert_eq!(table.get(&1), Some(&"one"));
    /// assert!(table.add(1, "uno", true));
    /// assert_eq!(table.get(&1), Some(&"uno"));
    /// ```
    pub fn add(&mut self, key: K, value: V, overwrite: bool) -> bool {
        match self.entry(key) {
            Entry::Occupied(mut entry) => {
                if overwrite {
                    entry.insert(value);
                }
                overwrite
            }
            Entry::Vacant(entry) => {
                entry.insert(value);
                true
            }
        }
    }

    /// Inserts or updates `key`, returning the previous value if the key was
    /// present. The stored key is kept on update.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        match self.entry(key) {
            Entry::Occupied(mut entry) => Some(entry.insert(value)),
            Entry::Vacant(entry) => {
                entry.insert(value);
                None
            }
        }
    }

    /// Returns a reference to the value stored for `key`.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.get_key_value(key).map(|(_, v)| v)
    }

    /// Returns the stored key and value for `key`.
    pub fn get_key_value(&self, key: &K) -> Option<(&K, &V)> {
        let hash = self.comparer.hash(key);
        let index = self.find_index(hash, key)?;
        self.entries[index].slot.as_ref().map(|(k, v)| (k, v))
    }

    /// Returns a mutable reference to the value stored for `key`.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let hash = self.comparer.hash(key);
        let index = self.find_index(hash, key)?;
        self.entries[index].slot.as_mut().map(|(_, v)| v)
    }

    /// Returns `true` if `key` is present.
    pub fn contains(&self, key: &K) -> bool {
        self.find_index(self.comparer.hash(key), key).is_some()
    }

    /// Returns the value for `key`, inserting the result of `default` first if
    /// the key is absent.
    pub fn get_or_insert_with(&mut self, key: K, default: impl FnOnce() -> V) -> &mut V {
        self.entry(key).or_insert_with(default)
    }

    /// Removes `key`, returning `true` if it was present.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use hashlinq::HashTable;
    /// #
    /// let mut table = HashTable::new();
    /// table.add("k", 1, false);
    /// assert!(table.remove(&"k"));
    /// assert!(!table.remove(&"k"));
    /// ```
    pub fn remove(&mut self, key: &K) -> bool {
        self.take(key).is_some()
    }

    /// Removes `key` and returns the stored key and value.
    pub fn take(&mut self, key: &K) -> Option<(K, V)> {
        if self.buckets.is_empty() {
            return None;
        }

        let hash = self.comparer.hash(key);
        let bucket = self.bucket_of(hash);
        let mut previous = NONE;
        let mut index = self.buckets[bucket];
        while index != NONE {
            let entry = &self.entries[index];
            let matches = entry.hash == hash
                && entry
                    .slot
                    .as_ref()
                    .is_some_and(|(k, _)| self.comparer.equals(k, key));
            if matches {
                return self.unlink(bucket, previous, index);
            }
            previous = index;
            index = entry.next;
        }
        None
    }

    /// Gets the entry for `key` for in-place insertion or update.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use hashlinq::HashTable;
    /// #
    /// let mut counts: HashTable<&str, u32> = HashTable::new();
    /// for word in ["a", "b", "a"] {
    ///     *counts.entry(word).or_insert(0) += 1;
    /// }
    /// assert_eq!(counts.get(&"a"), Some(&2));
    /// ```
    pub fn entry(&mut self, key: K) -> Entry<'_, K, V> {
        let hash = self.comparer.hash(&key);
        match self.find_index(hash, &key) {
            Some(index) => Entry::Occupied(OccupiedEntry { table: self, index }),
            None => Entry::Vacant(VacantEntry {
                table: self,
                hash,
                key,
            }),
        }
    }

    /// Removes all entries, keeping the bucket array.
    pub fn clear(&mut self) {
        self.buckets.fill(NONE);
        self.entries.clear();
        self.free_head = NONE;
        self.free_count = 0;
    }

    /// Ensures `additional` more entries fit without growing.
    ///
    /// # Panics
    ///
    /// Panics if the required capacity exceeds [`MAX_CAPACITY`].
    pub fn reserve(&mut self, additional: usize) {
        if let Err(error) = self.try_reserve(additional) {
            panic!("{error}");
        }
    }

    /// Fallible [`reserve`](Self::reserve).
    pub fn try_reserve(&mut self, additional: usize) -> Result<()> {
        let unused = self.buckets.len() - self.entries.len() + self.free_count;
        if additional <= unused {
            return Ok(());
        }
        let required = self
            .entries
            .len()
            .saturating_add(additional - self.free_count);
        let capacity = Capacity::checked(required)?;
        self.rehash(capacity);
        Ok(())
    }

    /// Drops freed slots and shrinks the bucket array to the smallest prime
    /// that holds the live entries. Relative iteration order is preserved.
    pub fn shrink_to_fit(&mut self) {
        if self.is_empty() {
            self.buckets = Vec::new();
            self.entries = Vec::new();
            self.free_head = NONE;
            self.free_count = 0;
            return;
        }

        let capacity = Capacity::from(self.len());
        if self.free_count == 0 && capacity.buckets >= self.buckets.len() {
            return;
        }

        self.entries.retain(|entry| entry.hash != EMPTY_HASH);
        self.free_head = NONE;
        self.free_count = 0;
        self.rehash(capacity);
        self.entries.shrink_to(capacity.buckets);
        self.buckets.shrink_to_fit();
    }

    /// Keeps only the entries for which `keep` returns `true`.
    pub fn retain(&mut self, mut keep: impl FnMut(&K, &mut V) -> bool) {
        for index in 0..self.entries.len() {
            if self.entries[index].hash == EMPTY_HASH {
                continue;
            }
            let (k, v) = self.pair_at_mut(index);
            if !keep(k, v) {
                self.remove_at(index);
            }
        }
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            entries: self.entries.iter(),
            remaining: self.len(),
        }
    }

    /// Iterates entries in insertion order with mutable values.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        let remaining = self.len();
        IterMut {
            entries: self.entries.iter_mut(),
            remaining,
        }
    }

    /// Iterates keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.iter().map(|(k, _)| k)
    }

    /// Iterates values in insertion order.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.iter().map(|(_, v)| v)
    }

    /// Removes and yields every entry in insertion order.
    ///
    /// The table is empty once the iterator is created; entries not consumed
    /// are dropped with it.
    pub fn drain(&mut self) -> Drain<'_, K, V> {
        self.buckets.fill(NONE);
        self.free_head = NONE;
        self.free_count = 0;
        Drain {
            entries: self.entries.drain(..),
        }
    }

    /// Chain-length histogram: index `n` counts buckets holding `n` entries.
    #[cfg(any(test, feature = "stats"))]
    pub fn chain_histogram(&self) -> Vec<usize> {
        let mut histogram = Vec::new();
        for &head in &self.buckets {
            let mut length = 0;
            let mut index = head;
            while index != NONE {
                length += 1;
                index = self.entries[index].next;
            }
            if histogram.len() <= length {
                histogram.resize(length + 1, 0);
            }
            histogram[length] += 1;
        }
        histogram
    }

    /// Collects [`DebugStats`] for this table.
    #[cfg(any(test, feature = "stats"))]
    pub fn debug_stats(&self) -> DebugStats {
        let histogram = self.chain_histogram();
        let used_buckets: usize = histogram.iter().skip(1).sum();
        let chained: usize = histogram
            .iter()
            .enumerate()
            .map(|(length, count)| length * count)
            .sum();

        DebugStats {
            populated: self.len(),
            capacity: self.buckets.len(),
            total_slots: self.entries.len(),
            free_slots: self.free_count,
            used_buckets,
            longest_chain: histogram.len().saturating_sub(1),
            load_factor: if self.buckets.is_empty() {
                0.0
            } else {
                self.len() as f64 / self.buckets.len() as f64
            },
            average_chain: if used_buckets == 0 {
                0.0
            } else {
                chained as f64 / used_buckets as f64
            },
        }
    }

    /// Prints the chain-length histogram as a bar chart.
    #[cfg(feature = "stats")]
    pub fn print_chain_histogram(&self) {
        let histogram = self.chain_histogram();
        let max = histogram.iter().copied().max().unwrap_or(0).max(1);
        let make_bar = |count: usize| {
            let width = (count * 50).div_ceil(max);
            "#".repeat(width)
        };

        for (length, &count) in histogram.iter().enumerate() {
            println!("{:>3} | {} ({})", length, make_bar(count), count);
        }
    }
}

impl<K, V> Extend<(K, V)> for HashTable<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<K, V> FromIterator<(K, V)> for HashTable<K, V>
where
    K: Hashable + Equatable + 'static,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut table = HashTable::new();
        table.extend(iter);
        table
    }
}

impl<'a, K, V> IntoIterator for &'a HashTable<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, V> IntoIterator for HashTable<K, V> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            entries: self.entries.into_iter(),
        }
    }
}

/// A view into a single entry in the table, which may be vacant or occupied.
///
/// This enum is constructed from the [`entry`] method on [`HashTable`].
///
/// [`entry`]: HashTable::entry
pub enum Entry<'a, K, V> {
    /// The key is not present in the table
    Vacant(VacantEntry<'a, K, V>),
    /// The key is present in the table
    Occupied(OccupiedEntry<'a, K, V>),
}

impl<'a, K, V> Entry<'a, K, V> {
    /// Inserts `default` if the entry is vacant and returns the value.
    pub fn or_insert(self, default: V) -> &'a mut V {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default),
        }
    }

    /// Inserts the result of `default` if the entry is vacant and returns the
    /// value. The closure is not called for an occupied entry.
    pub fn or_insert_with(self, default: impl FnOnce() -> V) -> &'a mut V {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default()),
        }
    }

    /// Applies `f` to an occupied entry's value.
    pub fn and_modify(self, f: impl FnOnce(&mut V)) -> Self {
        match self {
            Entry::Occupied(mut entry) => {
                f(entry.get_mut());
                Entry::Occupied(entry)
            }
            Entry::Vacant(entry) => Entry::Vacant(entry),
        }
    }

    /// The entry's key.
    pub fn key(&self) -> &K {
        match self {
            Entry::Occupied(entry) => entry.key(),
            Entry::Vacant(entry) => entry.key(),
        }
    }
}

impl<'a, K, V: Default> Entry<'a, K, V> {
    /// Inserts `V::default()` if the entry is vacant and returns the value.
    pub fn or_default(self) -> &'a mut V {
        self.or_insert_with(V::default)
    }
}

/// A view into a vacant entry in a [`HashTable`].
pub struct VacantEntry<'a, K, V> {
    table: &'a mut HashTable<K, V>,
    hash: u32,
    key: K,
}

impl<'a, K, V> VacantEntry<'a, K, V> {
    /// The key that would be inserted.
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Takes ownership of the key.
    pub fn into_key(self) -> K {
        self.key
    }

    /// Inserts `value` and returns a mutable reference to it.
    pub fn insert(self, value: V) -> &'a mut V {
        let table = self.table;
        let index = table.insert_new(self.hash, self.key, value);
        table.pair_at_mut(index).1
    }
}

/// A view into an occupied entry in a [`HashTable`].
pub struct OccupiedEntry<'a, K, V> {
    table: &'a mut HashTable<K, V>,
    index: usize,
}

impl<'a, K, V> OccupiedEntry<'a, K, V> {
    fn pair(&self) -> (&K, &V) {
        match &self.table.entries[self.index].slot {
            Some((k, v)) => (k, v),
            None => unreachable!("live entry without a payload"),
        }
    }

    /// The stored key.
    pub fn key(&self) -> &K {
        self.pair().0
    }

    /// The stored value.
    pub fn get(&self) -> &V {
        self.pair().1
    }

    /// The stored value, mutably.
    pub fn get_mut(&mut self) -> &mut V {
        self.table.pair_at_mut(self.index).1
    }

    /// Converts the entry into a mutable reference with the table's lifetime.
    pub fn into_mut(self) -> &'a mut V {
        let table = self.table;
        table.pair_at_mut(self.index).1
    }

    /// Replaces the value, returning the old one.
    pub fn insert(&mut self, value: V) -> V {
        core::mem::replace(self.get_mut(), value)
    }

    /// Removes the entry, returning its value.
    pub fn remove(self) -> V {
        self.remove_entry().1
    }

    /// Removes the entry, returning its key and value.
    pub fn remove_entry(self) -> (K, V) {
        self.table.remove_at(self.index)
    }
}

/// An iterator over the entries of a [`HashTable`] in insertion order.
pub struct Iter<'a, K, V> {
    entries: core::slice::Iter<'a, HashEntry<K, V>>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        for entry in self.entries.by_ref() {
            if let Some((k, v)) = &entry.slot {
                self.remaining -= 1;
                return Some((k, v));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
            remaining: self.remaining,
        }
    }
}

/// A mutable iterator over the entries of a [`HashTable`].
pub struct IterMut<'a, K, V> {
    entries: core::slice::IterMut<'a, HashEntry<K, V>>,
    remaining: usize,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        for entry in self.entries.by_ref() {
            if let Some((k, v)) = &mut entry.slot {
                self.remaining -= 1;
                return Some((&*k, v));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

/// An owning iterator over the entries of a [`HashTable`].
pub struct IntoIter<K, V> {
    entries: alloc::vec::IntoIter<HashEntry<K, V>>,
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.entries.by_ref().find_map(|entry| entry.slot)
    }
}

/// A draining iterator over the entries of a [`HashTable`].
///
/// This struct is created by the [`drain`] method on [`HashTable`].
///
/// [`drain`]: HashTable::drain
pub struct Drain<'a, K, V> {
    entries: alloc::vec::Drain<'a, HashEntry<K, V>>,
}

impl<K, V> Iterator for Drain<'_, K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.entries.by_ref().find_map(|entry| entry.slot)
    }
}
