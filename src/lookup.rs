//! Key to grouping tables.
//!
//! A [`Lookup`] maps each distinct key to a [`Grouping`] holding every value
//! added under that key, in append order. Groupings are visited in the order
//! their keys were first seen.

use alloc::vec::Vec;
use core::fmt::Debug;

use log::trace;

use crate::comparer::EqualityComparer;
#[cfg(any(test, feature = "stats"))]
use crate::hash_table::DebugStats;
use crate::hash_table::Capacity;
use crate::hash_table::NONE;
use crate::runtime::Equatable;
use crate::runtime::Hashable;

/// A key and the elements added under it.
#[derive(Clone, Debug)]
pub struct Grouping<K, T> {
    key: K,
    elements: Vec<T>,
}

impl<K, T> Grouping<K, T> {
    /// The key shared by every element.
    pub fn key(&self) -> &K {
        &self.key
    }

    /// The elements in append order.
    pub fn as_slice(&self) -> &[T] {
        &self.elements
    }

    /// Iterates the elements in append order.
    pub fn iter(&self) -> core::slice::Iter<'_, T> {
        self.elements.iter()
    }

    /// The number of elements. Never zero.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Always `false`; a grouping exists only once an element was added.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Splits the grouping into its key and elements.
    pub fn into_parts(self) -> (K, Vec<T>) {
        (self.key, self.elements)
    }
}

impl<'a, K, T> IntoIterator for &'a Grouping<K, T> {
    type Item = &'a T;
    type IntoIter = core::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}

impl<K, T> IntoIterator for Grouping<K, T> {
    type Item = T;
    type IntoIter = alloc::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.into_iter()
    }
}

#[derive(Clone, Debug)]
struct Slot<K, T> {
    hash: u32,
    next: usize,
    grouping: Grouping<K, T>,
}

/// A multi-value table from keys to [`Grouping`]s.
///
/// Slots are never removed, so the slot array doubles as the first-seen
/// order of keys.
///
/// ```rust
/// use hashlinq::Lookup;
///
/// let mut lookup = Lookup::new();
/// for word in ["apple", "avocado", "banana"] {
///     lookup.add(word.chars().next(), word);
/// }
/// assert_eq!(lookup.len(), 2);
/// assert_eq!(lookup.get(&Some('a')), &["apple", "avocado"]);
/// assert!(lookup.get(&Some('z')).is_empty());
/// ```
#[derive(Clone)]
pub struct Lookup<K, T> {
    buckets: Vec<usize>,
    slots: Vec<Slot<K, T>>,
    comparer: EqualityComparer<K>,
}

impl<K: Debug, T: Debug> Debug for Lookup<K, T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_map()
            .entries(
                self.slots
                    .iter()
                    .map(|slot| (&slot.grouping.key, &slot.grouping.elements)),
            )
            .finish()
    }
}

impl<K, T> Lookup<K, T>
where
    K: Hashable + Equatable + 'static,
{
    /// Creates an empty lookup using the runtime kernel for keys.
    pub fn new() -> Self {
        Self::with_comparer(EqualityComparer::default())
    }
}

impl<K, T> Default for Lookup<K, T>
where
    K: Hashable + Equatable + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, T> Lookup<K, T> {
    /// Creates an empty lookup with the given key comparer.
    pub fn with_comparer(comparer: EqualityComparer<K>) -> Self {
        Self {
            buckets: Vec::new(),
            slots: Vec::new(),
            comparer,
        }
    }

    /// The number of distinct keys.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if nothing has been added.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn find(&self, hash: u32, key: &K) -> Option<usize> {
        if self.buckets.is_empty() {
            return None;
        }

        let mut index = self.buckets[hash as usize % self.buckets.len()];
        while index != NONE {
            let slot = &self.slots[index];
            if slot.hash == hash && self.comparer.equals(&slot.grouping.key, key) {
                return Some(index);
            }
            index = slot.next;
        }
        None
    }

    fn resize(&mut self) {
        let capacity = Capacity::above(self.slots.len());
        trace!(
            "resizing lookup from {} to {} buckets ({} groupings)",
            self.buckets.len(),
            capacity.buckets,
            self.slots.len()
        );

        self.buckets.clear();
        self.buckets.resize(capacity.buckets, NONE);
        for (index, slot) in self.slots.iter_mut().enumerate() {
            let bucket = slot.hash as usize % capacity.buckets;
            slot.next = self.buckets[bucket];
            self.buckets[bucket] = index;
        }
    }

    /// Appends `value` to the grouping for `key`, creating the grouping if
    /// the key is new.
    pub fn add(&mut self, key: K, value: T) {
        let hash = self.comparer.hash(&key);
        if let Some(index) = self.find(hash, &key) {
            self.slots[index].grouping.elements.push(value);
            return;
        }

        if self.slots.len() == self.buckets.len() {
            self.resize();
        }
        let bucket = hash as usize % self.buckets.len();
        self.slots.push(Slot {
            hash,
            next: self.buckets[bucket],
            grouping: Grouping {
                key,
                elements: alloc::vec![value],
            },
        });
        self.buckets[bucket] = self.slots.len() - 1;
    }

    /// The elements for `key`, or an empty slice if the key was never added.
    ///
    /// An absent key never yields a [`Grouping`], empty or otherwise, and
    /// nothing is inserted or allocated for it. The empty result is the
    /// `'static` empty slice shared by every lookup. Use
    /// [`grouping`](Self::grouping) to tell an absent key apart and to read
    /// the stored key.
    ///
    /// ```rust
    /// use hashlinq::Lookup;
    ///
    /// let mut lookup = Lookup::new();
    /// lookup.add("even", 2);
    /// lookup.add("even", 4);
    ///
    /// assert_eq!(lookup.get(&"even"), &[2, 4]);
    /// assert!(lookup.get(&"odd").is_empty());
    /// assert!(lookup.grouping(&"odd").is_none());
    /// assert_eq!(lookup.len(), 1);
    /// ```
    pub fn get(&self, key: &K) -> &[T] {
        match self.grouping(key) {
            Some(grouping) => grouping.as_slice(),
            None => &[],
        }
    }

    /// The grouping for `key`, if any element was added under it.
    pub fn grouping(&self, key: &K) -> Option<&Grouping<K, T>> {
        let index = self.find(self.comparer.hash(key), key)?;
        Some(&self.slots[index].grouping)
    }

    /// Returns `true` if `key` has a grouping.
    pub fn contains(&self, key: &K) -> bool {
        self.find(self.comparer.hash(key), key).is_some()
    }

    /// Iterates groupings in first-insertion order of their keys.
    pub fn iter(&self) -> Iter<'_, K, T> {
        Iter {
            slots: self.slots.iter(),
        }
    }

    /// Collects [`DebugStats`] for the key table.
    #[cfg(any(test, feature = "stats"))]
    pub fn debug_stats(&self) -> DebugStats {
        let mut used_buckets = 0;
        let mut longest_chain = 0;
        for &head in &self.buckets {
            let mut length = 0;
            let mut index = head;
            while index != NONE {
                length += 1;
                index = self.slots[index].next;
            }
            if length > 0 {
                used_buckets += 1;
            }
            longest_chain = longest_chain.max(length);
        }

        DebugStats {
            populated: self.slots.len(),
            capacity: self.buckets.len(),
            total_slots: self.slots.len(),
            free_slots: 0,
            used_buckets,
            longest_chain,
            load_factor: if self.buckets.is_empty() {
                0.0
            } else {
                self.slots.len() as f64 / self.buckets.len() as f64
            },
            average_chain: if used_buckets == 0 {
                0.0
            } else {
                self.slots.len() as f64 / used_buckets as f64
            },
        }
    }
}

impl<K, T> Extend<(K, T)> for Lookup<K, T> {
    fn extend<I: IntoIterator<Item = (K, T)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.add(key, value);
        }
    }
}

impl<K, T> FromIterator<(K, T)> for Lookup<K, T>
where
    K: Hashable + Equatable + 'static,
{
    fn from_iter<I: IntoIterator<Item = (K, T)>>(iter: I) -> Self {
        let mut lookup = Lookup::new();
        lookup.extend(iter);
        lookup
    }
}

impl<'a, K, T> IntoIterator for &'a Lookup<K, T> {
    type Item = &'a Grouping<K, T>;
    type IntoIter = Iter<'a, K, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, T> IntoIterator for Lookup<K, T> {
    type Item = Grouping<K, T>;
    type IntoIter = IntoIter<K, T>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            slots: self.slots.into_iter(),
        }
    }
}

/// An iterator over the groupings of a [`Lookup`].
pub struct Iter<'a, K, T> {
    slots: core::slice::Iter<'a, Slot<K, T>>,
}

impl<'a, K, T> Iterator for Iter<'a, K, T> {
    type Item = &'a Grouping<K, T>;

    fn next(&mut self) -> Option<Self::Item> {
        self.slots.next().map(|slot| &slot.grouping)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.slots.size_hint()
    }
}

impl<K, T> ExactSizeIterator for Iter<'_, K, T> {}

/// An owning iterator over the groupings of a [`Lookup`].
pub struct IntoIter<K, T> {
    slots: alloc::vec::IntoIter<Slot<K, T>>,
}

impl<K, T> Iterator for IntoIter<K, T> {
    type Item = Grouping<K, T>;

    fn next(&mut self) -> Option<Self::Item> {
        self.slots.next().map(|slot| slot.grouping)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.slots.size_hint()
    }
}

impl<K, T> ExactSizeIterator for IntoIter<K, T> {}

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use alloc::vec;

    use super::*;
    use crate::runtime;

    #[test]
    fn groups_in_first_seen_order() {
        let lookup: Lookup<i32, i32> = [1, 1, 2, 3, 3, 4, 4, 4].into_iter().map(|n| (n, n)).collect();

        assert_eq!(lookup.len(), 4);
        assert_eq!(lookup.get(&4).len(), 3);
        assert_eq!(lookup.get(&1), &[1, 1]);
        let keys: Vec<i32> = lookup.iter().map(|g| *g.key()).collect();
        assert_eq!(keys, vec![1, 2, 3, 4]);
    }

    #[test]
    fn absent_key_yields_empty_slice() {
        let mut lookup: Lookup<&str, u8> = Lookup::new();
        assert!(lookup.get(&"missing").is_empty());
        assert!(lookup.grouping(&"missing").is_none());
        lookup.add("present", 1);
        assert!(lookup.get(&"missing").is_empty());
        assert!(!lookup.contains(&"missing"));
        assert!(lookup.contains(&"present"));
        // Reading an absent key leaves the lookup unchanged.
        assert_eq!(lookup.len(), 1);
        assert_eq!(lookup.iter().count(), 1);
        assert_eq!(lookup.get(&"missing"), lookup.get(&"other"));
    }

    #[test]
    fn elements_keep_append_order() {
        let mut lookup = Lookup::new();
        for (i, word) in ["b1", "a1", "b2", "a2", "b3"].into_iter().enumerate() {
            lookup.add(word.as_bytes()[0] as char, (i, word));
        }
        let b: Vec<&str> = lookup.get(&'b').iter().map(|(_, w)| *w).collect();
        assert_eq!(b, vec!["b1", "b2", "b3"]);

        let grouping = lookup.grouping(&'a').map(|g| g.as_slice().len());
        assert_eq!(grouping, Some(2));
    }

    #[test]
    fn grows_past_prime_boundaries() {
        let mut lookup = Lookup::new();
        for i in 0..2_000u32 {
            lookup.add(i % 1_100, i);
        }
        assert_eq!(lookup.len(), 1_100);
        assert_eq!(lookup.debug_stats().capacity, 4099);
        for key in 0..1_100u32 {
            let expected = if key < 900 { 2 } else { 1 };
            assert_eq!(lookup.get(&key).len(), expected, "key {key}");
        }
        let keys: Vec<u32> = lookup.iter().map(|g| *g.key()).collect();
        assert_eq!(keys, (0..1_100).collect::<Vec<_>>());
    }

    #[test]
    fn custom_comparer() {
        let mut lookup: Lookup<String, i32> = Lookup::with_comparer(EqualityComparer::new(
            |s: &String| runtime::hash_str(&s.to_lowercase()),
            |a: &String, b: &String| a.eq_ignore_ascii_case(b),
        ));
        lookup.add("Key".into(), 1);
        lookup.add("KEY".into(), 2);
        lookup.add("other".into(), 3);
        assert_eq!(lookup.len(), 2);
        assert_eq!(lookup.get(&"key".into()), &[1, 2]);
        assert_eq!(lookup.grouping(&"kEy".into()).map(|g| g.key().as_str()), Some("Key"));
    }

    #[test]
    fn owned_iteration() {
        let lookup: Lookup<bool, i32> = (0..6).map(|n| (n % 2 == 0, n)).collect();
        let parts: Vec<(bool, Vec<i32>)> = lookup.into_iter().map(Grouping::into_parts).collect();
        assert_eq!(parts, vec![(true, vec![0, 2, 4]), (false, vec![1, 3, 5])]);
    }
}
