use core::fmt::Debug;

use crate::comparer::EqualityComparer;
use crate::hash_table::HashTable;
use crate::runtime::Equatable;
use crate::runtime::Hashable;

/// A set of distinct values stored in a [`HashTable`].
///
/// `HashSet<T>` decides membership with an [`EqualityComparer`], by default
/// the runtime kernel, and iterates in insertion order.
///
/// The in-place set operations (`union_with`, `intersect_with`,
/// `except_with`, `symmetric_except_with`) and the relational queries
/// (`is_subset_of` and friends) accept any sequence of values and judge
/// membership with this set's comparer. Duplicates in the sequence are
/// ignored.
#[derive(Clone)]
pub struct HashSet<T> {
    table: HashTable<T, ()>,
}

impl<T> PartialEq for HashSet<T> {
    /// Same length and every element of `self` is in `other`, judged by
    /// `other`'s comparer.
    fn eq(&self, other: &Self) -> bool {
        if self.len() != other.len() {
            return false;
        }
        self.iter().all(|v| other.contains(v))
    }
}

impl<T> Debug for HashSet<T>
where
    T: Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<T> HashSet<T>
where
    T: Hashable + Equatable + 'static,
{
    /// Creates an empty set using the runtime kernel.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use hashlinq::HashSet;
    /// #
    /// let set: HashSet<i32> = HashSet::new();
    /// assert!(set.is_empty());
    /// ```
    pub fn new() -> Self {
        Self::with_comparer(EqualityComparer::default())
    }

    /// Creates an empty set with room for `capacity` values.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` exceeds [`MAX_CAPACITY`](crate::hash_table::MAX_CAPACITY).
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_comparer(capacity, EqualityComparer::default())
    }
}

impl<T> Default for HashSet<T>
where
    T: Hashable + Equatable + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> HashSet<T> {
    /// Creates an empty set with the given comparer.
    pub fn with_comparer(comparer: EqualityComparer<T>) -> Self {
        Self {
            table: HashTable::with_comparer(comparer),
        }
    }

    /// Creates an empty set with the given capacity and comparer.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` exceeds [`MAX_CAPACITY`](crate::hash_table::MAX_CAPACITY).
    pub fn with_capacity_and_comparer(capacity: usize, comparer: EqualityComparer<T>) -> Self {
        Self {
            table: HashTable::with_capacity_and_comparer(capacity, comparer),
        }
    }

    /// The comparer used for membership.
    pub fn comparer(&self) -> &EqualityComparer<T> {
        self.table.comparer()
    }

    /// An empty set sharing this set's comparer.
    fn empty_like(&self) -> Self {
        Self::with_comparer(self.comparer().clone())
    }

    /// Collects `other` under this set's comparer.
    fn collect_like(&self, other: impl IntoIterator<Item = T>) -> Self {
        let mut set = self.empty_like();
        set.extend(other);
        set
    }

    /// Returns the number of values in the set.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use hashlinq::HashSet;
    /// #
    /// let mut set = HashSet::new();
    /// assert_eq!(set.len(), 0);
    /// set.add(1);
    /// assert_eq!(set.len(), 1);
    /// ```
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` if the set contains no values.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Returns the number of values the set holds before growing.
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    /// Removes all values, keeping the allocated capacity.
    pub fn clear(&mut self) {
        self.table.clear();
    }

    /// Shrinks the capacity as much as possible.
    pub fn shrink_to_fit(&mut self) {
        self.table.shrink_to_fit();
    }

    /// Reserves capacity for at least `additional` more values.
    pub fn reserve(&mut self, additional: usize) {
        self.table.reserve(additional);
    }

    /// Adds a value to the set.
    ///
    /// Returns `false` and keeps the stored value if an equal value was
    /// already present.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use hashlinq::HashSet;
    /// #
    /// let mut set = HashSet::new();
    /// assert!(set.add("a"));
    /// assert!(!set.add("a"));
    /// ```
    pub fn add(&mut self, value: T) -> bool {
        self.table.add(value, (), false)
    }

    /// Adds a value, replacing and returning an equal stored value.
    pub fn replace(&mut self, value: T) -> Option<T> {
        let previous = self.table.take(&value).map(|(v, _)| v);
        self.table.add(value, (), false);
        previous
    }

    /// Returns `true` if the set contains `value`.
    pub fn contains(&self, value: &T) -> bool {
        self.table.contains(value)
    }

    /// Returns the stored value equal to `value`.
    pub fn get(&self, value: &T) -> Option<&T> {
        self.table.get_key_value(value).map(|(v, _)| v)
    }

    /// Removes `value`, returning `true` if it was present.
    pub fn remove(&mut self, value: &T) -> bool {
        self.table.remove(value)
    }

    /// Removes and returns the stored value equal to `value`.
    pub fn take(&mut self, value: &T) -> Option<T> {
        self.table.take(value).map(|(v, _)| v)
    }

    /// Keeps only the values for which `keep` returns `true`.
    pub fn retain(&mut self, mut keep: impl FnMut(&T) -> bool) {
        self.table.retain(|v, _| keep(v));
    }

    /// Iterates values in insertion order.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            inner: self.table.iter(),
        }
    }

    /// Removes and yields every value in insertion order.
    pub fn drain(&mut self) -> Drain<'_, T> {
        Drain {
            inner: self.table.drain(),
        }
    }

    /// Adds every value of `other`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use hashlinq::HashSet;
    /// #
    /// let mut set: HashSet<i32> = [1, 2].into_iter().collect();
    /// set.union_with([2, 3]);
    /// assert_eq!(set.iter().copied().collect::<Vec<_>>(), [1, 2, 3]);
    /// ```
    pub fn union_with(&mut self, other: impl IntoIterator<Item = T>) {
        self.extend(other);
    }

    /// Keeps only values also present in `other`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use hashlinq::HashSet;
    /// #
    /// let mut set: HashSet<i32> = [1, 2, 3].into_iter().collect();
    /// set.intersect_with([3, 1, 7]);
    /// assert_eq!(set.iter().copied().collect::<Vec<_>>(), [1, 3]);
    /// ```
    pub fn intersect_with(&mut self, other: impl IntoIterator<Item = T>) {
        if self.is_empty() {
            return;
        }
        let other = self.collect_like(other);
        self.retain(|v| other.contains(v));
    }

    /// Removes every value present in `other`.
    pub fn except_with(&mut self, other: impl IntoIterator<Item = T>) {
        for value in other {
            if self.is_empty() {
                return;
            }
            self.remove(&value);
        }
    }

    /// Keeps values present in exactly one of `self` and `other`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use hashlinq::HashSet;
    /// #
    /// let mut set: HashSet<i32> = [1, 2, 3].into_iter().collect();
    /// set.symmetric_except_with([3, 4, 4]);
    /// assert_eq!(set.iter().copied().collect::<Vec<_>>(), [1, 2, 4]);
    /// ```
    pub fn symmetric_except_with(&mut self, other: impl IntoIterator<Item = T>) {
        let mut other = self.collect_like(other);
        for value in other.drain() {
            if !self.remove(&value) {
                self.add(value);
            }
        }
    }

    /// Returns `true` if every value of `self` is in `other`.
    pub fn is_subset_of(&self, other: impl IntoIterator<Item = T>) -> bool {
        if self.is_empty() {
            return true;
        }
        let other = self.collect_like(other);
        self.len() <= other.len() && self.iter().all(|v| other.contains(v))
    }

    /// Returns `true` if every value of `other` is in `self`.
    pub fn is_superset_of(&self, other: impl IntoIterator<Item = T>) -> bool {
        other.into_iter().all(|v| self.contains(&v))
    }

    /// Returns `true` if `self` and `other` share at least one value.
    pub fn overlaps(&self, other: impl IntoIterator<Item = T>) -> bool {
        if self.is_empty() {
            return false;
        }
        other.into_iter().any(|v| self.contains(&v))
    }

    /// Returns `true` if `self` and `other` hold the same distinct values.
    pub fn set_equals(&self, other: impl IntoIterator<Item = T>) -> bool {
        let other = self.collect_like(other);
        self.len() == other.len() && self.iter().all(|v| other.contains(v))
    }
}

impl<T> Extend<T> for HashSet<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.add(value);
        }
    }
}

impl<T> FromIterator<T> for HashSet<T>
where
    T: Hashable + Equatable + 'static,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = HashSet::new();
        set.extend(iter);
        set
    }
}

impl<'a, T> IntoIterator for &'a HashSet<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T> IntoIterator for HashSet<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            inner: self.table.into_iter(),
        }
    }
}

/// An iterator over the values of a [`HashSet`].
pub struct Iter<'a, T> {
    inner: crate::hash_table::Iter<'a, T, ()>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(v, _)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

/// An owning iterator over the values of a [`HashSet`].
pub struct IntoIter<T> {
    inner: crate::hash_table::IntoIter<T, ()>,
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(v, _)| v)
    }
}

/// A draining iterator over the values of a [`HashSet`].
pub struct Drain<'a, T> {
    inner: crate::hash_table::Drain<'a, T, ()>,
}

impl<T> Iterator for Drain<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(v, _)| v)
    }
}

#[cfg(test)]
mod tests {
    use core::hash::BuildHasher;

    use rand::TryRngCore;
    use rand::rngs::OsRng;
    use siphasher::sip::SipHasher;

    use super::*;
    use crate::value::Value;

    #[derive(Clone)]
    struct SipHashBuilder {
        k1: u64,
        k2: u64,
    }

    impl BuildHasher for SipHashBuilder {
        type Hasher = SipHasher;

        fn build_hasher(&self) -> Self::Hasher {
            SipHasher::new_with_keys(self.k1, self.k2)
        }
    }

    impl Default for SipHashBuilder {
        fn default() -> Self {
            let mut rng = OsRng;
            Self {
                k1: rng.try_next_u64().unwrap_or(0),
                k2: rng.try_next_u64().unwrap_or(0),
            }
        }
    }

    fn set_of(values: &[i32]) -> HashSet<i32> {
        values.iter().copied().collect()
    }

    fn contents(set: &HashSet<i32>) -> Vec<i32> {
        set.iter().copied().collect()
    }

    #[test]
    fn test_new_and_with_comparer() {
        let set: HashSet<i32> = HashSet::new();
        assert!(set.is_empty());

        let set: HashSet<String> =
            HashSet::with_comparer(EqualityComparer::from_build_hasher(SipHashBuilder::default()));
        assert!(set.is_empty());
        assert!(!set.comparer().is_default());
    }

    #[test]
    fn test_with_capacity() {
        let set: HashSet<i32> = HashSet::with_capacity(100);
        assert!(set.capacity() >= 100);
        assert!(set.is_empty());
    }

    #[test]
    fn test_add_and_contains() {
        let mut set = HashSet::new();
        assert!(set.add(1));
        assert!(set.add(2));
        assert!(!set.add(1));
        assert_eq!(set.len(), 2);
        assert!(set.contains(&1));
        assert!(!set.contains(&3));
    }

    #[test]
    fn test_remove_take_get() {
        let mut set = HashSet::new();
        set.add("hello".to_string());
        set.add("world".to_string());

        assert_eq!(set.get(&"hello".to_string()), Some(&"hello".to_string()));
        assert!(set.remove(&"hello".to_string()));
        assert!(!set.remove(&"hello".to_string()));
        assert_eq!(set.take(&"world".to_string()), Some("world".to_string()));
        assert!(set.is_empty());
    }

    #[test]
    fn test_replace() {
        let mut set = HashSet::with_comparer(EqualityComparer::new(
            |s: &String| crate::runtime::hash_str(&s.to_lowercase()),
            |a: &String, b: &String| a.eq_ignore_ascii_case(b),
        ));
        set.add("Hello".to_string());
        assert_eq!(set.replace("HELLO".to_string()), Some("Hello".to_string()));
        assert_eq!(set.get(&"hello".to_string()).map(String::as_str), Some("HELLO"));
        assert_eq!(set.replace("new".to_string()), None);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_iteration_order() {
        let mut set = set_of(&[5, 3, 9, 1]);
        set.remove(&3);
        set.add(7);
        assert_eq!(contents(&set), vec![5, 7, 9, 1]);

        let drained: Vec<i32> = set.drain().collect();
        assert_eq!(drained, vec![5, 7, 9, 1]);
        assert!(set.is_empty());
    }

    #[test]
    fn test_union_with() {
        let mut set = set_of(&[1, 2, 3]);
        set.union_with([3, 4, 5, 4]);
        assert_eq!(contents(&set), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_intersect_with() {
        let mut set = set_of(&[1, 2, 3, 4]);
        set.intersect_with([4, 2, 8]);
        assert_eq!(contents(&set), vec![2, 4]);

        set.intersect_with([]);
        assert!(set.is_empty());
    }

    #[test]
    fn test_except_with() {
        let mut set = set_of(&[1, 2, 3, 4]);
        set.except_with([2, 3, 10]);
        assert_eq!(contents(&set), vec![1, 4]);
    }

    #[test]
    fn test_symmetric_except_with() {
        let mut set = set_of(&[1, 2, 3]);
        set.symmetric_except_with([2, 3, 4, 5, 5]);
        assert_eq!(contents(&set), vec![1, 4, 5]);
    }

    #[test]
    fn test_relations() {
        let set = set_of(&[1, 2]);
        assert!(set.is_subset_of([1, 2, 3]));
        assert!(set.is_subset_of([2, 1, 1]));
        assert!(!set.is_subset_of([1, 3]));
        assert!(HashSet::<i32>::new().is_subset_of([]));

        assert!(set.is_superset_of([1, 1]));
        assert!(set.is_superset_of([]));
        assert!(!set.is_superset_of([1, 5]));

        assert!(set.overlaps([9, 2]));
        assert!(!set.overlaps([9, 8]));

        assert!(set.set_equals([2, 1, 2]));
        assert!(!set.set_equals([1]));
        assert!(!set.set_equals([1, 2, 3]));
    }

    #[test]
    fn test_retain() {
        let mut set = set_of(&(0..20).collect::<Vec<_>>());
        set.retain(|v| v % 5 == 0);
        assert_eq!(contents(&set), vec![0, 5, 10, 15]);
    }

    #[test]
    fn test_mixed_values() {
        let mut set = HashSet::new();
        assert!(set.add(Value::from(1)));
        assert!(!set.add(Value::from(1.0)));
        assert!(set.add(Value::from("1")));
        assert!(set.add(Value::from(f64::NAN)));
        assert!(!set.add(Value::from(f64::NAN)));
        assert!(set.add(Value::Null));
        assert!(!set.add(Value::Undefined));
        assert_eq!(set.len(), 4);
    }

    #[test]
    fn test_equality_and_debug() {
        assert_eq!(set_of(&[1, 2, 3]), set_of(&[3, 2, 1]));
        assert_ne!(set_of(&[1, 2]), set_of(&[1, 3]));
        assert_eq!(format!("{:?}", set_of(&[4, 2])), "{4, 2}");
    }

    #[test]
    fn test_into_iterator() {
        let set = set_of(&[3, 1]);
        assert_eq!((&set).into_iter().count(), 2);
        assert_eq!(set.into_iter().collect::<Vec<_>>(), vec![3, 1]);
    }
}
