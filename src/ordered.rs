//! Deferred, stable multi-key ordering.
//!
//! An [`OrderedIterable`] holds its source elements and a chain of sort
//! criteria. Nothing is sorted until the sequence is iterated, and every
//! iteration sorts afresh, so one ordering can be iterated any number of
//! times and extended with [`then_by`](OrderedIterable::then_by) without
//! disturbing the original.
//!
//! Sorting computes each criterion's keys once per element, then sorts a
//! permutation of element indices. Ties on every key fall back to the
//! original index, so the sort is stable.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::cmp::Ordering;
use core::fmt;
use std::rc::Rc;

use crate::comparer::Comparer;
use crate::comparer::IntoComparer;
use crate::runtime::Comparable;

/// One link of the criteria chain.
trait Criterion<T> {
    /// Runs the key selector over `source`.
    fn keys(&self, source: &[T]) -> Box<dyn KeyColumn>;
}

/// Cached keys for every source element.
trait KeyColumn {
    fn compare(&self, i: usize, j: usize) -> Ordering;
}

struct KeyCriterion<T, K> {
    selector: Box<dyn Fn(&T) -> K>,
    comparer: Comparer<K>,
    descending: bool,
}

impl<T, K: 'static> Criterion<T> for KeyCriterion<T, K> {
    fn keys(&self, source: &[T]) -> Box<dyn KeyColumn> {
        Box::new(Column {
            keys: source.iter().map(|element| (self.selector)(element)).collect(),
            comparer: self.comparer.clone(),
            descending: self.descending,
        })
    }
}

struct Column<K> {
    keys: Vec<K>,
    comparer: Comparer<K>,
    descending: bool,
}

impl<K> KeyColumn for Column<K> {
    #[inline]
    fn compare(&self, i: usize, j: usize) -> Ordering {
        let ordering = self.comparer.compare(&self.keys[i], &self.keys[j]);
        if self.descending {
            ordering.reverse()
        } else {
            ordering
        }
    }
}

struct Sorter {
    columns: Vec<Box<dyn KeyColumn>>,
}

impl Sorter {
    fn compare_keys(&self, i: usize, j: usize) -> Ordering {
        if i == j {
            return Ordering::Equal;
        }
        for column in &self.columns {
            let ordering = column.compare(i, j);
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        i.cmp(&j)
    }

    fn sort(&self, len: usize) -> Vec<usize> {
        let mut map: Vec<usize> = (0..len).collect();
        if len > 1 {
            self.quick_sort(&mut map, 0, len as isize - 1);
        }
        map
    }

    /// Hoare-partition quicksort over `map[left..=right]` with a midpoint
    /// pivot. Recurses into the smaller side and loops on the larger.
    ///
    /// The pivot compares equal to itself and both scans stay inside
    /// `left..=right`, so every pass shrinks the range even when a comparer
    /// is not a total order.
    fn quick_sort(&self, map: &mut [usize], mut left: isize, mut right: isize) {
        loop {
            let mut i = left;
            let mut j = right;
            let pivot = map[(i + ((j - i) >> 1)) as usize];
            loop {
                while i <= right && self.compare_keys(pivot, map[i as usize]) == Ordering::Greater {
                    i += 1;
                }
                while j >= left && self.compare_keys(pivot, map[j as usize]) == Ordering::Less {
                    j -= 1;
                }
                if i > j {
                    break;
                }
                if i < j {
                    map.swap(i as usize, j as usize);
                }
                i += 1;
                j -= 1;
                if i > j {
                    break;
                }
            }

            if j - left <= right - i {
                if left < j {
                    self.quick_sort(map, left, j);
                }
                left = i;
            } else {
                if i < right {
                    self.quick_sort(map, i, right);
                }
                right = j;
            }
            if left >= right {
                break;
            }
        }
    }
}

/// A sequence sorted lazily by a chain of keys.
///
/// Build one with [`Enumerable::order_by`](crate::Enumerable::order_by) or
/// the constructors here, extend it with the `then_by*` methods, and iterate
/// it with [`iter`](Self::iter), [`to_vec`](Self::to_vec) or `into_iter`.
///
/// ```rust
/// use hashlinq::OrderedIterable;
///
/// let people = vec![("ann", 31), ("bob", 25), ("cat", 31)];
/// let by_age = OrderedIterable::order_by_descending(people, |p| p.1);
/// let names: Vec<&str> = by_age.then_by(|p| p.0).iter().map(|p| p.0).collect();
/// assert_eq!(names, ["ann", "cat", "bob"]);
///
/// // The base ordering is unaffected by the extension.
/// assert_eq!(by_age.iter().count(), 3);
/// ```
pub struct OrderedIterable<T> {
    source: Rc<[T]>,
    criteria: Vec<Rc<dyn Criterion<T>>>,
}

impl<T> Clone for OrderedIterable<T> {
    fn clone(&self) -> Self {
        Self {
            source: Rc::clone(&self.source),
            criteria: self.criteria.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for OrderedIterable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrderedIterable")
            .field("source", &self.source)
            .field("criteria", &self.criteria.len())
            .finish()
    }
}

impl<T: 'static> OrderedIterable<T> {
    /// Orders `source` ascending by the kernel order of a key.
    pub fn order_by<K>(
        source: impl IntoIterator<Item = T>,
        key_selector: impl Fn(&T) -> K + 'static,
    ) -> Self
    where
        K: Comparable + 'static,
    {
        Self::order_by_with(source, key_selector, Comparer::default(), false)
    }

    /// Orders `source` descending by the kernel order of a key.
    pub fn order_by_descending<K>(
        source: impl IntoIterator<Item = T>,
        key_selector: impl Fn(&T) -> K + 'static,
    ) -> Self
    where
        K: Comparable + 'static,
    {
        Self::order_by_with(source, key_selector, Comparer::default(), true)
    }

    /// Orders `source` by a key using `comparer`.
    pub fn order_by_with<K: 'static>(
        source: impl IntoIterator<Item = T>,
        key_selector: impl Fn(&T) -> K + 'static,
        comparer: impl IntoComparer<K>,
        descending: bool,
    ) -> Self {
        Self {
            source: source.into_iter().collect(),
            criteria: alloc::vec![criterion(key_selector, comparer, descending)],
        }
    }

    /// A new ordering that breaks ties of this one by a key, ascending.
    pub fn then_by<K>(&self, key_selector: impl Fn(&T) -> K + 'static) -> Self
    where
        K: Comparable + 'static,
    {
        self.then_by_with(key_selector, Comparer::default(), false)
    }

    /// A new ordering that breaks ties of this one by a key, descending.
    pub fn then_by_descending<K>(&self, key_selector: impl Fn(&T) -> K + 'static) -> Self
    where
        K: Comparable + 'static,
    {
        self.then_by_with(key_selector, Comparer::default(), true)
    }

    /// A new ordering that breaks ties of this one by a key using `comparer`.
    pub fn then_by_with<K: 'static>(
        &self,
        key_selector: impl Fn(&T) -> K + 'static,
        comparer: impl IntoComparer<K>,
        descending: bool,
    ) -> Self {
        let mut criteria = self.criteria.clone();
        criteria.push(criterion(key_selector, comparer, descending));
        Self {
            source: Rc::clone(&self.source),
            criteria,
        }
    }
}

fn criterion<T: 'static, K: 'static>(
    key_selector: impl Fn(&T) -> K + 'static,
    comparer: impl IntoComparer<K>,
    descending: bool,
) -> Rc<dyn Criterion<T>> {
    Rc::new(KeyCriterion {
        selector: Box::new(key_selector),
        comparer: comparer.into_comparer(),
        descending,
    })
}

impl<T> OrderedIterable<T> {
    /// The number of elements.
    pub fn len(&self) -> usize {
        self.source.len()
    }

    /// Returns `true` if the source is empty.
    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    /// The source elements in their original order.
    pub fn source(&self) -> &[T] {
        &self.source
    }

    /// Source indices in sorted order.
    pub fn sorted_indices(&self) -> Vec<usize> {
        if self.source.is_empty() {
            return Vec::new();
        }
        let sorter = Sorter {
            columns: self
                .criteria
                .iter()
                .map(|criterion| criterion.keys(&self.source))
                .collect(),
        };
        sorter.sort(self.source.len())
    }

    /// Sorts and iterates references to the elements.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            source: &self.source,
            order: self.sorted_indices().into_iter(),
        }
    }

    /// Sorts and clones the elements into a vector.
    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.iter().cloned().collect()
    }
}

impl<'a, T> IntoIterator for &'a OrderedIterable<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: Clone> IntoIterator for OrderedIterable<T> {
    type Item = T;
    type IntoIter = alloc::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.to_vec().into_iter()
    }
}

/// An iterator over the elements of an [`OrderedIterable`] in sorted order.
pub struct Iter<'a, T> {
    source: &'a [T],
    order: alloc::vec::IntoIter<usize>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        self.order.next().map(|index| &self.source[index])
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.order.size_hint()
    }
}

impl<T> DoubleEndedIterator for Iter<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.order.next_back().map(|index| &self.source[index])
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use alloc::vec;
    use core::cell::Cell;

    use rand::Rng;
    use rand::SeedableRng;
    use rand::TryRngCore;
    use rand::rngs::OsRng;
    use rand::rngs::SmallRng;

    use super::*;

    #[test]
    fn empty_input() {
        let ordered = OrderedIterable::order_by(Vec::<i32>::new(), |n| *n);
        assert!(ordered.is_empty());
        assert_eq!(ordered.iter().count(), 0);
        assert!(ordered.then_by(|n| -*n).to_vec().is_empty());
    }

    #[test]
    fn single_and_pair() {
        assert_eq!(OrderedIterable::order_by([5], |n| *n).to_vec(), vec![5]);
        assert_eq!(OrderedIterable::order_by([9, 2], |n| *n).to_vec(), vec![2, 9]);
        assert_eq!(
            OrderedIterable::order_by_descending([2, 9], |n| *n).to_vec(),
            vec![9, 2]
        );
    }

    #[test]
    fn ties_keep_source_order() {
        let rows = vec![(1, 'x'), (0, 'y'), (1, 'z'), (0, 'w'), (1, 'v')];
        let sorted: String = OrderedIterable::order_by(rows.clone(), |r| r.0)
            .iter()
            .map(|r| r.1)
            .collect();
        assert_eq!(sorted, "ywxzv");

        let descending: String = OrderedIterable::order_by_descending(rows, |r| r.0)
            .iter()
            .map(|r| r.1)
            .collect();
        assert_eq!(descending, "xzvyw");
    }

    #[test]
    fn then_by_does_not_touch_base() {
        let base = OrderedIterable::order_by(vec![(1, 3), (1, 1), (0, 2)], |p| p.0);
        let refined = base.then_by(|p| p.1);
        assert_eq!(base.to_vec(), vec![(0, 2), (1, 3), (1, 1)]);
        assert_eq!(refined.to_vec(), vec![(0, 2), (1, 1), (1, 3)]);
        let other = base.then_by_descending(|p| p.1);
        assert_eq!(other.to_vec(), vec![(0, 2), (1, 3), (1, 1)]);
    }

    #[test]
    fn restartable() {
        let ordered = OrderedIterable::order_by(vec![3, 1, 2], |n| *n);
        let first: Vec<i32> = ordered.iter().copied().collect();
        let second: Vec<i32> = ordered.iter().copied().collect();
        assert_eq!(first, second);
        assert_eq!(ordered.iter().rev().copied().collect::<Vec<_>>(), vec![3, 2, 1]);
        assert_eq!(ordered.into_iter().collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn selector_runs_once_per_element_per_sort() {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let ordered = OrderedIterable::order_by((0..50).rev().collect::<Vec<i32>>(), move |n| {
            counter.set(counter.get() + 1);
            *n
        });
        assert_eq!(calls.get(), 0);
        ordered.to_vec();
        assert_eq!(calls.get(), 50);
        ordered.to_vec();
        assert_eq!(calls.get(), 100);
    }

    #[test]
    fn custom_comparer() {
        let words = vec!["ccc", "a", "bb", "dd"];
        let by_len = OrderedIterable::order_by_with(
            words,
            |w| *w,
            |a: &&str, b: &&str| a.len().cmp(&b.len()),
            false,
        );
        assert_eq!(by_len.to_vec(), vec!["a", "bb", "dd", "ccc"]);

        let reversed = by_len.then_by_with(|w| *w, Comparer::<&str>::default().reversed(), false);
        assert_eq!(reversed.to_vec(), vec!["a", "dd", "bb", "ccc"]);
    }

    #[test]
    fn matches_std_stable_sort() {
        let seed = OsRng.try_next_u64().unwrap_or(7);
        let mut rng = SmallRng::seed_from_u64(seed);
        for len in [2, 3, 10, 100, 1_000] {
            let data: Vec<(u8, u8, u32)> = (0..len)
                .map(|i| (rng.random_range(0..4), rng.random_range(0..4), i))
                .collect();

            let mut expected = data.clone();
            expected.sort_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)));

            let actual = OrderedIterable::order_by(data, |r| r.0)
                .then_by_descending(|r| r.1)
                .to_vec();
            assert_eq!(actual, expected, "seed {seed}, len {len}");
        }
    }

    fn is_permutation(indices: &[usize], len: usize) -> bool {
        let mut seen = vec![false; len];
        indices.len() == len
            && indices
                .iter()
                .all(|&index| index < len && !core::mem::replace(&mut seen[index], true))
    }

    #[test]
    fn comparer_that_is_never_equal_terminates() {
        let ordered = OrderedIterable::order_by_with(
            vec![3, 1, 2],
            |n| *n,
            |_: &i32, _: &i32| Ordering::Less,
            false,
        );
        let mut sorted = ordered.to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, vec![1, 2, 3]);

        let always_greater = OrderedIterable::order_by_with(
            (0..200).collect::<Vec<i32>>(),
            |n| *n,
            |_: &i32, _: &i32| Ordering::Greater,
            true,
        );
        assert!(is_permutation(&always_greater.sorted_indices(), 200));
    }

    #[test]
    fn partial_order_with_nan_terminates() {
        let numbers = vec![f64::NAN, 1.0, f64::NAN, 0.5, 2.0];
        let ordered = OrderedIterable::order_by_with(
            numbers,
            |n| *n,
            |a: &f64, b: &f64| a.partial_cmp(b).unwrap_or(Ordering::Less),
            false,
        );
        let sorted = ordered.to_vec();
        assert_eq!(sorted.len(), 5);
        assert_eq!(sorted.iter().filter(|n| n.is_nan()).count(), 2);
        assert!(is_permutation(&ordered.sorted_indices(), 5));
    }

    #[test]
    fn random_comparers_give_permutations() {
        let seed = OsRng.try_next_u64().unwrap_or(11);
        let mut rng = SmallRng::seed_from_u64(seed);
        for len in [2, 3, 17, 100, 600] {
            let table: Rc<[Ordering]> = (0..64)
                .map(|_| match rng.random_range(0..3) {
                    0 => Ordering::Less,
                    1 => Ordering::Equal,
                    _ => Ordering::Greater,
                })
                .collect();
            let data: Vec<u8> = (0..len).map(|_| rng.random_range(0..8)).collect();

            let ordered = OrderedIterable::order_by_with(
                data,
                |n| *n,
                move |a: &u8, b: &u8| table[usize::from(*a) * 8 + usize::from(*b)],
                rng.random(),
            )
            .then_by_descending(|n| *n);
            assert!(is_permutation(&ordered.sorted_indices(), len), "seed {seed}, len {len}");
        }
    }

    #[test]
    fn all_equal_descending_keeps_source_order() {
        let rows = vec![(3, 'a'), (1, 'b'), (2, 'c'), (1, 'd')];
        let ordered = OrderedIterable::order_by_with(
            rows.clone(),
            |r| r.0,
            |_: &i32, _: &i32| Ordering::Equal,
            true,
        );
        assert_eq!(ordered.to_vec(), rows);

        let refined = ordered.then_by_descending(|r| r.0);
        assert_eq!(refined.to_vec(), vec![(3, 'a'), (2, 'c'), (1, 'b'), (1, 'd')]);
    }

    #[test]
    fn sorted_input_and_reverse_input() {
        let ascending: Vec<i32> = (0..500).collect();
        assert_eq!(OrderedIterable::order_by(ascending.clone(), |n| *n).to_vec(), ascending);
        let descending: Vec<i32> = (0..500).rev().collect();
        assert_eq!(OrderedIterable::order_by(descending, |n| *n).to_vec(), ascending);
        let constant = vec![7; 300];
        assert_eq!(
            OrderedIterable::order_by(constant.clone(), |n| *n).sorted_indices(),
            (0..300).collect::<Vec<_>>()
        );
    }
}
