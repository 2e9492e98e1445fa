//! Query terminals over any sequence.
//!
//! [`Enumerable`] is implemented for every [`IntoIterator`]. It adds the
//! operations that need the crate's kernel or containers (ordering,
//! grouping, distinct, strict element access) and leaves the rest of the
//! combinator surface to [`Iterator`].

use crate::comparer::EqualityComparer;
use crate::comparer::IntoComparer;
use crate::comparer::IntoEqualityComparer;
use crate::dictionary::Dictionary;
use crate::error::Error;
use crate::error::Result;
use crate::hash_set;
use crate::hash_set::HashSet;
use crate::lookup;
use crate::lookup::Lookup;
use crate::ordered::OrderedIterable;
use crate::runtime::Comparable;
use crate::runtime::Equatable;
use crate::runtime::Hashable;

/// Extension methods for sequences.
///
/// ```rust
/// use hashlinq::Enumerable;
///
/// let words = ["pear", "fig", "apple", "kiwi"];
/// let sorted: Vec<&str> = words.order_by(|w| w.len()).then_by(|w| *w).to_vec();
/// assert_eq!(sorted, ["fig", "kiwi", "pear", "apple"]);
///
/// let by_length = words.to_lookup(|w| w.len());
/// assert_eq!(by_length.get(&4), &["pear", "kiwi"]);
/// ```
pub trait Enumerable: IntoIterator + Sized {
    /// Orders the sequence ascending by a key. Sorting is deferred until the
    /// result is iterated.
    fn order_by<K>(self, key_selector: impl Fn(&Self::Item) -> K + 'static) -> OrderedIterable<Self::Item>
    where
        Self::Item: 'static,
        K: Comparable + 'static,
    {
        OrderedIterable::order_by(self, key_selector)
    }

    /// Orders the sequence descending by a key.
    fn order_by_descending<K>(
        self,
        key_selector: impl Fn(&Self::Item) -> K + 'static,
    ) -> OrderedIterable<Self::Item>
    where
        Self::Item: 'static,
        K: Comparable + 'static,
    {
        OrderedIterable::order_by_descending(self, key_selector)
    }

    /// Orders the sequence by a key using `comparer`.
    fn order_by_with<K: 'static>(
        self,
        key_selector: impl Fn(&Self::Item) -> K + 'static,
        comparer: impl IntoComparer<K>,
        descending: bool,
    ) -> OrderedIterable<Self::Item>
    where
        Self::Item: 'static,
    {
        OrderedIterable::order_by_with(self, key_selector, comparer, descending)
    }

    /// Groups the elements by a key into a [`Lookup`].
    fn to_lookup<K>(self, key_selector: impl Fn(&Self::Item) -> K) -> Lookup<K, Self::Item>
    where
        K: Hashable + Equatable + 'static,
    {
        self.to_lookup_with(key_selector, EqualityComparer::default())
    }

    /// Groups the elements by a key into a [`Lookup`] using `comparer` for
    /// keys.
    fn to_lookup_with<K>(
        self,
        key_selector: impl Fn(&Self::Item) -> K,
        comparer: impl IntoEqualityComparer<K>,
    ) -> Lookup<K, Self::Item> {
        let mut lookup = Lookup::with_comparer(comparer.into_equality_comparer());
        for element in self {
            lookup.add(key_selector(&element), element);
        }
        lookup
    }

    /// Groups the elements by a key, yielding groupings in the order their
    /// keys first appear.
    fn group_by<K>(self, key_selector: impl Fn(&Self::Item) -> K) -> lookup::IntoIter<K, Self::Item>
    where
        K: Hashable + Equatable + 'static,
    {
        self.to_lookup(key_selector).into_iter()
    }

    /// Builds a [`Dictionary`] from a key and a value per element.
    ///
    /// Fails with [`Error::DuplicateKey`] on the first repeated key.
    fn to_dictionary<K, V>(
        self,
        key_selector: impl Fn(&Self::Item) -> K,
        value_selector: impl Fn(Self::Item) -> V,
    ) -> Result<Dictionary<K, V>>
    where
        K: Hashable + Equatable + 'static,
    {
        let mut dictionary = Dictionary::new();
        for element in self {
            let key = key_selector(&element);
            dictionary.add(key, value_selector(element))?;
        }
        Ok(dictionary)
    }

    /// Collects the distinct elements into a [`HashSet`].
    fn to_hash_set(self) -> HashSet<Self::Item>
    where
        Self::Item: Hashable + Equatable + 'static,
    {
        self.into_iter().collect()
    }

    /// The distinct elements under kernel equality, first occurrences kept
    /// in order.
    fn distinct(self) -> hash_set::IntoIter<Self::Item>
    where
        Self::Item: Hashable + Equatable + 'static,
    {
        self.to_hash_set().into_iter()
    }

    /// The first element, or [`Error::EmptyCollection`].
    fn first_or_err(self) -> Result<Self::Item> {
        self.into_iter().next().ok_or(Error::EmptyCollection)
    }

    /// The last element, or [`Error::EmptyCollection`].
    fn last_or_err(self) -> Result<Self::Item> {
        self.into_iter().last().ok_or(Error::EmptyCollection)
    }

    /// The only element.
    ///
    /// Fails with [`Error::EmptyCollection`] for an empty sequence and
    /// [`Error::InvalidArgument`] when there is more than one element.
    fn single(self) -> Result<Self::Item> {
        let mut iter = self.into_iter();
        let element = iter.next().ok_or(Error::EmptyCollection)?;
        if iter.next().is_some() {
            return Err(Error::invalid_argument(
                "sequence contains more than one element",
            ));
        }
        Ok(element)
    }

    /// The element at `index`, or [`Error::IndexOutOfRange`].
    fn element_at(self, index: usize) -> Result<Self::Item> {
        let mut len = 0;
        for element in self {
            if len == index {
                return Ok(element);
            }
            len += 1;
        }
        Err(Error::IndexOutOfRange { index, len })
    }
}

impl<I: IntoIterator> Enumerable for I {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Record;
    use crate::value::Value;

    #[test]
    fn test_terminals() {
        assert_eq!(vec![3, 4].first_or_err(), Ok(3));
        assert_eq!(vec![3, 4].last_or_err(), Ok(4));
        assert_eq!(Vec::<i32>::new().first_or_err(), Err(Error::EmptyCollection));
        assert_eq!(Vec::<i32>::new().last_or_err(), Err(Error::EmptyCollection));
    }

    #[test]
    fn test_single() {
        assert_eq!([9].single(), Ok(9));
        assert_eq!(Vec::<u8>::new().single(), Err(Error::EmptyCollection));
        assert!(matches!(
            [1, 2].single(),
            Err(Error::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_element_at() {
        assert_eq!((10..20).element_at(3), Ok(13));
        assert_eq!(
            (10..20).element_at(10),
            Err(Error::IndexOutOfRange { index: 10, len: 10 })
        );
        assert_eq!(
            Vec::<i32>::new().element_at(0),
            Err(Error::IndexOutOfRange { index: 0, len: 0 })
        );
    }

    #[test]
    fn test_distinct_keeps_first_occurrence() {
        let values = vec![
            Value::from(1),
            Value::from("a"),
            Value::from(1.0),
            Value::from(f64::NAN),
            Value::from("a"),
            Value::from(f64::NAN),
        ];
        let distinct: Vec<Value> = values.distinct().collect();
        assert_eq!(distinct.len(), 3);
        assert_eq!(distinct[1], Value::from("a"));
    }

    #[test]
    fn test_to_dictionary() {
        let dictionary = ["one", "three", "five"]
            .to_dictionary(|w| w.len(), |w| w.to_uppercase())
            .map(|d| d.iter().map(|(k, v)| (*k, v.clone())).collect::<Vec<_>>());
        assert_eq!(
            dictionary,
            Ok(vec![(3, "ONE".to_string()), (5, "THREE".to_string()), (4, "FIVE".to_string())])
        );

        let duplicate = ["one", "two"].to_dictionary(|w| w.len(), |w| w);
        assert!(matches!(duplicate, Err(Error::DuplicateKey)));
    }

    #[test]
    fn test_group_by() {
        let groups: Vec<(bool, Vec<i32>)> = (1..=6)
            .group_by(|n| n % 3 == 0)
            .map(|g| g.into_parts())
            .collect();
        assert_eq!(groups, vec![(false, vec![1, 2, 4, 5]), (true, vec![3, 6])]);
    }

    #[test]
    fn test_to_lookup_with_comparer() {
        let lookup = ["Apple", "avocado", "Banana"].to_lookup_with(
            |w| w.chars().next().unwrap_or(' '),
            (
                |c: &char| c.to_ascii_lowercase() as u32,
                |a: &char, b: &char| a.eq_ignore_ascii_case(b),
            ),
        );
        assert_eq!(lookup.len(), 2);
        assert_eq!(lookup.get(&'a'), &["Apple", "avocado"]);
    }

    #[test]
    fn test_order_records() {
        let rows = vec![
            Value::from(Record::new().with("name", "b").with("n", 2)),
            Value::from(Record::new().with("name", "a").with("n", 2)),
            Value::from(Record::new().with("name", "c").with("n", 1)),
        ];
        let names: Vec<Value> = rows
            .order_by_descending(|r| r.field("n"))
            .then_by(|r| r.field("name"))
            .iter()
            .map(|r| r.field("name"))
            .collect();
        assert_eq!(names, vec![Value::from("a"), Value::from("b"), Value::from("c")]);
    }

    #[test]
    fn test_to_hash_set() {
        let set = [3, 1, 3, 2].to_hash_set();
        assert_eq!(set.len(), 3);
        assert!(set.set_equals([1, 2, 3]));
    }
}
