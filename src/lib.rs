#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

extern crate alloc;

pub mod comparer;

/// A strict key-value dictionary over the chained [`HashTable`].
pub mod dictionary;

pub mod error;

/// A chained hash table with free-list slot reuse and prime-sized growth.
///
/// This is the storage shared by [`Dictionary`], [`HashSet`] and [`Map`].
pub mod hash_table;

/// A set of distinct values over the chained [`HashTable`].
pub mod hash_set;

pub mod lookup;

/// A lenient insertion-ordered map over the chained [`HashTable`].
pub mod map;

pub mod ordered;
pub mod query;
pub mod runtime;
pub mod value;

pub use comparer::Comparer;
pub use comparer::EqualityComparer;
pub use dictionary::Dictionary;
pub use error::Error;
pub use error::Result;
pub use hash_set::HashSet;
pub use hash_table::Entry;
pub use hash_table::HashTable;
pub use lookup::Grouping;
pub use lookup::Lookup;
pub use map::Map;
pub use ordered::OrderedIterable;
pub use query::Enumerable;
pub use runtime::Comparable;
pub use runtime::Equatable;
pub use runtime::Hashable;
pub use value::Date;
pub use value::Object;
pub use value::Record;
pub use value::Value;
