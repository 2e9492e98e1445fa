//! Reusable ordering and equality strategies.
//!
//! [`Comparer`] wraps one ordering function and [`EqualityComparer`] wraps a
//! hash function and an equality function. Both are immutable and cheap to
//! clone, so one instance can be shared by any number of containers and
//! orderings. Their `Default` instances call the [`runtime`] kernel.
//!
//! [`Comparer::of`] and [`EqualityComparer::of`] normalise the accepted
//! shapes (an existing wrapper, a closure, a strategy object or `None`) into
//! a wrapper, falling back to the default for `None`.

use core::cmp::Ordering;
use core::fmt;
use core::hash::BuildHasher;
use core::hash::Hash;
use std::rc::Rc;

use cfg_if::cfg_if;

use crate::runtime;
use crate::runtime::Comparable;
use crate::runtime::Equatable;
use crate::runtime::HASH_MASK;
use crate::runtime::Hashable;

cfg_if! {
    if #[cfg(feature = "foldhash")] {
        /// The hasher builder used by [`EqualityComparer::with_default_hasher`]
        /// and by the runtime's identity side table.
        pub type DefaultHashBuilder = foldhash::fast::RandomState;
    } else {
        /// The hasher builder used by [`EqualityComparer::with_default_hasher`]
        /// and by the runtime's identity side table.
        pub type DefaultHashBuilder = std::hash::RandomState;
    }
}

/// An object that can order two values.
pub trait CompareStrategy<T: ?Sized> {
    /// Orders `a` relative to `b`.
    fn compare(&self, a: &T, b: &T) -> Ordering;
}

/// An object that can hash and compare values for equality.
///
/// Implementations must keep the two consistent: `equals(a, b)` implies
/// `hash(a) == hash(b)`.
pub trait EqualityStrategy<T: ?Sized> {
    /// Hashes `value`. The result is masked to 31 bits by the wrapper.
    fn hash(&self, value: &T) -> u32;

    /// Returns `true` if `a` equals `b`.
    fn equals(&self, a: &T, b: &T) -> bool;
}

/// An ordering strategy.
///
/// ```rust
/// use core::cmp::Ordering;
///
/// use hashlinq::Comparer;
///
/// let natural: Comparer<i32> = Comparer::default();
/// let reversed = natural.reversed();
/// assert_eq!(natural.compare(&1, &2), Ordering::Less);
/// assert_eq!(reversed.compare(&1, &2), Ordering::Greater);
/// ```
pub struct Comparer<T: ?Sized> {
    compare: Rc<dyn Fn(&T, &T) -> Ordering>,
    is_default: bool,
}

impl<T: ?Sized> Clone for Comparer<T> {
    fn clone(&self) -> Self {
        Self {
            compare: Rc::clone(&self.compare),
            is_default: self.is_default,
        }
    }
}

impl<T: ?Sized> fmt::Debug for Comparer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Comparer")
            .field("is_default", &self.is_default)
            .finish_non_exhaustive()
    }
}

impl<T: Comparable + ?Sized + 'static> Default for Comparer<T> {
    fn default() -> Self {
        Self {
            compare: Rc::new(|a: &T, b: &T| runtime::compare(a, b)),
            is_default: true,
        }
    }
}

impl<T: ?Sized> Comparer<T> {
    /// Orders `a` relative to `b`.
    #[inline]
    pub fn compare(&self, a: &T, b: &T) -> Ordering {
        (self.compare)(a, b)
    }

    /// Returns `true` if this is the kernel-backed default comparer.
    pub fn is_default(&self) -> bool {
        self.is_default
    }
}

impl<T: ?Sized + 'static> Comparer<T> {
    /// Wraps an ordering function.
    pub fn new(compare: impl Fn(&T, &T) -> Ordering + 'static) -> Self {
        Self {
            compare: Rc::new(compare),
            is_default: false,
        }
    }

    /// Wraps the `compare` method of a strategy object.
    pub fn from_strategy(strategy: impl CompareStrategy<T> + 'static) -> Self {
        Self::new(move |a, b| strategy.compare(a, b))
    }

    /// Normalises `value` into a comparer.
    pub fn of(value: impl IntoComparer<T>) -> Self {
        value.into_comparer()
    }

    /// A comparer producing the opposite order.
    pub fn reversed(&self) -> Self {
        let inner = Rc::clone(&self.compare);
        Self::new(move |a, b| inner(b, a))
    }

    /// Orders values by a projected key.
    pub fn by_key<K: 'static>(
        selector: impl Fn(&T) -> K + 'static,
        key_comparer: Comparer<K>,
    ) -> Self {
        Self::new(move |a, b| key_comparer.compare(&selector(a), &selector(b)))
    }
}

/// Conversion into a [`Comparer`].
pub trait IntoComparer<T: ?Sized> {
    /// Performs the conversion.
    fn into_comparer(self) -> Comparer<T>;
}

impl<T: ?Sized> IntoComparer<T> for Comparer<T> {
    fn into_comparer(self) -> Comparer<T> {
        self
    }
}

impl<T: ?Sized> IntoComparer<T> for &Comparer<T> {
    fn into_comparer(self) -> Comparer<T> {
        self.clone()
    }
}

impl<T, F> IntoComparer<T> for F
where
    T: ?Sized + 'static,
    F: Fn(&T, &T) -> Ordering + 'static,
{
    fn into_comparer(self) -> Comparer<T> {
        Comparer::new(self)
    }
}

impl<T: ?Sized + 'static> IntoComparer<T> for Rc<dyn CompareStrategy<T>> {
    fn into_comparer(self) -> Comparer<T> {
        Comparer::new(move |a, b| self.compare(a, b))
    }
}

/// `None` normalises to the default comparer.
impl<T, C> IntoComparer<T> for Option<C>
where
    T: Comparable + ?Sized + 'static,
    C: IntoComparer<T>,
{
    fn into_comparer(self) -> Comparer<T> {
        match self {
            Some(value) => value.into_comparer(),
            None => Comparer::default(),
        }
    }
}

/// A hashing and equality strategy.
///
/// ```rust
/// use hashlinq::EqualityComparer;
///
/// let case_insensitive = EqualityComparer::new(
///     |s: &String| hashlinq::runtime::hash_str(&s.to_lowercase()),
///     |a: &String, b: &String| a.eq_ignore_ascii_case(b),
/// );
/// assert!(case_insensitive.equals(&"Key".to_string(), &"KEY".to_string()));
/// ```
pub struct EqualityComparer<T: ?Sized> {
    hash: Rc<dyn Fn(&T) -> u32>,
    equals: Rc<dyn Fn(&T, &T) -> bool>,
    is_default: bool,
}

impl<T: ?Sized> Clone for EqualityComparer<T> {
    fn clone(&self) -> Self {
        Self {
            hash: Rc::clone(&self.hash),
            equals: Rc::clone(&self.equals),
            is_default: self.is_default,
        }
    }
}

impl<T: ?Sized> fmt::Debug for EqualityComparer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EqualityComparer")
            .field("is_default", &self.is_default)
            .finish_non_exhaustive()
    }
}

impl<T: Hashable + Equatable + ?Sized + 'static> Default for EqualityComparer<T> {
    fn default() -> Self {
        Self {
            hash: Rc::new(|value: &T| runtime::hash(value)),
            equals: Rc::new(|a: &T, b: &T| runtime::equals(a, b)),
            is_default: true,
        }
    }
}

impl<T: ?Sized> EqualityComparer<T> {
    /// Hashes `value` to 31 bits.
    #[inline]
    pub fn hash(&self, value: &T) -> u32 {
        (self.hash)(value) & HASH_MASK
    }

    /// Returns `true` if `a` equals `b`.
    #[inline]
    pub fn equals(&self, a: &T, b: &T) -> bool {
        (self.equals)(a, b)
    }

    /// Returns `true` if this is the kernel-backed default comparer.
    pub fn is_default(&self) -> bool {
        self.is_default
    }
}

impl<T: ?Sized + 'static> EqualityComparer<T> {
    /// Wraps a hash function and an equality function.
    pub fn new(
        hash: impl Fn(&T) -> u32 + 'static,
        equals: impl Fn(&T, &T) -> bool + 'static,
    ) -> Self {
        Self {
            hash: Rc::new(hash),
            equals: Rc::new(equals),
            is_default: false,
        }
    }

    /// Wraps the methods of a strategy object.
    pub fn from_strategy(strategy: impl EqualityStrategy<T> + 'static) -> Self {
        let strategy = Rc::new(strategy);
        let for_equals = Rc::clone(&strategy);
        Self::new(
            move |value| strategy.hash(value),
            move |a, b| for_equals.equals(a, b),
        )
    }

    /// Normalises `value` into an equality comparer.
    pub fn of(value: impl IntoEqualityComparer<T>) -> Self {
        value.into_equality_comparer()
    }

    /// Uses a [`BuildHasher`] and `Eq` instead of the kernel.
    pub fn from_build_hasher<S>(hash_builder: S) -> Self
    where
        T: Hash + Eq,
        S: BuildHasher + 'static,
    {
        Self::new(
            move |value| {
                let h = hash_builder.hash_one(value);
                (h ^ (h >> 32)) as u32
            },
            |a, b| a == b,
        )
    }

    /// [`from_build_hasher`](Self::from_build_hasher) with the
    /// [`DefaultHashBuilder`].
    pub fn with_default_hasher() -> Self
    where
        T: Hash + Eq,
    {
        Self::from_build_hasher(DefaultHashBuilder::default())
    }
}

/// Conversion into an [`EqualityComparer`].
pub trait IntoEqualityComparer<T: ?Sized> {
    /// Performs the conversion.
    fn into_equality_comparer(self) -> EqualityComparer<T>;
}

impl<T: ?Sized> IntoEqualityComparer<T> for EqualityComparer<T> {
    fn into_equality_comparer(self) -> EqualityComparer<T> {
        self
    }
}

impl<T: ?Sized> IntoEqualityComparer<T> for &EqualityComparer<T> {
    fn into_equality_comparer(self) -> EqualityComparer<T> {
        self.clone()
    }
}

/// A `(hash, equals)` pair of functions.
impl<T, H, E> IntoEqualityComparer<T> for (H, E)
where
    T: ?Sized + 'static,
    H: Fn(&T) -> u32 + 'static,
    E: Fn(&T, &T) -> bool + 'static,
{
    fn into_equality_comparer(self) -> EqualityComparer<T> {
        EqualityComparer::new(self.0, self.1)
    }
}

impl<T: ?Sized + 'static> IntoEqualityComparer<T> for Rc<dyn EqualityStrategy<T>> {
    fn into_equality_comparer(self) -> EqualityComparer<T> {
        let for_equals = Rc::clone(&self);
        EqualityComparer::new(
            move |value| self.hash(value),
            move |a, b| for_equals.equals(a, b),
        )
    }
}

/// `None` normalises to the default equality comparer.
impl<T, C> IntoEqualityComparer<T> for Option<C>
where
    T: Hashable + Equatable + ?Sized + 'static,
    C: IntoEqualityComparer<T>,
{
    fn into_equality_comparer(self) -> EqualityComparer<T> {
        match self {
            Some(value) => value.into_equality_comparer(),
            None => EqualityComparer::default(),
        }
    }
}
