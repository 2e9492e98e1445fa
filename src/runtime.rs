//! The equality, hashing and ordering kernel shared by every container.
//!
//! Types opt into the kernel through three capability traits:
//! [`Hashable`], [`Equatable`] and [`Comparable`]. The kernel implements them
//! for the built-in scalar, string, tuple and sequence types, and user types
//! implement them to override the defaults. The free functions [`hash`],
//! [`equals`] and [`compare`] are the canonical entry points; they are what
//! the default [`EqualityComparer`](crate::comparer::EqualityComparer) and
//! [`Comparer`](crate::comparer::Comparer) call.
//!
//! Hashes are 31-bit non-negative integers. Types that implement both
//! [`Hashable`] and [`Equatable`] must keep them consistent: `a.equals(b)`
//! implies `a.hash_code() == b.hash_code()`.

use core::cmp::Ordering;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::rc::Weak;

use log::debug;

use crate::comparer::DefaultHashBuilder;
use crate::value::Object;

/// Mask applied to every hash produced by the kernel.
pub const HASH_MASK: u32 = 0x7FFF_FFFF;

/// Hash of every NaN payload.
pub const NAN_HASH: u32 = 0x7FF8_0000;

/// Hash of `f64::INFINITY`.
pub const POSITIVE_INFINITY_HASH: u32 = 0x7FF0_0000;

/// Hash of `f64::NEG_INFINITY`.
pub const NEGATIVE_INFINITY_HASH: u32 = 0x7FF0_0001;

const STRING_SEED: u32 = 7;
const DATE_SALT: u32 = 0x2545_F491;

/// A type with a canonical 31-bit hash.
pub trait Hashable {
    /// Returns the hash of `self`. The kernel masks the result to 31 bits.
    fn hash_code(&self) -> u32;
}

/// A type with a canonical equality.
pub trait Equatable {
    /// Returns `true` if `self` and `other` are equal.
    fn equals(&self, other: &Self) -> bool;
}

/// A type with a canonical total order.
pub trait Comparable {
    /// Orders `self` relative to `other`.
    fn compare_to(&self, other: &Self) -> Ordering;
}

/// Hashes `value` to a 31-bit non-negative integer.
#[inline]
pub fn hash<T: Hashable + ?Sized>(value: &T) -> u32 {
    value.hash_code() & HASH_MASK
}

/// Returns `true` if `a` and `b` are equal. Identity short-circuits.
#[inline]
pub fn equals<T: Equatable + ?Sized>(a: &T, b: &T) -> bool {
    core::ptr::eq(a, b) || a.equals(b)
}

/// Orders `a` relative to `b`.
#[inline]
pub fn compare<T: Comparable + ?Sized>(a: &T, b: &T) -> Ordering {
    if core::ptr::eq(a, b) {
        return Ordering::Equal;
    }
    a.compare_to(b)
}

/// Hashes an integer by folding its high and low halves.
///
/// Non-negative values below 2^31 hash to themselves.
#[inline]
pub fn hash_i64(value: i64) -> u32 {
    let bits = value as u64;
    ((bits ^ (bits >> 32)) as u32) & HASH_MASK
}

/// Hashes a float.
///
/// Integral values inside the `i64` range share the integer hash, so `1.0`
/// hashes like `1` and `-0.0` like `0`. Other finite values mix their sign,
/// exponent and mantissa.
pub fn hash_f64(value: f64) -> u32 {
    if value.is_nan() {
        return NAN_HASH;
    }
    if value.is_infinite() {
        return if value > 0.0 {
            POSITIVE_INFINITY_HASH
        } else {
            NEGATIVE_INFINITY_HASH
        };
    }
    if value.fract() == 0.0 && (-9.223_372_036_854_776e18..9.223_372_036_854_776e18).contains(&value)
    {
        return hash_i64(value as i64);
    }

    let bits = value.to_bits();
    let sign = (bits >> 63) as u32;
    let exponent = ((bits >> 52) & 0x7FF) as u32;
    let mantissa = bits & ((1 << 52) - 1);

    let mut h = (mantissa as u32) ^ ((mantissa >> 32) as u32);
    h = h.wrapping_mul(31).wrapping_add(exponent);
    h = h.wrapping_mul(31).wrapping_add(sign);
    h & HASH_MASK
}

/// Polynomial rolling hash over UTF-16 code units.
pub fn hash_str(value: &str) -> u32 {
    let mut h = STRING_SEED;
    for unit in value.encode_utf16() {
        h = h.wrapping_mul(31).wrapping_add(u32::from(unit));
    }
    h & HASH_MASK
}

/// Hashes an epoch-millisecond timestamp, decorrelated from [`hash_i64`].
pub fn hash_epoch_millis(millis: i64) -> u32 {
    let h = hash_i64(millis);
    (h.rotate_left(7) ^ DATE_SALT) & HASH_MASK
}

/// Float equality where NaN equals NaN and `-0.0` equals `0.0`.
#[inline]
pub fn number_equals(a: f64, b: f64) -> bool {
    a == b || (a.is_nan() && b.is_nan())
}

/// Float ordering where NaN sorts before every other value.
#[inline]
pub fn number_compare(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

#[inline]
fn combine(h: u32, field: u32) -> u32 {
    h.wrapping_mul(31).wrapping_add(field)
}

macro_rules! integer_kernel {
    ($($t:ty),* $(,)?) => {
        $(
            impl Hashable for $t {
                #[inline]
                fn hash_code(&self) -> u32 {
                    hash_i64(*self as i64)
                }
            }

            impl Equatable for $t {
                #[inline]
                fn equals(&self, other: &Self) -> bool {
                    self == other
                }
            }

            impl Comparable for $t {
                #[inline]
                fn compare_to(&self, other: &Self) -> Ordering {
                    self.cmp(other)
                }
            }
        )*
    };
}

integer_kernel!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl Hashable for f64 {
    fn hash_code(&self) -> u32 {
        hash_f64(*self)
    }
}

impl Equatable for f64 {
    fn equals(&self, other: &Self) -> bool {
        number_equals(*self, *other)
    }
}

impl Comparable for f64 {
    fn compare_to(&self, other: &Self) -> Ordering {
        number_compare(*self, *other)
    }
}

impl Hashable for f32 {
    fn hash_code(&self) -> u32 {
        hash_f64(f64::from(*self))
    }
}

impl Equatable for f32 {
    fn equals(&self, other: &Self) -> bool {
        number_equals(f64::from(*self), f64::from(*other))
    }
}

impl Comparable for f32 {
    fn compare_to(&self, other: &Self) -> Ordering {
        number_compare(f64::from(*self), f64::from(*other))
    }
}

impl Hashable for bool {
    fn hash_code(&self) -> u32 {
        u32::from(*self)
    }
}

impl Equatable for bool {
    fn equals(&self, other: &Self) -> bool {
        self == other
    }
}

impl Comparable for bool {
    fn compare_to(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }
}

impl Hashable for char {
    fn hash_code(&self) -> u32 {
        u32::from(*self)
    }
}

impl Equatable for char {
    fn equals(&self, other: &Self) -> bool {
        self == other
    }
}

impl Comparable for char {
    fn compare_to(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }
}

impl Hashable for () {
    fn hash_code(&self) -> u32 {
        0
    }
}

impl Equatable for () {
    fn equals(&self, _other: &Self) -> bool {
        true
    }
}

impl Comparable for () {
    fn compare_to(&self, _other: &Self) -> Ordering {
        Ordering::Equal
    }
}

impl Hashable for str {
    fn hash_code(&self) -> u32 {
        hash_str(self)
    }
}

impl Equatable for str {
    fn equals(&self, other: &Self) -> bool {
        self == other
    }
}

impl Comparable for str {
    fn compare_to(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }
}

impl Hashable for String {
    fn hash_code(&self) -> u32 {
        hash_str(self)
    }
}

impl Equatable for String {
    fn equals(&self, other: &Self) -> bool {
        self == other
    }
}

impl Comparable for String {
    fn compare_to(&self, other: &Self) -> Ordering {
        self.as_str().cmp(other.as_str())
    }
}

impl<T: Hashable + ?Sized> Hashable for &T {
    fn hash_code(&self) -> u32 {
        (**self).hash_code()
    }
}

impl<T: Equatable + ?Sized> Equatable for &T {
    fn equals(&self, other: &Self) -> bool {
        equals(*self, *other)
    }
}

impl<T: Comparable + ?Sized> Comparable for &T {
    fn compare_to(&self, other: &Self) -> Ordering {
        compare(*self, *other)
    }
}

impl<T: Hashable + ?Sized> Hashable for Box<T> {
    fn hash_code(&self) -> u32 {
        (**self).hash_code()
    }
}

impl<T: Equatable + ?Sized> Equatable for Box<T> {
    fn equals(&self, other: &Self) -> bool {
        equals(&**self, &**other)
    }
}

impl<T: Comparable + ?Sized> Comparable for Box<T> {
    fn compare_to(&self, other: &Self) -> Ordering {
        compare(&**self, &**other)
    }
}

impl<T: Hashable + ?Sized> Hashable for Rc<T> {
    fn hash_code(&self) -> u32 {
        (**self).hash_code()
    }
}

impl<T: Equatable + ?Sized> Equatable for Rc<T> {
    fn equals(&self, other: &Self) -> bool {
        equals(&**self, &**other)
    }
}

impl<T: Comparable + ?Sized> Comparable for Rc<T> {
    fn compare_to(&self, other: &Self) -> Ordering {
        compare(&**self, &**other)
    }
}

/// `None` behaves like null: it hashes to zero and sorts first.
impl<T: Hashable> Hashable for Option<T> {
    fn hash_code(&self) -> u32 {
        match self {
            Some(value) => hash(value),
            None => 0,
        }
    }
}

impl<T: Equatable> Equatable for Option<T> {
    fn equals(&self, other: &Self) -> bool {
        match (self, other) {
            (Some(a), Some(b)) => equals(a, b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl<T: Comparable> Comparable for Option<T> {
    fn compare_to(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Some(a), Some(b)) => compare(a, b),
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
        }
    }
}

impl<T: Hashable> Hashable for [T] {
    fn hash_code(&self) -> u32 {
        self.iter().fold(1, |h, item| combine(h, hash(item))) & HASH_MASK
    }
}

impl<T: Equatable> Equatable for [T] {
    fn equals(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().zip(other).all(|(a, b)| equals(a, b))
    }
}

impl<T: Comparable> Comparable for [T] {
    fn compare_to(&self, other: &Self) -> Ordering {
        for (a, b) in self.iter().zip(other) {
            match compare(a, b) {
                Ordering::Equal => continue,
                ordering => return ordering,
            }
        }
        self.len().cmp(&other.len())
    }
}

impl<T: Hashable> Hashable for Vec<T> {
    fn hash_code(&self) -> u32 {
        self.as_slice().hash_code()
    }
}

impl<T: Equatable> Equatable for Vec<T> {
    fn equals(&self, other: &Self) -> bool {
        self.as_slice().equals(other.as_slice())
    }
}

impl<T: Comparable> Comparable for Vec<T> {
    fn compare_to(&self, other: &Self) -> Ordering {
        self.as_slice().compare_to(other.as_slice())
    }
}

macro_rules! tuple_kernel {
    ($(($($name:ident . $idx:tt),+))*) => {
        $(
            impl<$($name: Hashable),+> Hashable for ($($name,)+) {
                fn hash_code(&self) -> u32 {
                    let mut h = 1;
                    $(h = combine(h, hash(&self.$idx));)+
                    h & HASH_MASK
                }
            }

            impl<$($name: Equatable),+> Equatable for ($($name,)+) {
                fn equals(&self, other: &Self) -> bool {
                    $(equals(&self.$idx, &other.$idx))&&+
                }
            }

            impl<$($name: Comparable),+> Comparable for ($($name,)+) {
                fn compare_to(&self, other: &Self) -> Ordering {
                    Ordering::Equal
                        $(.then_with(|| compare(&self.$idx, &other.$idx)))+
                }
            }
        )*
    };
}

tuple_kernel! {
    (A.0, B.1)
    (A.0, B.1, C.2)
    (A.0, B.1, C.2, D.3)
}

struct IdentityEntry {
    object: Weak<dyn Object>,
    hash: u32,
}

/// Side table assigning stable hashes to object identities.
///
/// Entries hold a `Weak`, so the allocation behind an address cannot be
/// reused while its entry exists. Entries whose object has been dropped are
/// purged once the table has doubled since the previous purge.
struct IdentityTable {
    entries: HashMap<usize, IdentityEntry, DefaultHashBuilder>,
    next_hash: u32,
    purge_at: usize,
}

const IDENTITY_PURGE_MIN: usize = 64;

impl IdentityTable {
    fn new() -> Self {
        Self {
            entries: HashMap::with_hasher(DefaultHashBuilder::default()),
            next_hash: 1,
            purge_at: IDENTITY_PURGE_MIN,
        }
    }

    fn hash_of(&mut self, object: &Rc<dyn Object>) -> u32 {
        let address = Rc::as_ptr(object) as *const () as usize;
        if let Some(entry) = self.entries.get(&address) {
            if entry.object.strong_count() > 0 {
                return entry.hash;
            }
        }

        if self.entries.len() >= self.purge_at {
            self.purge();
        }

        let hash = self.next_hash;
        self.next_hash = self.next_hash.wrapping_add(1) & HASH_MASK;
        self.entries.insert(
            address,
            IdentityEntry {
                object: Rc::downgrade(object),
                hash,
            },
        );
        hash
    }

    fn purge(&mut self) {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.object.strong_count() > 0);
        self.purge_at = (self.entries.len() * 2).max(IDENTITY_PURGE_MIN);
        debug!(
            "identity table purged {} dead entries, {} live",
            before - self.entries.len(),
            self.entries.len()
        );
    }
}

thread_local! {
    static IDENTITY_HASHES: RefCell<IdentityTable> = RefCell::new(IdentityTable::new());
}

/// Returns the identity hash of `object`.
///
/// The first request assigns the next value of a per-thread counter; later
/// requests for the same live object return the same value.
pub fn identity_hash(object: &Rc<dyn Object>) -> u32 {
    IDENTITY_HASHES.with(|table| table.borrow_mut().hash_of(object))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_integers_hash_to_themselves() {
        for n in 0..1000i64 {
            assert_eq!(hash(&n), n as u32);
        }
        assert_eq!(hash(&i32::MAX), i32::MAX as u32);
    }

    #[test]
    fn integral_floats_share_integer_hash() {
        assert_eq!(hash(&1.0f64), hash(&1i64));
        assert_eq!(hash(&-42.0f64), hash(&-42i32));
        assert_eq!(hash(&-0.0f64), hash(&0.0f64));
        assert_eq!(hash(&1.5f32), hash(&1.5f64));
    }

    #[test]
    fn special_floats_have_fixed_hashes() {
        assert_eq!(hash(&f64::NAN), NAN_HASH);
        assert_eq!(hash(&-f64::NAN), NAN_HASH);
        assert_eq!(hash(&f64::INFINITY), POSITIVE_INFINITY_HASH);
        assert_eq!(hash(&f64::NEG_INFINITY), NEGATIVE_INFINITY_HASH);
        assert_ne!(POSITIVE_INFINITY_HASH, NEGATIVE_INFINITY_HASH);
    }

    #[test]
    fn fractional_floats_spread() {
        let hashes: Vec<u32> = [0.5, 0.25, 1.5, -0.5, 3.75, 1e-300, 1e300]
            .iter()
            .map(hash)
            .collect();
        for (i, a) in hashes.iter().enumerate() {
            for b in &hashes[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn string_hash_is_polynomial() {
        assert_eq!(hash_str(""), STRING_SEED);
        assert_eq!(hash_str("a"), STRING_SEED * 31 + 97);
        assert_eq!(hash("abc"), hash(&"abc".to_string()));
        assert_ne!(hash("ab"), hash("ba"));
    }

    #[test]
    fn hashes_are_31_bit() {
        assert!(hash(&-1i64) <= HASH_MASK);
        assert!(hash(&u64::MAX) <= HASH_MASK);
        assert!(hash("a much longer string that overflows many times") <= HASH_MASK);
        assert!(hash(&123.456f64) <= HASH_MASK);
    }

    #[test]
    fn bool_hash() {
        assert_eq!(hash(&true), 1);
        assert_eq!(hash(&false), 0);
    }

    #[test]
    fn nan_equality_and_ordering() {
        assert!(equals(&f64::NAN, &f64::NAN));
        assert!(equals(&0.0f64, &-0.0f64));
        assert_eq!(compare(&f64::NAN, &f64::NEG_INFINITY), Ordering::Less);
        assert_eq!(compare(&1.0f64, &f64::NAN), Ordering::Greater);
        assert_eq!(compare(&f64::NAN, &f64::NAN), Ordering::Equal);
        assert_eq!(compare(&2.0f64, &10.0f64), Ordering::Less);
    }

    #[test]
    fn option_behaves_like_null() {
        assert_eq!(hash(&None::<i32>), 0);
        assert_eq!(compare(&None, &Some(i32::MIN)), Ordering::Less);
        assert!(equals(&None::<i32>, &None));
        assert!(!equals(&None, &Some(0)));
    }

    #[test]
    fn tuples_and_sequences() {
        assert!(equals(&(1, "a"), &(1, "a")));
        assert_eq!(hash(&(1, "a")), hash(&(1, "a")));
        assert_eq!(compare(&(1, 2), &(1, 3)), Ordering::Less);
        assert_eq!(compare(&vec![1, 2], &vec![1, 2, 0]), Ordering::Less);
        assert_eq!(hash(&vec![3, 4]), hash(&[3, 4][..]));
        assert!(!equals(&vec![1], &vec![1, 1]));
    }

    #[test]
    fn boolean_ordering() {
        assert_eq!(compare(&false, &true), Ordering::Less);
        assert_eq!(compare(&true, &true), Ordering::Equal);
    }
}
