//! Dynamically typed values for mixed-type keys.
//!
//! [`Value`] covers the kinds of key the kernel knows how to canonicalise:
//! null and undefined, booleans, numbers, strings, dates, structural
//! [`Record`]s, native functions and opaque [`Object`]s. Records are the only
//! reference kind hashed and compared by content; every other object is
//! hashed by identity unless it supplies hooks.

use core::any::Any;
use core::cmp::Ordering;
use core::fmt;
use std::rc::Rc;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use log::trace;

use crate::error::Error;
use crate::error::Result;
use crate::runtime;
use crate::runtime::Comparable;
use crate::runtime::Equatable;
use crate::runtime::HASH_MASK;
use crate::runtime::Hashable;

const RECORD_SEED: u32 = 17;

/// An opaque reference value stored in [`Value::Object`].
///
/// Without hooks an object is equal only to itself and hashes by identity.
/// Implement the hook methods to give a type its own semantics; an object
/// that overrides [`equals_hook`](Object::equals_hook) must also override
/// [`hash_hook`](Object::hash_hook) so equal objects hash alike.
///
/// Hooks receive the other operand as a [`Value`], which need not be an
/// object; use [`Value::downcast_ref`] to recover a concrete type. They run
/// whichever side of the comparison the object is on: when only the right
/// operand is an object its hook sees the operands swapped, and a
/// `compare_hook` result is reversed to match. An object that equals a
/// primitive must hash like that primitive.
pub trait Object: Any + fmt::Debug {
    /// Hash override.
    fn hash_hook(&self) -> Option<u32> {
        None
    }

    /// Equality override. `None` falls back to identity.
    fn equals_hook(&self, _other: &Value) -> Option<bool> {
        None
    }

    /// Ordering override. `None` falls back to primitive conversion.
    fn compare_hook(&self, _other: &Value) -> Option<Ordering> {
        None
    }

    /// Converts the object to a primitive value for ordering.
    fn value_of(&self) -> Result<Value> {
        Err(Error::conversion("object has no primitive value"))
    }
}

/// Recovers the concrete type behind a `&dyn Object`.
pub fn downcast<T: Object>(object: &dyn Object) -> Option<&T> {
    let any: &dyn Any = object;
    any.downcast_ref::<T>()
}

fn same_object(a: &Rc<dyn Object>, b: &Rc<dyn Object>) -> bool {
    core::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
}

/// A millisecond-precision point in time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Date {
    epoch_millis: i64,
}

impl Date {
    /// Creates a date from milliseconds since the Unix epoch.
    pub const fn from_epoch_millis(epoch_millis: i64) -> Self {
        Self { epoch_millis }
    }

    /// The current time.
    pub fn now() -> Self {
        SystemTime::now().into()
    }

    /// Milliseconds since the Unix epoch.
    pub const fn epoch_millis(&self) -> i64 {
        self.epoch_millis
    }
}

impl From<SystemTime> for Date {
    fn from(time: SystemTime) -> Self {
        let epoch_millis = match time.duration_since(UNIX_EPOCH) {
            Ok(after) => after.as_millis() as i64,
            Err(before) => -(before.duration().as_millis() as i64),
        };
        Self { epoch_millis }
    }
}

impl Hashable for Date {
    fn hash_code(&self) -> u32 {
        runtime::hash_epoch_millis(self.epoch_millis)
    }
}

impl Equatable for Date {
    fn equals(&self, other: &Self) -> bool {
        self.epoch_millis == other.epoch_millis
    }
}

impl Comparable for Date {
    fn compare_to(&self, other: &Self) -> Ordering {
        self.epoch_millis.cmp(&other.epoch_millis)
    }
}

/// A named native function.
///
/// Functions are compared by identity and are skipped when a [`Record`] is
/// hashed or compared structurally.
pub struct NativeFunction {
    name: Rc<str>,
    body: Box<dyn Fn(&[Value]) -> Value>,
}

impl NativeFunction {
    /// The function's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Invokes the function.
    pub fn call(&self, args: &[Value]) -> Value {
        (self.body)(args)
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<fn {}>", self.name)
    }
}

impl Object for NativeFunction {}

/// A structurally compared record with insertion-ordered properties.
///
/// Hashing and equality walk the properties in insertion order, so two
/// records holding the same properties inserted in a different order are
/// not equal. Function-valued properties are ignored by both.
#[derive(Clone, Debug, Default)]
pub struct Record {
    fields: Vec<(Rc<str>, Value)>,
}

impl Record {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`set`](Record::set).
    pub fn with(mut self, name: impl Into<Rc<str>>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Sets a property, keeping its original position if it already exists.
    ///
    /// Returns the previous value.
    pub fn set(&mut self, name: impl Into<Rc<str>>, value: impl Into<Value>) -> Option<Value> {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => Some(core::mem::replace(slot, value)),
            None => {
                self.fields.push((name, value));
                None
            }
        }
    }

    /// Returns the property named `name`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(n, _)| &**n == name)
            .map(|(_, v)| v)
    }

    /// Removes a property, preserving the order of the others.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        let index = self.fields.iter().position(|(n, _)| &**n == name)?;
        Some(self.fields.remove(index).1)
    }

    /// Number of properties.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if the record has no properties.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates properties in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(n, v)| (&**n, v))
    }

    fn data_fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.iter().filter(|(_, v)| !v.is_function())
    }
}

impl Hashable for Record {
    fn hash_code(&self) -> u32 {
        let mut h = RECORD_SEED;
        for (name, value) in self.data_fields() {
            h = h.wrapping_mul(31).wrapping_add(runtime::hash_str(name));
            h = h.wrapping_mul(31).wrapping_add(runtime::hash(value));
        }
        h & HASH_MASK
    }
}

impl Equatable for Record {
    fn equals(&self, other: &Self) -> bool {
        if runtime::hash(self) != runtime::hash(other) {
            return false;
        }
        self.data_fields().all(|(name, value)| match other.get(name) {
            Some(theirs) => runtime::equals(value, theirs),
            None => runtime::equals(value, &Value::Undefined),
        })
    }
}

impl<K, V> FromIterator<(K, V)> for Record
where
    K: Into<Rc<str>>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (name, value) in iter {
            record.set(name, value);
        }
        record
    }
}

/// Builds a [`Record`] from `name: value` pairs in order.
///
/// ```rust
/// use hashlinq::record;
///
/// let point = record! { x: 1, y: 2 };
/// assert_eq!(point.len(), 2);
/// ```
#[macro_export]
macro_rules! record {
    () => {
        $crate::value::Record::new()
    };
    ($($name:ident : $value:expr),+ $(,)?) => {
        $crate::value::Record::new()$(.with(stringify!($name), $value))+
    };
}

/// A dynamically typed value.
#[derive(Clone, Debug, Default)]
pub enum Value {
    /// An absent value. Equal to `Null`.
    #[default]
    Undefined,
    /// An explicit null. Equal to `Undefined`.
    Null,
    /// A boolean.
    Bool(bool),
    /// A double-precision number.
    Number(f64),
    /// A string.
    String(Rc<str>),
    /// A point in time.
    Date(Date),
    /// A structurally compared record.
    Record(Rc<Record>),
    /// A native function.
    Function(Rc<NativeFunction>),
    /// An opaque object, compared by identity unless it has hooks.
    Object(Rc<dyn Object>),
}

/// A value reduced to a primitive for ordering.
enum Primitive {
    Nullish,
    Bool(bool),
    Number(f64),
    String(Rc<str>),
}

impl Primitive {
    fn rank(&self) -> u8 {
        match self {
            Primitive::Nullish => 0,
            Primitive::Bool(_) => 1,
            Primitive::Number(_) => 2,
            Primitive::String(_) => 3,
        }
    }

    fn compare(&self, other: &Primitive) -> Ordering {
        match (self, other) {
            (Primitive::Nullish, Primitive::Nullish) => Ordering::Equal,
            (Primitive::Bool(a), Primitive::Bool(b)) => a.cmp(b),
            (Primitive::Number(a), Primitive::Number(b)) => runtime::number_compare(*a, *b),
            (Primitive::String(a), Primitive::String(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl Value {
    /// Wraps `object` as a [`Value::Object`].
    pub fn object(object: impl Object) -> Self {
        Value::Object(Rc::new(object))
    }

    /// Wraps a closure as a [`Value::Function`].
    pub fn function(name: &str, body: impl Fn(&[Value]) -> Value + 'static) -> Self {
        Value::Function(Rc::new(NativeFunction {
            name: name.into(),
            body: Box::new(body),
        }))
    }

    /// Returns `true` for `Null` and `Undefined`.
    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Null | Value::Undefined)
    }

    /// Returns `true` for [`Value::Function`].
    pub fn is_function(&self) -> bool {
        matches!(self, Value::Function(_))
    }

    /// The number, if this is a [`Value::Number`].
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// The string, if this is a [`Value::String`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// The record, if this is a [`Value::Record`].
    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(r) => Some(r),
            _ => None,
        }
    }

    /// The object as a `T`, if this is a [`Value::Object`] holding one.
    pub fn downcast_ref<T: Object>(&self) -> Option<&T> {
        match self {
            Value::Object(object) => downcast(&**object),
            _ => None,
        }
    }

    /// Reads a property of a record. Any other value yields `Undefined`.
    pub fn field(&self, name: &str) -> Value {
        self.as_record()
            .and_then(|r| r.get(name))
            .cloned()
            .unwrap_or_default()
    }

    fn to_primitive(&self) -> Result<Primitive> {
        Ok(match self {
            Value::Undefined | Value::Null => Primitive::Nullish,
            Value::Bool(b) => Primitive::Bool(*b),
            Value::Number(n) => Primitive::Number(*n),
            Value::String(s) => Primitive::String(s.clone()),
            Value::Date(d) => Primitive::Number(d.epoch_millis() as f64),
            Value::Record(_) => return Err(Error::conversion("record has no primitive value")),
            Value::Function(f) => {
                return Err(Error::conversion(format!(
                    "function {} has no primitive value",
                    f.name()
                )));
            }
            Value::Object(object) => match object.value_of()? {
                Value::Object(_) => {
                    return Err(Error::conversion("value_of returned another object"));
                }
                primitive => primitive.to_primitive()?,
            },
        })
    }

    fn hooked_equals(&self, other: &Value) -> Option<bool> {
        if let Value::Object(object) = self
            && let Some(equal) = object.equals_hook(other)
        {
            return Some(equal);
        }
        match other {
            Value::Object(object) => object.equals_hook(self),
            _ => None,
        }
    }

    fn hooked_compare(&self, other: &Value) -> Option<Ordering> {
        if let Value::Object(object) = self
            && let Some(ordering) = object.compare_hook(other)
        {
            return Some(ordering);
        }
        match other {
            Value::Object(object) => object.compare_hook(self).map(Ordering::reverse),
            _ => None,
        }
    }

    fn compare_primitives(&self, other: &Value) -> Ordering {
        match (self.to_primitive(), other.to_primitive()) {
            (Ok(a), Ok(b)) => a.compare(&b),
            (Err(error), _) | (_, Err(error)) => {
                trace!("comparison fell back to equal: {error}");
                Ordering::Equal
            }
        }
    }
}

impl Hashable for Value {
    fn hash_code(&self) -> u32 {
        match self {
            Value::Undefined | Value::Null => 0,
            Value::Bool(b) => u32::from(*b),
            Value::Number(n) => runtime::hash_f64(*n),
            Value::String(s) => runtime::hash_str(s),
            Value::Date(d) => d.hash_code(),
            Value::Record(r) => r.hash_code(),
            Value::Function(f) => {
                let object: Rc<dyn Object> = f.clone();
                runtime::identity_hash(&object)
            }
            Value::Object(object) => match object.hash_hook() {
                Some(hash) => hash,
                None => runtime::identity_hash(object),
            },
        }
    }
}

impl Equatable for Value {
    fn equals(&self, other: &Self) -> bool {
        match (self, other) {
            (a, b) if a.is_nullish() || b.is_nullish() => a.is_nullish() && b.is_nullish(),
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => runtime::number_equals(*a, *b),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a.equals(b),
            (Value::Record(a), Value::Record(b)) => Rc::ptr_eq(a, b) || a.equals(b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) if same_object(a, b) => true,
            (Value::Object(_), _) | (_, Value::Object(_)) => {
                self.hooked_equals(other).unwrap_or(false)
            }
            _ => false,
        }
    }
}

impl Comparable for Value {
    fn compare_to(&self, other: &Self) -> Ordering {
        match (self, other) {
            (a, b) if a.is_nullish() || b.is_nullish() => a.is_nullish().cmp(&b.is_nullish()).reverse(),
            (Value::Number(a), Value::Number(b)) => runtime::number_compare(*a, *b),
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Date(a), Value::Date(b)) => a.compare_to(b),
            (Value::Object(_), _) | (_, Value::Object(_)) => match self.hooked_compare(other) {
                Some(ordering) => ordering,
                None => match (self, other) {
                    (Value::Object(a), Value::Object(b)) if same_object(a, b) => Ordering::Equal,
                    _ => self.compare_primitives(other),
                },
            },
            _ => self.compare_primitives(other),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        runtime::equals(self, other)
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(runtime::compare(self, other))
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Number(f64::from(value))
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Number(f64::from(value))
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Number(f64::from(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(value as f64)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.into())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value.into())
    }
}

impl From<Rc<str>> for Value {
    fn from(value: Rc<str>) -> Self {
        Value::String(value)
    }
}

impl From<Date> for Value {
    fn from(value: Date) -> Self {
        Value::Date(value)
    }
}

impl From<Record> for Value {
    fn from(value: Record) -> Self {
        Value::Record(Rc::new(value))
    }
}

impl From<Rc<Record>> for Value {
    fn from(value: Rc<Record>) -> Self {
        Value::Record(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}
