//! Runtime values and the growable array that backs a chunk's constant pool.

use core::{fmt, iter::Enumerate, slice};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::memory::push_grow;

/// A Lox runtime value.
///
/// Only numbers exist for now. Code that merely moves values around copies
/// the whole enum, so new variants do not change those call sites.
///
/// `Display` uses Rust's shortest round-trip form, not C's `%g`: large
/// magnitudes print every digit (`1e20` shows as `100000000000000000000`,
/// where `%g` gives `1e+20`) and not-a-number shows as `NaN` (`%g`: `nan`).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Value {
    /// Double-precision floating point number.
    Number(f64),
}

impl Value {
    /// Numeric payload, if this value is a number.
    pub const fn as_number(self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(n),
        }
    }

    /// Whether this value is a number.
    pub const fn is_number(self) -> bool { matches!(self, Value::Number(_)) }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self { Value::Number(n) }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{n}"),
        }
    }
}

/// Append-only array of values with stable indices (0-based).
///
/// Indices returned by [`ValueArray::write`] stay valid until [`ValueArray::clear`];
/// equal values are never merged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueArray {
    values: Vec<Value>,
}

impl ValueArray {
    /// Create an empty array with no backing storage.
    pub const fn new() -> Self { Self { values: Vec::new() } }

    /// Number of stored values.
    pub fn len(&self) -> usize { self.values.len() }

    /// Whether the array is empty.
    pub fn is_empty(&self) -> bool { self.values.is_empty() }

    /// Allocated slots.
    pub fn capacity(&self) -> usize { self.values.capacity() }

    /// Appends a value and returns its index.
    pub fn write(&mut self, value: Value) -> usize {
        let idx = self.values.len();
        push_grow(&mut self.values, value);
        idx
    }

    /// Lookup a value by index.
    pub fn get(&self, idx: usize) -> Option<Value> { self.values.get(idx).copied() }

    /// Stored values in index order.
    pub fn as_slice(&self) -> &[Value] { &self.values }

    /// Iterate as `(index, Value)`.
    pub fn iter(&self) -> ValueIter<'_> { ValueIter { inner: self.values.iter().enumerate() } }

    /// Release the storage; the array is back to its freshly created state.
    pub fn clear(&mut self) { self.values = Vec::new(); }
}

/// Iterator returned by [`ValueArray::iter`].
pub struct ValueIter<'a> {
    inner: Enumerate<slice::Iter<'a, Value>>,
}

impl Iterator for ValueIter<'_> {
    type Item = (usize, Value);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(idx, value)| (idx, *value))
    }
}

impl<'a> IntoIterator for &'a ValueArray {
    type Item = (usize, Value);
    type IntoIter = ValueIter<'a>;

    fn into_iter(self) -> Self::IntoIter { self.iter() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn display_numbers() {
        assert_eq!(Value::Number(5.0).to_string(), "5");
        assert_eq!(Value::Number(-4.0).to_string(), "-4");
        assert_eq!(Value::Number(1.22).to_string(), "1.22");
        assert_eq!(Value::Number(f64::INFINITY).to_string(), "inf");
        assert_eq!(Value::Number(1e20).to_string(), "100000000000000000000");
        assert_eq!(Value::Number(f64::NAN).to_string(), "NaN");
    }

    #[test]
    fn empty_array_has_no_storage() {
        let arr = ValueArray::new();
        assert!(arr.is_empty());
        assert_eq!(arr.capacity(), 0);
    }

    #[test]
    fn duplicates_get_fresh_indices() {
        let mut arr = ValueArray::new();
        assert_eq!(arr.write(Value::Number(1.0)), 0);
        assert_eq!(arr.write(Value::Number(1.0)), 1);
        assert_eq!(arr.len(), 2);
    }

    #[test]
    fn clear_is_idempotent() {
        let mut arr = ValueArray::new();
        arr.write(Value::Number(3.0));
        arr.clear();
        assert_eq!(arr, ValueArray::new());
        assert_eq!(arr.capacity(), 0);
        arr.clear();
        assert!(arr.is_empty());
    }

    proptest! {
        #[test]
        fn indices_follow_call_order(values in proptest::collection::vec(-1.0e9f64..1.0e9, 0..300)) {
            let mut arr = ValueArray::new();
            for (expected, v) in values.iter().enumerate() {
                prop_assert_eq!(arr.write(Value::Number(*v)), expected);
            }
            for (idx, v) in values.iter().enumerate() {
                prop_assert_eq!(arr.get(idx), Some(Value::Number(*v)));
            }
        }
    }
}
