//! Value object trait: equality by value, not identity.
//!
//! Value objects are domain objects that have **no identity** - they are defined entirely
//! by their attribute values. Two value objects with the same values are considered equal.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**. A catalog price
/// is a value object; a catalog item is an entity.
///
/// ```ignore
/// #[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// struct Price(i64);
///
/// impl ValueObject for Price {}
///
/// assert_eq!(Price(1999), Price(1999));
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
