//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are immutable domain objects defined entirely by their
/// attribute values; two value objects with the same values are equal.
/// `Money` is the canonical example: `Money::from_minor(100)` is the same
/// hundred cents wherever it appears, while a `ReturnRequest` with the same
/// fields is still a distinct request.
///
/// To "modify" a value object, create a new one with the new values.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
