//! Value object marker: equality by value, not identity.

/// Marker trait for immutable values compared by their attributes.
///
/// Margins, tax rates and channel price pairs are value objects: two margins of
/// `25%` are interchangeable, while two products with the same cost are not.
/// To "change" a value object, build a new one.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
