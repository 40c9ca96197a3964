//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**; they represent
/// concepts where identity doesn't matter. `Period` is the canonical example
/// here: two periods for the same year+month are the same period, regardless
/// of where they were computed.
///
/// To "modify" a value object, create a new one with the new values.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
