//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are immutable and compared by their attribute values.
/// To "modify" one, build a new one.
///
/// ```ignore
/// #[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// struct Amount(u64);
///
/// impl ValueObject for Amount {}
///
/// assert_eq!(Amount(50), Amount(50));
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
