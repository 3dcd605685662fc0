//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
pub trait Entity {
    /// Strongly-typed entity identifier.
    ///
    /// Identifiers are totally ordered so storage can keep rows in a stable
    /// order (UUIDv7 ids sort by creation time).
    type Id: Clone + Eq + Ord + core::hash::Hash + core::fmt::Debug + core::fmt::Display;

    /// Name of the table/collection the entity lives in.
    const TABLE: &'static str;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
