//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
pub trait Entity {
    /// Strongly-typed entity identifier, backed by a database-assigned `i64`.
    type Id: Copy
        + Eq
        + core::hash::Hash
        + core::fmt::Debug
        + core::fmt::Display
        + From<i64>
        + Into<i64>
        + Send
        + Sync
        + 'static;

    /// Returns the entity identifier (`None` until persisted).
    fn id(&self) -> Option<Self::Id>;
}
