//! Entity trait: identity that persists across state changes.
//!
//! A `ReturnRequest` stays the same request as it moves from pending to
//! completed; a policy keeps its identity when renamed. Identity, not field
//! values, is what makes two entities the same.

/// Marker for domain objects with a stable identity.
pub trait Entity {
    /// Strongly-typed identifier, one newtype per entity kind.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
