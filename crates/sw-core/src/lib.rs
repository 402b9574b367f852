//! Core types for Starward: entities, items, patches, and the entity store.
//!
//! This crate defines the data model the rules engine reads and writes. It
//! holds no rules of its own; derived blocks are typed here but computed by
//! `sw-mechanics`.

/// The six attributes and raw attribute values.
pub mod attribute;
/// Per-kind component blocks (character, NPC, faction).
pub mod component;
/// Derived stat blocks written by the rules engine.
pub mod derived;
/// Entity types, identifiers, and metadata values.
pub mod entity;
/// Error types used throughout the crate.
pub mod error;
pub mod item;
pub mod patch;
/// Entity storage with atomic, versioned patches.
pub mod store;

/// Re-export attribute types.
pub use attribute::{Attribute, AttributeSet};
/// Re-export derived stat types.
pub use derived::{AttributeModifiers, DerivedStats};
/// Re-export core entity types.
pub use entity::{Entity, EntityId, EntityKind, MetadataValue};
/// Re-export error types.
pub use error::{CoreError, CoreResult};
/// Re-export item types.
pub use item::{Item, ItemId, ItemKind};
/// Re-export the patch type.
pub use patch::Patch;
/// Re-export store types.
pub use store::{EntityStore, MemoryStore};
