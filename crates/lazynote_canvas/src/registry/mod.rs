//! Connection storage.
//!
//! # Responsibility
//! - Own the canonical edge set and the object -> edge inverse index.
//!
//! # Invariants
//! - Index and edge set are mutated together inside one call.

pub mod connection_registry;
