//! Canvas connection domain model.
//!
//! # Responsibility
//! - Define the identity and shape of connector edges between canvas objects.
//! - Define anchor and style value types exchanged with host collaborators.
//!
//! # Invariants
//! - Every connection is identified by an id derived from
//!   `(kind, source, target)`; the same triple always yields the same id.
//! - A connection's kind never changes after creation.

pub mod connection;
pub mod geometry;
pub mod style;
