//! Canvas connection use-case services.
//!
//! # Responsibility
//! - Orchestrate registry, scheduler, monitor and host collaborators into
//!   the connect/disconnect/reposition APIs used by the canvas controller.
//! - Keep UI layers decoupled from curve bookkeeping.

pub mod engine;
