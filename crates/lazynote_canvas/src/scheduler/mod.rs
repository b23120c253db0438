//! Frame-aligned reposition scheduling.
//!
//! # Responsibility
//! - Coalesce reposition requests into debounced, frame-aligned batches.
//! - Keep the bulk tier (environment-wide) and targeted tier (per object)
//!   independent, each with at most one timer and one frame in flight.
//!
//! # Invariants
//! - A request while a tier is pending is merged, never restarts the timer.
//! - Targeted objects are read from the pending set when the frame fires.

pub mod tier;
pub mod update_scheduler;
