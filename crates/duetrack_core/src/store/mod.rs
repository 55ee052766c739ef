//! Storage collaborators.
//!
//! # Responsibility
//! - Define the assignment and preferences store contracts the core consumes.
//! - Ship SQLite implementations and the live-subscription producer.
//!
//! # Invariants
//! - Store APIs return semantic errors (`NotFound`, `MissingId`) in addition
//!   to database transport errors.
//! - Only the store owns durable assignment records.

pub mod assignment_store;
pub mod live;
pub mod preferences_store;
