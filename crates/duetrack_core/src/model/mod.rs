//! Domain model for assignment tracking.
//!
//! # Responsibility
//! - Define the record shapes shared by store, reminder and query layers.
//!
//! # Invariants
//! - Every persisted assignment is identified by a stable `AssignmentId`.
//! - Deletion is a hard delete; the store keeps no tombstones.

pub mod assignment;
pub mod preferences;
