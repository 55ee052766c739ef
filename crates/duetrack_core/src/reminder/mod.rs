//! Reminder planning and scheduling.
//!
//! # Responsibility
//! - Decide each assignment's reminder instant (`planner`).
//! - Keep at most one pending reminder per assignment (`queue`).
//! - Run timers and deliver fired reminders (`executor`).

pub mod executor;
pub mod planner;
pub mod queue;
