//! Read path from list-screen criteria to live assignment lists.
//!
//! # Responsibility
//! - Describe what the user is looking for (`criteria`).
//! - Keep exactly one store subscription alive for the latest criteria
//!   (`pipeline`).

pub mod criteria;
pub mod pipeline;
