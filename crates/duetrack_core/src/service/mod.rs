//! Use-case services over the store and reminder collaborators.
//!
//! # Responsibility
//! - `lifecycle_service`: edit intents that keep storage and reminders aligned.
//! - `analytics_service`: on-demand progress counts.
//! - `projections`: board and calendar groupings of a result list.

pub mod analytics_service;
pub mod lifecycle_service;
pub mod projections;
