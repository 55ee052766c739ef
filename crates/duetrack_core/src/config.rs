//! Runtime tunables for the core.
//!
//! # Responsibility
//! - Hold the reminder lead time and the search debounce window.
//!
//! # Invariants
//! - Values are passed explicitly to the components that use them; nothing
//!   reads configuration from ambient global state.

use std::time::Duration;

/// Hours before the due instant a reminder fires.
pub const DEFAULT_REMINDER_LEAD_HOURS: i64 = 24;
/// Quiet period before a criteria change triggers a new store subscription.
pub const DEFAULT_SEARCH_DEBOUNCE: Duration = Duration::from_millis(200);

/// Core configuration shared by the planner and the query pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub reminder_lead: chrono::Duration,
    pub search_debounce: Duration,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            reminder_lead: chrono::Duration::hours(DEFAULT_REMINDER_LEAD_HOURS),
            search_debounce: DEFAULT_SEARCH_DEBOUNCE,
        }
    }
}

impl CoreConfig {
    pub fn with_reminder_lead(mut self, lead: chrono::Duration) -> Self {
        self.reminder_lead = lead;
        self
    }

    pub fn with_search_debounce(mut self, window: Duration) -> Self {
        self.search_debounce = window;
        self
    }
}
