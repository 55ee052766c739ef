//! Assignment tracker core.
//! Owns assignment persistence, reminder scheduling and the live query path;
//! presentation layers drive it through the re-exported types below.

pub mod clock;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod query;
pub mod reminder;
pub mod service;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::CoreConfig;
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::assignment::{
    Assignment, AssignmentDraft, AssignmentId, AssignmentValidationError, Priority, Status,
};
pub use model::preferences::{ThemeMode, UserPreferences};
pub use query::criteria::FilterCriteria;
pub use query::pipeline::{QueryPipeline, QueryResult, QueryResults};
pub use reminder::executor::{
    ChannelNotifier, LogNotifier, ReminderExecutor, ReminderNotifier, SchedulingError,
    SchedulingResult, TokioReminderExecutor,
};
pub use reminder::planner::{ReminderDecision, ReminderPayload, ReminderPlanner};
pub use reminder::queue::{reminder_key, ReminderQueue};
pub use service::analytics_service::{AnalyticsService, AnalyticsSnapshot};
pub use service::lifecycle_service::{
    LifecycleCoordinator, LifecycleError, LifecycleOutcome, LifecycleResult, ReminderOutcome,
};
pub use service::projections::{group_by_due_date, BoardColumns};
pub use store::assignment_store::{
    AssignmentStore, SqliteAssignmentStore, StoreError, StoreQuery, StoreResult,
};
pub use store::preferences_store::{PreferencesStore, SqlitePreferencesStore};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
