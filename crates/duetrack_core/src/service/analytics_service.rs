//! Weekly progress snapshot.
//!
//! # Invariants
//! - The week starts on the most recent Monday at 00:00 local time; on a
//!   Monday that is today's midnight.
//! - Overdue counts only open assignments due strictly before today.

use crate::clock::Clock;
use crate::store::assignment_store::{AssignmentStore, StoreQuery, StoreResult};
use chrono::{Datelike, Duration, NaiveDateTime, NaiveTime};
use log::debug;
use serde::Serialize;
use std::sync::Arc;

/// Counts shown on the analytics screen. Recomputed on every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct AnalyticsSnapshot {
    pub completed_this_week: usize,
    pub overdue_count: usize,
}

/// Local midnight of the Monday on or before `now`.
pub fn start_of_week(now: NaiveDateTime) -> NaiveDateTime {
    let days_since_monday = i64::from(now.weekday().num_days_from_monday());
    (now.date() - Duration::days(days_since_monday)).and_time(NaiveTime::MIN)
}

pub struct AnalyticsService {
    store: Arc<dyn AssignmentStore>,
    clock: Arc<dyn Clock>,
}

impl AnalyticsService {
    pub fn new(store: Arc<dyn AssignmentStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub fn snapshot(&self) -> StoreResult<AnalyticsSnapshot> {
        let now = self.clock.now();
        let week_start = start_of_week(now);

        let completed_this_week = self
            .store
            .fetch(&StoreQuery::CompletedSince(week_start))?
            .len();
        let overdue_count = self
            .store
            .fetch(&StoreQuery::OverdueBefore(now.date()))?
            .len();

        debug!(
            "event=analytics_snapshot module=analytics status=ok week_start={week_start} completed={completed_this_week} overdue={overdue_count}"
        );
        Ok(AnalyticsSnapshot {
            completed_this_week,
            overdue_count,
        })
    }
}
