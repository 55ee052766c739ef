//! Reminder fire-time planning.
//!
//! # Invariants
//! - Planning is pure: the same assignment and `now` give the same decision.
//! - A reminder is only scheduled when its fire instant is strictly after `now`.

use crate::config::CoreConfig;
use crate::model::assignment::{Assignment, AssignmentId};
use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Heading of the alert shown when a reminder fires.
pub const REMINDER_ALERT_TITLE: &str = "Assignment Reminder";

/// Data carried by a scheduled reminder to the notification collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderPayload {
    /// Activation target: the detail view for this assignment.
    pub assignment_id: AssignmentId,
    pub title: String,
    /// ISO calendar date (`YYYY-MM-DD`).
    pub due_date: String,
}

impl ReminderPayload {
    /// Alert body text.
    pub fn message(&self) -> String {
        format!("{} is due on {}", self.title, self.due_date)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReminderDecision {
    Schedule {
        fire_at: NaiveDateTime,
        payload: ReminderPayload,
    },
    Skip,
}

impl ReminderDecision {
    pub fn fire_at(&self) -> Option<NaiveDateTime> {
        match self {
            Self::Schedule { fire_at, .. } => Some(*fire_at),
            Self::Skip => None,
        }
    }
}

/// Computes when, if at all, an assignment's reminder should fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReminderPlanner {
    lead: Duration,
}

impl Default for ReminderPlanner {
    fn default() -> Self {
        Self::from_config(&CoreConfig::default())
    }
}

impl ReminderPlanner {
    /// Planner firing `lead` before each due instant.
    pub fn new(lead: Duration) -> Self {
        Self { lead }
    }

    pub fn from_config(config: &CoreConfig) -> Self {
        Self::new(config.reminder_lead)
    }

    /// Due instant minus the lead time. `None` when that falls before the
    /// earliest representable instant.
    pub fn fire_at(&self, assignment: &Assignment) -> Option<NaiveDateTime> {
        assignment.due_at().checked_sub_signed(self.lead)
    }

    /// Decides whether `assignment` gets a reminder when evaluated at `now`.
    ///
    /// Records without an id have never been persisted and always `Skip`.
    pub fn plan(&self, assignment: &Assignment, now: NaiveDateTime) -> ReminderDecision {
        let Some(assignment_id) = assignment.id else {
            return ReminderDecision::Skip;
        };

        let fire_at = match self.fire_at(assignment) {
            Some(fire_at) if fire_at > now => fire_at,
            _ => return ReminderDecision::Skip,
        };

        ReminderDecision::Schedule {
            fire_at,
            payload: ReminderPayload {
                assignment_id,
                title: assignment.title.clone(),
                due_date: assignment.due_date.format("%Y-%m-%d").to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ReminderDecision, ReminderPlanner};
    use crate::model::assignment::{Assignment, AssignmentDraft, Priority, Status};
    use chrono::{Duration, NaiveDate, NaiveDateTime};

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn persisted(due: NaiveDateTime, created: NaiveDateTime) -> Assignment {
        let mut assignment = Assignment::from_draft(
            AssignmentDraft::new("Lab report", due.date(), due.time()).with_priority(Priority::High),
            created,
        );
        assignment.id = Some(7);
        assignment
    }

    #[test]
    fn due_tomorrow_fires_one_day_early() {
        let now = at(2026, 5, 4, 9, 0);
        let due = at(2026, 5, 5, 10, 0);
        let decision = ReminderPlanner::default().plan(&persisted(due, now), now);

        match decision {
            ReminderDecision::Schedule { fire_at, payload } => {
                assert_eq!(fire_at, at(2026, 5, 4, 10, 0));
                assert_eq!(payload.assignment_id, 7);
                assert_eq!(payload.title, "Lab report");
                assert_eq!(payload.due_date, "2026-05-05");
                assert_eq!(payload.message(), "Lab report is due on 2026-05-05");
            }
            ReminderDecision::Skip => panic!("expected a scheduled reminder"),
        }
    }

    #[test]
    fn due_within_lead_time_is_skipped() {
        let now = at(2026, 5, 4, 9, 0);
        let due = now + Duration::hours(1);
        assert_eq!(
            ReminderPlanner::default().plan(&persisted(due, now), now),
            ReminderDecision::Skip
        );
    }

    #[test]
    fn fire_instant_equal_to_now_is_skipped() {
        let now = at(2026, 5, 4, 9, 0);
        let due = now + Duration::hours(24);
        let planner = ReminderPlanner::default();
        assert_eq!(planner.plan(&persisted(due, now), now), ReminderDecision::Skip);

        let one_second_earlier = now - Duration::seconds(1);
        assert!(matches!(
            planner.plan(&persisted(due, now), one_second_earlier),
            ReminderDecision::Schedule { .. }
        ));
    }

    #[test]
    fn skip_iff_fire_instant_not_after_now() {
        let planner = ReminderPlanner::default();
        let base = at(2026, 1, 1, 0, 0);
        for due_offset_minutes in (0..=72 * 60).step_by(37) {
            let due = base + Duration::minutes(due_offset_minutes);
            let assignment = persisted(due, base);
            for now_offset_minutes in (0..=72 * 60).step_by(53) {
                let now = base + Duration::minutes(now_offset_minutes);
                let expect_skip = due - Duration::hours(24) <= now;
                let decision = planner.plan(&assignment, now);
                assert_eq!(
                    decision == ReminderDecision::Skip,
                    expect_skip,
                    "due={due} now={now}"
                );
            }
        }
    }

    #[test]
    fn status_does_not_change_fire_instant() {
        let now = at(2026, 5, 1, 8, 0);
        let mut assignment = persisted(at(2026, 5, 9, 17, 30), now);
        let planner = ReminderPlanner::default();
        let baseline = planner.plan(&assignment, now);

        assignment.status = Status::Done;
        assert_eq!(planner.plan(&assignment, now), baseline);
    }

    #[test]
    fn unsaved_assignment_is_skipped() {
        let now = at(2026, 5, 1, 8, 0);
        let mut assignment = persisted(at(2026, 6, 1, 8, 0), now);
        assignment.id = None;
        assert_eq!(
            ReminderPlanner::default().plan(&assignment, now),
            ReminderDecision::Skip
        );
    }

    #[test]
    fn lead_time_is_configurable() {
        let now = at(2026, 5, 1, 8, 0);
        let due = at(2026, 5, 1, 12, 0);
        let planner = ReminderPlanner::new(Duration::hours(2));
        assert_eq!(
            planner.plan(&persisted(due, now), now).fire_at(),
            Some(at(2026, 5, 1, 10, 0))
        );
    }

    #[test]
    fn earliest_representable_due_date_is_skipped() {
        let now = at(2026, 5, 4, 9, 0);
        let due = NaiveDate::MIN.and_hms_opt(1, 0, 0).unwrap();
        let assignment = persisted(due, NaiveDate::MIN.and_hms_opt(0, 0, 0).unwrap());
        let planner = ReminderPlanner::default();

        assert_eq!(planner.fire_at(&assignment), None);
        assert_eq!(planner.plan(&assignment, now), ReminderDecision::Skip);
    }
}
