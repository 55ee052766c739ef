//! Assignment lifecycle coordination.
//!
//! # Responsibility
//! - Run every assignment write through the store first, then bring the
//!   reminder queue in line with the persisted record.
//!
//! # Invariants
//! - Validation and persistence failures abort before any reminder call.
//! - Update and status advance always cancel before re-planning, so the cancel
//!   is observed by the executor before any new enqueue.
//! - Delete cancels only after the store confirmed the row is gone.
//! - A scheduling failure never rolls back a persisted write; it is reported
//!   in [`ReminderOutcome::Failed`].
//! - Timestamps are stamped at whole-second precision.

use crate::clock::Clock;
use crate::model::assignment::{
    Assignment, AssignmentDraft, AssignmentId, AssignmentValidationError,
};
use crate::reminder::executor::SchedulingError;
use crate::reminder::planner::{ReminderDecision, ReminderPlanner};
use crate::reminder::queue::ReminderQueue;
use crate::store::assignment_store::{AssignmentStore, StoreError};
use chrono::{NaiveDateTime, Timelike};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Instant;

pub type LifecycleResult<T> = Result<T, LifecycleError>;

/// Failure that aborted a lifecycle operation.
#[derive(Debug)]
pub enum LifecycleError {
    /// Input rejected before touching the store.
    Validation(AssignmentValidationError),
    /// Store unavailable, row missing, or constraint violation.
    Persistence(StoreError),
}

impl Display for LifecycleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "invalid assignment: {err}"),
            Self::Persistence(err) => write!(f, "{err}"),
        }
    }
}

impl Error for LifecycleError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Persistence(err) => Some(err),
        }
    }
}

impl From<AssignmentValidationError> for LifecycleError {
    fn from(value: AssignmentValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<StoreError> for LifecycleError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Validation(err) => Self::Validation(err),
            other => Self::Persistence(other),
        }
    }
}

/// What happened on the reminder side of a successful write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReminderOutcome {
    Scheduled { fire_at: NaiveDateTime },
    /// No reminder is pending: the fire instant has already passed.
    Skipped,
    /// The reminder was removed along with the assignment.
    Cancelled,
    /// The write stands but the executor did not accept the change.
    Failed(SchedulingError),
}

impl ReminderOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Result of a successful create, update, status advance or delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleOutcome {
    /// The record as persisted. For delete, the record as it was before removal.
    pub assignment: Assignment,
    pub reminder: ReminderOutcome,
}

/// Orchestrates store writes and reminder upkeep for each edit intent.
///
/// Operations on the same assignment id must be serialized by the caller;
/// different ids may be edited concurrently.
pub struct LifecycleCoordinator {
    store: Arc<dyn AssignmentStore>,
    queue: ReminderQueue,
    planner: ReminderPlanner,
    clock: Arc<dyn Clock>,
}

impl LifecycleCoordinator {
    pub fn new(
        store: Arc<dyn AssignmentStore>,
        queue: ReminderQueue,
        planner: ReminderPlanner,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            queue,
            planner,
            clock,
        }
    }

    /// Persists a new assignment and schedules its reminder.
    ///
    /// # Errors
    /// - `LifecycleError::Validation` for a blank title; nothing is written.
    /// - `LifecycleError::Persistence` when the insert fails; no reminder call.
    pub fn create(&self, draft: AssignmentDraft) -> LifecycleResult<LifecycleOutcome> {
        let started_at = Instant::now();
        let mut assignment = Assignment::from_draft(draft, self.now());
        let result = self.create_inner(&mut assignment);
        self.log_result("create", assignment.id, started_at, &result);
        result
    }

    fn create_inner(&self, assignment: &mut Assignment) -> LifecycleResult<LifecycleOutcome> {
        assignment.validate()?;
        let id = self.store.insert(assignment)?;
        assignment.id = Some(id);

        let reminder = self.replan(id, assignment);
        Ok(LifecycleOutcome {
            assignment: assignment.clone(),
            reminder,
        })
    }

    /// Writes all fields of `assignment` and re-plans its reminder.
    ///
    /// `created_at` is kept; `updated_at` is stamped with the current time.
    pub fn update(&self, assignment: Assignment) -> LifecycleResult<LifecycleOutcome> {
        let started_at = Instant::now();
        let id = assignment.id;
        let result = self.update_inner(assignment);
        self.log_result("update", id, started_at, &result);
        result
    }

    /// Moves the assignment one step along the status cycle.
    ///
    /// Goes through the same cancel/re-plan path as [`Self::update`].
    pub fn advance_status(&self, id: AssignmentId) -> LifecycleResult<LifecycleOutcome> {
        let started_at = Instant::now();
        let result = self.load(id).and_then(|mut assignment| {
            assignment.status = assignment.status.next();
            self.update_inner(assignment)
        });
        self.log_result("advance_status", Some(id), started_at, &result);
        result
    }

    fn update_inner(&self, mut assignment: Assignment) -> LifecycleResult<LifecycleOutcome> {
        assignment.updated_at = self.now().max(assignment.created_at);
        assignment.validate()?;
        let id = assignment.id.ok_or(StoreError::MissingId)?;
        self.store.update(&assignment)?;

        if let Err(err) = self.queue.cancel(id) {
            return Ok(LifecycleOutcome {
                assignment,
                reminder: self.scheduling_failed(id, "cancel", err),
            });
        }
        let reminder = self.replan(id, &assignment);
        Ok(LifecycleOutcome {
            assignment,
            reminder,
        })
    }

    /// Removes the assignment and then its pending reminder.
    ///
    /// # Errors
    /// - `LifecycleError::Persistence(StoreError::NotFound)` when `id` does not
    ///   exist; the reminder queue is left untouched.
    pub fn delete(&self, id: AssignmentId) -> LifecycleResult<LifecycleOutcome> {
        let started_at = Instant::now();
        let result = self.delete_inner(id);
        self.log_result("delete", Some(id), started_at, &result);
        result
    }

    fn delete_inner(&self, id: AssignmentId) -> LifecycleResult<LifecycleOutcome> {
        let assignment = self.load(id)?;
        self.store.delete(id)?;

        let reminder = match self.queue.cancel(id) {
            Ok(()) => ReminderOutcome::Cancelled,
            Err(err) => self.scheduling_failed(id, "cancel", err),
        };
        Ok(LifecycleOutcome {
            assignment,
            reminder,
        })
    }

    /// Reads one assignment for the detail view.
    pub fn get(&self, id: AssignmentId) -> LifecycleResult<Option<Assignment>> {
        Ok(self.store.get_by_id(id)?)
    }

    fn load(&self, id: AssignmentId) -> LifecycleResult<Assignment> {
        self.store
            .get_by_id(id)?
            .ok_or(LifecycleError::Persistence(StoreError::NotFound(id)))
    }

    fn replan(&self, id: AssignmentId, assignment: &Assignment) -> ReminderOutcome {
        let decision = self.planner.plan(assignment, self.clock.now());
        match self.queue.upsert(id, &decision) {
            Ok(()) => match decision {
                ReminderDecision::Schedule { fire_at, .. } => ReminderOutcome::Scheduled { fire_at },
                ReminderDecision::Skip => ReminderOutcome::Skipped,
            },
            Err(err) => self.scheduling_failed(id, "upsert", err),
        }
    }

    fn scheduling_failed(
        &self,
        id: AssignmentId,
        step: &str,
        err: SchedulingError,
    ) -> ReminderOutcome {
        warn!(
            "event=reminder_{step} module=lifecycle status=error assignment_id={id} error={err}"
        );
        ReminderOutcome::Failed(err)
    }

    fn now(&self) -> NaiveDateTime {
        let now = self.clock.now();
        now.with_nanosecond(0).unwrap_or(now)
    }

    fn log_result(
        &self,
        op: &str,
        id: Option<AssignmentId>,
        started_at: Instant,
        result: &LifecycleResult<LifecycleOutcome>,
    ) {
        let duration_ms = started_at.elapsed().as_millis();
        match result {
            Ok(outcome) => info!(
                "event=assignment_{op} module=lifecycle status=ok assignment_id={} reminder={} duration_ms={duration_ms}",
                outcome.assignment.id.unwrap_or_default(),
                reminder_label(&outcome.reminder)
            ),
            Err(err) => warn!(
                "event=assignment_{op} module=lifecycle status=error assignment_id={} duration_ms={duration_ms} error={err}",
                id.map(|value| value.to_string()).unwrap_or_else(|| "none".to_string())
            ),
        }
    }
}

fn reminder_label(outcome: &ReminderOutcome) -> &'static str {
    match outcome {
        ReminderOutcome::Scheduled { .. } => "scheduled",
        ReminderOutcome::Skipped => "skipped",
        ReminderOutcome::Cancelled => "cancelled",
        ReminderOutcome::Failed(_) => "failed",
    }
}

#[cfg(test)]
mod tests {
    use super::{LifecycleError, ReminderOutcome};
    use crate::model::assignment::AssignmentValidationError;
    use crate::reminder::executor::SchedulingError;
    use crate::store::assignment_store::StoreError;

    #[test]
    fn store_validation_errors_surface_as_validation() {
        let err = LifecycleError::from(StoreError::Validation(
            AssignmentValidationError::BlankTitle,
        ));
        assert!(matches!(err, LifecycleError::Validation(_)));

        let err = LifecycleError::from(StoreError::NotFound(3));
        assert!(matches!(
            err,
            LifecycleError::Persistence(StoreError::NotFound(3))
        ));
    }

    #[test]
    fn only_failed_outcome_reports_failure() {
        assert!(ReminderOutcome::Failed(SchedulingError::Unavailable("down".into())).is_failed());
        assert!(!ReminderOutcome::Skipped.is_failed());
        assert!(!ReminderOutcome::Cancelled.is_failed());
    }
}
