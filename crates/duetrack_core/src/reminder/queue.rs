//! Reminder queue: the core's only entry point into the executor.
//!
//! # Responsibility
//! - Map assignment ids to unique executor keys.
//! - Translate planner decisions into enqueue calls.
//!
//! # Invariants
//! - Every executor call uses `reminder_{id}` as its key.
//! - The queue keeps no job table of its own; single-instance semantics come
//!   from the executor's replace-on-conflict enqueue.

use crate::model::assignment::AssignmentId;
use crate::reminder::executor::{ReminderExecutor, SchedulingResult};
use crate::reminder::planner::ReminderDecision;
use log::debug;
use std::sync::Arc;

/// Unique executor key for an assignment's reminder.
pub fn reminder_key(assignment_id: AssignmentId) -> String {
    format!("reminder_{assignment_id}")
}

#[derive(Clone)]
pub struct ReminderQueue {
    executor: Arc<dyn ReminderExecutor>,
}

impl ReminderQueue {
    pub fn new(executor: Arc<dyn ReminderExecutor>) -> Self {
        Self { executor }
    }

    /// Schedules per `decision`, replacing any job for `assignment_id`.
    ///
    /// `Skip` makes no executor call; an existing job is left to the caller's
    /// preceding `cancel`.
    pub fn upsert(
        &self,
        assignment_id: AssignmentId,
        decision: &ReminderDecision,
    ) -> SchedulingResult<()> {
        match decision {
            ReminderDecision::Schedule { fire_at, payload } => {
                self.executor
                    .enqueue_unique(&reminder_key(assignment_id), *fire_at, payload)
            }
            ReminderDecision::Skip => {
                debug!("event=reminder_upsert module=reminder status=skip assignment_id={assignment_id}");
                Ok(())
            }
        }
    }

    /// Drops any pending job for `assignment_id`. Safe to repeat.
    pub fn cancel(&self, assignment_id: AssignmentId) -> SchedulingResult<()> {
        self.executor.cancel(&reminder_key(assignment_id))
    }
}
