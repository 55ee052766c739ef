//! Screen projections over one store emission.
//!
//! Both projections keep the store's due order inside each group.

use crate::model::assignment::{Assignment, Status};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

/// Board view: one column per status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BoardColumns {
    pub not_started: Vec<Assignment>,
    pub in_progress: Vec<Assignment>,
    pub done: Vec<Assignment>,
}

impl BoardColumns {
    pub fn from_assignments(assignments: impl IntoIterator<Item = Assignment>) -> Self {
        let mut columns = Self::default();
        for assignment in assignments {
            columns.column_mut(assignment.status).push(assignment);
        }
        columns
    }

    pub fn column(&self, status: Status) -> &[Assignment] {
        match status {
            Status::NotStarted => &self.not_started,
            Status::InProgress => &self.in_progress,
            Status::Done => &self.done,
        }
    }

    fn column_mut(&mut self, status: Status) -> &mut Vec<Assignment> {
        match status {
            Status::NotStarted => &mut self.not_started,
            Status::InProgress => &mut self.in_progress,
            Status::Done => &mut self.done,
        }
    }
}

/// Calendar view: assignments keyed by due date, dates ascending.
pub fn group_by_due_date(
    assignments: impl IntoIterator<Item = Assignment>,
) -> BTreeMap<NaiveDate, Vec<Assignment>> {
    let mut days: BTreeMap<NaiveDate, Vec<Assignment>> = BTreeMap::new();
    for assignment in assignments {
        days.entry(assignment.due_date).or_default().push(assignment);
    }
    days
}
