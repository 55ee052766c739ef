//! Assignment domain model.
//!
//! # Responsibility
//! - Define the canonical assignment record and its enumerations.
//! - Validate write-side invariants before persistence.
//!
//! # Invariants
//! - `id` is assigned by the store on insert and never changes afterwards.
//! - `due_date` + `due_time` identify exactly one local due instant.
//! - `updated_at` is never earlier than `created_at`.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Store-generated row identifier.
pub type AssignmentId = i64;

/// Urgency level chosen by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

/// Progress state of an assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    #[default]
    NotStarted,
    InProgress,
    Done,
}

impl Status {
    /// Next state in the board cycle `NotStarted -> InProgress -> Done -> NotStarted`.
    pub fn next(self) -> Self {
        match self {
            Self::NotStarted => Self::InProgress,
            Self::InProgress => Self::Done,
            Self::Done => Self::NotStarted,
        }
    }

    pub fn is_done(self) -> bool {
        self == Self::Done
    }
}

/// Write-side validation failures for [`Assignment`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignmentValidationError {
    /// Title is empty or whitespace only.
    BlankTitle,
    /// `updated_at` precedes `created_at`.
    UpdatedBeforeCreated {
        created_at: NaiveDateTime,
        updated_at: NaiveDateTime,
    },
}

impl Display for AssignmentValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankTitle => write!(f, "title is required"),
            Self::UpdatedBeforeCreated {
                created_at,
                updated_at,
            } => write!(
                f,
                "updated_at {updated_at} is earlier than created_at {created_at}"
            ),
        }
    }
}

impl Error for AssignmentValidationError {}

/// Canonical assignment record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    /// `None` until the store has persisted the record.
    pub id: Option<AssignmentId>,
    pub title: String,
    /// May be empty.
    pub description: String,
    pub due_date: NaiveDate,
    pub due_time: NaiveTime,
    pub priority: Priority,
    pub status: Status,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Assignment {
    /// Builds an unsaved assignment from user input, stamped at `now`.
    pub fn from_draft(draft: AssignmentDraft, now: NaiveDateTime) -> Self {
        Self {
            id: None,
            title: draft.title,
            description: draft.description,
            due_date: draft.due_date,
            due_time: draft.due_time,
            priority: draft.priority,
            status: draft.status,
            created_at: now,
            updated_at: now,
        }
    }

    /// The local instant this assignment is due.
    pub fn due_at(&self) -> NaiveDateTime {
        self.due_date.and_time(self.due_time)
    }

    /// Checks invariants required before any write.
    pub fn validate(&self) -> Result<(), AssignmentValidationError> {
        if self.title.trim().is_empty() {
            return Err(AssignmentValidationError::BlankTitle);
        }
        if self.updated_at < self.created_at {
            return Err(AssignmentValidationError::UpdatedBeforeCreated {
                created_at: self.created_at,
                updated_at: self.updated_at,
            });
        }
        Ok(())
    }

    /// Whether this record is past due at `today` and still open.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !self.status.is_done() && self.due_date < today
    }
}

/// User-supplied fields for a new assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub due_date: NaiveDate,
    pub due_time: NaiveTime,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub status: Status,
}

impl AssignmentDraft {
    /// Draft with empty description, `Medium` priority and `NotStarted` status.
    pub fn new(title: impl Into<String>, due_date: NaiveDate, due_time: NaiveTime) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            due_date,
            due_time,
            priority: Priority::default(),
            status: Status::default(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::{Assignment, AssignmentDraft, AssignmentValidationError, Priority, Status};
    use chrono::{NaiveDate, NaiveTime};

    fn sample() -> Assignment {
        let now = NaiveDate::from_ymd_opt(2026, 3, 2)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        Assignment::from_draft(
            AssignmentDraft::new(
                "Essay",
                NaiveDate::from_ymd_opt(2026, 3, 10).unwrap(),
                NaiveTime::from_hms_opt(23, 59, 0).unwrap(),
            ),
            now,
        )
    }

    #[test]
    fn status_cycle_wraps_after_done() {
        assert_eq!(Status::NotStarted.next(), Status::InProgress);
        assert_eq!(Status::InProgress.next(), Status::Done);
        assert_eq!(Status::Done.next(), Status::NotStarted);
    }

    #[test]
    fn draft_defaults_match_new_assignment_form() {
        let assignment = sample();
        assert_eq!(assignment.priority, Priority::Medium);
        assert_eq!(assignment.status, Status::NotStarted);
        assert!(assignment.description.is_empty());
        assert_eq!(assignment.created_at, assignment.updated_at);
        assert!(assignment.id.is_none());
    }

    #[test]
    fn whitespace_title_is_rejected() {
        let mut assignment = sample();
        assignment.title = "  \t ".to_string();
        assert_eq!(
            assignment.validate(),
            Err(AssignmentValidationError::BlankTitle)
        );
    }

    #[test]
    fn updated_before_created_is_rejected() {
        let mut assignment = sample();
        assignment.updated_at = assignment.created_at - chrono::Duration::seconds(1);
        assert!(matches!(
            assignment.validate(),
            Err(AssignmentValidationError::UpdatedBeforeCreated { .. })
        ));
    }

    #[test]
    fn done_assignments_are_never_overdue() {
        let mut assignment = sample();
        let later = NaiveDate::from_ymd_opt(2026, 4, 1).unwrap();
        assert!(assignment.is_overdue(later));
        assignment.status = Status::Done;
        assert!(!assignment.is_overdue(later));
    }
}
