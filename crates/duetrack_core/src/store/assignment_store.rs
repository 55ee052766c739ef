//! Assignment store contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD and ordered queries over the `assignments` table.
//! - Publish a revision counter after every committed write so live
//!   subscriptions know when to re-query.
//!
//! # Invariants
//! - Write paths call `Assignment::validate()` before SQL mutations.
//! - Every list query is ordered by `(due_date, due_time)` ascending with the
//!   row id as a stable tie-breaker, except `CompletedSince` which lists most
//!   recently updated first.
//! - Read paths reject invalid persisted values instead of masking them.

use crate::db::DbError;
use crate::model::assignment::{
    Assignment, AssignmentId, AssignmentValidationError, Priority, Status,
};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use log::debug;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Mutex, MutexGuard};
use tokio::sync::watch;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S";
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const ASSIGNMENT_SELECT_SQL: &str = "SELECT
    id,
    title,
    description,
    due_date,
    due_time,
    priority,
    status,
    created_at,
    updated_at
FROM assignments";

const DUE_ORDER_SQL: &str = " ORDER BY due_date ASC, due_time ASC, id ASC";

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence-side failure for store reads and writes.
#[derive(Debug)]
pub enum StoreError {
    Validation(AssignmentValidationError),
    Db(DbError),
    NotFound(AssignmentId),
    /// Update was attempted on a record that was never persisted.
    MissingId,
    InvalidData(String),
    /// The backing store cannot serve requests (poisoned lock, closed backend).
    Unavailable(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "assignment not found: {id}"),
            Self::MissingId => write!(f, "assignment has no id; insert it first"),
            Self::InvalidData(message) => {
                write!(f, "invalid persisted assignment data: {message}")
            }
            Self::Unavailable(message) => write!(f, "assignment store unavailable: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::MissingId | Self::InvalidData(_) | Self::Unavailable(_) => {
                None
            }
        }
    }
}

impl From<AssignmentValidationError> for StoreError {
    fn from(value: AssignmentValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Predicate description for list queries and live subscriptions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreQuery {
    All,
    /// Substring match on title or description.
    Search(String),
    ByStatus(Status),
    ByPriority(Priority),
    /// Not-done assignments due strictly before the given date.
    OverdueBefore(NaiveDate),
    /// Done assignments updated at or after the given instant.
    CompletedSince(NaiveDateTime),
}

impl StoreQuery {
    /// Short label for log lines; never includes user text.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Search(_) => "search",
            Self::ByStatus(_) => "by_status",
            Self::ByPriority(_) => "by_priority",
            Self::OverdueBefore(_) => "overdue",
            Self::CompletedSince(_) => "completed_since",
        }
    }
}

/// Durable keyed storage for assignments.
///
/// Implementations must be shareable across tasks; the core holds them as
/// `Arc<dyn AssignmentStore>`.
pub trait AssignmentStore: Send + Sync {
    /// Persists a new record and returns the generated id. Any `id` already
    /// set on `assignment` is ignored.
    fn insert(&self, assignment: &Assignment) -> StoreResult<AssignmentId>;
    fn update(&self, assignment: &Assignment) -> StoreResult<()>;
    fn delete(&self, id: AssignmentId) -> StoreResult<()>;
    fn get_by_id(&self, id: AssignmentId) -> StoreResult<Option<Assignment>>;
    fn fetch(&self, query: &StoreQuery) -> StoreResult<Vec<Assignment>>;
    /// Revision feed; the value changes after every committed write.
    fn changes(&self) -> watch::Receiver<u64>;
}

/// SQLite-backed assignment store over a single migrated connection.
pub struct SqliteAssignmentStore {
    conn: Mutex<Connection>,
    revision: watch::Sender<u64>,
}

impl SqliteAssignmentStore {
    /// Wraps a connection returned by [`crate::db::open_db`] or
    /// [`crate::db::open_db_in_memory`].
    pub fn new(conn: Connection) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            conn: Mutex::new(conn),
            revision,
        }
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Unavailable("connection lock poisoned".to_string()))
    }

    fn publish_change(&self) {
        self.revision.send_modify(|revision| *revision += 1);
    }
}

impl AssignmentStore for SqliteAssignmentStore {
    fn insert(&self, assignment: &Assignment) -> StoreResult<AssignmentId> {
        assignment.validate()?;

        let id = {
            let conn = self.lock()?;
            conn.execute(
                "INSERT INTO assignments (
                    title,
                    description,
                    due_date,
                    due_time,
                    priority,
                    status,
                    created_at,
                    updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
                params![
                    assignment.title.as_str(),
                    assignment.description.as_str(),
                    format_date(assignment.due_date),
                    format_time(assignment.due_time),
                    priority_to_db(assignment.priority),
                    status_to_db(assignment.status),
                    format_datetime(assignment.created_at),
                    format_datetime(assignment.updated_at),
                ],
            )?;
            conn.last_insert_rowid()
        };

        self.publish_change();
        debug!("event=store_insert module=store status=ok id={id}");
        Ok(id)
    }

    fn update(&self, assignment: &Assignment) -> StoreResult<()> {
        assignment.validate()?;
        let id = assignment.id.ok_or(StoreError::MissingId)?;

        let changed = self.lock()?.execute(
            "UPDATE assignments
             SET
                title = ?1,
                description = ?2,
                due_date = ?3,
                due_time = ?4,
                priority = ?5,
                status = ?6,
                created_at = ?7,
                updated_at = ?8
             WHERE id = ?9;",
            params![
                assignment.title.as_str(),
                assignment.description.as_str(),
                format_date(assignment.due_date),
                format_time(assignment.due_time),
                priority_to_db(assignment.priority),
                status_to_db(assignment.status),
                format_datetime(assignment.created_at),
                format_datetime(assignment.updated_at),
                id,
            ],
        )?;

        if changed == 0 {
            return Err(StoreError::NotFound(id));
        }

        self.publish_change();
        debug!("event=store_update module=store status=ok id={id}");
        Ok(())
    }

    fn delete(&self, id: AssignmentId) -> StoreResult<()> {
        let changed = self
            .lock()?
            .execute("DELETE FROM assignments WHERE id = ?1;", [id])?;

        if changed == 0 {
            return Err(StoreError::NotFound(id));
        }

        self.publish_change();
        debug!("event=store_delete module=store status=ok id={id}");
        Ok(())
    }

    fn get_by_id(&self, id: AssignmentId) -> StoreResult<Option<Assignment>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!("{ASSIGNMENT_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_assignment_row(row)?));
        }
        Ok(None)
    }

    fn fetch(&self, query: &StoreQuery) -> StoreResult<Vec<Assignment>> {
        let mut sql = String::from(ASSIGNMENT_SELECT_SQL);
        let mut bind_values: Vec<Value> = Vec::new();

        match query {
            StoreQuery::All => sql.push_str(DUE_ORDER_SQL),
            StoreQuery::Search(text) => {
                sql.push_str(
                    " WHERE title LIKE ?1 ESCAPE '\\' OR description LIKE ?1 ESCAPE '\\'",
                );
                sql.push_str(DUE_ORDER_SQL);
                bind_values.push(Value::Text(format!("%{}%", escape_like(text))));
            }
            StoreQuery::ByStatus(status) => {
                sql.push_str(" WHERE status = ?1");
                sql.push_str(DUE_ORDER_SQL);
                bind_values.push(Value::Text(status_to_db(*status).to_string()));
            }
            StoreQuery::ByPriority(priority) => {
                sql.push_str(" WHERE priority = ?1");
                sql.push_str(DUE_ORDER_SQL);
                bind_values.push(Value::Text(priority_to_db(*priority).to_string()));
            }
            StoreQuery::OverdueBefore(today) => {
                sql.push_str(" WHERE due_date < ?1 AND status != 'DONE'");
                sql.push_str(DUE_ORDER_SQL);
                bind_values.push(Value::Text(format_date(*today)));
            }
            StoreQuery::CompletedSince(since) => {
                sql.push_str(
                    " WHERE status = 'DONE' AND updated_at >= ?1 ORDER BY updated_at DESC, id ASC",
                );
                bind_values.push(Value::Text(format_datetime(*since)));
            }
        }

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut assignments = Vec::new();
        while let Some(row) = rows.next()? {
            assignments.push(parse_assignment_row(row)?);
        }

        Ok(assignments)
    }

    fn changes(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }
}

fn parse_assignment_row(row: &Row<'_>) -> StoreResult<Assignment> {
    let due_date_text: String = row.get("due_date")?;
    let due_date = NaiveDate::parse_from_str(&due_date_text, DATE_FORMAT).map_err(|_| {
        StoreError::InvalidData(format!(
            "invalid date `{due_date_text}` in assignments.due_date"
        ))
    })?;

    let due_time_text: String = row.get("due_time")?;
    let due_time = NaiveTime::parse_from_str(&due_time_text, TIME_FORMAT).map_err(|_| {
        StoreError::InvalidData(format!(
            "invalid time `{due_time_text}` in assignments.due_time"
        ))
    })?;

    let priority_text: String = row.get("priority")?;
    let priority = parse_priority(&priority_text).ok_or_else(|| {
        StoreError::InvalidData(format!(
            "invalid priority `{priority_text}` in assignments.priority"
        ))
    })?;

    let status_text: String = row.get("status")?;
    let status = parse_status(&status_text).ok_or_else(|| {
        StoreError::InvalidData(format!(
            "invalid status `{status_text}` in assignments.status"
        ))
    })?;

    Ok(Assignment {
        id: Some(row.get("id")?),
        title: row.get("title")?,
        description: row.get("description")?,
        due_date,
        due_time,
        priority,
        status,
        created_at: parse_datetime_column(row, "created_at")?,
        updated_at: parse_datetime_column(row, "updated_at")?,
    })
}

fn parse_datetime_column(row: &Row<'_>, column: &str) -> StoreResult<NaiveDateTime> {
    let text: String = row.get(column)?;
    NaiveDateTime::parse_from_str(&text, DATETIME_FORMAT).map_err(|_| {
        StoreError::InvalidData(format!("invalid timestamp `{text}` in assignments.{column}"))
    })
}

fn format_date(value: NaiveDate) -> String {
    value.format(DATE_FORMAT).to_string()
}

fn format_time(value: NaiveTime) -> String {
    value.format(TIME_FORMAT).to_string()
}

fn format_datetime(value: NaiveDateTime) -> String {
    value.format(DATETIME_FORMAT).to_string()
}

fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

fn priority_to_db(priority: Priority) -> &'static str {
    match priority {
        Priority::Low => "LOW",
        Priority::Medium => "MEDIUM",
        Priority::High => "HIGH",
        Priority::Urgent => "URGENT",
    }
}

fn parse_priority(value: &str) -> Option<Priority> {
    match value {
        "LOW" => Some(Priority::Low),
        "MEDIUM" => Some(Priority::Medium),
        "HIGH" => Some(Priority::High),
        "URGENT" => Some(Priority::Urgent),
        _ => None,
    }
}

fn status_to_db(status: Status) -> &'static str {
    match status {
        Status::NotStarted => "NOT_STARTED",
        Status::InProgress => "IN_PROGRESS",
        Status::Done => "DONE",
    }
}

fn parse_status(value: &str) -> Option<Status> {
    match value {
        "NOT_STARTED" => Some(Status::NotStarted),
        "IN_PROGRESS" => Some(Status::InProgress),
        "DONE" => Some(Status::Done),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::escape_like;

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("plain"), "plain");
    }
}
