//! Key/value preferences store.
//!
//! # Responsibility
//! - Persist [`UserPreferences`] fields as individual rows in `preferences`.
//!
//! # Invariants
//! - Missing keys read back as the field's default.
//! - Unknown theme values are rejected rather than silently reset.

use crate::model::preferences::{ThemeMode, UserPreferences};
use crate::store::assignment_store::{StoreError, StoreResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Mutex, MutexGuard};

const KEY_USER_NAME: &str = "user_name";
const KEY_COURSE: &str = "course";
const KEY_ACADEMIC_YEAR: &str = "academic_year";
const KEY_THEME_MODE: &str = "theme_mode";
const KEY_ONBOARDING_DONE: &str = "has_completed_onboarding";

/// Preference persistence used by the presentation layer.
pub trait PreferencesStore: Send + Sync {
    fn load(&self) -> StoreResult<UserPreferences>;
    fn save(&self, preferences: &UserPreferences) -> StoreResult<()>;

    /// Display name used for the list greeting. Empty when unset.
    fn user_name(&self) -> StoreResult<String> {
        Ok(self.load()?.user_name)
    }
}

pub struct SqlitePreferencesStore {
    conn: Mutex<Connection>,
}

impl SqlitePreferencesStore {
    /// Wraps a migrated connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Applies `edit` to the stored preferences and writes the result back.
    pub fn update(&self, edit: impl FnOnce(&mut UserPreferences)) -> StoreResult<UserPreferences> {
        let mut preferences = self.load()?;
        edit(&mut preferences);
        self.save(&preferences)?;
        Ok(preferences)
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Unavailable("preferences lock poisoned".to_string()))
    }
}

impl PreferencesStore for SqlitePreferencesStore {
    fn load(&self) -> StoreResult<UserPreferences> {
        let conn = self.lock()?;
        let read = |key: &str| -> StoreResult<Option<String>> {
            Ok(conn
                .query_row(
                    "SELECT value FROM preferences WHERE key = ?1;",
                    [key],
                    |row| row.get::<_, String>(0),
                )
                .optional()?)
        };

        let theme_mode = match read(KEY_THEME_MODE)? {
            Some(value) => parse_theme_mode(&value).ok_or_else(|| {
                StoreError::InvalidData(format!("invalid theme mode `{value}` in preferences"))
            })?,
            None => ThemeMode::default(),
        };

        Ok(UserPreferences {
            user_name: read(KEY_USER_NAME)?.unwrap_or_default(),
            course: read(KEY_COURSE)?.unwrap_or_default(),
            academic_year: read(KEY_ACADEMIC_YEAR)?.unwrap_or_default(),
            theme_mode,
            has_completed_onboarding: read(KEY_ONBOARDING_DONE)?.as_deref() == Some("true"),
        })
    }

    fn save(&self, preferences: &UserPreferences) -> StoreResult<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let entries = [
            (KEY_USER_NAME, preferences.user_name.as_str()),
            (KEY_COURSE, preferences.course.as_str()),
            (KEY_ACADEMIC_YEAR, preferences.academic_year.as_str()),
            (KEY_THEME_MODE, theme_mode_to_db(preferences.theme_mode)),
            (
                KEY_ONBOARDING_DONE,
                if preferences.has_completed_onboarding {
                    "true"
                } else {
                    "false"
                },
            ),
        ];
        for (key, value) in entries {
            tx.execute(
                "INSERT INTO preferences (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value;",
                params![key, value],
            )?;
        }
        tx.commit()?;
        Ok(())
    }
}

fn theme_mode_to_db(mode: ThemeMode) -> &'static str {
    match mode {
        ThemeMode::Light => "LIGHT",
        ThemeMode::Dark => "DARK",
        ThemeMode::System => "SYSTEM",
    }
}

fn parse_theme_mode(value: &str) -> Option<ThemeMode> {
    match value {
        "LIGHT" => Some(ThemeMode::Light),
        "DARK" => Some(ThemeMode::Dark),
        "SYSTEM" => Some(ThemeMode::System),
        _ => None,
    }
}
