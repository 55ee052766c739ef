//! User preference record.
//!
//! Owned by the preferences store; the core only reads `user_name`.

use serde::{Deserialize, Serialize};

/// Theme choice persisted for the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ThemeMode {
    Light,
    Dark,
    #[default]
    System,
}

/// Profile and onboarding state. Missing keys read as `Default`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserPreferences {
    pub user_name: String,
    pub course: String,
    pub academic_year: String,
    pub theme_mode: ThemeMode,
    pub has_completed_onboarding: bool,
}

impl UserPreferences {
    /// Header shown above the assignment list, only when a name is set.
    pub fn greeting(&self) -> Option<String> {
        let name = self.user_name.trim();
        if name.is_empty() {
            None
        } else {
            Some(format!("Hey {name},"))
        }
    }
}
