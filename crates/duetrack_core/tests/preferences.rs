use duetrack_core::db::{open_db, open_db_in_memory};
use duetrack_core::{
    PreferencesStore, SqlitePreferencesStore, StoreError, ThemeMode, UserPreferences,
};

#[test]
fn empty_table_loads_defaults() {
    let store = SqlitePreferencesStore::new(open_db_in_memory().unwrap());
    let prefs = store.load().unwrap();

    assert_eq!(prefs, UserPreferences::default());
    assert_eq!(prefs.theme_mode, ThemeMode::System);
    assert!(!prefs.has_completed_onboarding);
    assert_eq!(store.user_name().unwrap(), "");
}

#[test]
fn saved_preferences_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("prefs.db");

    let saved = SqlitePreferencesStore::new(open_db(&path).unwrap())
        .update(|prefs| {
            prefs.user_name = "Ada".to_string();
            prefs.course = "Computer Science".to_string();
            prefs.academic_year = "Year 2".to_string();
            prefs.theme_mode = ThemeMode::Dark;
            prefs.has_completed_onboarding = true;
        })
        .unwrap();

    let reopened = SqlitePreferencesStore::new(open_db(&path).unwrap());
    assert_eq!(reopened.load().unwrap(), saved);
    assert_eq!(reopened.load().unwrap().greeting().as_deref(), Some("Hey Ada,"));
}

#[test]
fn saving_twice_overwrites_values() {
    let store = SqlitePreferencesStore::new(open_db_in_memory().unwrap());
    store.update(|prefs| prefs.user_name = "Ada".to_string()).unwrap();
    store.update(|prefs| prefs.user_name = "Grace".to_string()).unwrap();

    assert_eq!(store.user_name().unwrap(), "Grace");
}

#[test]
fn unknown_theme_value_is_invalid_data() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO preferences (key, value) VALUES ('theme_mode', 'SEPIA');",
        [],
    )
    .unwrap();
    let store = SqlitePreferencesStore::new(conn);

    assert!(matches!(
        store.load().unwrap_err(),
        StoreError::InvalidData(_)
    ));
}

#[test]
fn theme_mode_wire_names_are_upper_case() {
    assert_eq!(serde_json::to_string(&ThemeMode::Light).unwrap(), "\"LIGHT\"");
    let prefs: UserPreferences = serde_json::from_str(
        r#"{"user_name":"Ada","course":"","academic_year":"","theme_mode":"DARK","has_completed_onboarding":false}"#,
    )
    .unwrap();
    assert_eq!(prefs.theme_mode, ThemeMode::Dark);
}
