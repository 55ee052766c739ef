use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use duetrack_core::db::open_db_in_memory;
use duetrack_core::{
    Assignment, AssignmentDraft, AssignmentStore, AssignmentValidationError, Priority,
    SqliteAssignmentStore, Status, StoreError, StoreQuery,
};

fn created_at() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 4, 1)
        .unwrap()
        .and_hms_opt(8, 0, 0)
        .unwrap()
}

fn draft(title: &str, day: u32, hour: u32) -> Assignment {
    Assignment::from_draft(
        AssignmentDraft::new(
            title,
            NaiveDate::from_ymd_opt(2026, 4, day).unwrap(),
            NaiveTime::from_hms_opt(hour, 0, 0).unwrap(),
        ),
        created_at(),
    )
}

fn new_store() -> SqliteAssignmentStore {
    SqliteAssignmentStore::new(open_db_in_memory().unwrap())
}

fn titles(list: &[Assignment]) -> Vec<&str> {
    list.iter().map(|a| a.title.as_str()).collect()
}

#[test]
fn insert_and_get_roundtrip() {
    let store = new_store();
    let mut assignment = draft("Essay", 10, 23);
    assignment.description = "Two thousand words".to_string();
    assignment.priority = Priority::Urgent;

    let id = store.insert(&assignment).unwrap();
    let loaded = store.get_by_id(id).unwrap().unwrap();

    assignment.id = Some(id);
    assert_eq!(loaded, assignment);
}

#[test]
fn insert_ignores_caller_supplied_id() {
    let store = new_store();
    let mut assignment = draft("Essay", 10, 23);
    assignment.id = Some(500);

    let id = store.insert(&assignment).unwrap();
    assert_ne!(id, 500);
    assert!(store.get_by_id(500).unwrap().is_none());
}

#[test]
fn all_is_ordered_by_due_date_then_time() {
    let store = new_store();
    store.insert(&draft("late", 12, 9)).unwrap();
    store.insert(&draft("early afternoon", 5, 14)).unwrap();
    store.insert(&draft("early morning", 5, 8)).unwrap();

    let all = store.fetch(&StoreQuery::All).unwrap();
    assert_eq!(titles(&all), vec!["early morning", "early afternoon", "late"]);
}

#[test]
fn same_due_instant_falls_back_to_insertion_order() {
    let store = new_store();
    store.insert(&draft("first", 5, 9)).unwrap();
    store.insert(&draft("second", 5, 9)).unwrap();

    let all = store.fetch(&StoreQuery::All).unwrap();
    assert_eq!(titles(&all), vec!["first", "second"]);
}

#[test]
fn search_matches_title_or_description_case_insensitively() {
    let store = new_store();
    store.insert(&draft("Physics lab", 3, 9)).unwrap();
    let mut described = draft("Reading", 4, 9);
    described.description = "chapter on PHYSICS of sound".to_string();
    store.insert(&described).unwrap();
    store.insert(&draft("History essay", 5, 9)).unwrap();

    let hits = store
        .fetch(&StoreQuery::Search("physics".to_string()))
        .unwrap();
    assert_eq!(titles(&hits), vec!["Physics lab", "Reading"]);
}

#[test]
fn search_treats_like_wildcards_literally() {
    let store = new_store();
    store.insert(&draft("100% effort", 3, 9)).unwrap();
    store.insert(&draft("1000 words", 4, 9)).unwrap();

    let hits = store.fetch(&StoreQuery::Search("0%".to_string())).unwrap();
    assert_eq!(titles(&hits), vec!["100% effort"]);
}

#[test]
fn status_and_priority_filters() {
    let store = new_store();
    let mut done = draft("done", 3, 9);
    done.status = Status::Done;
    store.insert(&done).unwrap();
    let mut urgent = draft("urgent", 4, 9);
    urgent.priority = Priority::Urgent;
    store.insert(&urgent).unwrap();

    let by_status = store.fetch(&StoreQuery::ByStatus(Status::Done)).unwrap();
    assert_eq!(titles(&by_status), vec!["done"]);

    let by_priority = store
        .fetch(&StoreQuery::ByPriority(Priority::Urgent))
        .unwrap();
    assert_eq!(titles(&by_priority), vec!["urgent"]);
}

#[test]
fn overdue_excludes_done_and_today() {
    let store = new_store();
    store.insert(&draft("yesterday open", 9, 9)).unwrap();
    let mut closed = draft("yesterday done", 9, 10);
    closed.status = Status::Done;
    store.insert(&closed).unwrap();
    store.insert(&draft("today", 10, 9)).unwrap();

    let today = NaiveDate::from_ymd_opt(2026, 4, 10).unwrap();
    let overdue = store.fetch(&StoreQuery::OverdueBefore(today)).unwrap();
    assert_eq!(titles(&overdue), vec!["yesterday open"]);
}

#[test]
fn update_and_delete_missing_rows_are_not_found() {
    let store = new_store();
    let mut ghost = draft("ghost", 3, 9);
    ghost.id = Some(42);

    assert!(matches!(
        store.update(&ghost).unwrap_err(),
        StoreError::NotFound(42)
    ));
    assert!(matches!(
        store.delete(42).unwrap_err(),
        StoreError::NotFound(42)
    ));
}

#[test]
fn update_without_id_is_rejected() {
    let store = new_store();
    assert!(matches!(
        store.update(&draft("unsaved", 3, 9)).unwrap_err(),
        StoreError::MissingId
    ));
}

#[test]
fn blank_title_never_reaches_the_table() {
    let store = new_store();
    let err = store.insert(&draft("   ", 3, 9)).unwrap_err();
    assert!(matches!(
        err,
        StoreError::Validation(AssignmentValidationError::BlankTitle)
    ));
    assert!(store.fetch(&StoreQuery::All).unwrap().is_empty());
}

#[test]
fn writes_bump_the_revision_feed() {
    let store = new_store();
    let changes = store.changes();
    let before = *changes.borrow();

    let id = store.insert(&draft("Essay", 3, 9)).unwrap();
    store.delete(id).unwrap();
    let _ = store.delete(id);

    assert_eq!(*changes.borrow(), before + 2);
}

#[test]
fn corrupt_rows_are_reported_as_invalid_data() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO assignments (title, due_date, due_time, priority, status, created_at, updated_at)
         VALUES ('Broken', 'next week', '09:00:00', 'LOW', 'DONE',
                 '2026-04-01 08:00:00', '2026-04-01 08:00:00');",
        [],
    )
    .unwrap();
    let store = SqliteAssignmentStore::new(conn);

    assert!(matches!(
        store.fetch(&StoreQuery::All).unwrap_err(),
        StoreError::InvalidData(_)
    ));
}
