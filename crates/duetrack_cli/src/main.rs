//! CLI smoke entry point.
//!
//! # Responsibility
//! - Wire store, reminder executor and coordinator the way an app shell does.
//! - Print a deterministic summary of the database for quick sanity checks.
//!
//! Usage: `duetrack_cli [DB_PATH] [LOG_DIR]`. Without `DB_PATH` an in-memory
//! database seeded with one sample assignment is used.

use chrono::{Duration, NaiveTime};
use duetrack_core::{
    default_log_level, init_logging, open_db, open_db_in_memory, AnalyticsService,
    AssignmentDraft, AssignmentStore, BoardColumns, Clock, CoreConfig, LifecycleCoordinator,
    LogNotifier, Priority, ReminderPlanner, ReminderQueue, SqliteAssignmentStore, Status,
    StoreQuery, SystemClock, TokioReminderExecutor,
};
use std::error::Error;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("duetrack: {err}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn Error>> {
    let mut args = std::env::args().skip(1);
    let db_path = args.next();
    if let Some(log_dir) = args.next() {
        init_logging(default_log_level(), log_dir)?;
    }

    let conn = match &db_path {
        Some(path) => open_db(path)?,
        None => open_db_in_memory()?,
    };
    let config = CoreConfig::default();
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let store: Arc<dyn AssignmentStore> = Arc::new(SqliteAssignmentStore::new(conn));
    let executor = TokioReminderExecutor::new(Arc::clone(&clock), Arc::new(LogNotifier))?;
    let coordinator = LifecycleCoordinator::new(
        Arc::clone(&store),
        ReminderQueue::new(Arc::new(executor)),
        ReminderPlanner::from_config(&config),
        Arc::clone(&clock),
    );

    if db_path.is_none() {
        let tomorrow = clock.now().date() + Duration::days(1);
        let ten_am = NaiveTime::from_hms_opt(10, 0, 0).unwrap_or(NaiveTime::MIN);
        let outcome = coordinator.create(
            AssignmentDraft::new("Sample assignment", tomorrow, ten_am)
                .with_priority(Priority::High),
        )?;
        println!("seeded reminder={:?}", outcome.reminder);
    }

    println!("duetrack_core version={}", duetrack_core::core_version());

    let snapshot = AnalyticsService::new(Arc::clone(&store), Arc::clone(&clock)).snapshot()?;
    println!(
        "completed_this_week={} overdue={}",
        snapshot.completed_this_week, snapshot.overdue_count
    );

    let board = BoardColumns::from_assignments(store.fetch(&StoreQuery::All)?);
    for status in [Status::NotStarted, Status::InProgress, Status::Done] {
        println!("{status:?}:");
        for assignment in board.column(status) {
            println!(
                "  #{} {} due {} {} [{:?}]",
                assignment.id.unwrap_or_default(),
                assignment.title,
                assignment.due_date,
                assignment.due_time,
                assignment.priority
            );
        }
    }

    Ok(())
}
