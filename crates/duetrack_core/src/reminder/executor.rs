//! Deferred-job executor seam and an in-process tokio implementation.
//!
//! # Responsibility
//! - Define the unique-key executor contract the reminder queue targets.
//! - Run reminder timers on a tokio runtime and hand fired payloads to a
//!   [`ReminderNotifier`].
//!
//! # Invariants
//! - At most one pending job per key; enqueueing under a taken key replaces
//!   the old job under the same lock, so both can never fire.
//! - A replaced or cancelled job never reaches the notifier.

use crate::clock::Clock;
use crate::reminder::planner::{ReminderPayload, REMINDER_ALERT_TITLE};
use chrono::NaiveDateTime;
use log::{info, warn};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;

pub type SchedulingResult<T> = Result<T, SchedulingError>;

/// Executor-side failure. Never undoes a persisted write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulingError {
    /// The executor cannot accept work (no runtime, poisoned state).
    Unavailable(String),
    /// The executor refused this particular job.
    Rejected { key: String, reason: String },
}

impl Display for SchedulingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(message) => write!(f, "reminder executor unavailable: {message}"),
            Self::Rejected { key, reason } => {
                write!(f, "reminder job `{key}` rejected: {reason}")
            }
        }
    }
}

impl Error for SchedulingError {}

/// Keyed single-slot scheduler.
pub trait ReminderExecutor: Send + Sync {
    /// Schedules `payload` for `fire_at`, replacing any job under `key`.
    fn enqueue_unique(
        &self,
        key: &str,
        fire_at: NaiveDateTime,
        payload: &ReminderPayload,
    ) -> SchedulingResult<()>;

    /// Removes any job under `key`. A missing key is not an error.
    fn cancel(&self, key: &str) -> SchedulingResult<()>;
}

/// Presents a fired reminder to the user.
pub trait ReminderNotifier: Send + Sync {
    fn notify(&self, payload: &ReminderPayload);
}

/// Notifier that only records the firing in the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl ReminderNotifier for LogNotifier {
    fn notify(&self, payload: &ReminderPayload) {
        info!(
            "event=reminder_fired module=reminder status=ok assignment_id={} due_date={}",
            payload.assignment_id, payload.due_date
        );
    }
}

/// Notifier forwarding fired payloads to a channel, e.g. a UI event loop.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<ReminderPayload>,
}

impl ChannelNotifier {
    pub fn new(tx: mpsc::UnboundedSender<ReminderPayload>) -> Self {
        Self { tx }
    }
}

impl ReminderNotifier for ChannelNotifier {
    fn notify(&self, payload: &ReminderPayload) {
        if self.tx.send(payload.clone()).is_err() {
            warn!(
                "event=reminder_fired module=reminder status=dropped assignment_id={} reason=receiver_closed",
                payload.assignment_id
            );
        }
    }
}

struct PendingJob {
    job_id: u64,
    fire_at: NaiveDateTime,
    handle: AbortHandle,
}

struct ExecutorState {
    jobs: Mutex<HashMap<String, PendingJob>>,
    next_job_id: AtomicU64,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn ReminderNotifier>,
}

impl ExecutorState {
    fn lock_jobs(&self) -> SchedulingResult<MutexGuard<'_, HashMap<String, PendingJob>>> {
        self.jobs
            .lock()
            .map_err(|_| SchedulingError::Unavailable("job table lock poisoned".to_string()))
    }

    fn fire(&self, key: &str, job_id: u64, payload: &ReminderPayload) {
        let still_current = match self.lock_jobs() {
            Ok(mut jobs) => {
                let current = jobs.get(key).is_some_and(|job| job.job_id == job_id);
                if current {
                    jobs.remove(key);
                }
                current
            }
            Err(err) => {
                warn!("event=reminder_fire module=reminder status=error key={key} error={err}");
                false
            }
        };

        if still_current {
            info!(
                "event=reminder_fire module=reminder status=ok key={key} alert={:?}",
                REMINDER_ALERT_TITLE
            );
            self.notifier.notify(payload);
        }
    }
}

/// In-process executor: one sleeping tokio task per pending key.
pub struct TokioReminderExecutor {
    state: Arc<ExecutorState>,
    runtime: Handle,
}

impl TokioReminderExecutor {
    /// Binds to the tokio runtime of the calling context.
    ///
    /// # Errors
    /// - `SchedulingError::Unavailable` when called outside a runtime.
    pub fn new(
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn ReminderNotifier>,
    ) -> SchedulingResult<Self> {
        let runtime = Handle::try_current()
            .map_err(|err| SchedulingError::Unavailable(format!("no tokio runtime: {err}")))?;
        Ok(Self::with_handle(runtime, clock, notifier))
    }

    pub fn with_handle(
        runtime: Handle,
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn ReminderNotifier>,
    ) -> Self {
        Self {
            state: Arc::new(ExecutorState {
                jobs: Mutex::new(HashMap::new()),
                next_job_id: AtomicU64::new(1),
                clock,
                notifier,
            }),
            runtime,
        }
    }

    /// Keys with a job still waiting to fire, sorted.
    pub fn pending_keys(&self) -> Vec<String> {
        let mut keys = match self.state.lock_jobs() {
            Ok(jobs) => jobs.keys().cloned().collect::<Vec<_>>(),
            Err(_) => Vec::new(),
        };
        keys.sort();
        keys
    }

    /// Planned fire instant of the job under `key`, if one is pending.
    pub fn pending_fire_at(&self, key: &str) -> Option<NaiveDateTime> {
        self.state
            .lock_jobs()
            .ok()
            .and_then(|jobs| jobs.get(key).map(|job| job.fire_at))
    }
}

impl ReminderExecutor for TokioReminderExecutor {
    fn enqueue_unique(
        &self,
        key: &str,
        fire_at: NaiveDateTime,
        payload: &ReminderPayload,
    ) -> SchedulingResult<()> {
        if key.is_empty() {
            return Err(SchedulingError::Rejected {
                key: String::new(),
                reason: "empty job key".to_string(),
            });
        }

        let delay = (fire_at - self.state.clock.now())
            .to_std()
            .unwrap_or(Duration::ZERO);
        let job_id = self.state.next_job_id.fetch_add(1, Ordering::Relaxed);

        let mut jobs = self.state.lock_jobs()?;
        let state = Arc::clone(&self.state);
        let task_key = key.to_string();
        let task_payload = payload.clone();
        let task = self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            state.fire(&task_key, job_id, &task_payload);
        });
        // The task cannot fire while `jobs` is held, so a finished task here
        // was cancelled by a runtime that has shut down.
        if task.is_finished() {
            warn!(
                "event=reminder_enqueue module=reminder status=error key={key} reason=runtime_shut_down"
            );
            return Err(SchedulingError::Unavailable(
                "tokio runtime has shut down".to_string(),
            ));
        }

        let replaced = jobs.insert(
            key.to_string(),
            PendingJob {
                job_id,
                fire_at,
                handle: task.abort_handle(),
            },
        );
        let replaced_existing = replaced.is_some();
        if let Some(previous) = replaced {
            previous.handle.abort();
        }
        drop(jobs);

        info!(
            "event=reminder_enqueue module=reminder status=ok key={key} delay_ms={} replaced={replaced_existing}",
            delay.as_millis()
        );
        Ok(())
    }

    fn cancel(&self, key: &str) -> SchedulingResult<()> {
        let removed = self.state.lock_jobs()?.remove(key);
        let had_job = removed.is_some();
        if let Some(job) = removed {
            job.handle.abort();
        }
        info!("event=reminder_cancel module=reminder status=ok key={key} had_job={had_job}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{LogNotifier, ReminderExecutor, SchedulingError, TokioReminderExecutor};
    use crate::clock::{Clock, SystemClock};
    use crate::reminder::planner::ReminderPayload;
    use chrono::Duration;
    use std::sync::Arc;

    #[test]
    fn construction_outside_a_runtime_is_unavailable() {
        let result = TokioReminderExecutor::new(Arc::new(SystemClock), Arc::new(LogNotifier));
        assert!(matches!(result, Err(SchedulingError::Unavailable(_))));
    }

    #[test]
    fn enqueue_after_runtime_shutdown_is_unavailable() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        let handle = runtime.handle().clone();
        drop(runtime);

        let clock = Arc::new(SystemClock);
        let executor =
            TokioReminderExecutor::with_handle(handle, clock.clone(), Arc::new(LogNotifier));
        let payload = ReminderPayload {
            assignment_id: 5,
            title: "Essay".to_string(),
            due_date: "2026-05-05".to_string(),
        };

        let fire_at = clock.now() + Duration::hours(1);
        let result = executor.enqueue_unique("reminder_5", fire_at, &payload);

        assert!(matches!(result, Err(SchedulingError::Unavailable(_))));
        assert!(executor.pending_keys().is_empty());
    }
}
