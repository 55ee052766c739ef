//! Debounced, switch-to-latest query pipeline.
//!
//! # Responsibility
//! - Turn a stream of [`FilterCriteria`] into a live stream of assignment
//!   lists backed by store subscriptions.
//!
//! # Invariants
//! - A new store subscription starts only after the criteria have been quiet
//!   for the debounce window.
//! - The previous subscription's token is cancelled and its receiver dropped
//!   before the next subscription starts; nothing stale is forwarded.
//! - A store error is forwarded once and ends the stream.
//! - Emitted lists keep store order.

use crate::config::CoreConfig;
use crate::model::assignment::Assignment;
use crate::query::criteria::FilterCriteria;
use crate::store::assignment_store::{AssignmentStore, StoreError, StoreResult};
use crate::store::live::{self, Subscription};
use log::{debug, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;

const RESULTS_BUFFER: usize = 8;

pub type QueryResult = Result<Vec<Assignment>, StoreError>;

/// Consumer handle for a running pipeline.
///
/// `next()` yields `Ok(list)` for each fresh result. After an `Err` the
/// stream is finished; observe again to recover. Dropping the handle stops
/// the pipeline.
pub struct QueryResults {
    rx: mpsc::Receiver<QueryResult>,
    cancel: CancellationToken,
}

impl QueryResults {
    pub async fn next(&mut self) -> Option<QueryResult> {
        self.rx.recv().await
    }

    /// Stops the pipeline and its store subscription.
    pub fn close(&mut self) {
        self.cancel.cancel();
        self.rx.close();
    }
}

impl Drop for QueryResults {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Builds live result streams from filter criteria.
#[derive(Clone)]
pub struct QueryPipeline {
    store: Arc<dyn AssignmentStore>,
    debounce: Duration,
}

impl QueryPipeline {
    pub fn new(store: Arc<dyn AssignmentStore>) -> Self {
        Self::with_config(store, &CoreConfig::default())
    }

    pub fn with_config(store: Arc<dyn AssignmentStore>, config: &CoreConfig) -> Self {
        Self {
            store,
            debounce: config.search_debounce,
        }
    }

    /// Starts a pipeline driven by `criteria`.
    ///
    /// The current criteria value is debounced like any later change. Must be
    /// called from within a tokio runtime.
    pub fn observe(&self, criteria: watch::Receiver<FilterCriteria>) -> QueryResults {
        let (tx, rx) = mpsc::channel(RESULTS_BUFFER);
        let cancel = CancellationToken::new();
        let driver = PipelineDriver {
            store: Arc::clone(&self.store),
            debounce: self.debounce,
            criteria,
            tx,
            cancel: cancel.clone(),
        };
        tokio::spawn(driver.run());
        QueryResults { rx, cancel }
    }
}

struct ActiveSubscription {
    criteria: FilterCriteria,
    subscription: Subscription,
}

struct PipelineDriver {
    store: Arc<dyn AssignmentStore>,
    debounce: Duration,
    criteria: watch::Receiver<FilterCriteria>,
    tx: mpsc::Sender<QueryResult>,
    cancel: CancellationToken,
}

impl PipelineDriver {
    async fn run(mut self) {
        let mut criteria_open = true;
        let mut last_change: Option<Instant> = Some(Instant::now());
        let mut active: Option<ActiveSubscription> = None;
        let mut generation: u64 = 0;
        let _ = self.criteria.borrow_and_update();

        loop {
            let deadline = last_change.map(|at| at + self.debounce);

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                _ = self.tx.closed() => break,
                changed = self.criteria.changed(), if criteria_open => {
                    match changed {
                        Ok(()) => last_change = Some(Instant::now()),
                        // Sender gone: criteria are frozen, keep serving them.
                        Err(_) => criteria_open = false,
                    }
                }
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    last_change = None;
                    let next = self.criteria.borrow_and_update().clone();
                    if active.as_ref().is_some_and(|current| current.criteria == next) {
                        continue;
                    }
                    if let Some(mut previous) = active.take() {
                        previous.subscription.cancel();
                    }
                    generation += 1;
                    let query = next.store_query();
                    debug!(
                        "event=query_subscribe module=query status=start generation={generation} kind={}",
                        query.kind()
                    );
                    let subscription =
                        live::observe(Arc::clone(&self.store), query, self.cancel.child_token());
                    active = Some(ActiveSubscription {
                        criteria: next,
                        subscription,
                    });
                }
                emission = next_emission(&mut active), if active.is_some() => {
                    match emission {
                        Some(Ok(assignments)) => {
                            let filtered = match active.as_ref() {
                                Some(current) => current.criteria.apply(assignments),
                                None => assignments,
                            };
                            if self.tx.send(Ok(filtered)).await.is_err() {
                                break;
                            }
                        }
                        Some(Err(err)) => {
                            warn!(
                                "event=query_subscribe module=query status=error generation={generation} error={err}"
                            );
                            let _ = self.tx.send(Err(err)).await;
                            break;
                        }
                        None => active = None,
                    }
                }
            }
        }

        if let Some(mut current) = active.take() {
            current.subscription.cancel();
        }
        debug!("event=query_pipeline module=query status=stopped generations={generation}");
    }
}

async fn next_emission(
    active: &mut Option<ActiveSubscription>,
) -> Option<StoreResult<Vec<Assignment>>> {
    match active {
        Some(current) => current.subscription.next().await,
        None => std::future::pending().await,
    }
}
