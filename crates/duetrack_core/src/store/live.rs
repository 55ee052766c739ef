//! Live subscriptions over an [`AssignmentStore`].
//!
//! # Responsibility
//! - Turn a one-shot `fetch` plus the store's revision feed into an infinite
//!   stream of result lists.
//! - Stop the producer as soon as its cancellation token fires.
//!
//! # Invariants
//! - The first emission is the current state; later emissions follow writes.
//! - After cancellation the producer sends nothing further.
//! - A fetch error is delivered once and ends the subscription.
//! - Store reads run on the blocking pool, never on an async worker.

use crate::model::assignment::Assignment;
use crate::store::assignment_store::{AssignmentStore, StoreError, StoreQuery, StoreResult};
use log::debug;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

// One list in flight is enough: the consumer only cares about the latest.
const SUBSCRIPTION_BUFFER: usize = 1;

/// Receiving end of a live store query.
///
/// Dropping the subscription cancels its producer.
pub struct Subscription {
    rx: mpsc::Receiver<StoreResult<Vec<Assignment>>>,
    cancel: CancellationToken,
}

impl Subscription {
    /// Waits for the next result list. `None` once the producer has stopped.
    pub async fn next(&mut self) -> Option<StoreResult<Vec<Assignment>>> {
        self.rx.recv().await
    }

    /// Asks the producer to stop; values already buffered are discarded.
    pub fn cancel(&mut self) {
        self.cancel.cancel();
        self.rx.close();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Starts a producer task that re-runs `query` after every store write.
///
/// Must be called from within a tokio runtime.
pub fn observe(
    store: Arc<dyn AssignmentStore>,
    query: StoreQuery,
    cancel: CancellationToken,
) -> Subscription {
    let (tx, rx) = mpsc::channel(SUBSCRIPTION_BUFFER);
    let producer_cancel = cancel.clone();

    tokio::spawn(async move {
        let kind = query.kind();
        let mut changes = store.changes();
        debug!("event=subscription_start module=store kind={kind}");

        loop {
            // Mark the current revision seen before reading so a write racing
            // with this fetch still wakes us up afterwards.
            let _ = changes.borrow_and_update();
            let result = fetch_blocking(Arc::clone(&store), query.clone()).await;
            let failed = result.is_err();

            tokio::select! {
                biased;
                _ = producer_cancel.cancelled() => break,
                sent = tx.send(result) => {
                    if sent.is_err() {
                        break;
                    }
                }
            }

            if failed {
                debug!("event=subscription_failed module=store kind={kind}");
                break;
            }

            tokio::select! {
                biased;
                _ = producer_cancel.cancelled() => break,
                changed = changes.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        debug!("event=subscription_stop module=store kind={kind}");
    });

    Subscription { rx, cancel }
}

/// Runs the store query on the blocking pool so SQLite and the store lock
/// never stall the async workers.
async fn fetch_blocking(
    store: Arc<dyn AssignmentStore>,
    query: StoreQuery,
) -> StoreResult<Vec<Assignment>> {
    match tokio::task::spawn_blocking(move || store.fetch(&query)).await {
        Ok(result) => result,
        Err(err) => Err(StoreError::Unavailable(format!(
            "store fetch task failed: {err}"
        ))),
    }
}
