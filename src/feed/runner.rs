//! The chat feed's consumer task.
//!
//! One task owns the merged sequence. It subscribes, bulk-loads, then applies
//! notifications; author lookups run concurrently in a `JoinSet` and are
//! merged in completion order. Changes are forwarded to the UI as events.

use std::collections::HashSet;
use std::sync::Arc;

use crossbeam_channel::Sender;
use tokio::sync::oneshot;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, warn};

use super::{resolve_author, FeedOrdering, LiveFeed};
use crate::model::MessageRow;
use crate::protocol::GuiEvent;
use crate::store::{FeedStore, Subscription};

/// Owner-side handle of a running feed task.
pub struct FeedHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl FeedHandle {
    /// Stop delivery and release the subscription. Lookups still in flight
    /// finish on their own but are never applied.
    pub async fn teardown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Err(e) = (&mut self.task).await {
            warn!(event = "feed.task_failed", error = %e);
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Start a feed task on the current runtime.
pub fn spawn_feed<S: FeedStore>(
    store: Arc<S>,
    ordering: FeedOrdering,
    event_tx: Sender<GuiEvent>,
) -> FeedHandle {
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let feed = LiveFeed::new(store, ordering);
    let task = tokio::spawn(run_feed(feed, event_tx, shutdown_rx));
    FeedHandle {
        shutdown: Some(shutdown_tx),
        task,
    }
}

async fn run_feed<S: FeedStore>(
    mut feed: LiveFeed<S>,
    event_tx: Sender<GuiEvent>,
    mut shutdown: oneshot::Receiver<()>,
) {
    // Subscribe before the bulk read so nothing published in between is lost;
    // rows already in the history are dropped as duplicates.
    if let Err(e) = feed.subscribe().await {
        warn!(event = "feed.subscribe_failed", error = %e);
        let _ = event_tx.send(GuiEvent::Notice(format!(
            "Live updates unavailable: {}",
            e
        )));
    }
    if let Err(e) = feed.initialize().await {
        let _ = event_tx.send(GuiEvent::Notice(format!(
            "Could not load chat history: {}",
            e
        )));
    }
    let _ = event_tx.send(GuiEvent::FeedLoaded(feed.items().to_vec()));

    let mut subscription = feed.subscription.take();
    let mut lookups = JoinSet::new();
    // Ids with a lookup in flight; each new id is looked up once
    let mut pending: HashSet<String> = HashSet::new();

    loop {
        tokio::select! {
            _ = &mut shutdown => break,

            row = next_row(&mut subscription) => match row {
                Some(row) => {
                    if feed.merger.contains(&row.id) || pending.contains(&row.id) {
                        debug!(event = "feed.duplicate_dropped", id = %row.id);
                        continue;
                    }
                    pending.insert(row.id.clone());
                    let store = Arc::clone(&feed.store);
                    lookups.spawn(async move {
                        let id = row.id.clone();
                        let author = row.author_id.clone();
                        (id, author, resolve_author(store.as_ref(), row).await)
                    });
                }
                None => {
                    warn!(event = "feed.channel_closed");
                    let _ = event_tx.send(GuiEvent::Notice(
                        "Live updates stopped".to_string(),
                    ));
                    subscription = None;
                }
            },

            Some(joined) = lookups.join_next(), if !lookups.is_empty() => match joined {
                Ok((id, _, Ok(item))) => {
                    pending.remove(&id);
                    if let Some(index) = feed.merger.insert(item.clone()) {
                        if event_tx.send(GuiEvent::FeedItemAdded { index, item }).is_err() {
                            break;
                        }
                    }
                }
                Ok((id, author, Err(reason))) => {
                    pending.remove(&id);
                    let notice = format!("Could not show a message from {}: {}", author, reason);
                    if event_tx.send(GuiEvent::Notice(notice)).is_err() {
                        break;
                    }
                }
                // The id stays pending; a panicked lookup is not retried
                Err(e) => warn!(event = "feed.lookup_panicked", error = %e),
            },
        }
    }

    // Late lookups run to completion and their results are discarded
    lookups.detach_all();
    feed.subscription = subscription;
    feed.teardown();
    let _ = event_tx.send(GuiEvent::FeedClosed);
}

/// Next row from the subscription; pending forever once it is gone.
async fn next_row(subscription: &mut Option<Subscription>) -> Option<MessageRow> {
    match subscription {
        Some(sub) => sub.next().await,
        None => std::future::pending().await,
    }
}
