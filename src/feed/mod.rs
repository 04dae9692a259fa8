/// Live chat feed: one bulk read merged with realtime insert notifications.
///
/// - `merger`: the owned, ordered, de-duplicated sequence
/// - `runner`: the single consumer task that drives a feed for the UI
mod merger;
mod runner;

pub use merger::{FeedMerger, FeedOrdering};
pub use runner::{spawn_feed, FeedHandle};

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::model::{FeedItem, MessageRow};
use crate::session::{NotSignedIn, SessionContext};
use crate::store::{FeedStore, StoreError, Subscription};
use crate::validation;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedError {
    #[error("not signed in")]
    NotSignedIn,

    #[error("invalid message: {0}")]
    InvalidMessage(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<NotSignedIn> for FeedError {
    fn from(_: NotSignedIn) -> Self {
        FeedError::NotSignedIn
    }
}

/// What happened to one insert notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// Resolved and placed at this index.
    Added(usize),
    /// The id was already in the sequence.
    Duplicate,
    /// The author lookup failed or found nothing; the item was dropped.
    Unresolved,
    /// The feed was torn down.
    Closed,
}

/// A chat feed bound to one store.
pub struct LiveFeed<S> {
    store: Arc<S>,
    merger: FeedMerger,
    subscription: Option<Subscription>,
    closed: bool,
}

impl<S: FeedStore> LiveFeed<S> {
    pub fn new(store: Arc<S>, ordering: FeedOrdering) -> Self {
        Self {
            store,
            merger: FeedMerger::new(ordering),
            subscription: None,
            closed: false,
        }
    }

    pub fn items(&self) -> &[FeedItem] {
        self.merger.items()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Open the realtime subscription. Rows published from here on are
    /// buffered until the caller pulls them.
    pub async fn subscribe(&mut self) -> Result<(), FeedError> {
        if self.closed {
            return Ok(());
        }
        let subscription = self.store.subscribe_messages().await?;
        if let Some(previous) = self.subscription.replace(subscription) {
            self.store.unsubscribe(previous.id);
        }
        Ok(())
    }

    /// Bulk-load the history, ascending by creation time.
    ///
    /// On error the sequence stays empty and the feed remains usable; the
    /// error is returned only so it can be reported.
    pub async fn initialize(&mut self) -> Result<usize, FeedError> {
        match self.store.list_messages().await {
            Ok(items) => {
                if !self.closed {
                    self.merger.load(items);
                }
                info!(event = "feed.initialized", count = self.merger.len());
                Ok(self.merger.len())
            }
            Err(e) => {
                warn!(event = "feed.initialize_failed", error = %e);
                Err(e.into())
            }
        }
    }

    /// Pull the next buffered notification, if subscribed.
    pub async fn next_notification(&mut self) -> Option<MessageRow> {
        self.subscription.as_mut()?.next().await
    }

    /// Resolve a notified row's author and merge it into the sequence.
    pub async fn on_insert_notification(&mut self, row: MessageRow) -> InsertOutcome {
        if self.closed {
            return InsertOutcome::Closed;
        }
        if self.merger.contains(&row.id) {
            debug!(event = "feed.duplicate_dropped", id = %row.id);
            return InsertOutcome::Duplicate;
        }
        let Ok(item) = resolve_author(self.store.as_ref(), row).await else {
            return InsertOutcome::Unresolved;
        };
        if self.closed {
            return InsertOutcome::Closed;
        }
        match self.merger.insert(item) {
            Some(index) => InsertOutcome::Added(index),
            None => InsertOutcome::Duplicate,
        }
    }

    /// Send the draft as a new message from the signed-in user.
    ///
    /// The message is not added locally; it comes back through the
    /// subscription. The draft is cleared only when the store accepts it.
    pub async fn submit(
        &self,
        session: &SessionContext,
        draft: &mut String,
    ) -> Result<MessageRow, FeedError> {
        submit_message(self.store.as_ref(), session, draft).await
    }

    /// Release the subscription. Safe before `initialize` and when repeated.
    pub fn teardown(&mut self) {
        self.closed = true;
        if let Some(subscription) = self.subscription.take() {
            self.store.unsubscribe(subscription.id);
            info!(event = "feed.torn_down", subscription = subscription.id);
        }
    }
}

/// Validate and send a chat message, clearing `draft` only on success.
pub async fn submit_message<S: FeedStore>(
    store: &S,
    session: &SessionContext,
    draft: &mut String,
) -> Result<MessageRow, FeedError> {
    let session = session.require()?;
    let body = validation::sanitize_message(draft.trim());
    validation::validate_message(&body).map_err(FeedError::InvalidMessage)?;
    match store.insert_message(session, &body).await {
        Ok(row) => {
            draft.clear();
            Ok(row)
        }
        Err(e) => {
            warn!(event = "feed.submit_failed", error = %e);
            Err(e.into())
        }
    }
}

/// Look up the author of a notified row. An `Err` carries the reason the
/// row is dropped.
async fn resolve_author<S: FeedStore>(store: &S, row: MessageRow) -> Result<FeedItem, String> {
    match store.fetch_profile(&row.author_id).await {
        Ok(Some(profile)) => Ok(FeedItem::enrich(row, profile.author())),
        Ok(None) => {
            warn!(event = "feed.author_missing", id = %row.id, author = %row.author_id);
            Err("no such profile".to_string())
        }
        Err(e) => {
            warn!(event = "feed.author_lookup_failed", id = %row.id, error = %e);
            Err(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Profile, Session};
    use crate::store::{AuthStore, MemoryStore};
    use chrono::{TimeZone, Utc};

    fn row(id: &str, secs: i64, author: &str) -> MessageRow {
        MessageRow {
            id: id.into(),
            body: format!("message {}", id),
            author_id: author.into(),
            created_at: Utc.timestamp_opt(secs, 0).unwrap(),
        }
    }

    fn store_with_history() -> Arc<MemoryStore> {
        let store = MemoryStore::new();
        store.put_profile(Profile::new("u1", "Maria")).unwrap();
        store.put_profile(Profile::new("u2", "Alex")).unwrap();
        store.publish_message(row("1", 10, "u1")).unwrap();
        Arc::new(store)
    }

    /// A store whose every call fails.
    struct DownStore;

    impl FeedStore for DownStore {
        async fn list_messages(&self) -> Result<Vec<FeedItem>, StoreError> {
            Err(StoreError::Unavailable("offline".into()))
        }
        async fn fetch_profile(&self, _user_id: &str) -> Result<Option<Profile>, StoreError> {
            Err(StoreError::Unavailable("offline".into()))
        }
        async fn insert_message(
            &self,
            _session: &Session,
            _body: &str,
        ) -> Result<MessageRow, StoreError> {
            Err(StoreError::Unavailable("offline".into()))
        }
        async fn subscribe_messages(&self) -> Result<Subscription, StoreError> {
            Err(StoreError::Unavailable("offline".into()))
        }
        fn unsubscribe(&self, _subscription_id: u64) {}
    }

    #[tokio::test]
    async fn test_initialize_matches_bulk_read() {
        let store = store_with_history();
        store.publish_message(row("0", 5, "u2")).unwrap();
        let expected = store.list_messages().await.unwrap();

        let mut feed = LiveFeed::new(store, FeedOrdering::Append);
        assert_eq!(feed.initialize().await, Ok(2));
        assert_eq!(feed.items(), expected.as_slice());
    }

    #[tokio::test]
    async fn test_initialize_failure_leaves_empty_feed() {
        let mut feed = LiveFeed::new(Arc::new(DownStore), FeedOrdering::Append);
        assert!(feed.initialize().await.is_err());
        assert!(feed.items().is_empty());
        // Still usable afterwards
        assert_eq!(
            feed.on_insert_notification(row("2", 11, "u2")).await,
            InsertOutcome::Unresolved
        );
        feed.teardown();
    }

    #[tokio::test]
    async fn test_notification_is_enriched_and_appended() {
        let mut feed = LiveFeed::new(store_with_history(), FeedOrdering::Append);
        feed.initialize().await.unwrap();

        let outcome = feed.on_insert_notification(row("2", 11, "u2")).await;
        assert_eq!(outcome, InsertOutcome::Added(1));
        let ids: Vec<_> = feed.items().iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
        assert_eq!(feed.items()[1].author_display_name, "Alex");
    }

    #[tokio::test]
    async fn test_duplicate_notifications_are_idempotent() {
        let mut feed = LiveFeed::new(store_with_history(), FeedOrdering::Append);
        feed.initialize().await.unwrap();

        // Already in the bulk read
        assert_eq!(
            feed.on_insert_notification(row("1", 10, "u1")).await,
            InsertOutcome::Duplicate
        );
        assert_eq!(feed.items().len(), 1);

        feed.on_insert_notification(row("2", 11, "u2")).await;
        let once = feed.items().to_vec();
        assert_eq!(
            feed.on_insert_notification(row("2", 11, "u2")).await,
            InsertOutcome::Duplicate
        );
        assert_eq!(feed.items(), once.as_slice());
    }

    #[tokio::test]
    async fn test_unresolved_author_is_dropped() {
        let mut feed = LiveFeed::new(store_with_history(), FeedOrdering::Append);
        feed.initialize().await.unwrap();
        assert_eq!(
            feed.on_insert_notification(row("9", 12, "nobody")).await,
            InsertOutcome::Unresolved
        );
        assert_eq!(feed.items().len(), 1);
    }

    #[tokio::test]
    async fn test_length_never_decreases() {
        let mut feed = LiveFeed::new(store_with_history(), FeedOrdering::Chronological);
        feed.initialize().await.unwrap();
        let mut last = feed.items().len();
        for r in [
            row("2", 11, "u2"),
            row("2", 11, "u2"),
            row("x", 12, "ghost"),
            row("3", 9, "u1"),
            row("1", 10, "u1"),
        ] {
            feed.on_insert_notification(r).await;
            assert!(feed.items().len() >= last);
            last = feed.items().len();
        }
        assert_eq!(last, 3);
    }

    #[tokio::test]
    async fn test_submit_round_trips_through_subscription() {
        let store = store_with_history();
        let session = store.sign_up("Sam", "sam@example.com", "secret1").await.unwrap();
        let mut ctx = SessionContext::new();
        ctx.sign_in(session);

        let mut feed = LiveFeed::new(Arc::clone(&store), FeedOrdering::Append);
        feed.subscribe().await.unwrap();
        feed.initialize().await.unwrap();

        let mut draft = String::from("  hello  ");
        let sent = feed.submit(&ctx, &mut draft).await.unwrap();
        assert!(draft.is_empty());
        assert_eq!(sent.body, "hello");
        // Not inserted optimistically
        assert_eq!(feed.items().len(), 1);

        let notified = feed.next_notification().await.unwrap();
        assert_eq!(notified, sent);
        assert_eq!(feed.on_insert_notification(notified).await, InsertOutcome::Added(1));
        assert_eq!(feed.items()[1].author_display_name, "Sam");
    }

    #[tokio::test]
    async fn test_failed_submit_keeps_draft() {
        let store = store_with_history();
        let session = store.sign_up("Sam", "sam@example.com", "secret1").await.unwrap();
        let mut ctx = SessionContext::new();
        ctx.sign_in(session.clone());
        // Revoke the token so the write is refused
        store.sign_out(&session).await.unwrap();

        let feed = LiveFeed::new(store, FeedOrdering::Append);
        let mut draft = String::from("hello");
        let result = feed.submit(&ctx, &mut draft).await;
        assert!(matches!(result, Err(FeedError::Store(StoreError::Auth(_)))));
        assert_eq!(draft, "hello");
    }

    #[tokio::test]
    async fn test_submit_requires_session_and_body() {
        let feed = LiveFeed::new(store_with_history(), FeedOrdering::Append);
        let mut draft = String::from("hello");
        assert_eq!(
            feed.submit(&SessionContext::new(), &mut draft).await,
            Err(FeedError::NotSignedIn)
        );
        assert_eq!(draft, "hello");

        let mut ctx = SessionContext::new();
        ctx.sign_in(Session {
            user_id: "u1".into(),
            email: "m@example.com".into(),
            access_token: "t".into(),
        });
        let mut blank = String::from("   ");
        assert!(matches!(
            feed.submit(&ctx, &mut blank).await,
            Err(FeedError::InvalidMessage(_))
        ));
    }

    #[tokio::test]
    async fn test_teardown_is_safe_and_final() {
        let store = store_with_history();

        // Never initialized
        let mut fresh = LiveFeed::new(Arc::clone(&store), FeedOrdering::Append);
        fresh.teardown();
        fresh.teardown();

        let mut feed = LiveFeed::new(Arc::clone(&store), FeedOrdering::Append);
        feed.subscribe().await.unwrap();
        assert_eq!(store.subscriber_count(), 1);
        feed.teardown();
        assert_eq!(store.subscriber_count(), 0);
        assert!(feed.is_closed());
        assert_eq!(
            feed.on_insert_notification(row("2", 11, "u2")).await,
            InsertOutcome::Closed
        );
        assert!(feed.items().is_empty());
    }
}
