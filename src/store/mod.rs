/// Seam over the hosted backend (auth, tables, realtime).
///
/// - `memory`: in-process implementation with realtime fan-out, used for
///   offline runs and tests
mod memory;

pub use memory::MemoryStore;

use std::future::Future;

use chrono::NaiveDate;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::model::{DailyEntry, FeedItem, MessageRow, NewDailyEntry, Product, Profile, Session};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("request rejected: {0}")]
    Rejected(String),

    #[error("authentication failed: {0}")]
    Auth(String),
}

/// A live "row created" subscription on the `messages` table.
///
/// Rows arrive in the order the store publishes them. Dropping the
/// subscription stops delivery locally; `Store::unsubscribe` also releases
/// the channel on the store side.
#[derive(Debug)]
pub struct Subscription {
    pub id: u64,
    rx: mpsc::UnboundedReceiver<MessageRow>,
}

impl Subscription {
    pub fn new(id: u64, rx: mpsc::UnboundedReceiver<MessageRow>) -> Self {
        Self { id, rx }
    }

    /// Wait for the next inserted row. `None` once the store closed the channel.
    pub async fn next(&mut self) -> Option<MessageRow> {
        self.rx.recv().await
    }
}

/// Sign-up, sign-in and token handling of the hosted auth provider.
pub trait AuthStore: Send + Sync + 'static {
    fn sign_up(
        &self,
        full_name: &str,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<Session, StoreError>> + Send;

    fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<Session, StoreError>> + Send;

    fn sign_out(&self, session: &Session) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Exchange a remembered access token for a live session.
    fn restore_session(
        &self,
        access_token: &str,
    ) -> impl Future<Output = Result<Session, StoreError>> + Send;
}

/// The `messages` and `profiles` tables plus the realtime channel.
pub trait FeedStore: Send + Sync + 'static {
    /// All messages ascending by creation time, joined with their authors.
    fn list_messages(&self) -> impl Future<Output = Result<Vec<FeedItem>, StoreError>> + Send;

    fn fetch_profile(
        &self,
        user_id: &str,
    ) -> impl Future<Output = Result<Option<Profile>, StoreError>> + Send;

    fn insert_message(
        &self,
        session: &Session,
        body: &str,
    ) -> impl Future<Output = Result<MessageRow, StoreError>> + Send;

    fn subscribe_messages(&self) -> impl Future<Output = Result<Subscription, StoreError>> + Send;

    fn unsubscribe(&self, subscription_id: u64);
}

/// The `products` inventory table.
pub trait InventoryStore: Send + Sync + 'static {
    /// Inventory, newest first.
    fn list_products(&self) -> impl Future<Output = Result<Vec<Product>, StoreError>> + Send;

    fn insert_product(
        &self,
        session: &Session,
        name: &str,
        quantity: &str,
    ) -> impl Future<Output = Result<Product, StoreError>> + Send;

    fn delete_product(
        &self,
        session: &Session,
        product_id: &str,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// The `daily_entries` table, one row per date.
pub trait EntryStore: Send + Sync + 'static {
    /// Insert or replace the entry for `entry.date`.
    fn upsert_daily_entry(
        &self,
        session: &Session,
        entry: NewDailyEntry,
    ) -> impl Future<Output = Result<DailyEntry, StoreError>> + Send;

    fn daily_entry_for(
        &self,
        date: NaiveDate,
    ) -> impl Future<Output = Result<Option<DailyEntry>, StoreError>> + Send;

    /// All entries, newest date first.
    fn list_daily_entries(&self)
        -> impl Future<Output = Result<Vec<DailyEntry>, StoreError>> + Send;
}

/// Everything the client needs from the backend-as-a-service.
///
/// Writes take a `&Session`, which can only be obtained through
/// `SessionContext::require`.
pub trait Store: AuthStore + FeedStore + InventoryStore + EntryStore {}

impl<T> Store for T where T: AuthStore + FeedStore + InventoryStore + EntryStore {}
