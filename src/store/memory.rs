//! In-process backend with the same contract as the hosted service.
//!
//! Tables live behind one mutex; realtime subscribers get every inserted
//! message row over their own unbounded channel.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use chrono::{NaiveDate, Utc};
use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;

use super::{AuthStore, EntryStore, FeedStore, InventoryStore, StoreError, Subscription};
use crate::model::{
    DailyEntry, FeedItem, MessageRow, NewDailyEntry, Product, Profile, Session,
};

/// A registered account.
struct Account {
    user_id: String,
    password: String,
}

#[derive(Default)]
struct Tables {
    accounts: HashMap<String, Account>,
    /// Live access tokens
    tokens: HashMap<String, Session>,
    profiles: HashMap<String, Profile>,
    messages: Vec<MessageRow>,
    products: Vec<Product>,
    entries: BTreeMap<NaiveDate, DailyEntry>,
    subscribers: HashMap<u64, mpsc::UnboundedSender<MessageRow>>,
    next_subscription: u64,
}

impl Tables {
    fn check_session(&self, session: &Session) -> Result<(), StoreError> {
        match self.tokens.get(&session.access_token) {
            Some(live) if live.user_id == session.user_id => Ok(()),
            _ => Err(StoreError::Auth("session expired".into())),
        }
    }

    fn issue_session(&mut self, user_id: &str, email: &str) -> Session {
        let session = Session {
            user_id: user_id.to_string(),
            email: email.to_string(),
            access_token: Uuid::new_v4().to_string(),
        };
        self.tokens
            .insert(session.access_token.clone(), session.clone());
        session
    }

    /// Store a message row and fan it out to every live subscriber.
    fn publish(&mut self, row: MessageRow) {
        self.messages.push(row.clone());
        // Subscribers whose receiver is gone are pruned here
        self.subscribers
            .retain(|_, tx| tx.send(row.clone()).is_ok());
    }
}

/// Backend kept entirely in memory.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".into()))
    }

    /// Create or replace a profile row directly.
    pub fn put_profile(&self, profile: Profile) -> Result<(), StoreError> {
        self.tables()?.profiles.insert(profile.id.clone(), profile);
        Ok(())
    }

    /// Insert a message row as another client would, notifying subscribers.
    pub fn publish_message(&self, row: MessageRow) -> Result<(), StoreError> {
        self.tables()?.publish(row);
        Ok(())
    }

    /// Number of live realtime subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.tables().map(|t| t.subscribers.len()).unwrap_or(0)
    }
}

impl AuthStore for MemoryStore {
    async fn sign_up(
        &self,
        full_name: &str,
        email: &str,
        password: &str,
    ) -> Result<Session, StoreError> {
        let mut tables = self.tables()?;
        let key = email.to_lowercase();
        if tables.accounts.contains_key(&key) {
            return Err(StoreError::Rejected("email already registered".into()));
        }
        let user_id = Uuid::new_v4().to_string();
        tables.accounts.insert(
            key,
            Account {
                user_id: user_id.clone(),
                password: password.to_string(),
            },
        );
        tables
            .profiles
            .insert(user_id.clone(), Profile::new(user_id.clone(), full_name.trim()));
        info!(event = "store.auth.sign_up", user_id = %user_id);
        Ok(tables.issue_session(&user_id, email))
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, StoreError> {
        let mut tables = self.tables()?;
        let user_id = match tables.accounts.get(&email.to_lowercase()) {
            Some(account) if account.password == password => account.user_id.clone(),
            _ => return Err(StoreError::Auth("invalid login credentials".into())),
        };
        Ok(tables.issue_session(&user_id, email))
    }

    async fn sign_out(&self, session: &Session) -> Result<(), StoreError> {
        self.tables()?.tokens.remove(&session.access_token);
        Ok(())
    }

    async fn restore_session(&self, access_token: &str) -> Result<Session, StoreError> {
        self.tables()?
            .tokens
            .get(access_token)
            .cloned()
            .ok_or_else(|| StoreError::Auth("unknown or expired token".into()))
    }
}

impl FeedStore for MemoryStore {
    async fn list_messages(&self) -> Result<Vec<FeedItem>, StoreError> {
        let tables = self.tables()?;
        let mut rows = tables.messages.clone();
        rows.sort_by_key(|row| row.created_at);
        // Rows whose author has no profile are left out, as an inner join would
        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let author = tables.profiles.get(&row.author_id)?.author();
                Some(FeedItem::enrich(row, author))
            })
            .collect())
    }

    async fn fetch_profile(&self, user_id: &str) -> Result<Option<Profile>, StoreError> {
        Ok(self.tables()?.profiles.get(user_id).cloned())
    }

    async fn insert_message(&self, session: &Session, body: &str) -> Result<MessageRow, StoreError> {
        let mut tables = self.tables()?;
        tables.check_session(session)?;
        let row = MessageRow {
            id: Uuid::new_v4().to_string(),
            body: body.to_string(),
            author_id: session.user_id.clone(),
            created_at: Utc::now(),
        };
        tables.publish(row.clone());
        Ok(row)
    }

    async fn subscribe_messages(&self) -> Result<Subscription, StoreError> {
        let mut tables = self.tables()?;
        let (tx, rx) = mpsc::unbounded_channel();
        tables.next_subscription += 1;
        let id = tables.next_subscription;
        tables.subscribers.insert(id, tx);
        debug!(event = "store.realtime.subscribed", subscription = id);
        Ok(Subscription::new(id, rx))
    }

    fn unsubscribe(&self, subscription_id: u64) {
        if let Ok(mut tables) = self.tables() {
            if tables.subscribers.remove(&subscription_id).is_some() {
                debug!(event = "store.realtime.unsubscribed", subscription = subscription_id);
            }
        }
    }
}

impl InventoryStore for MemoryStore {
    async fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        let mut products = self.tables()?.products.clone();
        // Newest first; insertion order breaks timestamp ties
        products.reverse();
        products.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(products)
    }

    async fn insert_product(
        &self,
        session: &Session,
        name: &str,
        quantity: &str,
    ) -> Result<Product, StoreError> {
        let mut tables = self.tables()?;
        tables.check_session(session)?;
        let product = Product {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            quantity: quantity.to_string(),
            created_at: Utc::now(),
        };
        tables.products.push(product.clone());
        Ok(product)
    }

    async fn delete_product(&self, session: &Session, product_id: &str) -> Result<(), StoreError> {
        let mut tables = self.tables()?;
        tables.check_session(session)?;
        let before = tables.products.len();
        tables.products.retain(|p| p.id != product_id);
        if tables.products.len() == before {
            return Err(StoreError::NotFound(format!("product {}", product_id)));
        }
        Ok(())
    }
}

impl EntryStore for MemoryStore {
    async fn upsert_daily_entry(
        &self,
        session: &Session,
        entry: NewDailyEntry,
    ) -> Result<DailyEntry, StoreError> {
        let mut tables = self.tables()?;
        tables.check_session(session)?;
        // The row id survives a replace so references to it stay valid
        let id = tables
            .entries
            .get(&entry.date)
            .map(|existing| existing.id.clone())
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let row = DailyEntry {
            id,
            date: entry.date,
            morning_count: entry.morning_count,
            night_count: entry.night_count,
            attendance: entry.attendance,
            items: entry.items,
            recorded_by: session.user_id.clone(),
            updated_at: Utc::now(),
        };
        tables.entries.insert(row.date, row.clone());
        Ok(row)
    }

    async fn daily_entry_for(&self, date: NaiveDate) -> Result<Option<DailyEntry>, StoreError> {
        Ok(self.tables()?.entries.get(&date).cloned())
    }

    async fn list_daily_entries(&self) -> Result<Vec<DailyEntry>, StoreError> {
        Ok(self.tables()?.entries.values().rev().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EntryItem;

    fn entry(date: NaiveDate, morning: u32, night: u32) -> NewDailyEntry {
        NewDailyEntry {
            date,
            morning_count: morning,
            night_count: night,
            attendance: morning + night,
            items: vec![],
        }
    }

    #[tokio::test]
    async fn test_sign_up_creates_profile() {
        let store = MemoryStore::new();
        let session = store.sign_up("Maria Lopez", "maria@example.com", "secret1").await.unwrap();
        let profile = store.fetch_profile(&session.user_id).await.unwrap().unwrap();
        assert_eq!(profile.full_name, "Maria Lopez");
        assert_eq!(profile.avatar_initials, "ML");

        let again = store.sign_up("Other", "MARIA@example.com", "secret2").await;
        assert!(matches!(again, Err(StoreError::Rejected(_))));
    }

    #[tokio::test]
    async fn test_sign_in_and_out() {
        let store = MemoryStore::new();
        store.sign_up("Alex", "alex@example.com", "secret1").await.unwrap();

        assert!(matches!(
            store.sign_in("alex@example.com", "wrong").await,
            Err(StoreError::Auth(_))
        ));
        let session = store.sign_in("alex@example.com", "secret1").await.unwrap();
        assert_eq!(store.restore_session(&session.access_token).await.unwrap(), session);

        store.sign_out(&session).await.unwrap();
        assert!(store.restore_session(&session.access_token).await.is_err());
        assert!(matches!(
            store.insert_message(&session, "late").await,
            Err(StoreError::Auth(_))
        ));
    }

    #[tokio::test]
    async fn test_subscribers_receive_inserts() {
        let store = MemoryStore::new();
        let session = store.sign_up("Alex", "alex@example.com", "secret1").await.unwrap();
        let mut sub = store.subscribe_messages().await.unwrap();
        assert_eq!(store.subscriber_count(), 1);

        let row = store.insert_message(&session, "hello").await.unwrap();
        assert_eq!(sub.next().await, Some(row));

        store.unsubscribe(sub.id);
        assert_eq!(store.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_list_messages_is_ascending_and_joined() {
        let store = MemoryStore::new();
        store.put_profile(Profile::new("u1", "Alex")).unwrap();
        let now = Utc::now();
        for (id, offset, author) in [("b", 2, "u1"), ("a", 1, "u1"), ("x", 3, "ghost")] {
            store
                .publish_message(MessageRow {
                    id: id.into(),
                    body: id.into(),
                    author_id: author.into(),
                    created_at: now + chrono::Duration::seconds(offset),
                })
                .unwrap();
        }
        let ids: Vec<_> = store
            .list_messages()
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_products_newest_first_and_delete() {
        let store = MemoryStore::new();
        let session = store.sign_up("Alex", "alex@example.com", "secret1").await.unwrap();
        store.insert_product(&session, "Rice", "25kg Bag").await.unwrap();
        let oil = store.insert_product(&session, "Cooking Oil", "5L Can").await.unwrap();

        let products = store.list_products().await.unwrap();
        assert_eq!(products[0].name, "Cooking Oil");
        assert_eq!(products[1].name, "Rice");

        store.delete_product(&session, &oil.id).await.unwrap();
        assert_eq!(store.list_products().await.unwrap().len(), 1);
        assert!(matches!(
            store.delete_product(&session, &oil.id).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_daily_entry_upsert_is_keyed_by_date() {
        let store = MemoryStore::new();
        let session = store.sign_up("Alex", "alex@example.com", "secret1").await.unwrap();
        let may20 = NaiveDate::from_ymd_opt(2025, 5, 20).unwrap();
        let may19 = NaiveDate::from_ymd_opt(2025, 5, 19).unwrap();

        let first = store.upsert_daily_entry(&session, entry(may20, 50, 45)).await.unwrap();
        store.upsert_daily_entry(&session, entry(may19, 55, 50)).await.unwrap();
        let mut update = entry(may20, 52, 48);
        update.items = vec![EntryItem {
            name: "Rice".into(),
            quantity: "10kg".into(),
        }];
        let second = store.upsert_daily_entry(&session, update).await.unwrap();

        assert_eq!(first.id, second.id);
        let all = store.list_daily_entries().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].date, may20);
        assert_eq!(all[0].attendance, 100);
        assert_eq!(all[0].items.len(), 1);
        assert_eq!(
            store.daily_entry_for(may19).await.unwrap().map(|e| e.morning_count),
            Some(55)
        );
    }
}
