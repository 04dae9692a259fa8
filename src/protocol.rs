use chrono::NaiveDate;

use crate::model::{DailyEntry, FeedItem, NewDailyEntry, Product, Session};

/// Actions sent from the UI to the Backend
#[derive(Debug, Clone)]
pub enum BackendAction {
    /// Create an account (and its profile), then sign in
    SignUp {
        full_name: String,
        email: String,
        password: String,
    },
    /// Sign in with email and password
    SignIn { email: String, password: String },
    /// Resume a remembered session for this email
    RestoreSession { email: String },
    /// Sign out and forget the remembered session
    SignOut,
    /// Open the group chat feed
    OpenChat,
    /// Close the group chat feed
    CloseChat,
    /// Post a chat message as the current user
    SendMessage(String),
    /// Upsert the daily entry for its date
    SubmitEntry(NewDailyEntry),
    /// Fetch the dashboard summary for a date
    LoadSummary(NaiveDate),
    /// Fetch the full entries log
    LoadEntries,
    /// Fetch the product inventory
    LoadProducts,
    /// Add a product to the inventory
    AddProduct { name: String, quantity: String },
    /// Remove a product from the inventory
    DeleteProduct(String),
    /// Stop the backend worker
    Shutdown,
}

/// Events sent from the Backend to the UI
#[derive(Debug, Clone)]
pub enum GuiEvent {
    /// A session was established (sign-in, sign-up or restore)
    SignedIn {
        session: Session,
        display_name: String,
    },
    /// The session was cleared
    SignedOut,
    /// Sign-in, sign-up or restore failed
    AuthFailed(String),
    /// Chat history loaded; replaces whatever the UI showed
    FeedLoaded(Vec<FeedItem>),
    /// A live chat message was resolved and placed at `index`
    FeedItemAdded { index: usize, item: FeedItem },
    /// The chat feed was torn down
    FeedClosed,
    /// The store accepted the chat message sent with this body
    MessageSent(String),
    /// The store refused the chat message sent with `body`
    MessageRejected { body: String, reason: String },
    /// Daily entry saved
    EntrySaved(DailyEntry),
    /// Dashboard summary for a date
    SummaryLoaded {
        date: NaiveDate,
        entry: Option<DailyEntry>,
    },
    /// Entries log, newest first
    EntriesLoaded(Vec<DailyEntry>),
    /// Inventory, newest first
    ProductsLoaded(Vec<Product>),
    ProductAdded(Product),
    ProductDeleted(String),
    /// Non-fatal problem worth showing to the user
    Notice(String),
    /// An action failed
    Error(String),
}
