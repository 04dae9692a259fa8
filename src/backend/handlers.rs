//! Action routing and event generation
//!
//! Each `BackendAction` becomes one call into the domain modules. Results
//! and failures go back to the UI as `GuiEvent`s; nothing here panics or
//! stops the worker.

use crossbeam_channel::Sender;
use std::sync::Arc;
use tracing::{debug, warn};

use super::main_loop::BackendOptions;
use crate::auth::{self, SignedIn};
use crate::dashboard;
use crate::entries;
use crate::error::ActionError;
use crate::feed::{self, spawn_feed, FeedHandle};
use crate::model::NewDailyEntry;
use crate::products::{self, ProductForm};
use crate::protocol::{BackendAction, GuiEvent};
use crate::session::{self, SessionContext};
use crate::store::Store;

/// State owned by the worker thread: the store, the session, and the open feed.
pub(super) struct Worker<S> {
    store: Arc<S>,
    options: BackendOptions,
    ctx: SessionContext,
    feed: Option<FeedHandle>,
    event_tx: Sender<GuiEvent>,
}

impl<S: Store> Worker<S> {
    pub(super) fn new(store: Arc<S>, options: BackendOptions, event_tx: Sender<GuiEvent>) -> Self {
        Self {
            store,
            options,
            ctx: SessionContext::new(),
            feed: None,
            event_tx,
        }
    }

    fn send(&self, event: GuiEvent) {
        // A closed channel means the UI is exiting; the main loop notices
        let _ = self.event_tx.send(event);
    }

    pub(super) async fn handle(&mut self, action: BackendAction) {
        debug!(event = "backend.action", action = action_name(&action));
        match action {
            BackendAction::SignUp {
                full_name,
                email,
                password,
            } => {
                let result =
                    auth::sign_up(self.store.as_ref(), &mut self.ctx, &full_name, &email, &password).await;
                self.finish_auth(result);
            }
            BackendAction::SignIn { email, password } => {
                let result = auth::sign_in(self.store.as_ref(), &mut self.ctx, &email, &password).await;
                self.finish_auth(result);
            }
            BackendAction::RestoreSession { email } => self.restore(&email).await,
            BackendAction::SignOut => self.sign_out().await,
            BackendAction::OpenChat => self.open_chat().await,
            BackendAction::CloseChat => {
                if self.feed.is_none() {
                    self.send(GuiEvent::Notice("Chat is not open".into()));
                }
                self.close_feed().await;
            }
            BackendAction::SendMessage(text) => self.send_message(text).await,
            BackendAction::SubmitEntry(entry) => self.submit_entry(entry).await,
            BackendAction::LoadSummary(date) => {
                match dashboard::load_summary(self.store.as_ref(), date).await {
                    Ok(entry) => self.send(GuiEvent::SummaryLoaded { date, entry }),
                    Err(e) => self.report("Could not load summary", e),
                }
            }
            BackendAction::LoadEntries => match entries::load_entries(self.store.as_ref()).await {
                Ok(list) => self.send(GuiEvent::EntriesLoaded(list)),
                Err(e) => self.report("Could not load entries", e),
            },
            BackendAction::LoadProducts => match products::load_products(self.store.as_ref()).await {
                Ok(list) => self.send(GuiEvent::ProductsLoaded(list)),
                Err(e) => self.report("Could not load products", e),
            },
            BackendAction::AddProduct { name, quantity } => {
                let form = ProductForm::new(name, quantity);
                match products::add_product(self.store.as_ref(), &self.ctx, &form).await {
                    Ok(product) => self.send(GuiEvent::ProductAdded(product)),
                    Err(e) => self.report("Could not add product", e),
                }
            }
            BackendAction::DeleteProduct(id) => {
                match products::delete_product(self.store.as_ref(), &self.ctx, &id).await {
                    Ok(()) => self.send(GuiEvent::ProductDeleted(id)),
                    Err(e) => self.report("Could not delete product", e),
                }
            }
            // Handled by the main loop before dispatch
            BackendAction::Shutdown => {}
        }
    }

    /// Tear down the chat feed if one is running.
    pub(super) async fn close_feed(&mut self) {
        if let Some(handle) = self.feed.take() {
            handle.teardown().await;
        }
    }

    fn finish_auth(&mut self, result: Result<SignedIn, ActionError>) {
        match result {
            Ok(signed) => {
                if self.options.remember_session {
                    if let Err(e) =
                        session::save_session_token(&signed.session.email, &signed.session.access_token)
                    {
                        warn!(event = "backend.remember_failed", error = %e);
                        self.send(GuiEvent::Notice(format!("Session will not be remembered: {}", e)));
                    }
                }
                self.send(GuiEvent::SignedIn {
                    session: signed.session,
                    display_name: signed.display_name,
                });
            }
            Err(e) => self.send(GuiEvent::AuthFailed(e.to_string())),
        }
    }

    async fn restore(&mut self, email: &str) {
        let Some(token) = session::load_session_token(email) else {
            self.send(GuiEvent::AuthFailed(format!("No remembered session for {}", email)));
            return;
        };
        let result = auth::restore(self.store.as_ref(), &mut self.ctx, &token).await;
        if result.is_err() {
            // Stale token: forget it so the next start asks for a password
            session::clear_session_token(email);
        }
        self.finish_auth(result);
    }

    async fn sign_out(&mut self) {
        self.close_feed().await;
        match auth::sign_out(self.store.as_ref(), &mut self.ctx).await {
            Some(session) => {
                if self.options.remember_session {
                    session::clear_session_token(&session.email);
                }
                self.send(GuiEvent::SignedOut);
            }
            None => self.send(GuiEvent::Notice("Not signed in".into())),
        }
    }

    async fn open_chat(&mut self) {
        if !self.ctx.is_signed_in() {
            self.send(GuiEvent::Error("Sign in to open the chat".into()));
            return;
        }
        // Reopening starts a fresh sequence
        self.close_feed().await;
        self.feed = Some(spawn_feed(
            Arc::clone(&self.store),
            self.options.feed_ordering,
            self.event_tx.clone(),
        ));
    }

    async fn send_message(&mut self, text: String) {
        let mut draft = text.clone();
        match feed::submit_message(self.store.as_ref(), &self.ctx, &mut draft).await {
            // The message itself arrives through the feed subscription
            Ok(_) => self.send(GuiEvent::MessageSent(text)),
            Err(e) => self.send(GuiEvent::MessageRejected {
                body: text,
                reason: e.to_string(),
            }),
        }
    }

    async fn submit_entry(&mut self, entry: NewDailyEntry) {
        match dashboard::submit_entry(self.store.as_ref(), &self.ctx, entry).await {
            Ok(saved) => self.send(GuiEvent::EntrySaved(saved)),
            Err(e) => self.report("Could not save entry", e),
        }
    }

    fn report(&self, what: &str, error: ActionError) {
        warn!(event = "backend.action_failed", what, error = %error);
        self.send(GuiEvent::Error(format!("{}: {}", what, error)));
    }
}

fn action_name(action: &BackendAction) -> &'static str {
    match action {
        BackendAction::SignUp { .. } => "sign_up",
        BackendAction::SignIn { .. } => "sign_in",
        BackendAction::RestoreSession { .. } => "restore_session",
        BackendAction::SignOut => "sign_out",
        BackendAction::OpenChat => "open_chat",
        BackendAction::CloseChat => "close_chat",
        BackendAction::SendMessage(_) => "send_message",
        BackendAction::SubmitEntry(_) => "submit_entry",
        BackendAction::LoadSummary(_) => "load_summary",
        BackendAction::LoadEntries => "load_entries",
        BackendAction::LoadProducts => "load_products",
        BackendAction::AddProduct { .. } => "add_product",
        BackendAction::DeleteProduct(_) => "delete_product",
        BackendAction::Shutdown => "shutdown",
    }
}
