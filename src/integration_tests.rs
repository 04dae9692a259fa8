//! Integration tests for mess-client
//!
//! These tests exercise full workflows across multiple modules: commands go
//! to a live backend worker, and its events are applied to client state.

#[cfg(test)]
mod integration_tests {
    use chrono::NaiveDate;
    use crossbeam_channel::{unbounded, Receiver, Sender};
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    use crate::backend::{run_backend, BackendOptions};
    use crate::commands::{handle_chat_line, handle_user_command, CommandOutcome};
    use crate::events::apply_event;
    use crate::feed::FeedOrdering;
    use crate::protocol::{BackendAction, GuiEvent};
    use crate::state::{ClientState, Page};
    use crate::store::MemoryStore;

    struct Client {
        state: ClientState,
        action_tx: Sender<BackendAction>,
        event_rx: Receiver<GuiEvent>,
        log: Vec<String>,
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, 20).unwrap()
    }

    fn connect(store: Arc<MemoryStore>) -> Client {
        let (action_tx, action_rx) = unbounded();
        let (event_tx, event_rx) = unbounded();
        let options = BackendOptions {
            feed_ordering: FeedOrdering::Chronological,
            remember_session: false,
        };
        std::thread::spawn(move || run_backend(store, options, action_rx, event_tx));
        Client {
            state: ClientState::new(),
            action_tx,
            event_rx,
            log: Vec::new(),
        }
    }

    impl Client {
        fn command(&mut self, line: &str) {
            let outcome = handle_user_command(line, &mut self.state, &self.action_tx, today());
            if outcome == CommandOutcome::NotACommand {
                handle_chat_line(line, &mut self.state, &self.action_tx);
            }
            self.log.extend(self.state.drain_log());
        }

        /// Apply backend events until `done` holds.
        fn pump_until(&mut self, what: &str, done: impl Fn(&ClientState) -> bool) {
            let deadline = Instant::now() + Duration::from_secs(3);
            while !done(&self.state) {
                let left = deadline.saturating_duration_since(Instant::now());
                match self.event_rx.recv_timeout(left) {
                    Ok(event) => apply_event(&mut self.state, event),
                    Err(_) => panic!("timed out waiting for {}", what),
                }
                self.log.extend(self.state.drain_log());
            }
        }

        fn logged(&self, needle: &str) -> bool {
            self.log.iter().any(|line| line.contains(needle))
        }
    }

    impl Drop for Client {
        fn drop(&mut self) {
            let _ = self.action_tx.send(BackendAction::Shutdown);
        }
    }

    #[test]
    fn test_sign_up_lands_on_dashboard() {
        let mut client = connect(Arc::new(MemoryStore::new()));
        client.command("/signup max@example.com secret1 Max Robinson");
        client.pump_until("sign-in", |s| s.is_signed_in());
        assert_eq!(client.state.page, Page::Dashboard);
        assert_eq!(client.state.display_name, "Max Robinson");
        assert!(client.logged("Welcome, Max Robinson!"));
    }

    #[test]
    fn test_pages_need_sign_in() {
        let mut client = connect(Arc::new(MemoryStore::new()));
        client.command("/products");
        client.command("/chat");
        assert_eq!(client.state.page, Page::SignIn);
        assert!(client.event_rx.recv_timeout(Duration::from_millis(100)).is_err());
        assert!(client.logged("Please sign in first"));
    }

    #[test]
    fn test_two_users_chat() {
        let store = Arc::new(MemoryStore::new());
        let mut max = connect(Arc::clone(&store));
        let mut alex = connect(Arc::clone(&store));

        max.command("/signup max@example.com secret1 Max Robinson");
        max.pump_until("max signed in", |s| s.is_signed_in());
        alex.command("/signup alex@example.com secret1 Alex Kumar");
        alex.pump_until("alex signed in", |s| s.is_signed_in());

        max.command("/chat");
        max.pump_until("max feed", |s| s.chat.loaded);
        alex.command("/chat");
        alex.pump_until("alex feed", |s| s.chat.loaded);

        max.command("Dinner at 8");
        max.pump_until("own message", |s| s.chat.messages.len() == 1);
        alex.pump_until("max's message", |s| s.chat.messages.len() == 1);
        max.pump_until("history", |s| !s.input.history.is_empty());

        assert!(max.logged("] You: Dinner at 8"));
        assert!(alex.logged("] Max Robinson: Dinner at 8"));
        assert_eq!(max.state.input.history, vec!["Dinner at 8"]);
        assert!(max.state.input.message_input.is_empty());

        alex.command("/leave");
        alex.pump_until("feed closed", |s| !s.chat.loaded);
        assert_eq!(alex.state.page, Page::Dashboard);
    }

    #[test]
    fn test_products_by_command() {
        let mut client = connect(Arc::new(MemoryStore::new()));
        client.command("/signup max@example.com secret1 Max");
        client.pump_until("sign-in", |s| s.is_signed_in());

        client.command("/product add Rice | 25kg Bag");
        client.pump_until("rice", |s| s.inventory.products.len() == 1);
        client.command("/product add Cooking Oil | 5L Can");
        client.pump_until("oil", |s| s.inventory.products.len() == 2);
        assert_eq!(client.state.inventory.products[0].name, "Cooking Oil");

        client.command("/product rm 1");
        client.pump_until("removal", |s| s.inventory.products.len() == 1);
        assert!(client.logged("Removed Cooking Oil"));
        assert_eq!(client.state.inventory.products[0].name, "Rice");
    }

    #[test]
    fn test_entry_then_summary() {
        let mut client = connect(Arc::new(MemoryStore::new()));
        client.command("/signup max@example.com secret1 Max");
        client.pump_until("sign-in", |s| s.is_signed_in());

        client.command("/dashboard");
        client.pump_until("summary", |s| s.summary.is_some());
        assert!(client.logged("No entry yet"));

        client.command("/entry 50 45 items=Rice=10kg");
        client.pump_until("saved summary", |s| {
            matches!(&s.summary, Some((_, Some(entry))) if entry.attendance == 95)
        });
        assert!(client.logged("Saved entry for 20 May 2025"));

        client.command("/entries");
        client.pump_until("entries", |s| s.entries.len() == 1);
        assert!(client.logged("items: Rice (10kg)"));
    }

    #[test]
    fn test_sign_out_resets_state() {
        let mut client = connect(Arc::new(MemoryStore::new()));
        client.command("/signup max@example.com secret1 Max");
        client.pump_until("sign-in", |s| s.is_signed_in());
        client.command("/chat");
        client.pump_until("feed", |s| s.chat.loaded);

        client.command("/signout");
        client.pump_until("sign-out", |s| !s.is_signed_in());
        assert_eq!(client.state.page, Page::SignIn);
        assert!(client.state.chat.messages.is_empty());
    }
}
