//! Backend event processing (sign-in results, feed updates, page data).

use crossbeam_channel::Receiver;

use crate::buffer::format_message_line;
use crate::dashboard::summary_lines;
use crate::entries::{format_entry_date, format_entry_row};
use crate::logging::LogEntry;
use crate::protocol::GuiEvent;
use crate::state::{ClientState, Page};

/// Apply every pending backend event.
pub fn process_events(event_rx: &Receiver<GuiEvent>, state: &mut ClientState) {
    while let Ok(event) = event_rx.try_recv() {
        apply_event(state, event);
    }
}

/// Apply one backend event to the client state.
pub fn apply_event(state: &mut ClientState, event: GuiEvent) {
    match event {
        GuiEvent::SignedIn {
            session,
            display_name,
        } => {
            state.session = Some(session);
            state.log(format!("Welcome, {}!", display_name));
            state.display_name = display_name;
            state.navigate(Page::Dashboard);
        }

        GuiEvent::SignedOut => {
            state.reset_session();
            state.log("Signed out");
        }

        GuiEvent::AuthFailed(reason) => {
            state.log(format!("Sign-in failed: {}", reason));
            if !state.is_signed_in() {
                state.page = Page::SignIn;
            }
        }

        GuiEvent::FeedLoaded(items) => {
            let own = state.own_user_id().map(str::to_string);
            let lines: Vec<String> = items
                .iter()
                .map(|item| format_message_line(item, own.as_deref()))
                .collect();
            state.chat.load(items);
            if state.page == Page::Chat {
                if lines.is_empty() {
                    state.log("No messages yet. Say hello!");
                }
                for line in lines {
                    state.log(line);
                }
            }
        }

        GuiEvent::FeedItemAdded { index, item } => {
            let is_active = state.page == Page::Chat;
            if let Some(logger) = &state.logger {
                logger.log(LogEntry::from_item(&item));
            }
            let line = format_message_line(&item, state.own_user_id());
            state.chat.insert_message(index, item, is_active);
            if is_active {
                state.log(line);
            }
        }

        GuiEvent::FeedClosed => {
            state.chat.clear();
            state.log("Chat closed");
        }

        GuiEvent::MessageSent(body) => state.input.commit_sent(&body),

        GuiEvent::MessageRejected { body, reason } => {
            state.log(format!(
                "Message not sent: {} (/retry to resend \"{}\")",
                reason, body
            ));
            state.input.restore_rejected(body);
        }

        GuiEvent::EntrySaved(entry) => {
            state.log(format!("Saved entry for {}", format_entry_date(entry.date)));
            if let Some((date, shown)) = &mut state.summary {
                if *date == entry.date {
                    *shown = Some(entry.clone());
                }
            }
            if let Some(pos) = state.entries.iter().position(|e| e.date == entry.date) {
                state.entries[pos] = entry;
            }
        }

        GuiEvent::SummaryLoaded { date, entry } => {
            for line in summary_lines(date, entry.as_ref()) {
                state.log(line);
            }
            state.summary = Some((date, entry));
        }

        GuiEvent::EntriesLoaded(entries) => {
            if entries.is_empty() {
                state.log("No entries yet");
            }
            for entry in &entries {
                state.log(format_entry_row(entry));
            }
            state.entries = entries;
        }

        GuiEvent::ProductsLoaded(products) => {
            state.inventory.replace(products);
            if state.inventory.products.is_empty() {
                state.log("No products yet");
            }
            let lines: Vec<String> = state
                .inventory
                .products
                .iter()
                .enumerate()
                .map(|(i, p)| format!("  {}. {} ({})", i + 1, p.name, p.quantity))
                .collect();
            for line in lines {
                state.log(line);
            }
        }

        GuiEvent::ProductAdded(product) => {
            state.log(format!("Added {} ({})", product.name, product.quantity));
            state.inventory.add(product);
        }

        GuiEvent::ProductDeleted(id) => {
            if let Some(product) = state.inventory.products.iter().find(|p| p.id == id) {
                let line = format!("Removed {}", product.name);
                state.log(line);
            }
            state.inventory.remove(&id);
        }

        GuiEvent::Notice(msg) => state.log(format!("* {}", msg)),

        GuiEvent::Error(msg) => state.log(format!("Error: {}", msg)),
    }
}
