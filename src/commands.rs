//! Slash command handling (/signin, /entry, /chat, etc.).

use chrono::NaiveDate;
use crossbeam_channel::Sender;

use crate::dashboard::EntryForm;
use crate::input_state::InputState;
use crate::products::ProductForm;
use crate::protocol::BackendAction;
use crate::state::{ClientState, Page};
use crate::validation;

/// Every command with its usage line.
pub const COMMANDS: &[(&str, &str)] = &[
    ("/signin", "/signin <email> [password]  (no password: resume a remembered session)"),
    ("/signup", "/signup <email> <password> <full name>"),
    ("/signout", "/signout"),
    ("/dashboard", "/dashboard [YYYY-MM-DD]"),
    (
        "/entry",
        "/entry <morning> <night> [attendance=N] [date=YYYY-MM-DD] [items=Rice=10kg, Dal=5kg]",
    ),
    ("/entries", "/entries"),
    ("/products", "/products"),
    ("/product", "/product add <name> | <quantity>  or  /product rm <number|id>"),
    ("/chat", "/chat"),
    ("/leave", "/leave"),
    ("/history", "/history"),
    ("/up", "/up  (load the previous sent message into the draft)"),
    ("/down", "/down  (load the next sent message, or the original draft)"),
    ("/retry", "/retry  (send the current draft)"),
    ("/help", "/help"),
    ("/quit", "/quit"),
];

/// What the caller should do after a line was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Not a command; treat as chat input
    NotACommand,
    Handled,
    Quit,
}

/// Handle a line starting with '/'.
pub fn handle_user_command(
    input: &str,
    state: &mut ClientState,
    action_tx: &Sender<BackendAction>,
    today: NaiveDate,
) -> CommandOutcome {
    let s = input.trim();
    let Some(cmdline) = s.strip_prefix('/') else {
        return CommandOutcome::NotACommand;
    };
    let cmdline = cmdline.trim();
    let mut parts = cmdline.split_whitespace();
    let cmd = parts.next().unwrap_or("").to_lowercase();

    match cmd.as_str() {
        "signin" | "login" => match (parts.next(), parts.next()) {
            (Some(email), Some(password)) => {
                let _ = action_tx.send(BackendAction::SignIn {
                    email: email.to_string(),
                    password: password.to_string(),
                });
            }
            (Some(email), None) => {
                let _ = action_tx.send(BackendAction::RestoreSession {
                    email: email.to_string(),
                });
            }
            _ => state.log(format!("Usage: {}", usage("/signin"))),
        },
        "signup" => {
            let email = parts.next();
            let password = parts.next();
            let full_name = parts.collect::<Vec<_>>().join(" ");
            match (email, password) {
                (Some(email), Some(password)) if !full_name.is_empty() => {
                    let _ = action_tx.send(BackendAction::SignUp {
                        full_name,
                        email: email.to_string(),
                        password: password.to_string(),
                    });
                }
                _ => state.log(format!("Usage: {}", usage("/signup"))),
            }
        }
        "signout" | "logout" => {
            let _ = action_tx.send(BackendAction::SignOut);
        }
        "dashboard" => {
            if state.navigate(Page::Dashboard) {
                match parts.next() {
                    Some(date) => match validation::parse_entry_date(date) {
                        Ok(date) => {
                            let _ = action_tx.send(BackendAction::LoadSummary(date));
                        }
                        Err(e) => state.log(e),
                    },
                    None => {
                        let _ = action_tx.send(BackendAction::LoadSummary(today));
                    }
                }
            }
        }
        "entry" => {
            if state.navigate(Page::Dashboard) {
                let rest = cmdline[cmd.len()..].trim();
                match parse_entry_form(rest) {
                    Ok(form) => match form.parse(today) {
                        Ok(entry) => {
                            let _ = action_tx.send(BackendAction::SubmitEntry(entry));
                        }
                        Err(e) => state.log(e),
                    },
                    Err(e) => state.log(e),
                }
            }
        }
        "entries" => {
            if state.navigate(Page::Entries) {
                let _ = action_tx.send(BackendAction::LoadEntries);
            }
        }
        "products" => {
            if state.navigate(Page::Products) {
                let _ = action_tx.send(BackendAction::LoadProducts);
            }
        }
        "product" => {
            if state.navigate(Page::Products) {
                let sub = parts.next().unwrap_or("").to_lowercase();
                let rest = parts.collect::<Vec<_>>().join(" ");
                handle_product(&sub, &rest, state, action_tx);
            }
        }
        "chat" => {
            if state.navigate(Page::Chat) {
                let _ = action_tx.send(BackendAction::OpenChat);
            }
        }
        "leave" => {
            let _ = action_tx.send(BackendAction::CloseChat);
            if state.page == Page::Chat {
                state.navigate(Page::Dashboard);
            }
        }
        "history" => {
            if state.input.history.is_empty() {
                state.log("No sent messages yet");
            } else {
                let lines: Vec<String> = state
                    .input
                    .history
                    .iter()
                    .enumerate()
                    .map(|(i, h)| format!("  {}. {}", i + 1, h))
                    .collect();
                for line in lines {
                    state.log(line);
                }
            }
        }
        "up" | "down" => {
            let moved = if cmd == "up" {
                state.input.history_up()
            } else {
                state.input.history_down()
            };
            if !moved {
                state.log("No sent messages to browse");
            } else if state.input.message_input.is_empty() {
                state.log("Draft is empty");
            } else {
                let draft = format!("Draft: {} (/retry to send)", state.input.message_input);
                state.log(draft);
            }
        }
        "retry" => {
            if state.input.message_input.trim().is_empty() {
                state.log("Nothing to resend");
            } else if state.navigate(Page::Chat) {
                let draft = state.input.message_input.clone();
                state.input.stage(&draft);
                let _ = action_tx.send(BackendAction::SendMessage(draft));
            }
        }
        "help" => {
            state.log("Commands:");
            for (_, line) in COMMANDS {
                state.log(format!("  {}", line));
            }
        }
        "quit" | "exit" => {
            let _ = action_tx.send(BackendAction::Shutdown);
            return CommandOutcome::Quit;
        }
        unknown => {
            let suggestions = InputState::complete_command(&format!("/{}", unknown));
            if suggestions.is_empty() {
                state.log(format!("Unknown command: /{} (try /help)", unknown));
            } else {
                state.log(format!(
                    "Unknown command: /{} (did you mean {}?)",
                    unknown,
                    suggestions.join(", ")
                ));
            }
        }
    }
    CommandOutcome::Handled
}

/// Chat input typed on the chat page.
pub fn handle_chat_line(line: &str, state: &mut ClientState, action_tx: &Sender<BackendAction>) {
    if state.page != Page::Chat {
        state.log("Open the chat with /chat to send messages");
        return;
    }
    if let Err(e) = validation::validate_message(line) {
        state.log(e);
        return;
    }
    state.input.stage(line);
    let _ = action_tx.send(BackendAction::SendMessage(line.to_string()));
}

fn handle_product(
    sub: &str,
    rest: &str,
    state: &mut ClientState,
    action_tx: &Sender<BackendAction>,
) {
    match sub {
        "add" => {
            let Some((name, quantity)) = rest.split_once('|') else {
                state.log(format!("Usage: {}", usage("/product")));
                return;
            };
            let form = ProductForm::new(name, quantity);
            match form.parse() {
                Ok((name, quantity)) => {
                    let _ = action_tx.send(BackendAction::AddProduct { name, quantity });
                }
                Err(e) => state.log(e),
            }
        }
        "rm" | "delete" => match state.inventory.resolve(rest.trim()) {
            Some(product) => {
                let _ = action_tx.send(BackendAction::DeleteProduct(product.id.clone()));
            }
            None => state.log(format!("No such product: {} (see /products)", rest.trim())),
        },
        _ => state.log(format!("Usage: {}", usage("/product"))),
    }
}

/// Split `/entry` arguments into form fields. `items=` takes the rest of the line.
fn parse_entry_form(args: &str) -> Result<EntryForm, String> {
    let (head, items) = match args.find("items=") {
        Some(idx) => (&args[..idx], args[idx + "items=".len()..].trim()),
        None => (args, ""),
    };
    let mut form = EntryForm {
        items: items.to_string(),
        ..EntryForm::default()
    };
    let mut positional = Vec::new();
    for token in head.split_whitespace() {
        match token.split_once('=') {
            Some(("attendance", value)) => form.attendance = value.to_string(),
            Some(("date", value)) => form.date = value.to_string(),
            Some((key, _)) => return Err(format!("Unknown field: {}", key)),
            None => positional.push(token),
        }
    }
    match positional.as_slice() {
        [morning, night] => {
            form.morning_count = morning.to_string();
            form.night_count = night.to_string();
            Ok(form)
        }
        _ => Err(format!("Usage: {}", usage("/entry"))),
    }
}

fn usage(name: &str) -> &'static str {
    COMMANDS
        .iter()
        .find(|(cmd, _)| *cmd == name)
        .map(|(_, line)| *line)
        .unwrap_or("/help")
}
