//! Input validation for forms and chat messages

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::EntryItem;

/// Maximum chat message length in characters
pub const MAX_MESSAGE_CHARS: usize = 1000;
/// Maximum length of names and product fields
pub const MAX_FIELD_CHARS: usize = 80;
/// Minimum password length accepted by the auth provider
pub const MIN_PASSWORD_CHARS: usize = 6;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex pattern is valid")
});

/// Validates an email address (local@domain.tld)
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email cannot be empty".to_string());
    }
    if !EMAIL_RE.is_match(email) {
        return Err(format!("Invalid email address: {}", email));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), String> {
    if password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(format!(
            "Password too short (min {} characters)",
            MIN_PASSWORD_CHARS
        ));
    }
    Ok(())
}

/// Validates a full name for sign-up
pub fn validate_full_name(name: &str) -> Result<(), String> {
    validate_field("Full name", name)
}

/// Validates a product name or quantity/unit
pub fn validate_product_field(label: &str, value: &str) -> Result<(), String> {
    validate_field(label, value)
}

fn validate_field(label: &str, value: &str) -> Result<(), String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(format!("{} cannot be empty", label));
    }
    if value.chars().count() > MAX_FIELD_CHARS {
        return Err(format!(
            "{} too long (max {} characters)",
            label, MAX_FIELD_CHARS
        ));
    }
    if value.contains(|c: char| c.is_control()) {
        return Err(format!("{} contains invalid characters", label));
    }
    Ok(())
}

/// Validates a chat message body
pub fn validate_message(msg: &str) -> Result<(), String> {
    if msg.trim().is_empty() {
        return Err("Message cannot be empty".to_string());
    }
    if msg.chars().count() > MAX_MESSAGE_CHARS {
        return Err(format!(
            "Message too long (max {} characters)",
            MAX_MESSAGE_CHARS
        ));
    }
    Ok(())
}

/// Sanitizes a message by removing control characters other than newlines
pub fn sanitize_message(msg: &str) -> String {
    msg.chars()
        .filter(|&c| c == '\n' || !c.is_control())
        .take(MAX_MESSAGE_CHARS)
        .collect()
}

/// Parses a head-count field (non-negative integer)
pub fn parse_count(label: &str, value: &str) -> Result<u32, String> {
    value
        .trim()
        .parse::<u32>()
        .map_err(|_| format!("{} must be a whole number, got '{}'", label, value))
}

/// Parses a YYYY-MM-DD date
pub fn parse_entry_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| format!("Invalid date '{}', expected YYYY-MM-DD", value))
}

/// Parses "Rice=10kg, Dal=5kg" into entry items
pub fn parse_items(value: &str) -> Result<Vec<EntryItem>, String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            let (name, quantity) = part
                .split_once('=')
                .ok_or_else(|| format!("Item '{}' must look like name=quantity", part))?;
            validate_product_field("Item name", name)?;
            validate_product_field("Item quantity", quantity)?;
            Ok(EntryItem {
                name: name.trim().to_string(),
                quantity: quantity.trim().to_string(),
            })
        })
        .collect()
}
