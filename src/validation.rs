//! Input validation for the public API
//!
//! All checks run before any external call is made.

use anyhow::{anyhow, Result};

/// Maximum lengths for sanity and abuse protection
pub const MAX_MESSAGE_LENGTH: usize = 8_000;
pub const MAX_TITLE_LENGTH: usize = 512;
pub const MAX_LABEL_LENGTH: usize = 64;
pub const MAX_HISTORY_TURNS: usize = 200;

/// Validate a chat message
pub fn validate_message(message: &str) -> Result<()> {
    if message.trim().is_empty() {
        return Err(anyhow!("Message is required"));
    }

    if message.len() > MAX_MESSAGE_LENGTH {
        return Err(anyhow!(
            "message too long: {} chars (max: {})",
            message.len(),
            MAX_MESSAGE_LENGTH
        ));
    }

    Ok(())
}

/// Validate a todo title
pub fn validate_title(title: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(anyhow!("Title is required"));
    }

    if title.len() > MAX_TITLE_LENGTH {
        return Err(anyhow!(
            "title too long: {} chars (max: {})",
            title.len(),
            MAX_TITLE_LENGTH
        ));
    }

    Ok(())
}

/// Validate a short text label (status, priority)
pub fn validate_label(name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(anyhow!("{name} cannot be empty"));
    }

    if value.len() > MAX_LABEL_LENGTH {
        return Err(anyhow!(
            "{name} too long: {} chars (max: {})",
            value.len(),
            MAX_LABEL_LENGTH
        ));
    }

    Ok(())
}

/// Validate caller-supplied conversation history length
pub fn validate_history_len(turns: usize) -> Result<()> {
    if turns > MAX_HISTORY_TURNS {
        return Err(anyhow!(
            "history too long: {turns} turns (max: {MAX_HISTORY_TURNS})"
        ));
    }
    Ok(())
}
