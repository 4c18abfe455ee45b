//! Update handlers.
//!
//! Each handler is a small adapter that:
//! - makes sure the chat has a user row (first contact creates it)
//! - reads or writes the domain store if it needs to
//! - emits outbound messages through the messaging port
//!
//! Handlers keep no state between calls: which "screen" a user is on is
//! implied entirely by the command text or callback payload that arrives.

use crate::{messaging::types::IncomingMessage, router::AppState, Result};

pub mod callback;
pub mod commands;
pub mod inline;
pub mod poll;

pub use callback::handle_callback;
pub use inline::{handle_chosen_inline_result, handle_inline_query};
pub use poll::{handle_poll, handle_poll_answer};

use commands::Command;

/// Shared by new and edited messages.
pub async fn handle_message(state: &AppState, msg: IncomingMessage) -> Result<()> {
    let chat_id = msg.chat_id;
    state.store.ensure_user(chat_id).await?;

    let Some(text) = msg.text.as_deref() else {
        tracing::debug!(chat_id = chat_id.0, "ignoring message without text");
        return Ok(());
    };

    match Command::parse(text) {
        Some(cmd) => commands::handle_command(state, chat_id, cmd).await,
        None => commands::send_usage(state, chat_id).await,
    }
}
