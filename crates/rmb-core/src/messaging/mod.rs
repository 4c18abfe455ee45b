//! Cross-messenger abstractions (Telegram today).

pub mod markup;
pub mod port;
pub mod text;
pub mod types;
