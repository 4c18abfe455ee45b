//! Core domain + application logic for the reminder bot.
//!
//! This crate is intentionally framework-agnostic. Telegram lives behind the
//! messaging port, implemented in the adapter crate.

pub mod callback_data;
pub mod config;
pub mod cooldown;
pub mod delivery;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod logging;
pub mod messaging;
pub mod router;
pub mod store;

#[cfg(test)]
mod testing;

pub use errors::{Error, Result};
