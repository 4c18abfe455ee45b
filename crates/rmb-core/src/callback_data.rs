//! Compact entity references carried in inline-button payloads.
//!
//! Token grammar: `<tag>:<id>`, e.g. `act:42`. Action literals used by the
//! router never contain `:`, so they cannot be mistaken for a token.

use crate::{Error, Result};

/// Telegram rejects `callback_data` longer than this many bytes.
pub const TELEGRAM_CALLBACK_DATA_LIMIT: usize = 64;

const SEPARATOR: char = ':';

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntityKind {
    User,
    Activity,
    Alarm,
}

impl EntityKind {
    fn tag(self) -> &'static str {
        match self {
            EntityKind::User => "usr",
            EntityKind::Activity => "act",
            EntityKind::Alarm => "alm",
        }
    }

    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "usr" => Some(EntityKind::User),
            "act" => Some(EntityKind::Activity),
            "alm" => Some(EntityKind::Alarm),
            _ => None,
        }
    }
}

/// A decoded token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EntityRef {
    pub kind: EntityKind,
    pub id: i64,
}

#[derive(Clone, Copy, Debug)]
pub struct CallbackCodec {
    max_len: usize,
}

impl Default for CallbackCodec {
    fn default() -> Self {
        Self::new(TELEGRAM_CALLBACK_DATA_LIMIT)
    }
}

impl CallbackCodec {
    pub fn new(max_len: usize) -> Self {
        Self { max_len }
    }

    /// Fails with [`Error::CallbackDataTooLong`] instead of truncating.
    pub fn encode(&self, kind: EntityKind, id: i64) -> Result<String> {
        let token = format!("{}{SEPARATOR}{id}", kind.tag());
        if token.len() > self.max_len {
            return Err(Error::CallbackDataTooLong {
                len: token.len(),
                max: self.max_len,
            });
        }
        Ok(token)
    }

    pub fn decode(&self, token: &str) -> Result<EntityRef> {
        let invalid = || Error::InvalidCallbackData(token.to_string());

        if token.len() > self.max_len {
            return Err(invalid());
        }
        let (tag, id) = token.split_once(SEPARATOR).ok_or_else(invalid)?;
        let kind = EntityKind::from_tag(tag).ok_or_else(invalid)?;
        // `i64::from_str` accepts a leading '+', which `encode` never emits.
        if id.starts_with('+') {
            return Err(invalid());
        }
        let id = id.parse::<i64>().map_err(|_| invalid())?;
        Ok(EntityRef { kind, id })
    }
}
