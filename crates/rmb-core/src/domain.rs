use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

pub const TITLE_MAX_CHARS: usize = 100;
pub const DESCRIPTION_MAX_CHARS: usize = 500;

/// Platform user id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub i64);

/// Platform chat id (numeric). Doubles as the owner key of a [`User`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChatId(pub i64);

/// Platform message id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub i32);

/// A stable reference to a sent message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub chat_id: ChatId,
    pub message_id: MessageId,
}

/// Internal (storage) key of a user row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserKey(pub i64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActivityId(pub i64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AlarmId(pub i64);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserKey,
    pub chat_id: Option<ChatId>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub id: ActivityId,
    pub title: String,
    pub description: Option<String>,
    pub user_id: UserKey,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alarm {
    pub id: AlarmId,
    pub activity_id: ActivityId,
    pub time: DateTime<Utc>,
}

/// A validated activity that has not been persisted yet.
///
/// The bounds match the `CHECK` constraints of the `activities` table, so a
/// value of this type never trips the storage-level checks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewActivity {
    title: String,
    description: Option<String>,
}

impl NewActivity {
    pub fn new(title: &str, description: Option<&str>) -> Result<Self> {
        let title = title.trim();
        if title.is_empty() {
            return Err(Error::Validation("activity title must not be empty".into()));
        }
        let title_len = title.chars().count();
        if title_len > TITLE_MAX_CHARS {
            return Err(Error::Validation(format!(
                "activity title is {title_len} characters, limit is {TITLE_MAX_CHARS}"
            )));
        }

        let description = description.map(str::trim).filter(|d| !d.is_empty());
        if let Some(d) = description {
            let len = d.chars().count();
            if len > DESCRIPTION_MAX_CHARS {
                return Err(Error::Validation(format!(
                    "activity description is {len} characters, limit is {DESCRIPTION_MAX_CHARS}"
                )));
            }
        }

        Ok(Self {
            title: title.to_string(),
            description: description.map(str::to_string),
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}
