//! Transport-neutral keyboard descriptors.
//!
//! Everything here is plain data: adapters translate a [`Markup`] into the
//! platform's own reply-markup type right before sending.

/// Markup attached to an outbound message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Markup {
    Inline(InlineKeyboard),
    Reply(ReplyKeyboard),
    /// Ask the client to hide a previously shown reply keyboard.
    Remove,
}

/// Keyboard attached under a message; presses come back as callback queries.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InlineKeyboard {
    pub rows: Vec<Vec<InlineButton>>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InlineButton {
    pub label: String,
    pub action: InlineAction,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InlineAction {
    /// Opaque payload echoed back in a callback query.
    Callback(String),
    /// Switch the user into inline mode in the current chat, prefilled with the query.
    SwitchInlineQueryCurrentChat(String),
}

/// Keyboard replacing the client's text input; presses arrive as plain text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReplyKeyboard {
    pub rows: Vec<Vec<KeyboardButton>>,
    pub resize: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyboardButton {
    pub text: String,
    pub request: Option<KeyboardRequest>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyboardRequest {
    Location,
    Contact,
}

impl InlineKeyboard {
    pub fn new(rows: Vec<Vec<InlineButton>>) -> Self {
        Self { rows }
    }

    /// Build from rows of `(label, callback payload)` pairs.
    pub fn from_rows<R, L, P>(rows: R) -> Self
    where
        R: IntoIterator,
        R::Item: IntoIterator<Item = (L, P)>,
        L: Into<String>,
        P: Into<String>,
    {
        let rows = rows
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|(label, payload)| InlineButton::callback(label, payload))
                    .collect()
            })
            .collect();
        Self { rows }
    }

    pub fn push_row(mut self, row: Vec<InlineButton>) -> Self {
        self.rows.push(row);
        self
    }
}

impl InlineButton {
    pub fn callback(label: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            action: InlineAction::Callback(payload.into()),
        }
    }

    pub fn switch_inline_current_chat(label: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            action: InlineAction::SwitchInlineQueryCurrentChat(query.into()),
        }
    }
}

impl ReplyKeyboard {
    pub fn new(rows: Vec<Vec<KeyboardButton>>) -> Self {
        Self { rows, resize: true }
    }

    /// Build from rows of plain text buttons.
    pub fn from_rows<R, T>(rows: R) -> Self
    where
        R: IntoIterator,
        R::Item: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self::new(
            rows.into_iter()
                .map(|row| row.into_iter().map(KeyboardButton::text).collect())
                .collect(),
        )
    }
}

impl KeyboardButton {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            request: None,
        }
    }

    pub fn request(text: impl Into<String>, request: KeyboardRequest) -> Self {
        Self {
            text: text.into(),
            request: Some(request),
        }
    }
}
