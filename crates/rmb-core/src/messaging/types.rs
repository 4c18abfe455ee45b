use crate::domain::{ChatId, MessageId, UserId};

/// Cross-messenger inbound event.
///
/// Telegram-specific fields live in the Telegram adapter; it converts every
/// platform update into exactly one [`UpdateKind`].
#[derive(Clone, Debug)]
pub struct Update {
    pub id: i64,
    pub kind: UpdateKind,
}

/// Variants in dispatch priority order.
#[derive(Clone, Debug)]
pub enum UpdateKind {
    Message(IncomingMessage),
    EditedMessage(IncomingMessage),
    CallbackQuery(CallbackQuery),
    InlineQuery(InlineQuery),
    ChosenInlineResult(ChosenInlineResult),
    Poll(Poll),
    PollAnswer(PollAnswer),
    /// Anything the router has no handler for. `kind` is a short label for logs.
    Unrecognized { kind: String },
}

impl UpdateKind {
    pub fn name(&self) -> &str {
        match self {
            UpdateKind::Message(_) => "message",
            UpdateKind::EditedMessage(_) => "edited_message",
            UpdateKind::CallbackQuery(_) => "callback_query",
            UpdateKind::InlineQuery(_) => "inline_query",
            UpdateKind::ChosenInlineResult(_) => "chosen_inline_result",
            UpdateKind::Poll(_) => "poll",
            UpdateKind::PollAnswer(_) => "poll_answer",
            UpdateKind::Unrecognized { kind } => kind,
        }
    }
}

#[derive(Clone, Debug)]
pub struct IncomingMessage {
    pub chat_id: ChatId,
    pub message_id: MessageId,
    pub user_id: Option<UserId>,
    /// `None` for non-text messages (shared contact, location, media).
    pub text: Option<String>,
}

#[derive(Clone, Debug)]
pub struct CallbackQuery {
    pub callback_id: String,
    pub user_id: UserId,
    /// Chat of the message the button was attached to, if the platform reports it.
    pub chat_id: Option<ChatId>,
    pub data: String,
}

#[derive(Clone, Debug)]
pub struct InlineQuery {
    pub query_id: String,
    pub user_id: UserId,
    pub query: String,
}

#[derive(Clone, Debug)]
pub struct ChosenInlineResult {
    pub result_id: String,
    pub user_id: UserId,
    pub query: String,
}

#[derive(Clone, Debug)]
pub struct Poll {
    pub poll_id: String,
    pub question: String,
    pub options: Vec<String>,
    pub total_voter_count: u32,
}

#[derive(Clone, Debug)]
pub struct PollAnswer {
    pub poll_id: String,
    pub user_id: UserId,
    /// Selected option indices; empty when the vote was retracted.
    pub option_ids: Vec<i64>,
}

/// One entry of an inline-query answer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InlineArticle {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub message_text: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InlineAnswerOptions {
    pub cache_time_secs: u32,
    pub is_personal: bool,
}

impl Default for InlineAnswerOptions {
    fn default() -> Self {
        Self {
            cache_time_secs: 0,
            is_personal: true,
        }
    }
}

/// Capabilities / limits of a messenger implementation.
#[derive(Clone, Copy, Debug)]
pub struct MessagingCapabilities {
    pub max_message_len: usize,
    pub max_callback_data_len: usize,
}
