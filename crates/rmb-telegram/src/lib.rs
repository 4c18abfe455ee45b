//! Telegram adapter (teloxide).
//!
//! This crate implements the `rmb-core` MessagingPort over the Telegram Bot API
//! and feeds Telegram updates into the core delivery loop.

use async_trait::async_trait;

use teloxide::{
    prelude::*,
    types::{
        ButtonRequest, InlineKeyboardButton, InlineKeyboardMarkup, InlineQueryResult,
        InlineQueryResultArticle, InputMessageContent, InputMessageContentText,
        KeyboardButton as TgKeyboardButton, KeyboardMarkup, KeyboardRemove, ReplyMarkup,
    },
};

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

pub mod convert;
pub mod polling;

use rmb_core::{
    callback_data::TELEGRAM_CALLBACK_DATA_LIMIT,
    domain::{ChatId, MessageId, MessageRef},
    errors::Error,
    messaging::{
        markup::{InlineAction, InlineButton, KeyboardButton, KeyboardRequest, Markup},
        port::MessagingPort,
        types::{InlineAnswerOptions, InlineArticle, MessagingCapabilities},
    },
    Result,
};

#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
    cancel: CancellationToken,
}

impl TelegramMessenger {
    /// `cancel` cuts short any flood-control wait so shutdown is not held up.
    pub fn new(bot: Bot, cancel: CancellationToken) -> Self {
        Self { bot, cancel }
    }

    fn tg_chat(chat_id: ChatId) -> teloxide::types::ChatId {
        teloxide::types::ChatId(chat_id.0)
    }

    pub(crate) fn map_err(e: teloxide::RequestError) -> Error {
        Error::Transport(format!("telegram error: {e}"))
    }

    async fn with_retry<T, Fut>(&self, op: impl FnMut() -> Fut) -> Result<T>
    where
        Fut: std::future::IntoFuture<Output = std::result::Result<T, teloxide::RequestError>>,
        Fut::IntoFuture: Send,
    {
        retry_after_flood(&self.cancel, op).await
    }
}

/// Run `op`, waiting out one `RetryAfter` before giving up. The wait aborts
/// with [`Error::Cancelled`] once `cancel` fires.
async fn retry_after_flood<T, Fut>(
    cancel: &CancellationToken,
    mut op: impl FnMut() -> Fut,
) -> Result<T>
where
    Fut: std::future::IntoFuture<Output = std::result::Result<T, teloxide::RequestError>>,
    Fut::IntoFuture: Send,
{
    const MAX_RETRIES: usize = 1;
    let mut attempts = 0usize;
    loop {
        match op().await {
            Ok(v) => return Ok(v),
            Err(e) => match e {
                teloxide::RequestError::RetryAfter(d) if attempts < MAX_RETRIES => {
                    attempts += 1;
                    tracing::debug!(retry_after = ?d, "telegram flood control, retrying");
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Err(Error::Cancelled),
                        _ = sleep(d) => {}
                    }
                }
                other => return Err(TelegramMessenger::map_err(other)),
            },
        }
    }
}

fn inline_button(b: InlineButton) -> InlineKeyboardButton {
    match b.action {
        InlineAction::Callback(data) => InlineKeyboardButton::callback(b.label, data),
        InlineAction::SwitchInlineQueryCurrentChat(query) => {
            InlineKeyboardButton::switch_inline_query_current_chat(b.label, query)
        }
    }
}

fn keyboard_button(b: KeyboardButton) -> TgKeyboardButton {
    let button = TgKeyboardButton::new(b.text);
    match b.request {
        Some(KeyboardRequest::Location) => button.request(ButtonRequest::Location),
        Some(KeyboardRequest::Contact) => button.request(ButtonRequest::Contact),
        None => button,
    }
}

/// Translate a transport-neutral markup into teloxide's reply markup.
pub fn reply_markup(markup: Markup) -> ReplyMarkup {
    match markup {
        Markup::Inline(kb) => ReplyMarkup::InlineKeyboard(InlineKeyboardMarkup::new(
            kb.rows
                .into_iter()
                .map(|row| row.into_iter().map(inline_button).collect::<Vec<_>>()),
        )),
        Markup::Reply(kb) => ReplyMarkup::Keyboard(
            KeyboardMarkup::new(
                kb.rows
                    .into_iter()
                    .map(|row| row.into_iter().map(keyboard_button).collect::<Vec<_>>()),
            )
            .resize_keyboard(kb.resize),
        ),
        Markup::Remove => ReplyMarkup::KeyboardRemove(KeyboardRemove::new()),
    }
}

fn inline_result(article: InlineArticle) -> InlineQueryResult {
    let content =
        InputMessageContent::Text(InputMessageContentText::new(article.message_text));
    let mut result = InlineQueryResultArticle::new(article.id, article.title, content);
    if let Some(d) = article.description {
        result = result.description(d);
    }
    InlineQueryResult::Article(result)
}

#[async_trait]
impl MessagingPort for TelegramMessenger {
    fn capabilities(&self) -> MessagingCapabilities {
        MessagingCapabilities {
            max_message_len: 4096,
            max_callback_data_len: TELEGRAM_CALLBACK_DATA_LIMIT,
        }
    }

    async fn send_message(
        &self,
        chat_id: ChatId,
        text: &str,
        markup: Option<Markup>,
    ) -> Result<MessageRef> {
        let markup = markup.map(reply_markup);
        let msg = self
            .with_retry(|| {
                let mut req = self.bot.send_message(Self::tg_chat(chat_id), text.to_string());
                if let Some(m) = &markup {
                    req = req.reply_markup(m.clone());
                }
                req
            })
            .await?;

        Ok(MessageRef {
            chat_id,
            message_id: MessageId(msg.id.0),
        })
    }

    async fn send_poll(
        &self,
        chat_id: ChatId,
        question: &str,
        options: &[String],
    ) -> Result<MessageRef> {
        let msg = self
            .with_retry(|| {
                self.bot
                    .send_poll(Self::tg_chat(chat_id), question.to_string(), options.to_vec())
                    .is_anonymous(false)
            })
            .await?;

        Ok(MessageRef {
            chat_id,
            message_id: MessageId(msg.id.0),
        })
    }

    async fn answer_callback_query(&self, callback_id: &str, text: Option<&str>) -> Result<()> {
        self.with_retry(|| {
            let mut req = self.bot.answer_callback_query(callback_id.to_string());
            if let Some(t) = text {
                req = req.text(t.to_string());
            }
            req
        })
        .await?;
        Ok(())
    }

    async fn answer_inline_query(
        &self,
        query_id: &str,
        results: Vec<InlineArticle>,
        options: InlineAnswerOptions,
    ) -> Result<()> {
        let results: Vec<InlineQueryResult> = results.into_iter().map(inline_result).collect();
        self.with_retry(|| {
            self.bot
                .answer_inline_query(query_id.to_string(), results.clone())
                .cache_time(options.cache_time_secs)
                .is_personal(options.is_personal)
        })
        .await?;
        Ok(())
    }
}
