use async_trait::async_trait;

use crate::{
    domain::{ChatId, MessageRef},
    messaging::{
        markup::Markup,
        types::{InlineAnswerOptions, InlineArticle, MessagingCapabilities},
    },
    Result,
};

/// Cross-messenger port: the outbound half of the transport collaborator.
///
/// Every method may fail with [`crate::Error::Transport`].
#[async_trait]
pub trait MessagingPort: Send + Sync {
    fn capabilities(&self) -> MessagingCapabilities;

    async fn send_message(
        &self,
        chat_id: ChatId,
        text: &str,
        markup: Option<Markup>,
    ) -> Result<MessageRef>;

    /// Send a non-anonymous poll so answers come back as poll-answer updates.
    async fn send_poll(&self, chat_id: ChatId, question: &str, options: &[String])
        -> Result<MessageRef>;

    async fn answer_callback_query(&self, callback_id: &str, text: Option<&str>) -> Result<()>;

    async fn answer_inline_query(
        &self,
        query_id: &str,
        results: Vec<InlineArticle>,
        options: InlineAnswerOptions,
    ) -> Result<()>;
}
