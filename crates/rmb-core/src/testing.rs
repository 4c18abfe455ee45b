use std::sync::{
    atomic::{AtomicI32, AtomicUsize, Ordering},
    Arc, Mutex,
};

use async_trait::async_trait;
use tokio::time::Instant;

use crate::{
    domain::{ChatId, MessageId, MessageRef, UserId},
    messaging::{
        markup::Markup,
        port::MessagingPort,
        types::{
            IncomingMessage, InlineAnswerOptions, InlineArticle, MessagingCapabilities, Update,
            UpdateKind,
        },
    },
    Error, Result,
};

/// One recorded outbound call.
#[derive(Clone, Debug, PartialEq)]
pub enum Sent {
    Message {
        chat_id: ChatId,
        text: String,
        markup: Option<Markup>,
    },
    Poll {
        chat_id: ChatId,
        question: String,
        options: Vec<String>,
    },
    CallbackAnswer {
        callback_id: String,
        text: Option<String>,
    },
    InlineAnswer {
        query_id: String,
        results: Vec<InlineArticle>,
        options: InlineAnswerOptions,
    },
}

/// Records every outbound call; can be told to fail the next N calls with a
/// transport error.
#[derive(Default)]
pub struct FakeMessenger {
    calls: Mutex<Vec<(Instant, Sent)>>,
    fail_next: AtomicUsize,
    next_id: AtomicI32,
}

impl FakeMessenger {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_next(&self, n: usize) {
        self.fail_next.store(n, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent_at().into_iter().map(|(_, s)| s).collect()
    }

    pub fn sent_at(&self) -> Vec<(Instant, Sent)> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, sent: Sent) -> Result<i32> {
        let failing = self
            .fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(Error::Transport("fake transport failure".to_string()));
        }
        self.calls.lock().unwrap().push((Instant::now(), sent));
        Ok(self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

#[async_trait]
impl MessagingPort for FakeMessenger {
    fn capabilities(&self) -> MessagingCapabilities {
        MessagingCapabilities {
            max_message_len: 4096,
            max_callback_data_len: 64,
        }
    }

    async fn send_message(
        &self,
        chat_id: ChatId,
        text: &str,
        markup: Option<Markup>,
    ) -> Result<MessageRef> {
        let id = self.record(Sent::Message {
            chat_id,
            text: text.to_string(),
            markup,
        })?;
        Ok(MessageRef {
            chat_id,
            message_id: MessageId(id),
        })
    }

    async fn send_poll(
        &self,
        chat_id: ChatId,
        question: &str,
        options: &[String],
    ) -> Result<MessageRef> {
        let id = self.record(Sent::Poll {
            chat_id,
            question: question.to_string(),
            options: options.to_vec(),
        })?;
        Ok(MessageRef {
            chat_id,
            message_id: MessageId(id),
        })
    }

    async fn answer_callback_query(&self, callback_id: &str, text: Option<&str>) -> Result<()> {
        self.record(Sent::CallbackAnswer {
            callback_id: callback_id.to_string(),
            text: text.map(str::to_string),
        })?;
        Ok(())
    }

    async fn answer_inline_query(
        &self,
        query_id: &str,
        results: Vec<InlineArticle>,
        options: InlineAnswerOptions,
    ) -> Result<()> {
        self.record(Sent::InlineAnswer {
            query_id: query_id.to_string(),
            results,
            options,
        })?;
        Ok(())
    }
}

pub fn text_update(id: i64, chat: i64, text: &str) -> Update {
    Update {
        id,
        kind: UpdateKind::Message(IncomingMessage {
            chat_id: ChatId(chat),
            message_id: MessageId(id as i32),
            user_id: Some(UserId(chat)),
            text: Some(text.to_string()),
        }),
    }
}
