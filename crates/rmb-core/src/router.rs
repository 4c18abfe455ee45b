use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::{
    callback_data::CallbackCodec,
    handlers,
    messaging::{
        port::MessagingPort,
        types::{Update, UpdateKind},
    },
    store::DomainStore,
    Error, Result,
};

/// Dependencies shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DomainStore>,
    pub messenger: Arc<dyn MessagingPort>,
    pub codec: CallbackCodec,
}

/// Routes each inbound update to exactly one handler.
///
/// The router holds no per-chat state and takes no locks. The delivery loop may
/// run several dispatches at once, so two updates from the same chat can
/// interleave; all mutual exclusion lives in the store's per-call atomicity.
#[derive(Clone)]
pub struct UpdateRouter {
    state: AppState,
}

impl UpdateRouter {
    pub fn new(store: Arc<dyn DomainStore>, messenger: Arc<dyn MessagingPort>) -> Self {
        let codec = CallbackCodec::new(messenger.capabilities().max_callback_data_len);
        Self {
            state: AppState {
                store,
                messenger,
                codec,
            },
        }
    }

    /// Handle one update. Cancellation is checked once, before any work.
    pub async fn dispatch(&self, update: Update, cancel: &CancellationToken) -> Result<()> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let update_id = update.id;
        tracing::debug!(update_id, kind = update.kind.name(), "dispatching update");

        let state = &self.state;
        match update.kind {
            UpdateKind::Message(msg) | UpdateKind::EditedMessage(msg) => {
                handlers::handle_message(state, msg).await
            }
            UpdateKind::CallbackQuery(q) => handlers::handle_callback(state, q).await,
            UpdateKind::InlineQuery(q) => handlers::handle_inline_query(state, q).await,
            UpdateKind::ChosenInlineResult(r) => {
                handlers::handle_chosen_inline_result(state, r).await
            }
            UpdateKind::Poll(p) => handlers::handle_poll(p).await,
            UpdateKind::PollAnswer(a) => handlers::handle_poll_answer(state, a).await,
            UpdateKind::Unrecognized { kind } => {
                tracing::info!(update_id, kind = %kind, "unknown update type");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{ChatId, MessageId, UserId},
        errors::ErrorKind,
        handlers::{
            callback::ADD_ACTIVITY_ACTION,
            commands::{ACTIVITIES_LABEL_EN, ACTIVITIES_LABEL_RU},
            poll::POLL_OPTIONS,
        },
        messaging::{
            markup::{InlineAction, InlineButton, KeyboardButton, KeyboardRequest, Markup},
            types::{
                CallbackQuery, ChosenInlineResult, IncomingMessage, InlineQuery, PollAnswer,
            },
        },
        store::SqliteStore,
        testing::{text_update, FakeMessenger, Sent},
    };

    struct Harness {
        router: UpdateRouter,
        messenger: Arc<FakeMessenger>,
        store: Arc<SqliteStore>,
        cancel: CancellationToken,
    }

    impl Harness {
        fn new() -> Self {
            let messenger = FakeMessenger::new();
            let store = Arc::new(SqliteStore::in_memory().unwrap());
            Self {
                router: UpdateRouter::new(store.clone(), messenger.clone()),
                messenger,
                store,
                cancel: CancellationToken::new(),
            }
        }

        async fn dispatch(&self, update: Update) -> Result<()> {
            self.router.dispatch(update, &self.cancel).await
        }

        async fn text(&self, chat: i64, text: &str) -> Result<()> {
            self.dispatch(text_update(1, chat, text)).await
        }

        fn user_count(&self) -> i64 {
            self.store
                .connection()
                .unwrap()
                .query_row("SELECT COUNT(*) FROM users", [], |r| r.get(0))
                .unwrap()
        }
    }

    fn callback(data: &str) -> Update {
        Update {
            id: 2,
            kind: UpdateKind::CallbackQuery(CallbackQuery {
                callback_id: "cb-1".to_string(),
                user_id: UserId(10),
                chat_id: Some(ChatId(10)),
                data: data.to_string(),
            }),
        }
    }

    fn only_message(sent: &[Sent]) -> (ChatId, String, Option<Markup>) {
        assert_eq!(sent.len(), 1, "expected exactly one send, got {sent:?}");
        match &sent[0] {
            Sent::Message {
                chat_id,
                text,
                markup,
            } => (*chat_id, text.clone(), markup.clone()),
            other => panic!("expected a message, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn keyboard_command_sends_two_row_reply_keyboard() {
        let h = Harness::new();
        h.text(10, "/keyboard").await.unwrap();

        let (chat, _, markup) = only_message(&h.messenger.sent());
        assert_eq!(chat, ChatId(10));
        let Some(Markup::Reply(kb)) = markup else {
            panic!("expected reply keyboard");
        };
        assert_eq!(
            kb.rows,
            vec![
                vec![KeyboardButton::text("1.1"), KeyboardButton::text("1.2")],
                vec![KeyboardButton::text("2.1"), KeyboardButton::text("2.2")],
            ]
        );
    }

    #[tokio::test]
    async fn inline_buttons_command_sends_callback_grid() {
        let h = Harness::new();
        h.text(10, "/inline_buttons").await.unwrap();

        let (_, _, markup) = only_message(&h.messenger.sent());
        let Some(Markup::Inline(kb)) = markup else {
            panic!("expected inline keyboard");
        };
        assert_eq!(kb.rows.len(), 2);
        assert_eq!(kb.rows[1][1], InlineButton::callback("2.2", "22"));
    }

    #[tokio::test]
    async fn remove_request_and_inline_mode_commands() {
        let h = Harness::new();
        h.text(10, "/remove").await.unwrap();
        h.text(10, "/request").await.unwrap();
        h.text(10, "/inline_mode").await.unwrap();

        let sent = h.messenger.sent();
        assert_eq!(sent.len(), 3);
        let markups: Vec<Option<Markup>> = sent
            .into_iter()
            .map(|s| match s {
                Sent::Message { markup, .. } => markup,
                other => panic!("unexpected {other:?}"),
            })
            .collect();

        assert_eq!(markups[0], Some(Markup::Remove));

        let Some(Markup::Reply(req)) = &markups[1] else {
            panic!("expected reply keyboard");
        };
        assert_eq!(req.rows[0][0].request, Some(KeyboardRequest::Location));
        assert_eq!(req.rows[1][0].request, Some(KeyboardRequest::Contact));

        let Some(Markup::Inline(inline)) = &markups[2] else {
            panic!("expected inline keyboard");
        };
        assert_eq!(
            inline.rows[0][0].action,
            InlineAction::SwitchInlineQueryCurrentChat(String::new())
        );
    }

    #[tokio::test]
    async fn non_command_text_gets_usage_and_activity_keyboard() {
        let h = Harness::new();
        for text in ["hello", "/Keyboard", "/keyboard@rmb_bot"] {
            h.text(10, text).await.unwrap();
        }

        let sent = h.messenger.sent();
        assert_eq!(sent.len(), 3);
        for s in sent {
            let Sent::Message { text, markup, .. } = s else {
                panic!("expected message");
            };
            assert!(text.starts_with("Usage:"));
            let Some(Markup::Reply(kb)) = markup else {
                panic!("expected reply keyboard");
            };
            assert_eq!(
                kb.rows,
                vec![vec![
                    KeyboardButton::text(ACTIVITIES_LABEL_RU),
                    KeyboardButton::text(ACTIVITIES_LABEL_EN),
                ]]
            );
        }
    }

    #[tokio::test]
    async fn edited_messages_route_like_new_ones() {
        let h = Harness::new();
        let update = Update {
            id: 5,
            kind: UpdateKind::EditedMessage(IncomingMessage {
                chat_id: ChatId(10),
                message_id: MessageId(1),
                user_id: Some(UserId(10)),
                text: Some("/remove".to_string()),
            }),
        };
        h.dispatch(update).await.unwrap();

        let (_, _, markup) = only_message(&h.messenger.sent());
        assert_eq!(markup, Some(Markup::Remove));
    }

    #[tokio::test]
    async fn first_contact_creates_user_even_without_text() {
        let h = Harness::new();
        let update = Update {
            id: 6,
            kind: UpdateKind::Message(IncomingMessage {
                chat_id: ChatId(33),
                message_id: MessageId(1),
                user_id: Some(UserId(33)),
                text: None,
            }),
        };
        h.dispatch(update).await.unwrap();
        h.text(33, "hi").await.unwrap();

        assert_eq!(h.user_count(), 1);
        assert_eq!(h.messenger.sent().len(), 1);
    }

    #[tokio::test]
    async fn show_activities_lists_and_encodes_buttons() {
        let h = Harness::new();
        let chat = ChatId(10);
        let milk = h.store.create_activity(chat, "Buy milk", None).await.unwrap();
        h.store
            .create_activity(chat, "Run", Some("5k"))
            .await
            .unwrap();

        h.text(10, ACTIVITIES_LABEL_EN).await.unwrap();

        let (_, text, markup) = only_message(&h.messenger.sent());
        assert_eq!(text, "Your activities:\n1. Buy milk\n2. Run: 5k");
        let Some(Markup::Inline(kb)) = markup else {
            panic!("expected inline keyboard");
        };
        assert_eq!(kb.rows.len(), 3);
        assert_eq!(
            kb.rows[0][0],
            InlineButton::callback("Buy milk", format!("act:{}", milk.id.0))
        );
        assert_eq!(
            kb.rows[2][0],
            InlineButton::callback("➕ Add activity", ADD_ACTIVITY_ACTION)
        );
    }

    #[tokio::test]
    async fn show_activities_empty_state() {
        let h = Harness::new();
        h.text(10, ACTIVITIES_LABEL_RU).await.unwrap();

        let (_, text, markup) = only_message(&h.messenger.sent());
        assert_eq!(text, "You have no activities yet.");
        let Some(Markup::Inline(kb)) = markup else {
            panic!("expected inline keyboard");
        };
        assert_eq!(kb.rows.len(), 1);
    }

    #[tokio::test]
    async fn long_activity_list_is_split_to_fit_the_platform_limit() {
        let h = Harness::new();
        let chat = ChatId(10);
        let description = "d".repeat(crate::domain::DESCRIPTION_MAX_CHARS);
        for i in 0..8 {
            let title = format!("{i}{}", "t".repeat(crate::domain::TITLE_MAX_CHARS - 1));
            h.store
                .create_activity(chat, &title, Some(&description))
                .await
                .unwrap();
        }

        h.text(10, ACTIVITIES_LABEL_EN).await.unwrap();

        let limit = h.messenger.capabilities().max_message_len;
        let messages: Vec<(String, Option<Markup>)> = h
            .messenger
            .sent()
            .into_iter()
            .map(|s| match s {
                Sent::Message { text, markup, .. } => (text, markup),
                other => panic!("expected a message, got {other:?}"),
            })
            .collect();
        assert!(messages.len() > 1);
        for (text, _) in &messages {
            assert!(text.chars().count() <= limit, "{} > {limit}", text.chars().count());
        }

        let (last, head) = messages.split_last().unwrap();
        assert!(head.iter().all(|(_, markup)| markup.is_none()));
        let Some(Markup::Inline(kb)) = &last.1 else {
            panic!("expected inline keyboard on the last chunk");
        };
        assert_eq!(kb.rows.len(), 9);

        let joined: String = messages.iter().map(|(t, _)| t.as_str()).collect();
        for i in 0..8 {
            assert!(joined.contains(&format!("{}. {i}t", i + 1)));
        }
    }

    #[tokio::test]
    async fn unknown_callback_payload_is_still_acknowledged() {
        let h = Harness::new();
        h.dispatch(callback("xyz")).await.unwrap();

        assert_eq!(
            h.messenger.sent(),
            vec![
                Sent::CallbackAnswer {
                    callback_id: "cb-1".to_string(),
                    text: Some("Received xyz".to_string()),
                },
                Sent::Message {
                    chat_id: ChatId(10),
                    text: "Received xyz".to_string(),
                    markup: None,
                },
            ]
        );
    }

    #[tokio::test]
    async fn add_activity_and_entity_callbacks_are_acknowledged() {
        let h = Harness::new();
        h.dispatch(callback(ADD_ACTIVITY_ACTION)).await.unwrap();
        h.dispatch(callback("act:999")).await.unwrap();

        let acks: Vec<Sent> = h
            .messenger
            .sent()
            .into_iter()
            .filter(|s| matches!(s, Sent::Message { .. }))
            .collect();
        assert_eq!(acks.len(), 2);
        assert!(matches!(&acks[0], Sent::Message { text, .. } if text == "Received add_activity"));
        assert!(matches!(&acks[1], Sent::Message { text, .. } if text == "Received act:999"));

        // The placeholder action writes nothing besides the user row.
        assert!(h.store.list_activities(ChatId(10)).await.unwrap().is_empty());
        assert_eq!(h.user_count(), 1);
    }

    #[tokio::test]
    async fn callback_without_chat_answers_in_private_chat() {
        let h = Harness::new();
        let update = Update {
            id: 3,
            kind: UpdateKind::CallbackQuery(CallbackQuery {
                callback_id: "cb-2".to_string(),
                user_id: UserId(44),
                chat_id: None,
                data: "11".to_string(),
            }),
        };
        h.dispatch(update).await.unwrap();

        let sent = h.messenger.sent();
        assert_eq!(sent.len(), 2);
        assert!(matches!(&sent[1], Sent::Message { chat_id, .. } if *chat_id == ChatId(44)));
    }

    #[tokio::test]
    async fn inline_query_answers_with_matching_activities() {
        let h = Harness::new();
        let chat = ChatId(10);
        let run = h.store.create_activity(chat, "Morning run", None).await.unwrap();
        h.store.create_activity(chat, "Buy milk", None).await.unwrap();
        h.store.create_activity(ChatId(11), "Evening run", None).await.unwrap();

        let update = Update {
            id: 4,
            kind: UpdateKind::InlineQuery(InlineQuery {
                query_id: "iq".to_string(),
                user_id: UserId(10),
                query: "RUN".to_string(),
            }),
        };
        h.dispatch(update).await.unwrap();

        let sent = h.messenger.sent();
        assert_eq!(sent.len(), 1);
        let Sent::InlineAnswer {
            query_id,
            results,
            options,
        } = &sent[0]
        else {
            panic!("expected inline answer");
        };
        assert_eq!(query_id, "iq");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, run.id.0.to_string());
        assert_eq!(results[0].title, "Morning run");
        assert!(options.is_personal);
        assert_eq!(options.cache_time_secs, 0);
    }

    #[tokio::test]
    async fn chosen_inline_result_is_echoed_to_sender() {
        let h = Harness::new();
        let update = Update {
            id: 4,
            kind: UpdateKind::ChosenInlineResult(ChosenInlineResult {
                result_id: "17".to_string(),
                user_id: UserId(12),
                query: "run".to_string(),
            }),
        };
        h.dispatch(update).await.unwrap();

        let (chat, text, _) = only_message(&h.messenger.sent());
        assert_eq!(chat, ChatId(12));
        assert_eq!(text, "You chose result with Id: 17");
    }

    #[tokio::test]
    async fn poll_command_and_answers() {
        let h = Harness::new();
        h.text(10, "/poll").await.unwrap();

        let answer = |ids: Vec<i64>| Update {
            id: 9,
            kind: UpdateKind::PollAnswer(PollAnswer {
                poll_id: "p1".to_string(),
                user_id: UserId(10),
                option_ids: ids,
            }),
        };
        h.dispatch(answer(vec![1])).await.unwrap();
        h.dispatch(answer(vec![])).await.unwrap();

        let err = h.dispatch(answer(vec![5])).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Programming);

        let sent = h.messenger.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(
            sent[0],
            Sent::Poll {
                chat_id: ChatId(10),
                question: "Question".to_string(),
                options: POLL_OPTIONS.iter().map(|s| s.to_string()).collect(),
            }
        );
        assert!(matches!(&sent[1], Sent::Message { text, .. } if text == "You've chosen: World!"));
    }

    #[tokio::test]
    async fn unrecognized_updates_are_ignored() {
        let h = Harness::new();
        let update = Update {
            id: 8,
            kind: UpdateKind::Unrecognized {
                kind: "chat_join_request".to_string(),
            },
        };
        h.dispatch(update).await.unwrap();
        assert!(h.messenger.sent().is_empty());
    }

    #[tokio::test]
    async fn throw_command_fails_without_sending() {
        let h = Harness::new();
        let err = h.text(10, "/throw").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Other);
        assert!(h.messenger.sent().is_empty());
    }

    #[tokio::test]
    async fn transport_failures_surface_as_transport_errors() {
        let h = Harness::new();
        h.messenger.fail_next(1);
        let err = h.text(10, "/keyboard").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
    }

    #[tokio::test]
    async fn cancelled_dispatch_does_no_work() {
        let h = Harness::new();
        h.cancel.cancel();
        let err = h.text(10, "/keyboard").await.unwrap_err();
        assert!(matches!(err, Error::Cancelled));
        assert!(h.messenger.sent().is_empty());
        assert_eq!(h.user_count(), 0);
    }
}
