//! teloxide update → core update.

use teloxide::types::{
    CallbackQuery as TgCallbackQuery, Message, Update as TgUpdate, UpdateKind as TgKind,
};

use rmb_core::{
    domain::{ChatId, MessageId, UserId},
    messaging::types::{
        CallbackQuery, ChosenInlineResult, IncomingMessage, InlineQuery, Poll, PollAnswer, Update,
        UpdateKind,
    },
};

fn user_id(user: &teloxide::types::User) -> UserId {
    UserId(user.id.0 as i64)
}

fn message(msg: &Message) -> IncomingMessage {
    IncomingMessage {
        chat_id: ChatId(msg.chat.id.0),
        message_id: MessageId(msg.id.0),
        user_id: msg.from().map(user_id),
        text: msg.text().map(str::to_string),
    }
}

fn callback(q: TgCallbackQuery) -> CallbackQuery {
    CallbackQuery {
        user_id: user_id(&q.from),
        chat_id: q.message.as_ref().map(|m| ChatId(m.chat.id.0)),
        data: q.data.unwrap_or_default(),
        callback_id: q.id,
    }
}

/// Short label for update kinds the router has no handler for.
fn unhandled_kind_name(kind: &TgKind) -> &'static str {
    match kind {
        TgKind::ChannelPost(_) => "channel_post",
        TgKind::EditedChannelPost(_) => "edited_channel_post",
        TgKind::ShippingQuery(_) => "shipping_query",
        TgKind::PreCheckoutQuery(_) => "pre_checkout_query",
        TgKind::MyChatMember(_) => "my_chat_member",
        TgKind::ChatMember(_) => "chat_member",
        TgKind::ChatJoinRequest(_) => "chat_join_request",
        TgKind::Error(_) => "unparsed",
        _ => "unknown",
    }
}

pub fn update(u: TgUpdate) -> Update {
    let id = i64::from(u.id);
    let kind = match u.kind {
        TgKind::Message(m) => UpdateKind::Message(message(&m)),
        TgKind::EditedMessage(m) => UpdateKind::EditedMessage(message(&m)),
        TgKind::CallbackQuery(q) => UpdateKind::CallbackQuery(callback(q)),
        TgKind::InlineQuery(q) => UpdateKind::InlineQuery(InlineQuery {
            user_id: user_id(&q.from),
            query_id: q.id,
            query: q.query,
        }),
        TgKind::ChosenInlineResult(r) => UpdateKind::ChosenInlineResult(ChosenInlineResult {
            user_id: user_id(&r.from),
            result_id: r.result_id,
            query: r.query,
        }),
        TgKind::Poll(p) => UpdateKind::Poll(Poll {
            options: p.options.into_iter().map(|o| o.text).collect(),
            total_voter_count: p.total_voter_count as u32,
            poll_id: p.id,
            question: p.question,
        }),
        TgKind::PollAnswer(a) => UpdateKind::PollAnswer(PollAnswer {
            user_id: user_id(&a.user),
            option_ids: a.option_ids.into_iter().map(i64::from).collect(),
            poll_id: a.poll_id,
        }),
        other => UpdateKind::Unrecognized {
            kind: unhandled_kind_name(&other).to_string(),
        },
    };
    Update { id, kind }
}
