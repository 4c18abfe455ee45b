use crate::{
    callback_data::EntityKind,
    domain::ChatId,
    handlers::{callback::ADD_ACTIVITY_ACTION, poll},
    messaging::{
        markup::{
            InlineButton, InlineKeyboard, KeyboardButton, KeyboardRequest, Markup, ReplyKeyboard,
        },
        text::split_message,
    },
    router::AppState,
    Error, Result,
};

/// Reply-keyboard labels that open the activity list.
pub const ACTIVITIES_LABEL_RU: &str = "📋 Мои активности";
pub const ACTIVITIES_LABEL_EN: &str = "📋 My activities";

const USAGE: &str = "Usage:\n\
/inline_buttons - send inline buttons\n\
/keyboard - send keyboard buttons\n\
/remove - remove keyboard buttons\n\
/request - request location or contact\n\
/inline_mode - send keyboard with inline-mode button\n\
/poll - send a poll\n\
/throw - what happens if a handler fails";

/// Fixed text-command vocabulary. Matching is exact: no trimming, no case
/// folding, no `@botname` suffix, no arguments.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    InlineButtons,
    Keyboard,
    Remove,
    Request,
    InlineMode,
    Poll,
    Throw,
    ShowActivities,
}

impl Command {
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "/inline_buttons" => Some(Command::InlineButtons),
            "/keyboard" => Some(Command::Keyboard),
            "/remove" => Some(Command::Remove),
            "/request" => Some(Command::Request),
            "/inline_mode" => Some(Command::InlineMode),
            "/poll" => Some(Command::Poll),
            "/throw" => Some(Command::Throw),
            ACTIVITIES_LABEL_RU | ACTIVITIES_LABEL_EN => Some(Command::ShowActivities),
            _ => None,
        }
    }
}

pub async fn handle_command(state: &AppState, chat_id: ChatId, cmd: Command) -> Result<()> {
    tracing::debug!(chat_id = chat_id.0, command = ?cmd, "running command");
    match cmd {
        Command::InlineButtons => send_inline_buttons(state, chat_id).await,
        Command::Keyboard => send_reply_keyboard(state, chat_id).await,
        Command::Remove => remove_keyboard(state, chat_id).await,
        Command::Request => request_contact_or_location(state, chat_id).await,
        Command::InlineMode => send_inline_mode_button(state, chat_id).await,
        Command::Poll => poll::send_poll(state, chat_id).await,
        Command::Throw => Err(Error::Internal(
            "/throw: intentional handler failure".to_string(),
        )),
        Command::ShowActivities => show_activities(state, chat_id).await,
    }
}

/// Fallback for any text that is not a command.
pub async fn send_usage(state: &AppState, chat_id: ChatId) -> Result<()> {
    let keyboard = ReplyKeyboard::from_rows([[ACTIVITIES_LABEL_RU, ACTIVITIES_LABEL_EN]]);
    state
        .messenger
        .send_message(chat_id, USAGE, Some(Markup::Reply(keyboard)))
        .await?;
    Ok(())
}

async fn send_inline_buttons(state: &AppState, chat_id: ChatId) -> Result<()> {
    let keyboard = InlineKeyboard::from_rows([
        [("1.1", "11"), ("1.2", "12")],
        [("2.1", "21"), ("2.2", "22")],
    ]);
    state
        .messenger
        .send_message(chat_id, "Inline buttons:", Some(Markup::Inline(keyboard)))
        .await?;
    Ok(())
}

async fn send_reply_keyboard(state: &AppState, chat_id: ChatId) -> Result<()> {
    let keyboard = ReplyKeyboard::from_rows([["1.1", "1.2"], ["2.1", "2.2"]]);
    state
        .messenger
        .send_message(chat_id, "Choose", Some(Markup::Reply(keyboard)))
        .await?;
    Ok(())
}

async fn remove_keyboard(state: &AppState, chat_id: ChatId) -> Result<()> {
    state
        .messenger
        .send_message(chat_id, "Removing keyboard", Some(Markup::Remove))
        .await?;
    Ok(())
}

async fn request_contact_or_location(state: &AppState, chat_id: ChatId) -> Result<()> {
    let keyboard = ReplyKeyboard::new(vec![
        vec![KeyboardButton::request("Location", KeyboardRequest::Location)],
        vec![KeyboardButton::request("Contact", KeyboardRequest::Contact)],
    ]);
    state
        .messenger
        .send_message(chat_id, "Who or Where are you?", Some(Markup::Reply(keyboard)))
        .await?;
    Ok(())
}

async fn send_inline_mode_button(state: &AppState, chat_id: ChatId) -> Result<()> {
    let keyboard = InlineKeyboard::default()
        .push_row(vec![InlineButton::switch_inline_current_chat("Inline Mode", "")]);
    state
        .messenger
        .send_message(
            chat_id,
            "Press the button to start inline query",
            Some(Markup::Inline(keyboard)),
        )
        .await?;
    Ok(())
}

async fn show_activities(state: &AppState, chat_id: ChatId) -> Result<()> {
    let activities = state.store.list_activities(chat_id).await?;

    let text = if activities.is_empty() {
        "You have no activities yet.".to_string()
    } else {
        let mut out = String::from("Your activities:");
        for (idx, a) in activities.iter().enumerate() {
            out.push_str(&format!("\n{}. {}", idx + 1, a.title));
            if let Some(d) = &a.description {
                out.push_str(&format!(": {d}"));
            }
        }
        out
    };

    let mut keyboard = InlineKeyboard::default();
    for a in &activities {
        let token = state.codec.encode(EntityKind::Activity, a.id.0)?;
        keyboard = keyboard.push_row(vec![InlineButton::callback(a.title.clone(), token)]);
    }
    keyboard = keyboard.push_row(vec![InlineButton::callback(
        "➕ Add activity",
        ADD_ACTIVITY_ACTION,
    )]);

    // Long lists go out in several messages; the keyboard rides on the last one.
    let max_len = state.messenger.capabilities().max_message_len;
    let chunks = split_message(&text, max_len);
    let last = chunks.len() - 1;
    let mut keyboard = Some(Markup::Inline(keyboard));
    for (idx, chunk) in chunks.iter().enumerate() {
        let markup = if idx == last { keyboard.take() } else { None };
        state.messenger.send_message(chat_id, chunk, markup).await?;
    }
    Ok(())
}
