use crate::{
    callback_data::EntityKind,
    domain::{ActivityId, ChatId},
    messaging::types::CallbackQuery,
    router::AppState,
    Error, Result,
};

/// Payload of the "Add activity" button under the activity list.
pub const ADD_ACTIVITY_ACTION: &str = "add_activity";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CallbackAction {
    AddActivity,
    Default,
}

impl CallbackAction {
    fn parse(data: &str) -> Self {
        match data {
            ADD_ACTIVITY_ACTION => CallbackAction::AddActivity,
            _ => CallbackAction::Default,
        }
    }
}

pub async fn handle_callback(state: &AppState, q: CallbackQuery) -> Result<()> {
    // Inline-mode messages carry no chat; answer in the presser's private chat.
    let chat_id = q.chat_id.unwrap_or(ChatId(q.user_id.0));

    let action_result = run_action(state, chat_id, &q.data).await;

    // Always answer, even when the action failed or did nothing.
    let ack = format!("Received {}", q.data);
    state
        .messenger
        .answer_callback_query(&q.callback_id, Some(&ack))
        .await?;
    state.messenger.send_message(chat_id, &ack, None).await?;

    action_result
}

async fn run_action(state: &AppState, chat_id: ChatId, data: &str) -> Result<()> {
    state.store.ensure_user(chat_id).await?;

    match CallbackAction::parse(data) {
        CallbackAction::AddActivity => {
            // Placeholder: creating an activity needs a multi-step flow that is not defined yet.
            tracing::info!(chat_id = chat_id.0, "add activity requested");
            Ok(())
        }
        CallbackAction::Default => describe_payload(state, chat_id, data).await,
    }
}

async fn describe_payload(state: &AppState, chat_id: ChatId, data: &str) -> Result<()> {
    let entity = match state.codec.decode(data) {
        Ok(entity) => entity,
        Err(_) => {
            tracing::debug!(chat_id = chat_id.0, payload = data, "no action bound to callback payload");
            return Ok(());
        }
    };

    if entity.kind != EntityKind::Activity {
        tracing::debug!(chat_id = chat_id.0, kind = ?entity.kind, id = entity.id, "callback references entity");
        return Ok(());
    }

    match state.store.find_activity(chat_id, ActivityId(entity.id)).await {
        Ok(activity) => {
            tracing::debug!(chat_id = chat_id.0, activity_id = entity.id, title = %activity.title, "activity button pressed");
            Ok(())
        }
        // Buttons outlive the activities they point at.
        Err(Error::NotFound(_)) => {
            tracing::debug!(chat_id = chat_id.0, activity_id = entity.id, "stale activity button");
            Ok(())
        }
        Err(e) => Err(e),
    }
}
