use crate::{
    domain::ChatId,
    messaging::types::{Poll, PollAnswer},
    router::AppState,
    Error, Result,
};

pub const POLL_QUESTION: &str = "Question";

/// Options of the poll sent by `/poll`; answers index into this list.
pub const POLL_OPTIONS: [&str; 2] = ["Hello", "World!"];

/// Bounds-checked lookup. An index outside the list means the answer does not
/// belong to our poll, which is a bug rather than user input.
pub fn poll_option(index: i64) -> Result<&'static str> {
    usize::try_from(index)
        .ok()
        .and_then(|i| POLL_OPTIONS.get(i))
        .copied()
        .ok_or_else(|| {
            Error::Programming(format!(
                "poll option index {index} out of range 0..{}",
                POLL_OPTIONS.len()
            ))
        })
}

pub async fn send_poll(state: &AppState, chat_id: ChatId) -> Result<()> {
    let options: Vec<String> = POLL_OPTIONS.iter().map(|s| s.to_string()).collect();
    state
        .messenger
        .send_poll(chat_id, POLL_QUESTION, &options)
        .await?;
    Ok(())
}

pub async fn handle_poll(poll: Poll) -> Result<()> {
    tracing::info!(
        poll_id = %poll.poll_id,
        question = %poll.question,
        options = poll.options.len(),
        voters = poll.total_voter_count,
        "poll state updated"
    );
    Ok(())
}

pub async fn handle_poll_answer(state: &AppState, answer: PollAnswer) -> Result<()> {
    let Some(&index) = answer.option_ids.first() else {
        tracing::info!(poll_id = %answer.poll_id, user_id = answer.user_id.0, "poll vote retracted");
        return Ok(());
    };

    let label = poll_option(index)?;
    state
        .messenger
        .send_message(
            ChatId(answer.user_id.0),
            &format!("You've chosen: {label}"),
            None,
        )
        .await?;
    Ok(())
}
