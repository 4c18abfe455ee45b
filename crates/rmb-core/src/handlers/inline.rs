use crate::{
    domain::ChatId,
    messaging::types::{ChosenInlineResult, InlineAnswerOptions, InlineArticle, InlineQuery},
    router::AppState,
    Result,
};

/// Telegram accepts at most 50 results per answer.
const MAX_INLINE_RESULTS: usize = 50;

/// Answer with the sender's activities whose title contains the query.
pub async fn handle_inline_query(state: &AppState, q: InlineQuery) -> Result<()> {
    // Inline queries come from a user, whose private chat id equals the user id.
    let owner = ChatId(q.user_id.0);
    let needle = q.query.trim().to_lowercase();

    let results: Vec<InlineArticle> = state
        .store
        .list_activities(owner)
        .await?
        .into_iter()
        .filter(|a| needle.is_empty() || a.title.to_lowercase().contains(&needle))
        .take(MAX_INLINE_RESULTS)
        .map(|a| InlineArticle {
            id: a.id.0.to_string(),
            message_text: format!("📌 {}", a.title),
            title: a.title,
            description: a.description,
        })
        .collect();

    tracing::debug!(user_id = q.user_id.0, results = results.len(), "answering inline query");
    state
        .messenger
        .answer_inline_query(&q.query_id, results, InlineAnswerOptions::default())
        .await
}

pub async fn handle_chosen_inline_result(state: &AppState, r: ChosenInlineResult) -> Result<()> {
    state
        .messenger
        .send_message(
            ChatId(r.user_id.0),
            &format!("You chose result with Id: {}", r.result_id),
            None,
        )
        .await?;
    Ok(())
}
