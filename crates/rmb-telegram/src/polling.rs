use std::sync::Arc;

use async_trait::async_trait;
use teloxide::prelude::*;
use tokio_util::sync::CancellationToken;

use rmb_core::{
    config::Config,
    cooldown::CooldownPolicy,
    delivery::{DeliveryLoop, DeliveryStats, UpdateSource},
    messaging::{port::MessagingPort, types::Update},
    router::UpdateRouter,
    store::DomainStore,
    Result,
};

use crate::{convert, TelegramMessenger};

/// Long-polls `getUpdates`, acknowledging each batch by advancing the offset.
pub struct TelegramUpdateSource {
    bot: Bot,
    offset: i32,
    timeout_secs: u32,
}

impl TelegramUpdateSource {
    pub fn new(bot: Bot, timeout_secs: u32) -> Self {
        Self {
            bot,
            offset: 0,
            timeout_secs,
        }
    }
}

#[async_trait]
impl UpdateSource for TelegramUpdateSource {
    async fn next_batch(&mut self) -> Result<Option<Vec<Update>>> {
        let updates = self
            .bot
            .get_updates()
            .offset(self.offset)
            .timeout(self.timeout_secs)
            .await
            .map_err(TelegramMessenger::map_err)?;

        if let Some(last) = updates.last() {
            self.offset = last.id + 1;
        }
        Ok(Some(updates.into_iter().map(convert::update).collect()))
    }
}

/// Run the bot until `cancel` fires.
pub async fn run_polling(
    cfg: Arc<Config>,
    store: Arc<dyn DomainStore>,
    cancel: CancellationToken,
) -> DeliveryStats {
    let bot = Bot::new(cfg.telegram_bot_token.clone());

    match bot.get_me().await {
        Ok(me) => tracing::info!(username = %me.username(), "rmb started"),
        Err(e) => tracing::warn!(error = %e, "getMe failed, polling anyway"),
    }

    let messenger: Arc<dyn MessagingPort> =
        Arc::new(TelegramMessenger::new(bot.clone(), cancel.clone()));
    let router = Arc::new(UpdateRouter::new(store, messenger));
    let delivery = DeliveryLoop::new(
        router,
        CooldownPolicy::new(cfg.dispatch_cooldown),
        cfg.dispatch_concurrency,
    );

    let source = TelegramUpdateSource::new(bot, cfg.poll_timeout_secs);
    let stats = delivery.run(source, cancel).await;
    tracing::info!(
        dispatched = stats.dispatched,
        failed = stats.failed,
        "delivery loop stopped"
    );
    stats
}
