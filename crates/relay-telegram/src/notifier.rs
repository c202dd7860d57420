//! Delivers relay notifications to the team chat.

use async_trait::async_trait;
use relay_core::{Notification, Notifier, RelayError};
use teloxide::prelude::*;
use tracing::debug;

/// Posts every notification to one chat. Mentions are already part of the
/// text, so Telegram highlights the addressee.
#[derive(Clone)]
pub struct TelegramNotifier {
    bot: Bot,
    chat_id: ChatId,
}

impl TelegramNotifier {
    pub fn new(bot: Bot, chat_id: ChatId) -> Self {
        Self { bot, chat_id }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, notification: &Notification) -> relay_core::Result<()> {
        self.bot
            .send_message(self.chat_id, notification.text.clone())
            .await
            .map_err(|e| RelayError::Notify(e.to_string()))?;

        debug!(
            chat_id = %self.chat_id,
            kind = ?notification.kind,
            recipient = ?notification.recipient,
            "Notification delivered"
        );
        Ok(())
    }
}
