//! Error types for the Telegram transport.

use thiserror::Error;

/// Errors that can occur in the Telegram bot.
#[derive(Debug, Error)]
pub enum TelegramError {
    /// Bot token not provided.
    #[error("Telegram bot token not set. Set TELEGRAM_BOT_TOKEN environment variable.")]
    NoToken,

    /// Destination chat not provided.
    #[error("Telegram chat not set. Set TELEGRAM_CHAT_ID environment variable.")]
    NoChatId,

    /// Destination chat is not a numeric id.
    #[error("Invalid TELEGRAM_CHAT_ID: {0}")]
    InvalidChatId(String),

    /// Failed to start the bot.
    #[error("Failed to start bot: {0}")]
    BotStartFailed(String),

    /// Webhook registration failed.
    #[error("Failed to register webhook: {0}")]
    WebhookFailed(String),

    /// Webhook mode without a public URL.
    #[error("Webhook mode needs a public URL. Pass --webhook-url or set TELEGRAM_WEBHOOK_URL.")]
    NoWebhookUrl,

    /// Relay core error (config, roster, HTTP client).
    #[error(transparent)]
    Relay(#[from] relay_core::RelayError),

    /// Scheduler error.
    #[error("Scheduler error: {0}")]
    Scheduler(#[from] relay_runtime::SchedulerError),

    /// IO error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for Telegram operations.
pub type Result<T> = std::result::Result<T, TelegramError>;
