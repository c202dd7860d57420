//! Telegram transport configuration.
//!
//! Required:
//! - `TELEGRAM_BOT_TOKEN`: Bot token from @BotFather
//! - `TELEGRAM_CHAT_ID`: Chat that receives notifications and may run commands
//!
//! Optional:
//! - `TELEGRAM_WEBHOOK_URL`: Public URL Telegram posts updates to (webhook mode)
//! - `TELEGRAM_WEBHOOK_PORT`: Local port for the webhook server (default: 8443)

use crate::error::{Result, TelegramError};

/// Default webhook port.
pub const DEFAULT_WEBHOOK_PORT: u16 = 8443;

/// Settings for the chat side of the relay.
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: i64,
    pub webhook_url: Option<String>,
    pub webhook_port: u16,
}

impl TelegramConfig {
    /// Builds the config from process environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bot_token = get("TELEGRAM_BOT_TOKEN").ok_or(TelegramError::NoToken)?;
        let raw_chat = get("TELEGRAM_CHAT_ID").ok_or(TelegramError::NoChatId)?;
        let chat_id = raw_chat
            .trim()
            .parse::<i64>()
            .map_err(|_| TelegramError::InvalidChatId(raw_chat.clone()))?;

        let webhook_port = get("TELEGRAM_WEBHOOK_PORT")
            .and_then(|p| p.trim().parse().ok())
            .unwrap_or(DEFAULT_WEBHOOK_PORT);

        Ok(Self {
            bot_token: bot_token.trim().to_string(),
            chat_id,
            webhook_url: get("TELEGRAM_WEBHOOK_URL"),
            webhook_port,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_from_lookup() {
        let config = TelegramConfig::from_lookup(lookup(&[
            ("TELEGRAM_BOT_TOKEN", "123:abc"),
            ("TELEGRAM_CHAT_ID", "-100200300"),
        ]))
        .unwrap();

        assert_eq!(config.bot_token, "123:abc");
        assert_eq!(config.chat_id, -100200300);
        assert_eq!(config.webhook_port, DEFAULT_WEBHOOK_PORT);
        assert!(config.webhook_url.is_none());
    }

    #[test]
    fn test_missing_and_invalid() {
        assert!(matches!(
            TelegramConfig::from_lookup(lookup(&[("TELEGRAM_CHAT_ID", "1")])),
            Err(TelegramError::NoToken)
        ));
        assert!(matches!(
            TelegramConfig::from_lookup(lookup(&[("TELEGRAM_BOT_TOKEN", "t")])),
            Err(TelegramError::NoChatId)
        ));
        assert!(matches!(
            TelegramConfig::from_lookup(lookup(&[
                ("TELEGRAM_BOT_TOKEN", "t"),
                ("TELEGRAM_CHAT_ID", "team-chat"),
            ])),
            Err(TelegramError::InvalidChatId(_))
        ));
    }
}
