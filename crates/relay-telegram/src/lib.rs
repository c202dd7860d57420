//! Telegram side of the Basecamp relay.
//!
//! Posts task notifications and the daily report to a team chat and exposes
//! a small command surface for steering the relay from that chat.
//!
//! # Environment Variables
//!
//! Required:
//! - `TELEGRAM_BOT_TOKEN`: Bot token from @BotFather
//! - `TELEGRAM_CHAT_ID`: Team chat id
//!
//! Optional:
//! - `TELEGRAM_WEBHOOK_URL`: Public URL for webhook mode
//! - `TELEGRAM_WEBHOOK_PORT`: Webhook port (default: 8443)
//!
//! Basecamp and schedule settings are read by [`relay_core::RelayConfig`].
//!
//! # Commands
//!
//! - `/start`, `/stop` - Toggle monitoring
//! - `/add Имя Фамилия @ник` - Register a name for a handle
//! - `/remove Имя Фамилия` - Forget a name
//! - `/team` - Show the roster
//! - `/status` - Monitoring state and schedule
//! - `/report` - Send the daily report now
//! - `/help` - List commands

pub mod bot;
pub mod commands;
pub mod config;
pub mod error;
pub mod handlers;
pub mod notifier;
pub mod state;
pub mod webhook;

pub use bot::{RelayBot, UpdateMode};
pub use commands::{Command, RosterCommand};
pub use config::TelegramConfig;
pub use error::{Result, TelegramError};
pub use notifier::TelegramNotifier;
pub use state::BotState;
