//! Basecamp relay binary.
//!
//! ```bash
//! TELEGRAM_BOT_TOKEN=xxx TELEGRAM_CHAT_ID=-100... \
//! BASECAMP_ACCOUNT_ID=123 BASECAMP_ACCESS_TOKEN=yyy cargo run -p relay-telegram
//! ```

use std::path::PathBuf;

use clap::Parser;
use relay_core::{config, RelayConfig};
use relay_telegram::{RelayBot, TelegramConfig, TelegramError, UpdateMode};
use tracing_subscriber::EnvFilter;
use url::Url;

/// Relays Basecamp task activity into a Telegram team chat
#[derive(Parser, Debug)]
#[command(name = "relay-telegram")]
#[command(about = "Basecamp to Telegram task relay")]
struct Args {
    /// Use webhook mode (default: long polling)
    #[arg(short, long)]
    webhook: bool,

    /// Webhook port (overrides TELEGRAM_WEBHOOK_PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Public webhook URL (overrides TELEGRAM_WEBHOOK_URL)
    #[arg(long)]
    webhook_url: Option<String>,

    /// Roster file (overrides RELAY_TEAM_FILE)
    #[arg(long)]
    team_file: Option<PathBuf>,

    /// Verbose logging (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // State directory first, then a local .env
    let env_path = config::env_file();
    if env_path.exists() {
        let _ = dotenvy::from_path(&env_path);
    }
    let _ = dotenvy::dotenv();

    let filter = match args.verbose {
        0 => "relay_telegram=info,relay_runtime=info,relay_core=info,teloxide=warn",
        1 => "relay_telegram=debug,relay_runtime=debug,relay_core=debug,teloxide=info",
        2 => "relay_telegram=trace,relay_runtime=trace,relay_core=trace,teloxide=debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut relay = RelayConfig::from_env()?;
    if let Some(path) = args.team_file {
        relay.team_file = path;
    }

    let mut telegram = TelegramConfig::from_env()?;
    if let Some(port) = args.port {
        telegram.webhook_port = port;
    }
    if args.webhook_url.is_some() {
        telegram.webhook_url = args.webhook_url;
    }

    let mode = if args.webhook {
        let raw = telegram
            .webhook_url
            .as_deref()
            .ok_or(TelegramError::NoWebhookUrl)?;
        UpdateMode::Webhook {
            url: Url::parse(raw)?,
            port: telegram.webhook_port,
        }
    } else {
        UpdateMode::Polling
    };

    let mut bot = RelayBot::new(&relay, &telegram)?;

    match bot.get_me().await {
        Ok(username) => {
            tracing::info!(username = %username, "Bot initialized successfully");
            println!("\n[relay] Basecamp → Telegram");
            println!("   Bot: @{}", username);
            println!("   Chat: {}", telegram.chat_id);
            println!(
                "   Mode: {}",
                if args.webhook { "webhook" } else { "polling" }
            );
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to get bot info");
            return Err(e.into());
        }
    }

    println!("   Press Ctrl+C to stop\n");

    bot.run(mode).await?;

    Ok(())
}
