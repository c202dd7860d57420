//! Main Telegram bot implementation.

use std::net::SocketAddr;
use std::sync::Arc;

use relay_core::{BasecampClient, NotificationEngine, RecipientDirectory, RelayConfig, RelayContext};
use relay_runtime::Scheduler;
use teloxide::dispatching::{DefaultKey, UpdateHandler};
use teloxide::error_handlers::LoggingErrorHandler;
use teloxide::prelude::*;
use teloxide::update_listeners::webhooks;
use tracing::{debug, error, info};
use url::Url;

use crate::commands::Command;
use crate::config::TelegramConfig;
use crate::error::{Result, TelegramError};
use crate::handlers::{handle_command, handle_unknown};
use crate::notifier::TelegramNotifier;
use crate::state::BotState;
use crate::webhook::health_router;

/// How the bot receives updates.
#[derive(Debug, Clone)]
pub enum UpdateMode {
    /// Long polling (no public endpoint needed).
    Polling,
    /// Telegram posts to `url`; the local server listens on `port`.
    Webhook { url: Url, port: u16 },
}

/// The relay bot: command surface plus the background scheduler.
pub struct RelayBot {
    bot: Bot,
    state: Arc<BotState>,
    scheduler: Scheduler,
}

impl RelayBot {
    /// Wire the engine to Basecamp and to the team chat.
    ///
    /// Loads the initial roster from `relay.team_file`.
    pub fn new(relay: &RelayConfig, telegram: &TelegramConfig) -> Result<Self> {
        let directory = RecipientDirectory::load(&relay.team_file)?;
        info!(
            path = %relay.team_file.display(),
            mentions = directory.len(),
            "Roster loaded"
        );

        let bot = Bot::new(&telegram.bot_token);
        let team_chat = ChatId(telegram.chat_id);

        let context = Arc::new(RelayContext::new(directory));
        let source = Arc::new(BasecampClient::new(&relay.basecamp)?);
        let notifier = Arc::new(TelegramNotifier::new(bot.clone(), team_chat));
        let engine = Arc::new(NotificationEngine::new(
            context,
            source,
            notifier,
            relay.schedule.clone(),
        ));

        Ok(Self {
            bot,
            state: Arc::new(BotState::new(Arc::clone(&engine), team_chat)),
            scheduler: Scheduler::new(engine),
        })
    }

    /// Get the bot's username.
    pub async fn get_me(&self) -> Result<String> {
        let me = self
            .bot
            .get_me()
            .await
            .map_err(|e| TelegramError::BotStartFailed(e.to_string()))?;
        Ok(me.username().to_string())
    }

    /// Start the scheduler and serve commands until Ctrl+C.
    pub async fn run(&mut self, mode: UpdateMode) -> Result<()> {
        self.scheduler.start()?;

        let result = match mode {
            UpdateMode::Polling => {
                info!("Starting Telegram bot in polling mode...");
                self.dispatcher().dispatch().await;
                Ok(())
            }
            UpdateMode::Webhook { url, port } => self.run_webhook(url, port).await,
        };

        self.scheduler.shutdown().await?;
        info!("Bot stopped");
        result
    }

    async fn run_webhook(&self, url: Url, port: u16) -> Result<()> {
        info!(url = %url, port, "Starting Telegram bot in webhook mode...");

        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        let options = webhooks::Options::new(addr, url);
        let (listener, stop_flag, router) = webhooks::axum_to_router(self.bot.clone(), options)
            .await
            .map_err(|e| TelegramError::WebhookFailed(e.to_string()))?;

        let app = router.merge(health_router());
        let tcp = tokio::net::TcpListener::bind(addr).await?;
        tokio::spawn(async move {
            if let Err(e) = axum::serve(tcp, app).with_graceful_shutdown(stop_flag).await {
                error!(error = %e, "Webhook server failed");
            }
        });

        self.dispatcher()
            .dispatch_with_listener(
                listener,
                LoggingErrorHandler::with_custom_text("Webhook listener error"),
            )
            .await;
        Ok(())
    }

    fn dispatcher(&self) -> Dispatcher<Bot, teloxide::RequestError, DefaultKey> {
        Dispatcher::builder(self.bot.clone(), handler_tree(Arc::clone(&self.state)))
            .default_handler(|upd| async move {
                debug!(update_id = ?upd.id, "Unhandled update");
            })
            .enable_ctrlc_handler()
            .build()
    }
}

fn handler_tree(state: Arc<BotState>) -> UpdateHandler<teloxide::RequestError> {
    dptree::entry()
        .branch(
            Update::filter_message()
                .filter_command::<Command>()
                .endpoint(move |bot: Bot, msg: Message, cmd: Command| {
                    let state = Arc::clone(&state);
                    async move { handle_command(bot, msg, cmd, state).await }
                }),
        )
        .branch(
            Update::filter_message()
                .filter(|msg: Message| msg.text().map(|t| t.starts_with('/')).unwrap_or(false))
                .endpoint(handle_unknown),
        )
}
