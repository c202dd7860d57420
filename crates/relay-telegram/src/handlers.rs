//! Command handlers for the Telegram bot.

use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;
use tracing::{info, warn};

use crate::commands::{parse_add, parse_remove, ArgsError, Command, RosterCommand};
use crate::state::BotState;

const NOT_AUTHORIZED: &str = "Этот бот работает только в чате команды.";
const BAD_HANDLE: &str = "❌ Ник должен выглядеть как @username";

/// Route a command to its handler.
pub async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    state: Arc<BotState>,
) -> ResponseResult<()> {
    if !state.is_authorized(msg.chat.id) {
        warn!(chat_id = %msg.chat.id, ?cmd, "Command from foreign chat ignored");
        bot.send_message(msg.chat.id, NOT_AUTHORIZED).await?;
        return Ok(());
    }

    info!(chat_id = %msg.chat.id, ?cmd, "Handling command");

    let reply = match cmd {
        Command::Start => Some(state.set_monitoring(true)),
        Command::Stop => Some(state.set_monitoring(false)),
        Command::Add(args) => Some(roster_reply(&state, parse_add(&args)).await),
        Command::Remove(args) => Some(roster_reply(&state, parse_remove(&args)).await),
        Command::Team => Some(state.team_listing().await),
        Command::Status => Some(state.status()),
        Command::Report => state.report_now().await,
        Command::Help => Some(Command::descriptions().to_string()),
    };

    if let Some(text) = reply {
        bot.send_message(msg.chat.id, text).await?;
    }
    Ok(())
}

async fn roster_reply(state: &BotState, parsed: Result<RosterCommand, ArgsError>) -> String {
    match parsed {
        Ok(command) => state.apply_roster(command).await,
        Err(ArgsError::Usage(usage)) => usage.to_string(),
        Err(ArgsError::Mention(_)) => BAD_HANDLE.to_string(),
    }
}

/// Reply to a slash command that did not parse.
pub async fn handle_unknown(bot: Bot, msg: Message) -> ResponseResult<()> {
    if let Some(text) = msg.text() {
        let name = text.split_whitespace().next().unwrap_or(text);
        info!(cmd = %name, "Unrecognized command");
        bot.send_message(
            msg.chat.id,
            format!("Неизвестная команда: {}\n\nСписок команд: /help", name),
        )
        .await?;
    }
    Ok(())
}
