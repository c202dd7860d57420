//! Chat commands and argument parsing.

use relay_models::{InvalidMention, Mention};
use teloxide::utils::command::BotCommands;

/// Bot commands that can be invoked with /.
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Команды:")]
pub enum Command {
    #[command(description = "включить мониторинг")]
    Start,

    #[command(description = "остановить мониторинг")]
    Stop,

    #[command(description = "добавить участника: /add Имя Фамилия @ник")]
    Add(String),

    #[command(description = "удалить участника: /remove Имя Фамилия")]
    Remove(String),

    #[command(description = "показать состав команды")]
    Team,

    #[command(description = "состояние мониторинга")]
    Status,

    #[command(description = "отправить отчёт сейчас")]
    Report,

    #[command(description = "список команд")]
    Help,
}

pub const ADD_USAGE: &str = "Используй: /add Имя Фамилия @ник";
pub const REMOVE_USAGE: &str = "Используй: /remove Имя Фамилия";

/// A parsed roster edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RosterCommand {
    Add { name: String, mention: Mention },
    Remove { name: String },
}

/// Why roster arguments were rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgsError {
    /// Wrong number of tokens; carries the usage line.
    Usage(&'static str),
    /// The handle token is not a valid mention.
    Mention(InvalidMention),
}

/// `/add` takes exactly a first name, a last name and a handle.
pub fn parse_add(args: &str) -> Result<RosterCommand, ArgsError> {
    let tokens: Vec<&str> = args.split_whitespace().collect();
    let [first, last, handle] = tokens.as_slice() else {
        return Err(ArgsError::Usage(ADD_USAGE));
    };

    let mention = Mention::parse(handle).map_err(ArgsError::Mention)?;
    Ok(RosterCommand::Add {
        name: format!("{} {}", first, last),
        mention,
    })
}

/// `/remove` takes exactly a first name and a last name.
pub fn parse_remove(args: &str) -> Result<RosterCommand, ArgsError> {
    let tokens: Vec<&str> = args.split_whitespace().collect();
    let [first, last] = tokens.as_slice() else {
        return Err(ArgsError::Usage(REMOVE_USAGE));
    };

    Ok(RosterCommand::Remove {
        name: format!("{} {}", first, last),
    })
}
