//! State shared by the command handlers.

use std::sync::Arc;

use relay_core::{AddOutcome, NotificationEngine, RelayContext, RelayError, ReportTrigger};
use teloxide::types::ChatId;
use tracing::{info, warn};

use crate::commands::RosterCommand;

/// Handler state: the engine (and through it the shared relay context)
/// plus the one chat allowed to drive it.
pub struct BotState {
    engine: Arc<NotificationEngine>,
    team_chat: ChatId,
}

impl BotState {
    pub fn new(engine: Arc<NotificationEngine>, team_chat: ChatId) -> Self {
        Self { engine, team_chat }
    }

    pub fn context(&self) -> &Arc<RelayContext> {
        self.engine.context()
    }

    /// Only the configured team chat may change relay state.
    pub fn is_authorized(&self, chat: ChatId) -> bool {
        chat == self.team_chat
    }

    /// Turns monitoring on or off and describes the result.
    pub fn set_monitoring(&self, enabled: bool) -> String {
        let was = self.context().set_monitoring(enabled);
        match (was, enabled) {
            (false, true) => {
                info!("Monitoring enabled");
                "✅ Мониторинг включён.".to_string()
            }
            (true, true) => "Мониторинг уже включён.".to_string(),
            (true, false) => {
                info!("Monitoring disabled");
                "🛑 Мониторинг остановлен.".to_string()
            }
            (false, false) => "Мониторинг уже остановлен.".to_string(),
        }
    }

    /// Applies a roster edit under the directory write lock.
    pub async fn apply_roster(&self, command: RosterCommand) -> String {
        let mut directory = self.context().directory().write().await;
        match command {
            RosterCommand::Add { name, mention } => {
                match directory.add(mention.clone(), name.as_str()) {
                    Ok(AddOutcome::Added) => {
                        info!(mention = %mention, name = %name, "Roster entry added");
                        format!("👤 Участник {} добавлен как {}", name, mention)
                    }
                    Ok(AddOutcome::AlreadyPresent) => {
                        format!("Участник {} уже закреплён за {}", name, mention)
                    }
                    Err(RelayError::DuplicateVariant { variant, owner }) => {
                        format!("❌ {} уже закреплён за {}", variant, owner)
                    }
                    Err(e) => {
                        warn!(error = %e, "Roster add rejected");
                        format!("❌ Не удалось добавить участника: {}", e)
                    }
                }
            }
            RosterCommand::Remove { name } => match directory.remove(&name) {
                Some(mention) => {
                    info!(mention = %mention, name = %name, "Roster entry removed");
                    format!("🗑 Участник {} удалён.", name)
                }
                None => format!("❌ Участник {} не найден.", name),
            },
        }
    }

    /// Current roster, one mention per line.
    pub async fn team_listing(&self) -> String {
        let directory = self.context().directory().read().await;
        if directory.is_empty() {
            return "В команде пока никого нет.".to_string();
        }

        let mut text = String::from("👥 Команда:\n");
        for mention in directory.mentions() {
            let variants = directory.variants(mention);
            if variants.is_empty() {
                text.push_str(&format!("{}: (нет имён)\n", mention));
            } else {
                text.push_str(&format!("{}: {}\n", mention, variants.join(", ")));
            }
        }
        text
    }

    /// Monitoring flag, schedule and dedup counters.
    pub fn status(&self) -> String {
        let schedule = self.engine.schedule();
        let (tasks, comments) = self.context().dedup().counts();
        format!(
            "Мониторинг: {}\n\
             Окно: {}–{}, опрос каждые {} с\n\
             Отчёт: {}\n\
             Отслежено задач: {}, комментариев: {}",
            if self.context().is_monitoring() { "включён" } else { "выключен" },
            schedule.active_start.format("%H:%M"),
            schedule.active_end.format("%H:%M"),
            schedule.poll_interval.as_secs(),
            schedule.report_time.format("%H:%M"),
            tasks,
            comments,
        )
    }

    /// Sends the daily report now. The report itself goes out through the
    /// notifier; the returned text is only for failures.
    pub async fn report_now(&self) -> Option<String> {
        match self.engine.run_daily_report(ReportTrigger::Manual).await {
            Ok(Some(_)) => None,
            Ok(None) => Some("Отчёт не отправлен.".to_string()),
            Err(e) => {
                warn!(error = %e, "Manual report failed");
                Some(format!("❌ Не удалось отправить отчёт: {}", e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_core::testing::{task, FakeSource, FixedClock, RecordingNotifier};
    use relay_core::{NotificationKind, RecipientDirectory, ScheduleConfig};
    use relay_models::Mention;

    const TEAM: ChatId = ChatId(-100);

    fn state_with(source: Arc<FakeSource>, notifier: Arc<RecordingNotifier>) -> BotState {
        let mut dir = RecipientDirectory::new();
        dir.add(Mention::parse("@alice").unwrap(), "Алиса Федяшова").unwrap();
        let context = Arc::new(RelayContext::new(dir));
        let engine = NotificationEngine::new(context, source, notifier, ScheduleConfig::default())
            .with_clock(Arc::new(FixedClock::at(12, 0)));
        BotState::new(Arc::new(engine), TEAM)
    }

    fn state() -> BotState {
        state_with(Arc::new(FakeSource::new()), Arc::new(RecordingNotifier::new()))
    }

    fn add(name: &str, handle: &str) -> RosterCommand {
        RosterCommand::Add {
            name: name.to_string(),
            mention: Mention::parse(handle).unwrap(),
        }
    }

    #[test]
    fn test_authorization() {
        let state = state();
        assert!(state.is_authorized(TEAM));
        assert!(!state.is_authorized(ChatId(42)));
    }

    #[test]
    fn test_toggle_monitoring() {
        let state = state();
        assert!(state.context().is_monitoring());

        assert!(state.set_monitoring(false).contains("остановлен"));
        assert!(!state.context().is_monitoring());
        assert_eq!(state.set_monitoring(false), "Мониторинг уже остановлен.");

        assert!(state.set_monitoring(true).contains("включён"));
        assert!(state.context().is_monitoring());
    }

    #[tokio::test]
    async fn test_add_and_remove() {
        let state = state();

        let reply = state.apply_roster(add("Боб Петров", "@bob")).await;
        assert_eq!(reply, "👤 Участник Боб Петров добавлен как @bob");
        {
            let dir = state.context().directory().read().await;
            assert_eq!(dir.resolve("Боб Петров").map(Mention::as_str), Some("@bob"));
        }

        let reply = state
            .apply_roster(RosterCommand::Remove {
                name: "Боб Петров".to_string(),
            })
            .await;
        assert_eq!(reply, "🗑 Участник Боб Петров удалён.");
        assert!(state
            .context()
            .directory()
            .read()
            .await
            .resolve("Боб Петров")
            .is_none());
    }

    #[tokio::test]
    async fn test_add_conflicting_name() {
        let state = state();
        let reply = state.apply_roster(add("Алиса Федяшова", "@bob")).await;
        assert_eq!(reply, "❌ Алиса Федяшова уже закреплён за @alice");

        let dir = state.context().directory().read().await;
        assert_eq!(
            dir.resolve("Алиса Федяшова").map(Mention::as_str),
            Some("@alice")
        );
    }

    #[tokio::test]
    async fn test_remove_unknown() {
        let state = state();
        let reply = state
            .apply_roster(RosterCommand::Remove {
                name: "Нет Такого".to_string(),
            })
            .await;
        assert_eq!(reply, "❌ Участник Нет Такого не найден.");
    }

    #[tokio::test]
    async fn test_team_listing() {
        let state = state();
        state.apply_roster(add("Алиса", "@alice")).await;

        let text = state.team_listing().await;
        assert!(text.contains("@alice: Алиса Федяшова, Алиса"));
    }

    #[test]
    fn test_status() {
        let state = state();
        let text = state.status();
        assert!(text.contains("Мониторинг: включён"));
        assert!(text.contains("Окно: 10:00–21:00, опрос каждые 600 с"));
        assert!(text.contains("Отчёт: 11:00"));
    }

    #[tokio::test]
    async fn test_report_now() {
        let source = Arc::new(FakeSource::new());
        source.add_task(1, 10, task(42, "T1", &["Алиса Федяшова"]));
        let notifier = Arc::new(RecordingNotifier::new());
        let state = state_with(source, notifier.clone());
        state.set_monitoring(false);

        assert_eq!(state.report_now().await, None);
        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].kind, NotificationKind::DailyReport);
        assert!(sent[0].text.contains("@alice — 1 задач(и) сегодня"));
    }

    #[tokio::test]
    async fn test_report_now_failure() {
        let notifier = Arc::new(RecordingNotifier::new());
        notifier.fail_for(None);
        let state = state_with(Arc::new(FakeSource::new()), notifier);

        let reply = state.report_now().await.unwrap();
        assert!(reply.starts_with("❌ Не удалось отправить отчёт"));
    }
}
