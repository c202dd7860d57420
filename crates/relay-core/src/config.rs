//! Configuration for the relay.
//!
//! Everything is read from environment variables. The binary loads a
//! `.env` file from the state directory first, so the variables below can
//! live there:
//!
//! ```text
//! ~/.basecamp-relay/
//! ├── .env        # credentials and overrides
//! └── team.json   # initial roster: { "@handle": ["Full Name", "Name"] }
//! ```
//!
//! # Environment Variables
//!
//! Required:
//! - `BASECAMP_ACCOUNT_ID`, `BASECAMP_ACCESS_TOKEN`
//!
//! Optional:
//! - `BASECAMP_API_BASE`: API root (default `https://3.basecampapi.com/{account}`)
//! - `RELAY_USER_AGENT`: User-Agent sent to Basecamp
//! - `RELAY_REQUEST_TIMEOUT_SECS`: per-request timeout (default 30)
//! - `RELAY_ACTIVE_START` / `RELAY_ACTIVE_END`: polling window, `HH:MM` (default 10:00-21:00)
//! - `RELAY_POLL_INTERVAL_SECS`: poll cadence (default 600)
//! - `RELAY_REPORT_TIME`: daily report time, `HH:MM` (default 11:00)
//! - `RELAY_REPORT_RESPECTS_MONITORING`: skip the daily report while paused (default false)
//! - `RELAY_TEAM_FILE`: roster file (default `~/.basecamp-relay/team.json`)
//! - `RELAY_STATE_DIR`: override the state directory
//! - `RELAY_ENDPOINT_PROJECTS`, `RELAY_ENDPOINT_TODOLISTS`,
//!   `RELAY_ENDPOINT_TODOS`, `RELAY_ENDPOINT_COMMENTS`: path templates
//!   relative to the API root. Placeholders `{project}`, `{todolist}` and
//!   `{todo}` are required where the request is scoped by them.

use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveTime;

use crate::client::Endpoints;
use crate::error::{RelayError, Result};

/// Environment variable for a custom state directory.
pub const STATE_DIR_ENV: &str = "RELAY_STATE_DIR";

/// Default state directory name under home.
const DEFAULT_STATE_DIR: &str = ".basecamp-relay";

const DEFAULT_USER_AGENT: &str = "BasecampRelay (basecamp-relay@localhost)";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_POLL_INTERVAL_SECS: u64 = 600;

/// Get the relay state directory.
///
/// `RELAY_STATE_DIR` if set, otherwise `~/.basecamp-relay`, otherwise
/// `.basecamp-relay` in the current directory.
pub fn state_dir() -> PathBuf {
    std::env::var(STATE_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .map(|h| h.join(DEFAULT_STATE_DIR))
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_DIR))
        })
}

/// Get the `.env` file path inside the state directory.
pub fn env_file() -> PathBuf {
    state_dir().join(".env")
}

/// Get the default roster file path.
pub fn default_team_file() -> PathBuf {
    state_dir().join("team.json")
}

/// Remote API access settings.
#[derive(Debug, Clone)]
pub struct BasecampConfig {
    /// OAuth bearer token.
    pub access_token: String,
    /// API root; all endpoint templates are relative to it.
    pub api_base: String,
    /// Basecamp rejects requests without a User-Agent.
    pub user_agent: String,
    /// Upper bound for a single request.
    pub request_timeout: Duration,
    /// Endpoint path templates.
    pub endpoints: Endpoints,
}

impl BasecampConfig {
    /// Creates a config for the public Basecamp 3 API; the account id
    /// becomes part of the API root.
    pub fn new(account_id: impl AsRef<str>, access_token: impl Into<String>) -> Self {
        Self {
            api_base: format!("https://3.basecampapi.com/{}", account_id.as_ref()),
            access_token: access_token.into(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            endpoints: Endpoints::default(),
        }
    }

    /// Sets the API root.
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    /// Sets the per-request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets the endpoint templates.
    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }
}

/// Timing of the poll and report loops.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleConfig {
    /// Start of the active window (inclusive).
    pub active_start: NaiveTime,
    /// End of the active window (inclusive).
    pub active_end: NaiveTime,
    /// Pause between poll cycles.
    pub poll_interval: Duration,
    /// Local time of the daily report.
    pub report_time: NaiveTime,
    /// Skip the daily report while monitoring is off.
    pub report_respects_monitoring: bool,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            active_start: hm(10, 0),
            active_end: hm(21, 0),
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            report_time: hm(11, 0),
            report_respects_monitoring: false,
        }
    }
}

impl ScheduleConfig {
    /// Creates a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the active window.
    pub fn with_active_window(mut self, start: NaiveTime, end: NaiveTime) -> Self {
        self.active_start = start;
        self.active_end = end;
        self
    }

    /// Sets the poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Sets the daily report time.
    pub fn with_report_time(mut self, at: NaiveTime) -> Self {
        self.report_time = at;
        self
    }

    /// Makes the daily report honour the monitoring flag.
    pub fn with_report_respects_monitoring(mut self, respects: bool) -> Self {
        self.report_respects_monitoring = respects;
        self
    }

    /// Whether `time` falls inside the active window, both ends inclusive.
    ///
    /// A window whose start is after its end wraps past midnight.
    pub fn in_active_window(&self, time: NaiveTime) -> bool {
        if self.active_start <= self.active_end {
            self.active_start <= time && time <= self.active_end
        } else {
            time >= self.active_start || time <= self.active_end
        }
    }
}

/// Full relay configuration.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub basecamp: BasecampConfig,
    pub schedule: ScheduleConfig,
    /// Initial roster; missing file means an empty roster.
    pub team_file: PathBuf,
}

impl RelayConfig {
    /// Builds the config from process environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &'static str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &'static str| get(key).ok_or(RelayError::MissingEnv(key));

        let mut basecamp = BasecampConfig::new(
            require("BASECAMP_ACCOUNT_ID")?.trim(),
            require("BASECAMP_ACCESS_TOKEN")?.trim(),
        );
        if let Some(base) = get("BASECAMP_API_BASE") {
            basecamp.api_base = base.trim().trim_end_matches('/').to_string();
        }
        if let Some(agent) = get("RELAY_USER_AGENT") {
            basecamp.user_agent = agent;
        }
        if let Some(raw) = get("RELAY_REQUEST_TIMEOUT_SECS") {
            basecamp.request_timeout = Duration::from_secs(parse_secs("RELAY_REQUEST_TIMEOUT_SECS", &raw)?);
        }

        let defaults = Endpoints::default();
        let template = |key: &'static str, default: String, required: &[&str]| match get(key) {
            Some(raw) => parse_template(key, &raw, required),
            None => Ok(default),
        };
        let endpoints = Endpoints {
            projects: template("RELAY_ENDPOINT_PROJECTS", defaults.projects, &[])?,
            task_lists: template("RELAY_ENDPOINT_TODOLISTS", defaults.task_lists, &["{project}"])?,
            tasks: template(
                "RELAY_ENDPOINT_TODOS",
                defaults.tasks,
                &["{project}", "{todolist}"],
            )?,
            comments: template(
                "RELAY_ENDPOINT_COMMENTS",
                defaults.comments,
                &["{project}", "{todo}"],
            )?,
        };
        let basecamp = basecamp.with_endpoints(endpoints);

        let mut schedule = ScheduleConfig::default();
        if let Some(raw) = get("RELAY_ACTIVE_START") {
            schedule.active_start = parse_time("RELAY_ACTIVE_START", &raw)?;
        }
        if let Some(raw) = get("RELAY_ACTIVE_END") {
            schedule.active_end = parse_time("RELAY_ACTIVE_END", &raw)?;
        }
        if let Some(raw) = get("RELAY_POLL_INTERVAL_SECS") {
            schedule.poll_interval = Duration::from_secs(parse_secs("RELAY_POLL_INTERVAL_SECS", &raw)?);
        }
        if let Some(raw) = get("RELAY_REPORT_TIME") {
            schedule.report_time = parse_time("RELAY_REPORT_TIME", &raw)?;
        }
        if let Some(raw) = get("RELAY_REPORT_RESPECTS_MONITORING") {
            schedule.report_respects_monitoring =
                parse_bool("RELAY_REPORT_RESPECTS_MONITORING", &raw)?;
        }

        let team_file = get("RELAY_TEAM_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(default_team_file);

        Ok(Self {
            basecamp,
            schedule,
            team_file,
        })
    }
}

fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN)
}

fn parse_time(key: &'static str, raw: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M").map_err(|e| RelayError::InvalidEnv {
        key,
        value: raw.to_string(),
        reason: format!("expected HH:MM, {}", e),
    })
}

fn parse_secs(key: &'static str, raw: &str) -> Result<u64> {
    match raw.trim().parse::<u64>() {
        Ok(0) | Err(_) => Err(RelayError::InvalidEnv {
            key,
            value: raw.to_string(),
            reason: "expected a positive number of seconds".to_string(),
        }),
        Ok(secs) => Ok(secs),
    }
}

fn parse_template(key: &'static str, raw: &str, required: &[&str]) -> Result<String> {
    let template = raw.trim().trim_start_matches('/');
    match required.iter().find(|p| !template.contains(**p)) {
        Some(missing) => Err(RelayError::InvalidEnv {
            key,
            value: raw.to_string(),
            reason: format!("path template must contain {}", missing),
        }),
        None => Ok(template.to_string()),
    }
}

fn parse_bool(key: &'static str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(RelayError::InvalidEnv {
            key,
            value: raw.to_string(),
            reason: "expected true or false".to_string(),
        }),
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

    const CREDS: [(&str, &str); 2] = [
        ("BASECAMP_ACCOUNT_ID", "999"),
        ("BASECAMP_ACCESS_TOKEN", "secret"),
    ];

    #[test]
    fn test_defaults() {
        let config = RelayConfig::from_lookup(lookup(&CREDS)).unwrap();

        assert_eq!(config.basecamp.api_base, "https://3.basecampapi.com/999");
        assert_eq!(config.basecamp.request_timeout, Duration::from_secs(30));
        assert_eq!(config.schedule, ScheduleConfig::default());
        assert_eq!(config.schedule.poll_interval, Duration::from_secs(600));
        assert_eq!(config.schedule.report_time, hm(11, 0));
        assert!(!config.schedule.report_respects_monitoring);
        assert!(config.team_file.ends_with("team.json"));
    }

    #[test]
    fn test_missing_token() {
        let err = RelayConfig::from_lookup(lookup(&[("BASECAMP_ACCOUNT_ID", "1")])).unwrap_err();
        assert!(matches!(err, RelayError::MissingEnv("BASECAMP_ACCESS_TOKEN")));
    }

    #[test]
    fn test_overrides() {
        let mut pairs = CREDS.to_vec();
        pairs.extend([
            ("BASECAMP_API_BASE", "http://127.0.0.1:9000/"),
            ("RELAY_ACTIVE_START", "08:30"),
            ("RELAY_ACTIVE_END", "19:00"),
            ("RELAY_POLL_INTERVAL_SECS", "120"),
            ("RELAY_REPORT_TIME", "09:15"),
            ("RELAY_REPORT_RESPECTS_MONITORING", "yes"),
            ("RELAY_TEAM_FILE", "/etc/relay/team.json"),
            ("RELAY_ENDPOINT_PROJECTS", "/v2/projects.json"),
            ("RELAY_ENDPOINT_COMMENTS", "v2/{project}/todos/{todo}/notes.json"),
        ]);
        let config = RelayConfig::from_lookup(lookup(&pairs)).unwrap();

        assert_eq!(config.basecamp.api_base, "http://127.0.0.1:9000");
        assert_eq!(config.schedule.active_start, hm(8, 30));
        assert_eq!(config.schedule.active_end, hm(19, 0));
        assert_eq!(config.schedule.poll_interval, Duration::from_secs(120));
        assert_eq!(config.schedule.report_time, hm(9, 15));
        assert!(config.schedule.report_respects_monitoring);
        assert_eq!(config.team_file, PathBuf::from("/etc/relay/team.json"));
        assert_eq!(config.basecamp.endpoints.projects, "v2/projects.json");
        assert_eq!(
            config.basecamp.endpoints.comments,
            "v2/{project}/todos/{todo}/notes.json"
        );
        assert_eq!(config.basecamp.endpoints.tasks, Endpoints::default().tasks);
    }

    #[test]
    fn test_endpoint_template_needs_placeholders() {
        let mut pairs = CREDS.to_vec();
        pairs.push(("RELAY_ENDPOINT_TODOS", "buckets/{project}/todos.json"));
        let err = RelayConfig::from_lookup(lookup(&pairs)).unwrap_err();
        assert!(matches!(
            err,
            RelayError::InvalidEnv { key: "RELAY_ENDPOINT_TODOS", ref reason, .. }
                if reason.contains("{todolist}")
        ));
    }

    #[test]
    fn test_invalid_values() {
        let mut pairs = CREDS.to_vec();
        pairs.push(("RELAY_REPORT_TIME", "11am"));
        assert!(matches!(
            RelayConfig::from_lookup(lookup(&pairs)).unwrap_err(),
            RelayError::InvalidEnv { key: "RELAY_REPORT_TIME", .. }
        ));

        let mut pairs = CREDS.to_vec();
        pairs.push(("RELAY_POLL_INTERVAL_SECS", "0"));
        assert!(RelayConfig::from_lookup(lookup(&pairs)).is_err());
    }

    #[test]
    fn test_active_window_inclusive() {
        let schedule = ScheduleConfig::default();
        assert!(schedule.in_active_window(hm(10, 0)));
        assert!(schedule.in_active_window(hm(15, 42)));
        assert!(schedule.in_active_window(hm(21, 0)));
        assert!(!schedule.in_active_window(hm(9, 59)));
        assert!(!schedule.in_active_window(hm(21, 1)));
    }

    #[test]
    fn test_active_window_wraps_midnight() {
        let schedule = ScheduleConfig::new().with_active_window(hm(22, 0), hm(2, 0));
        assert!(schedule.in_active_window(hm(23, 30)));
        assert!(schedule.in_active_window(hm(1, 0)));
        assert!(!schedule.in_active_window(hm(12, 0)));
    }

    #[test]
    fn test_state_paths() {
        assert!(env_file().ends_with(".env"));
        assert!(default_team_file().ends_with("team.json"));
    }
}
