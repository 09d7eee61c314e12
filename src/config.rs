use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};

pub const SCORING_URL_VAR: &str = "CHECKIN_SCORING_URL";
pub const SCORING_TIMEOUT_VAR: &str = "CHECKIN_SCORING_TIMEOUT_SECS";
pub const ALERT_URL_VAR: &str = "CHECKIN_ALERT_URL";
pub const ALERT_TIMEOUT_VAR: &str = "CHECKIN_ALERT_TIMEOUT_SECS";
pub const TYPING_DELAYS_VAR: &str = "CHECKIN_TYPING_DELAYS";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// JSON script replacing the built-in one.
    pub script_path: Option<PathBuf>,
    /// Remote scoring endpoint. `None` scores locally.
    pub scoring_url: Option<String>,
    pub scoring_timeout: Duration,
    /// Webhook for trigger alerts. `None` only logs them.
    pub alert_url: Option<String>,
    pub alert_timeout: Duration,
    /// Simulated typing latency between bot messages.
    pub typing_delays: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            script_path: None,
            scoring_url: None,
            scoring_timeout: Duration::from_secs(10),
            alert_url: None,
            alert_timeout: Duration::from_secs(5),
            typing_delays: true,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let args: Vec<String> = std::env::args().collect();
        Self::from_lookup(&args, |key| std::env::var(key).ok())
    }

    /// `args` is the full argv (program name first).
    pub fn from_lookup(args: &[String], lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let seconds = |key: &str, default: Duration| -> Result<Duration> {
            match non_empty(key) {
                Some(raw) => Ok(Duration::from_secs(raw.trim().parse().with_context(
                    || format!("{key} must be whole seconds, got '{raw}'"),
                )?)),
                None => Ok(default),
            }
        };
        let scoring_timeout = seconds(SCORING_TIMEOUT_VAR, defaults.scoring_timeout)?;
        let alert_timeout = seconds(ALERT_TIMEOUT_VAR, defaults.alert_timeout)?;

        let typing_delays = match non_empty(TYPING_DELAYS_VAR) {
            Some(raw) => match raw.trim().to_lowercase().as_str() {
                "on" | "true" | "1" => true,
                "off" | "false" | "0" => false,
                other => bail!("{TYPING_DELAYS_VAR} must be 'on' or 'off', got '{other}'"),
            },
            None => defaults.typing_delays,
        };

        Ok(Self {
            script_path: args.get(1).map(PathBuf::from),
            scoring_url: non_empty(SCORING_URL_VAR),
            scoring_timeout,
            alert_url: non_empty(ALERT_URL_VAR),
            alert_timeout,
            typing_delays,
        })
    }
}
