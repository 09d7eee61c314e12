mod alert;
mod chat;
mod config;
mod scoring;

use std::sync::Arc;

use anyhow::{Context, Result};
use log::info;

use alert::{LogNotifier, Notifier, WebhookNotifier};
use chat::outbox::{Pacing, TerminalSink};
use chat::script::Script;
use chat::Session;
use config::AppConfig;
use scoring::{HttpScoringClient, LocalScreening, ScoringService};

fn main() -> Result<()> {
    // Initialize logging. Control verbosity with RUST_LOG env var:
    //   RUST_LOG=info   cargo run              # transitions, triggers, scoring
    //   RUST_LOG=debug  cargo run              # + every submission and queued line
    //   RUST_LOG=trace  cargo run              # + typing delays
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let config = AppConfig::from_env().context(
        "Usage: checkin [script.json]\n\
         \n\
         Environment:\n  \
         CHECKIN_SCORING_URL           remote scoring endpoint (default: local screening)\n  \
         CHECKIN_SCORING_TIMEOUT_SECS  scoring timeout in seconds (default: 10)\n  \
         CHECKIN_ALERT_URL             webhook for trigger alerts (default: log only)\n  \
         CHECKIN_ALERT_TIMEOUT_SECS    alert webhook timeout in seconds (default: 5)\n  \
         CHECKIN_TYPING_DELAYS         on|off (default: on)",
    )?;

    let script = match &config.script_path {
        Some(path) => Script::load(path)?,
        None => Script::builtin().context("built-in script is invalid")?,
    };

    let scorer: Arc<dyn ScoringService> = match &config.scoring_url {
        Some(url) => {
            info!("Scoring via {url} (timeout {:?})", config.scoring_timeout);
            Arc::new(HttpScoringClient::new(url.clone(), config.scoring_timeout)?)
        }
        None => {
            info!("No {} set; scoring locally", config::SCORING_URL_VAR);
            Arc::new(LocalScreening::default())
        }
    };

    let notifier: Box<dyn Notifier> = match &config.alert_url {
        Some(url) => Box::new(WebhookNotifier::new(url.clone(), config.alert_timeout)?),
        None => Box::new(LogNotifier),
    };

    let pacing = if config.typing_delays {
        Pacing::typing()
    } else {
        Pacing::instant()
    };

    let mut session = Session::new(script, notifier, scorer)?;
    let mut sink = TerminalSink::new()?;

    chat::run(&mut session, &mut sink, pacing, config.scoring_timeout)
}
