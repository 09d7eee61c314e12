//! Side channel for messages that hit a trigger term.
//!
//! Notifications are fire-and-forget: the chat never waits on them and a
//! failed delivery is only logged. `flush` is called once when the session
//! ends so alerts still in flight are not cut off by process exit.

use std::cell::RefCell;
use std::thread::JoinHandle;
use std::time::Duration;

use anyhow::{Context, Result};
use log::{error, info, warn};
use serde::Serialize;

pub trait Notifier {
    fn notify(&self, triggering_message: &str) -> Result<()>;

    /// Wait for deliveries still in flight.
    fn flush(&self) {}
}

/// Writes the alert to the log only.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, triggering_message: &str) -> Result<()> {
        warn!(target: "checkin::alert", "Trigger message: \"{triggering_message}\"");
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct AlertPayload {
    message: String,
}

/// POSTs `{"message": ...}` to a webhook from a background thread. Each
/// delivery is bounded by the client timeout, so `flush` is too.
pub struct WebhookNotifier {
    client: reqwest::blocking::Client,
    url: String,
    in_flight: RefCell<Vec<JoinHandle<()>>>,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build alert HTTP client")?;
        Ok(Self {
            client,
            url: url.into(),
            in_flight: RefCell::new(Vec::new()),
        })
    }

    #[cfg(test)]
    fn in_flight(&self) -> usize {
        self.in_flight.borrow().len()
    }
}

impl Notifier for WebhookNotifier {
    fn notify(&self, triggering_message: &str) -> Result<()> {
        let client = self.client.clone();
        let url = self.url.clone();
        let payload = AlertPayload {
            message: triggering_message.to_string(),
        };

        let handle = std::thread::Builder::new()
            .name("alert-webhook".into())
            .spawn(move || {
                match client
                    .post(&url)
                    .json(&payload)
                    .send()
                    .and_then(|r| r.error_for_status())
                {
                    Ok(_) => info!("Alert delivered to {url}"),
                    Err(e) => error!("Alert delivery to {url} failed: {e}"),
                }
            })
            .context("failed to spawn alert thread")?;

        let mut in_flight = self.in_flight.borrow_mut();
        in_flight.retain(|h| !h.is_finished());
        in_flight.push(handle);
        Ok(())
    }

    fn flush(&self) {
        let pending: Vec<_> = self.in_flight.borrow_mut().drain(..).collect();
        if !pending.is_empty() {
            info!("Waiting for {} alert(s) to be delivered", pending.len());
        }
        for handle in pending {
            if handle.join().is_err() {
                error!("Alert thread panicked");
            }
        }
    }
}
