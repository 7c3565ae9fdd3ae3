//! Multi-channel notification delivery.
//!
//! A [`NotificationDispatcher`] holds the channels that were enabled at startup. Each event goes to every enabled
//! channel it targets. Channels are attempted concurrently and independently: a failing chat webhook does not delay
//! or prevent the email. Each channel gets a fixed number of attempts with linear backoff, after which the event is
//! dropped for that channel and the failure is logged. Delivery problems never reach the sync engine.
use std::{sync::Arc, time::Duration};

use futures_util::future::{join_all, BoxFuture};
use log::*;
use regex::Regex;
use thiserror::Error;

use crate::events::{ChannelKind, Handler, NotificationEvent, Severity};

pub const DEFAULT_ATTEMPTS: usize = 3;
pub const DEFAULT_BACKOFF: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Error)]
pub enum NotificationDeliveryError {
    #[error("Could not reach the notification endpoint: {0}")]
    Transport(String),
    #[error("The notification endpoint replied with {status}. {message}")]
    Rejected { status: u16, message: String },
    #[error("Could not build the notification: {0}")]
    Formatting(String),
}

/// A way of getting a message in front of a human.
pub trait NotificationChannel: Send + Sync {
    fn kind(&self) -> ChannelKind;

    fn name(&self) -> &str;

    fn send<'a>(&'a self, subject: &'a str, body: &'a str) -> BoxFuture<'a, Result<(), NotificationDeliveryError>>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub delivered: Vec<String>,
    pub dropped: Vec<String>,
}

pub struct NotificationDispatcher {
    channels: Vec<Arc<dyn NotificationChannel>>,
    attempts: usize,
    backoff: Duration,
    trace_id: Option<Regex>,
}

impl NotificationDispatcher {
    pub fn new(channels: Vec<Arc<dyn NotificationChannel>>) -> Self {
        let trace_id = Regex::new(r"\(00-[0-9a-f]{32}-[0-9a-f]{16}-01\)")
            .map_err(|e| error!("📣️ Trace id pattern failed to compile. {e}"))
            .ok();
        Self { channels, attempts: DEFAULT_ATTEMPTS, backoff: DEFAULT_BACKOFF, trace_id }
    }

    /// Overrides the per-channel attempt budget and the backoff step. The delay before attempt `n + 1` is
    /// `backoff * n`.
    pub fn with_retries(mut self, attempts: usize, backoff: Duration) -> Self {
        self.attempts = attempts.max(1);
        self.backoff = backoff;
        self
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Replaces trace ids of the form `(00-<32 hex>-<16 hex>-01)` with `(<omitted>)`.
    pub fn strip_trace_id(&self, text: &str) -> String {
        match &self.trace_id {
            Some(re) => re.replace_all(text, "(<omitted>)").into_owned(),
            None => text.to_string(),
        }
    }

    pub async fn dispatch(&self, event: &NotificationEvent) -> DispatchReport {
        let subject = format!("{} {}", severity_icon(event.severity), self.strip_trace_id(&event.subject));
        let body = self.strip_trace_id(&event.body);
        let targets = self.channels.iter().filter(|c| event.targets.contains(&c.kind())).collect::<Vec<_>>();
        if targets.is_empty() {
            trace!("📣️ No enabled channel for {} notification on order {}", event.severity, event.order_id);
            return DispatchReport::default();
        }
        let deliveries = targets.into_iter().map(|channel| {
            let subject = subject.as_str();
            let body = body.as_str();
            async move {
                let delivered = self.deliver(channel.as_ref(), subject, body).await;
                (channel.name().to_string(), delivered)
            }
        });
        let mut report = DispatchReport::default();
        for (name, delivered) in join_all(deliveries).await {
            if delivered {
                report.delivered.push(name);
            } else {
                report.dropped.push(name);
            }
        }
        report
    }

    async fn deliver(&self, channel: &dyn NotificationChannel, subject: &str, body: &str) -> bool {
        for attempt in 1..=self.attempts {
            match channel.send(subject, body).await {
                Ok(()) => {
                    trace!("📣️ Notification delivered via {} on attempt {attempt}", channel.name());
                    return true;
                },
                Err(e) if attempt < self.attempts => {
                    debug!("📣️ Attempt {attempt} to notify via {} failed. {e}", channel.name());
                    tokio::time::sleep(self.backoff * attempt as u32).await;
                },
                Err(e) => {
                    error!(
                        "📣️ Giving up on notification via {} after {attempt} attempts. {e}. Subject: {subject}",
                        channel.name()
                    );
                },
            }
        }
        false
    }

    /// Wraps the dispatcher as an event hook, so it can be registered with
    /// [`EventHooks`](crate::events::EventHooks).
    pub fn into_handler(self) -> Handler<NotificationEvent> {
        let dispatcher = Arc::new(self);
        Arc::new(move |event| {
            let dispatcher = Arc::clone(&dispatcher);
            Box::pin(async move {
                let report = dispatcher.dispatch(&event).await;
                if !report.dropped.is_empty() {
                    warn!("📣️ Notification for order {} was dropped by {:?}", event.order_id, report.dropped);
                }
            })
        })
    }
}

fn severity_icon(severity: Severity) -> &'static str {
    match severity {
        Severity::Info => "👍",
        Severity::Warning => "☢",
        Severity::Error => "💣",
    }
}
