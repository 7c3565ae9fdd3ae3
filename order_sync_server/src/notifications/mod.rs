//! Notification channels.
//!
//! The channels enabled in the configuration are built once at startup and handed to a
//! [`NotificationDispatcher`]. Chat and email are independent; either, both or neither may be enabled.
mod email;
mod teams;

use std::{sync::Arc, time::Duration};

pub use email::{EmailChannel, EmailMessage};
use log::*;
use order_sync_engine::events::{NotificationChannel, NotificationDispatcher};
use reqwest::Client;
pub use teams::{adaptive_card, TeamsChannel};

use crate::{config::NotificationConfig, errors::ServerError};

const NOTIFICATION_TIMEOUT: Duration = Duration::from_secs(10);

pub fn build_channels(config: &NotificationConfig) -> Result<Vec<Arc<dyn NotificationChannel>>, ServerError> {
    let client = Client::builder()
        .timeout(NOTIFICATION_TIMEOUT)
        .build()
        .map_err(|e| ServerError::InitializeError(format!("Could not create the notification client. {e}")))?;
    let mut channels: Vec<Arc<dyn NotificationChannel>> = Vec::with_capacity(2);
    if config.chat_enabled {
        channels.push(Arc::new(TeamsChannel::new(client.clone(), config.teams_webhook_url.clone())));
    }
    if config.email_enabled {
        channels.push(Arc::new(EmailChannel::new(
            client,
            &config.email_api_url,
            config.email_api_key.clone(),
            &config.email_from,
            config.email_recipients.clone(),
        )));
    }
    let names = channels.iter().map(|c| c.name()).collect::<Vec<_>>();
    if names.is_empty() {
        warn!("📣️ No notification channels are enabled. State changes will only be logged.");
    } else {
        info!("📣️ Notification channels enabled: {}", names.join(", "));
    }
    Ok(channels)
}

pub fn build_dispatcher(config: &NotificationConfig) -> Result<NotificationDispatcher, ServerError> {
    build_channels(config).map(NotificationDispatcher::new)
}
