use futures::future::BoxFuture;
use log::*;
use order_sync_engine::events::{ChannelKind, NotificationChannel, NotificationDeliveryError};
use osb_common::Secret;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

/// Posts notifications to an MS Teams incoming webhook as adaptive cards.
pub struct TeamsChannel {
    client: Client,
    webhook_url: Secret<String>,
}

impl TeamsChannel {
    pub fn new(client: Client, webhook_url: Secret<String>) -> Self {
        Self { client, webhook_url }
    }

    async fn post(&self, subject: &str, body: &str) -> Result<(), NotificationDeliveryError> {
        let message = adaptive_card(subject, body);
        let response = self
            .client
            .post(self.webhook_url.reveal())
            .json(&message)
            .send()
            .await
            .map_err(|e| NotificationDeliveryError::Transport(e.without_url().to_string()))?;
        let status = response.status();
        if status == StatusCode::OK || status == StatusCode::ACCEPTED {
            trace!("📣️ Teams accepted the notification with {status}");
            Ok(())
        } else {
            let message = response.text().await.unwrap_or_default();
            Err(NotificationDeliveryError::Rejected { status: status.as_u16(), message })
        }
    }
}

impl NotificationChannel for TeamsChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Chat
    }

    fn name(&self) -> &str {
        "teams"
    }

    fn send<'a>(&'a self, subject: &'a str, body: &'a str) -> BoxFuture<'a, Result<(), NotificationDeliveryError>> {
        Box::pin(self.post(subject, body))
    }
}

/// Builds the webhook message for a single adaptive card with a title and a body. The title colour follows the
/// severity icon at the start of the subject.
pub fn adaptive_card(subject: &str, body: &str) -> Value {
    let color = if subject.starts_with('💣') {
        "Attention"
    } else if subject.starts_with('☢') {
        "Warning"
    } else {
        "Accent"
    };
    json!({
        "type": "message",
        "attachments": [{
            "contentType": "application/vnd.microsoft.card.adaptive",
            "content": {
                "$schema": "http://adaptivecards.io/schemas/adaptive-card.json",
                "type": "AdaptiveCard",
                "version": "1.4",
                "body": [
                    { "type": "TextBlock", "text": subject, "size": "Large", "weight": "Bolder", "color": color },
                    { "type": "TextBlock", "text": body, "wrap": true, "size": "Small", "color": "Default" }
                ],
                "msteams": { "width": "Full" }
            }
        }]
    })
}
