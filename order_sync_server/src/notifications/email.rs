use futures::future::BoxFuture;
use log::*;
use order_sync_engine::events::{ChannelKind, NotificationChannel, NotificationDeliveryError};
use osb_common::Secret;
use reqwest::Client;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct EmailMessage<'a> {
    pub from: &'a str,
    pub to: &'a [String],
    pub subject: &'a str,
    pub text: &'a str,
}

/// Sends notifications through an HTTP email API. The API key is sent as a bearer token.
pub struct EmailChannel {
    client: Client,
    api_url: String,
    api_key: Secret<String>,
    from: String,
    recipients: Vec<String>,
}

impl EmailChannel {
    pub fn new(client: Client, api_url: &str, api_key: Secret<String>, from: &str, recipients: Vec<String>) -> Self {
        Self { client, api_url: api_url.to_string(), api_key, from: from.to_string(), recipients }
    }

    async fn post(&self, subject: &str, body: &str) -> Result<(), NotificationDeliveryError> {
        let message = EmailMessage { from: &self.from, to: &self.recipients, subject, text: body };
        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(self.api_key.reveal())
            .json(&message)
            .send()
            .await
            .map_err(|e| NotificationDeliveryError::Transport(e.to_string()))?;
        let status = response.status();
        if status.is_success() {
            trace!("📣️ Email sent to {} recipients", self.recipients.len());
            Ok(())
        } else {
            let message = response.text().await.unwrap_or_default();
            Err(NotificationDeliveryError::Rejected { status: status.as_u16(), message })
        }
    }
}

impl NotificationChannel for EmailChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Email
    }

    fn name(&self) -> &str {
        "email"
    }

    fn send<'a>(&'a self, subject: &'a str, body: &'a str) -> BoxFuture<'a, Result<(), NotificationDeliveryError>> {
        Box::pin(self.post(subject, body))
    }
}

#[cfg(test)]
mod test {
    use std::sync::{Arc, Mutex};

    use actix_web::{http::header::AUTHORIZATION, web, App, HttpRequest, HttpResponse, HttpServer};
    use serde_json::Value;

    use super::*;

    #[actix_web::test]
    async fn emails_are_posted_with_the_api_key() {
        let received = Arc::new(Mutex::new(Vec::<(String, Value)>::new()));
        let log = Arc::clone(&received);
        let server = HttpServer::new(move || {
            let log = Arc::clone(&log);
            App::new().route(
                "/send",
                web::post().to(move |req: HttpRequest, body: web::Json<Value>| {
                    let log = Arc::clone(&log);
                    async move {
                        let auth = req.headers().get(AUTHORIZATION).and_then(|v| v.to_str().ok()).unwrap_or_default();
                        log.lock().unwrap().push((auth.to_string(), body.into_inner()));
                        HttpResponse::Created().finish()
                    }
                }),
            )
        })
        .workers(1)
        .bind(("127.0.0.1", 0))
        .unwrap();
        let addr = server.addrs()[0];
        let server = server.run();
        let handle = server.handle();
        actix_web::rt::spawn(server);

        let channel = EmailChannel::new(
            Client::new(),
            &format!("http://{addr}/send"),
            Secret::new("key-1".to_string()),
            "bridge@example.com",
            vec!["ops@example.com".to_string(), "finance@example.com".to_string()],
        );
        channel.send("💣 Order ORD-1 is Failed", "Due date is reached").await.unwrap();
        let err = EmailChannel::new(Client::new(), &format!("http://{addr}/nowhere"), Secret::default(), "", vec![])
            .send("s", "b")
            .await
            .unwrap_err();
        assert!(matches!(err, NotificationDeliveryError::Rejected { status: 404, .. }));
        handle.stop(true).await;

        let received = received.lock().unwrap();
        assert_eq!(received.len(), 1);
        let (auth, body) = &received[0];
        assert_eq!(auth, "Bearer key-1");
        assert_eq!(body["from"], "bridge@example.com");
        assert_eq!(body["to"][1], "finance@example.com");
        assert_eq!(body["subject"], "💣 Order ORD-1 is Failed");
        assert_eq!(body["text"], "Due date is reached");
    }
}
