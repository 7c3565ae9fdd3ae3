use std::{sync::Arc, time::Duration};

use chrono::Utc;
use order_sync_engine::{
    db_types::WebhookEvent,
    events::{EventProducer, EventProducers, NotificationEvent},
    test_utils::prepare_test_db,
    OrderSyncApi,
    RetryPolicy,
    SqliteDatabase,
};
use tempfile::TempDir;
use tokio::sync::mpsc;

use super::fakes::{FakeFinOps, FakeMarketplace};

pub type TestApi = OrderSyncApi<SqliteDatabase, FakeFinOps, FakeMarketplace>;

/// Everything a sync engine test needs. Notifications published by the engine can be read from `events`.
pub struct TestEnv {
    pub api: Arc<TestApi>,
    pub finops: FakeFinOps,
    pub marketplace: FakeMarketplace,
    pub events: mpsc::Receiver<NotificationEvent>,
    _dir: TempDir,
}

impl TestEnv {
    pub async fn new(finops: FakeFinOps, marketplace: FakeMarketplace) -> Self {
        Self::with_due_date_period(finops, marketplace, chrono::Duration::days(30)).await
    }

    pub async fn with_due_date_period(
        finops: FakeFinOps,
        marketplace: FakeMarketplace,
        due_date_period: chrono::Duration,
    ) -> Self {
        let (db, dir) = prepare_test_db().await;
        let (sender, events) = mpsc::channel(100);
        let producers = EventProducers { notification_producers: vec![EventProducer::new(sender)] };
        let retry = RetryPolicy::new(Duration::from_millis(1), Duration::from_millis(4), 5);
        let api = OrderSyncApi::new(db, finops.clone(), marketplace.clone(), producers)
            .with_retry_policy(retry)
            .with_due_date_period(due_date_period);
        Self { api: Arc::new(api), finops, marketplace, events, _dir: dir }
    }

    /// Drains the notifications published so far.
    pub fn notifications(&mut self) -> Vec<NotificationEvent> {
        let mut result = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            result.push(event);
        }
        result
    }
}

/// A validated webhook delivery. Deliveries with the same payload are duplicates of each other.
pub fn webhook_event(order_id: &str, product_id: &str, payload: &str) -> WebhookEvent {
    WebhookEvent {
        product_id: product_id.into(),
        order_id: order_id.into(),
        payload_hash: format!("hash-{payload}"),
        webhook_id: Some("WH-1".into()),
        received_at: Utc::now(),
    }
}
