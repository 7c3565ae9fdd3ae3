//! SQLite backend for the sync engine.
mod db;

use std::{fmt::Debug, str::FromStr};

use chrono::Utc;
use log::*;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};

use crate::{
    db_types::{NewOrder, Order, OrderChanges, OrderId, RemoteOperationStatus, SyncState, TransitionRecord, WebhookEvent},
    traits::{SyncDatabase, SyncDatabaseError},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SqliteDatabase ({})", self.url)
    }
}

impl SqliteDatabase {
    /// Connects to the database at `url`, creating the database file if it does not exist yet.
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, SyncDatabaseError> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await?;
        info!("🗃️ Connected to {url}");
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn run_migrations(&self) -> Result<(), SyncDatabaseError> {
        sqlx::migrate!("./src/sqlite/migrations")
            .run(&self.pool)
            .await
            .map_err(|e| SyncDatabaseError::MigrationError(e.to_string()))?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }
}

impl SyncDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, SyncDatabaseError> {
        let mut conn = self.pool.acquire().await?;
        let order = db::orders::fetch_order_by_order_id(order_id, &mut conn).await?;
        Ok(order)
    }

    async fn insert_order_if_absent(&self, order: NewOrder) -> Result<(Order, bool), SyncDatabaseError> {
        let mut conn = self.pool.acquire().await?;
        db::orders::idempotent_insert(order, &mut conn).await
    }

    async fn webhook_event_exists(&self, event: &WebhookEvent) -> Result<bool, SyncDatabaseError> {
        let mut conn = self.pool.acquire().await?;
        let exists = db::webhook_events::event_exists(event, &mut conn).await?;
        Ok(exists)
    }

    async fn record_webhook_event(&self, event: &WebhookEvent) -> Result<bool, SyncDatabaseError> {
        let mut conn = self.pool.acquire().await?;
        let inserted = db::webhook_events::insert_event(event, &mut conn).await?;
        Ok(inserted)
    }

    async fn update_order_state(
        &self,
        order_id: &OrderId,
        expected: SyncState,
        new: SyncState,
        changes: OrderChanges,
        reason: &str,
    ) -> Result<Option<Order>, SyncDatabaseError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        let updated = db::orders::update_state(order_id, expected, new, changes, now, &mut tx).await?;
        let order = match updated {
            Some(order) => order,
            None => {
                debug!("🗃️ Order {order_id} is no longer {expected}. {new} not applied.");
                tx.rollback().await?;
                return Ok(None);
            },
        };
        db::transitions::insert_transition(order_id, expected, new, reason, now, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Order {order_id} moved from {expected} to {new}");
        Ok(Some(order))
    }

    async fn record_sync(
        &self,
        order_id: &OrderId,
        status: Option<RemoteOperationStatus>,
    ) -> Result<Option<Order>, SyncDatabaseError> {
        let mut conn = self.pool.acquire().await?;
        let order = db::orders::record_sync(order_id, status, Utc::now(), &mut conn).await?;
        Ok(order)
    }

    async fn fetch_orders_in_states(&self, states: &[SyncState]) -> Result<Vec<Order>, SyncDatabaseError> {
        let mut conn = self.pool.acquire().await?;
        let orders = db::orders::fetch_orders_in_states(states, &mut conn).await?;
        Ok(orders)
    }

    async fn fetch_transitions(&self, order_id: &OrderId) -> Result<Vec<TransitionRecord>, SyncDatabaseError> {
        let mut conn = self.pool.acquire().await?;
        let records = db::transitions::fetch_transitions(order_id, &mut conn).await?;
        Ok(records)
    }
}
