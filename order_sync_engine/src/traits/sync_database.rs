use thiserror::Error;

use crate::db_types::{
    NewOrder,
    Order,
    OrderChanges,
    OrderId,
    RemoteOperationStatus,
    SyncState,
    TransitionRecord,
    WebhookEvent,
};

#[allow(async_fn_in_trait)]
pub trait SyncDatabase: Clone {
    /// The URL of the database
    fn url(&self) -> &str;

    async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, SyncDatabaseError>;

    /// Stores the order in the `Draft` state unless an order with the same id already exists.
    /// Returns the stored order, and `true` if it was inserted by this call.
    async fn insert_order_if_absent(&self, order: NewOrder) -> Result<(Order, bool), SyncDatabaseError>;

    async fn webhook_event_exists(&self, event: &WebhookEvent) -> Result<bool, SyncDatabaseError>;

    /// Records a webhook delivery. Returns `false` if the same delivery was already recorded.
    async fn record_webhook_event(&self, event: &WebhookEvent) -> Result<bool, SyncDatabaseError>;

    /// Moves the order from `expected` to `new`, applying `changes` and writing a transition record, in a single
    /// database transaction.
    ///
    /// Returns `None`, without changing anything, if the order is not currently in the `expected` state.
    async fn update_order_state(
        &self,
        order_id: &OrderId,
        expected: SyncState,
        new: SyncState,
        changes: OrderChanges,
        reason: &str,
    ) -> Result<Option<Order>, SyncDatabaseError>;

    /// Stamps `last_synced_at` and, if given, the last seen remote operation status, without a state change.
    async fn record_sync(
        &self,
        order_id: &OrderId,
        status: Option<RemoteOperationStatus>,
    ) -> Result<Option<Order>, SyncDatabaseError>;

    /// Fetches all orders in any of the given states, oldest first.
    async fn fetch_orders_in_states(&self, states: &[SyncState]) -> Result<Vec<Order>, SyncDatabaseError>;

    /// The audit trail for the order, oldest first.
    async fn fetch_transitions(&self, order_id: &OrderId) -> Result<Vec<TransitionRecord>, SyncDatabaseError>;
}

#[derive(Debug, Clone, Error)]
pub enum SyncDatabaseError {
    #[error("We have an internal database engine (configuration/uptime etc.) : {0}")]
    DatabaseError(String),
    #[error("Could not run database migrations: {0}")]
    MigrationError(String),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderId),
}

impl From<sqlx::Error> for SyncDatabaseError {
    fn from(e: sqlx::Error) -> Self {
        SyncDatabaseError::DatabaseError(e.to_string())
    }
}
