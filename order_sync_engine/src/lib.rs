//! Order Sync Engine
//!
//! The order sync engine keeps marketplace orders and their FinOps operations in step. This library contains the core
//! logic of the bridge. It knows nothing about HTTP: the marketplace and FinOps backends are reached through the
//! traits in [`mod@traits`], and the server crate binds those to the real API clients.
//!
//! The library is divided into these sections:
//! 1. Storage ([`SqliteDatabase`]) behind the [`SyncDatabase`] trait. Orders, webhook deliveries and the transition
//!    audit trail live here. The data types are defined in [`mod@db_types`].
//! 2. The synchronization engine ([`OrderSyncApi`]). It owns the order state machine, per-order locking, retries and
//!    escalation.
//! 3. The [`OrderPoller`], which periodically discovers orders that need work and feeds them to the engine.
//! 4. Events. Every state transition publishes a [`NotificationEvent`](events::NotificationEvent). The
//!    [`NotificationDispatcher`](events::NotificationDispatcher) delivers them to chat and email channels.
pub mod db_types;
pub mod events;
pub mod poller;
pub mod sync_api;
pub mod traits;

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use poller::OrderPoller;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use sync_api::{
    errors::SyncError,
    order_sync_api::OrderSyncApi,
    retry::RetryPolicy,
    sync_objects::{CycleOutcome, CycleSummary, DiscoveredOrders, SyncOutcome, WebhookOutcome},
};
pub use traits::{FinOpsOperations, MarketplaceOrders, SyncDatabase, SyncDatabaseError};
