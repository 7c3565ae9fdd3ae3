//! # Order sync public API
//!
//! [`OrderSyncApi`](order_sync_api::OrderSyncApi) is the synchronization engine. It is created by supplying a
//! database backend that implements [`SyncDatabase`](crate::traits::SyncDatabase) and the two remote clients,
//! [`FinOpsOperations`](crate::traits::FinOpsOperations) and [`MarketplaceOrders`](crate::traits::MarketplaceOrders).
//!
//! ```rust,ignore
//! use order_sync_engine::{OrderSyncApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url("sqlite://data/osb.db", 5).await?;
//! let api = OrderSyncApi::new(db, finops, marketplace, producers);
//! let outcome = api.process_order(&order_id).await?;
//! ```
//!
//! Support types:
//! * [`locks`] serializes work on a single order.
//! * [`retry`] holds the backoff policy for remote calls.
pub mod errors;
pub mod locks;
pub mod order_sync_api;
pub mod retry;
pub mod sync_objects;
