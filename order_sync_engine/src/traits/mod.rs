//! # Backend contracts
//!
//! The sync engine is generic over three collaborators:
//!
//! * [`SyncDatabase`] is the durable store for orders, webhook deliveries and the transition audit trail. State changes
//!   are compare-and-swap on the current state, so a lost update is refused by the store even if the caller forgot to
//!   take the per-order lock.
//! * [`FinOpsOperations`] creates and queries operations on the FinOps backend.
//! * [`MarketplaceOrders`] lists, fetches and updates orders on the marketplace.
//!
//! The remote traits report failures as [`osb_common::RemoteError`], already classified as transient, permanent or a
//! business rejection.
mod data_objects;
mod remote;
mod sync_database;

pub use data_objects::{
    OperationRequest,
    OrderDetails,
    OrderSummary,
    ParameterError,
    RemoteOperation,
    PURCHASE_ORDER_TYPE,
    UNSUPPORTED_ORDER_TYPE_CODE,
};
pub use remote::{FinOpsOperations, MarketplaceOrders};
pub use sync_database::{SyncDatabase, SyncDatabaseError};
