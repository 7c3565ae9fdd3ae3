use osb_common::RemoteError;
use thiserror::Error;

use crate::{
    db_types::{OrderId, ProductId},
    traits::SyncDatabaseError,
};

#[derive(Debug, Clone, Error)]
pub enum SyncError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] SyncDatabaseError),
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("Order {order_id} belongs to product {stored}, but the event was for {claimed}")]
    ProductMismatch { order_id: OrderId, stored: ProductId, claimed: ProductId },
    #[error("Remote call failed. {0}")]
    Remote(#[from] RemoteError),
}
