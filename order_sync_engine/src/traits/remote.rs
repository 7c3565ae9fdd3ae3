use osb_common::RemoteError;

use crate::{
    db_types::{OperationId, OrderId, ProductId},
    traits::{OperationRequest, OrderDetails, OrderSummary, RemoteOperation},
};

/// Operations on the FinOps backend.
#[allow(async_fn_in_trait)]
pub trait FinOpsOperations {
    async fn create_operation(&self, request: &OperationRequest) -> Result<RemoteOperation, RemoteError>;

    /// The operation previously created for the order, if there is one.
    async fn find_operation_for_order(&self, order_id: &OrderId) -> Result<Option<RemoteOperation>, RemoteError>;

    async fn fetch_operation(&self, operation_id: &OperationId) -> Result<RemoteOperation, RemoteError>;
}

/// Order operations on the marketplace.
#[allow(async_fn_in_trait)]
pub trait MarketplaceOrders {
    /// Orders for the given products that are in a marketplace status the bridge acts on.
    async fn list_actionable_orders(&self, product_ids: &[ProductId]) -> Result<Vec<OrderSummary>, RemoteError>;

    async fn fetch_order(&self, order_id: &OrderId) -> Result<OrderDetails, RemoteError>;

    /// Marks the order as fulfilled.
    async fn mark_fulfilled(&self, order_id: &OrderId) -> Result<(), RemoteError>;

    /// Hands the order back to the buyer for correction.
    async fn mark_needs_attention(&self, order_id: &OrderId, reason: &str) -> Result<(), RemoteError>;

    async fn mark_failed(&self, order_id: &OrderId, reason: &str) -> Result<(), RemoteError>;
}
