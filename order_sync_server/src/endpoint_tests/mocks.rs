use mockall::mock;
use order_sync_engine::{
    db_types::{OperationId, OrderId, ProductId},
    traits::{FinOpsOperations, MarketplaceOrders, OperationRequest, OrderDetails, OrderSummary, RemoteOperation},
};
use osb_common::RemoteError;

mock! {
    pub FinOps {}
    impl FinOpsOperations for FinOps {
        async fn create_operation(&self, request: &OperationRequest) -> Result<RemoteOperation, RemoteError>;
        async fn find_operation_for_order(&self, order_id: &OrderId) -> Result<Option<RemoteOperation>, RemoteError>;
        async fn fetch_operation(&self, operation_id: &OperationId) -> Result<RemoteOperation, RemoteError>;
    }
}

mock! {
    pub Marketplace {}
    impl MarketplaceOrders for Marketplace {
        async fn list_actionable_orders(&self, product_ids: &[ProductId]) -> Result<Vec<OrderSummary>, RemoteError>;
        async fn fetch_order(&self, order_id: &OrderId) -> Result<OrderDetails, RemoteError>;
        async fn mark_fulfilled(&self, order_id: &OrderId) -> Result<(), RemoteError>;
        async fn mark_needs_attention(&self, order_id: &OrderId, reason: &str) -> Result<(), RemoteError>;
        async fn mark_failed(&self, order_id: &OrderId, reason: &str) -> Result<(), RemoteError>;
    }
}
