use log::*;
use marketplace_tools::{MarketplaceApi, MarketplaceOrder, OrderStatusNotes, ADMIN_CONTACT, CURRENCY, ORGANIZATION_NAME};
use order_sync_engine::{
    db_types::{OrderId, ProductId},
    traits::{MarketplaceOrders, OrderDetails, OrderSummary},
};
use osb_common::RemoteError;

/// Marketplace order statuses that the poller looks at.
pub const ACTIONABLE_STATUSES: [&str; 2] = ["Draft", "Processing"];

const QUERY_NOTE_ID: &str = "OSB0001";
const FAILURE_NOTE_ID: &str = "OSB0002";

/// Implements [`MarketplaceOrders`] on top of the marketplace API client.
#[derive(Clone)]
pub struct MarketplaceConnector {
    api: MarketplaceApi,
}

impl MarketplaceConnector {
    pub fn new(api: MarketplaceApi) -> Self {
        Self { api }
    }
}

impl MarketplaceOrders for MarketplaceConnector {
    async fn list_actionable_orders(&self, product_ids: &[ProductId]) -> Result<Vec<OrderSummary>, RemoteError> {
        let products = product_ids.iter().map(|p| p.to_string()).collect::<Vec<_>>();
        let orders = self.api.list_orders(&products, &ACTIONABLE_STATUSES).await?;
        trace!("🔄️ {} actionable orders on the marketplace", orders.len());
        let summaries = orders
            .into_iter()
            .map(|o| OrderSummary { order_id: o.id.into(), product_id: o.product.id.into(), status: o.status })
            .collect();
        Ok(summaries)
    }

    async fn fetch_order(&self, order_id: &OrderId) -> Result<OrderDetails, RemoteError> {
        let order = self.api.get_order(order_id.as_str()).await?;
        Ok(order_details_from_marketplace_order(&order))
    }

    async fn mark_fulfilled(&self, order_id: &OrderId) -> Result<(), RemoteError> {
        self.api.complete_order(order_id.as_str()).await?;
        Ok(())
    }

    async fn mark_needs_attention(&self, order_id: &OrderId, reason: &str) -> Result<(), RemoteError> {
        let notes = OrderStatusNotes { id: QUERY_NOTE_ID.into(), message: reason.into() };
        self.api.query_order(order_id.as_str(), notes).await?;
        Ok(())
    }

    async fn mark_failed(&self, order_id: &OrderId, reason: &str) -> Result<(), RemoteError> {
        let notes = OrderStatusNotes { id: FAILURE_NOTE_ID.into(), message: reason.into() };
        self.api.fail_order(order_id.as_str(), notes).await?;
        Ok(())
    }
}

pub fn order_details_from_marketplace_order(order: &MarketplaceOrder) -> OrderDetails {
    OrderDetails {
        order_id: OrderId::from(order.id.as_str()),
        product_id: ProductId::from(order.product.id.as_str()),
        status: order.status.clone(),
        order_type: order.order_type.clone(),
        organization_name: order.ordering_text(ORGANIZATION_NAME),
        currency: order.ordering_text(CURRENCY),
        admin_contact: order.ordering_text(ADMIN_CONTACT),
    }
}
