use std::sync::Arc;

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
    Method,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::json;

use crate::{
    config::MarketplaceConfig,
    rql::orders_query,
    MarketplaceApiError,
    MarketplaceOrder,
    OrderStatusNotes,
    Page,
};

#[derive(Clone)]
pub struct MarketplaceApi {
    config: MarketplaceConfig,
    client: Arc<Client>,
}

impl MarketplaceApi {
    pub fn new(config: MarketplaceConfig) -> Result<Self, MarketplaceApiError> {
        let mut headers = HeaderMap::with_capacity(2);
        let val = HeaderValue::from_str(&format!("Bearer {}", config.api_token.reveal()))
            .map_err(|e| MarketplaceApiError::Initialization(e.to_string()))?;
        headers.insert("Authorization", val);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let mut builder = Client::builder().default_headers(headers);
        if !config.timeout.is_zero() {
            builder = builder.timeout(config.timeout);
        }
        let client = builder.build().map_err(|e| MarketplaceApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/v1{path}", self.config.base_url)
    }

    pub async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<B>,
    ) -> Result<T, MarketplaceApiError> {
        let url = self.url(path);
        trace!("Sending marketplace query: {method} {url}");
        let mut req = self.client.request(method, url);
        if let Some(body) = body {
            req = req.json(&body);
        }
        let response = req.send().await?;
        if response.status().is_success() {
            trace!("Marketplace query successful. {}", response.status());
            let body = response.bytes().await?;
            serde_json::from_slice::<T>(&body).map_err(|e| MarketplaceApiError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let text = response.text().await?;
            Err(MarketplaceApiError::from_response(status, &text))
        }
    }

    /// Fetches every order for the given products that is in one of the given statuses, following pagination.
    pub async fn list_orders(
        &self,
        product_ids: &[String],
        statuses: &[&str],
    ) -> Result<Vec<MarketplaceOrder>, MarketplaceApiError> {
        let limit = self.config.page_size.max(1);
        let mut offset = 0;
        let mut orders = Vec::new();
        loop {
            let path = format!("/commerce/orders?{}", orders_query(product_ids, statuses, offset, limit));
            let page = self.rest_query::<Page<MarketplaceOrder>, ()>(Method::GET, &path, None).await?;
            let next = page.next_offset();
            orders.extend(page.data);
            match next {
                Some(n) => offset = n,
                None => break,
            }
        }
        debug!("Fetched {} orders in [{}] from the marketplace", orders.len(), statuses.join(","));
        Ok(orders)
    }

    pub async fn get_order(&self, order_id: &str) -> Result<MarketplaceOrder, MarketplaceApiError> {
        let path = format!("/commerce/orders/{}", urlencoding::encode(order_id));
        debug!("Fetching order {order_id}");
        self.rest_query::<MarketplaceOrder, ()>(Method::GET, &path, None).await
    }

    /// Moves the order to `Completed`.
    pub async fn complete_order(&self, order_id: &str) -> Result<MarketplaceOrder, MarketplaceApiError> {
        let path = format!("/commerce/orders/{}/complete", urlencoding::encode(order_id));
        debug!("Completing order {order_id}");
        let result = self.rest_query::<MarketplaceOrder, _>(Method::POST, &path, Some(json!({}))).await?;
        info!("Order {order_id} marked as completed in the marketplace");
        Ok(result)
    }

    /// Moves the order to `Querying` so that the buyer can correct it.
    pub async fn query_order(&self, order_id: &str, notes: OrderStatusNotes) -> Result<MarketplaceOrder, MarketplaceApiError> {
        let path = format!("/commerce/orders/{}/query", urlencoding::encode(order_id));
        debug!("Switching order {order_id} to querying");
        let body = json!({ "statusNotes": &notes });
        let result = self.rest_query::<MarketplaceOrder, _>(Method::POST, &path, Some(body)).await?;
        info!("Order {order_id} switched to querying. {}", notes.message);
        Ok(result)
    }

    pub async fn fail_order(&self, order_id: &str, notes: OrderStatusNotes) -> Result<MarketplaceOrder, MarketplaceApiError> {
        let path = format!("/commerce/orders/{}/fail", urlencoding::encode(order_id));
        debug!("Failing order {order_id}");
        let body = json!({ "statusNotes": &notes });
        let result = self.rest_query::<MarketplaceOrder, _>(Method::POST, &path, Some(body)).await?;
        info!("Order {order_id} marked as failed in the marketplace. {}", notes.message);
        Ok(result)
    }
}
