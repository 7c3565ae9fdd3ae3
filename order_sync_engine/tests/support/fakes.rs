//! Scripted, in-memory stand-ins for the FinOps and marketplace backends.
//!
//! Both fakes are cheap to clone and share their state, so a test can keep a handle to inspect the calls that the
//! engine made. Calls that have side effects are written to an optional [`CallLog`] as `start <call> <order>` and
//! `end <call> <order>` pairs.
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use osb_common::RemoteError;

use order_sync_engine::{
    db_types::{OperationId, OrderId, ProductId, RemoteOperationStatus},
    traits::{
        FinOpsOperations,
        MarketplaceOrders,
        OperationRequest,
        OrderDetails,
        OrderSummary,
        RemoteOperation,
        PURCHASE_ORDER_TYPE,
    },
};

#[derive(Clone, Default)]
pub struct CallLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl CallLog {
    pub fn record<S: Into<String>>(&self, entry: S) {
        self.entries.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().unwrap().clone()
    }

    /// True if no call started before the previous one had ended.
    pub fn is_serialized(&self) -> bool {
        let mut depth = 0i32;
        for entry in self.entries() {
            if entry.starts_with("start ") {
                depth += 1;
            } else if entry.starts_with("end ") {
                depth -= 1;
            }
            if depth > 1 {
                return false;
            }
        }
        true
    }

    async fn around<T, Fut: std::future::Future<Output = T>>(&self, label: String, delay: Duration, f: Fut) -> T {
        self.record(format!("start {label}"));
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let result = f.await;
        self.record(format!("end {label}"));
        result
    }
}

/// Fully populated order details for `order_id`.
pub fn order_details(order_id: &str, product_id: &str) -> OrderDetails {
    OrderDetails {
        order_id: order_id.into(),
        product_id: product_id.into(),
        status: "Processing".into(),
        order_type: PURCHASE_ORDER_TYPE.into(),
        organization_name: Some("Acme Corp".into()),
        currency: Some("USD".into()),
        admin_contact: Some("admin@acme.test".into()),
    }
}

//--------------------------------------       FakeFinOps       -------------------------------------------------------
#[derive(Default)]
struct FinOpsState {
    delay: Duration,
    create_error: Option<RemoteError>,
    fetch_error: Option<RemoteError>,
    operations: HashMap<OperationId, RemoteOperation>,
    by_order: HashMap<OrderId, OperationId>,
    next_id: usize,
    create_calls: usize,
    fetch_calls: usize,
}

#[derive(Clone, Default)]
pub struct FakeFinOps {
    state: Arc<Mutex<FinOpsState>>,
    log: CallLog,
}

impl FakeFinOps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_log(mut self, log: CallLog) -> Self {
        self.log = log;
        self
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut FinOpsState) -> R) -> R {
        f(&mut self.state.lock().unwrap())
    }

    pub fn set_delay(&self, delay: Duration) {
        self.with_state(|s| s.delay = delay);
    }

    /// Every `create_operation` call fails with `error` from now on. `None` restores normal behaviour.
    pub fn fail_creates_with(&self, error: Option<RemoteError>) {
        self.with_state(|s| s.create_error = error);
    }

    /// Every `fetch_operation` call fails with `error` from now on. `None` restores normal behaviour.
    pub fn fail_fetches_with(&self, error: Option<RemoteError>) {
        self.with_state(|s| s.fetch_error = error);
    }

    /// Stores an operation that already exists on the backend for `order_id`.
    pub fn add_operation(&self, order_id: &str, operation: RemoteOperation) {
        self.with_state(|s| {
            s.by_order.insert(order_id.into(), operation.id.clone());
            s.operations.insert(operation.id.clone(), operation);
        });
    }

    pub fn set_status(&self, operation_id: &str, status: RemoteOperationStatus, error_message: Option<&str>) {
        self.with_state(|s| {
            let id = OperationId::from(operation_id);
            let op = s.operations.entry(id.clone()).or_insert(RemoteOperation { id, status, error_message: None });
            op.status = status;
            op.error_message = error_message.map(String::from);
        });
    }

    pub fn create_calls(&self) -> usize {
        self.with_state(|s| s.create_calls)
    }

    pub fn fetch_calls(&self) -> usize {
        self.with_state(|s| s.fetch_calls)
    }
}

impl FinOpsOperations for FakeFinOps {
    async fn create_operation(&self, request: &OperationRequest) -> Result<RemoteOperation, RemoteError> {
        let delay = self.with_state(|s| {
            s.create_calls += 1;
            s.delay
        });
        let label = format!("create {}", request.order_id);
        self.log
            .around(label, delay, async {
                self.with_state(|s| {
                    if let Some(e) = &s.create_error {
                        return Err(e.clone());
                    }
                    s.next_id += 1;
                    let id = OperationId::from(format!("OP-{}", s.next_id));
                    let op = RemoteOperation { id: id.clone(), status: RemoteOperationStatus::Pending, error_message: None };
                    s.by_order.insert(request.order_id.clone(), id.clone());
                    s.operations.insert(id, op.clone());
                    Ok(op)
                })
            })
            .await
    }

    async fn find_operation_for_order(&self, order_id: &OrderId) -> Result<Option<RemoteOperation>, RemoteError> {
        Ok(self.with_state(|s| s.by_order.get(order_id).and_then(|id| s.operations.get(id)).cloned()))
    }

    async fn fetch_operation(&self, operation_id: &OperationId) -> Result<RemoteOperation, RemoteError> {
        let delay = self.with_state(|s| {
            s.fetch_calls += 1;
            s.delay
        });
        let label = format!("fetch {operation_id}");
        self.log
            .around(label, delay, async {
                self.with_state(|s| {
                    if let Some(e) = &s.fetch_error {
                        return Err(e.clone());
                    }
                    s.operations
                        .get(operation_id)
                        .cloned()
                        .ok_or_else(|| RemoteError::permanent(format!("Operation {operation_id} not found")))
                })
            })
            .await
    }
}

//--------------------------------------    FakeMarketplace     -------------------------------------------------------
#[derive(Default)]
struct MarketplaceState {
    delay: Duration,
    orders: HashMap<OrderId, OrderDetails>,
    listing: Vec<OrderSummary>,
    listing_failures: usize,
    list_calls: usize,
    fulfill_error: Option<RemoteError>,
    fulfilled: Vec<OrderId>,
    queried: Vec<(OrderId, String)>,
    failed: Vec<(OrderId, String)>,
}

#[derive(Clone, Default)]
pub struct FakeMarketplace {
    state: Arc<Mutex<MarketplaceState>>,
    log: CallLog,
}

impl FakeMarketplace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_log(mut self, log: CallLog) -> Self {
        self.log = log;
        self
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut MarketplaceState) -> R) -> R {
        f(&mut self.state.lock().unwrap())
    }

    pub fn set_delay(&self, delay: Duration) {
        self.with_state(|s| s.delay = delay);
    }

    /// Makes the order fetchable. The order is also added to the actionable listing.
    pub fn add_order(&self, details: OrderDetails) {
        self.with_state(|s| {
            s.listing.push(OrderSummary {
                order_id: details.order_id.clone(),
                product_id: details.product_id.clone(),
                status: details.status.clone(),
            });
            s.orders.insert(details.order_id.clone(), details);
        });
    }

    /// The next `count` listings fail with a transient error.
    pub fn fail_next_listings(&self, count: usize) {
        self.with_state(|s| s.listing_failures = count);
    }

    pub fn fail_fulfillment_with(&self, error: Option<RemoteError>) {
        self.with_state(|s| s.fulfill_error = error);
    }

    pub fn list_calls(&self) -> usize {
        self.with_state(|s| s.list_calls)
    }

    pub fn fulfilled(&self) -> Vec<OrderId> {
        self.with_state(|s| s.fulfilled.clone())
    }

    pub fn queried(&self) -> Vec<(OrderId, String)> {
        self.with_state(|s| s.queried.clone())
    }

    pub fn failed(&self) -> Vec<(OrderId, String)> {
        self.with_state(|s| s.failed.clone())
    }
}

impl MarketplaceOrders for FakeMarketplace {
    async fn list_actionable_orders(&self, product_ids: &[ProductId]) -> Result<Vec<OrderSummary>, RemoteError> {
        let delay = self.with_state(|s| {
            s.list_calls += 1;
            s.delay
        });
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.with_state(|s| {
            if s.listing_failures > 0 {
                s.listing_failures -= 1;
                return Err(RemoteError::transient("503 Service Unavailable"));
            }
            Ok(s.listing.iter().filter(|o| product_ids.contains(&o.product_id)).cloned().collect())
        })
    }

    async fn fetch_order(&self, order_id: &OrderId) -> Result<OrderDetails, RemoteError> {
        let delay = self.with_state(|s| s.delay);
        let label = format!("get {order_id}");
        self.log
            .around(label, delay, async {
                self.with_state(|s| {
                    s.orders
                        .get(order_id)
                        .cloned()
                        .ok_or_else(|| RemoteError::permanent(format!("Order {order_id} not found")))
                })
            })
            .await
    }

    async fn mark_fulfilled(&self, order_id: &OrderId) -> Result<(), RemoteError> {
        let delay = self.with_state(|s| s.delay);
        let label = format!("complete {order_id}");
        self.log
            .around(label, delay, async {
                self.with_state(|s| {
                    if let Some(e) = &s.fulfill_error {
                        return Err(e.clone());
                    }
                    s.fulfilled.push(order_id.clone());
                    Ok(())
                })
            })
            .await
    }

    async fn mark_needs_attention(&self, order_id: &OrderId, reason: &str) -> Result<(), RemoteError> {
        self.with_state(|s| s.queried.push((order_id.clone(), reason.to_string())));
        Ok(())
    }

    async fn mark_failed(&self, order_id: &OrderId, reason: &str) -> Result<(), RemoteError> {
        self.with_state(|s| s.failed.push((order_id.clone(), reason.to_string())));
        Ok(())
    }
}
