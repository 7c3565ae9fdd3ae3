use std::{collections::HashSet, fmt::Debug};

use chrono::{Duration, Utc};
use log::*;
use osb_common::{ErrorClass, RemoteError};

use crate::{
    db_types::{NewOrder, Order, OrderChanges, OrderId, ProductId, RemoteOperationStatus, SyncState, TransitionRecord, WebhookEvent},
    events::{EventProducers, NotificationEvent},
    sync_api::{
        errors::SyncError,
        locks::OrderLocks,
        retry::RetryPolicy,
        sync_objects::{DiscoveredOrders, SyncOutcome, WebhookOutcome},
    },
    traits::{FinOpsOperations, MarketplaceOrders, SyncDatabase},
};

pub const DEFAULT_DUE_DATE_DAYS: i64 = 30;

/// `OrderSyncApi` moves orders through their lifecycle in response to webhook events and poller cycles.
///
/// Every state change for an order happens while holding that order's lock, and is persisted with a compare-and-swap
/// on the previous state. Each applied transition publishes exactly one [`NotificationEvent`].
pub struct OrderSyncApi<B, F, M> {
    db: B,
    finops: F,
    marketplace: M,
    locks: OrderLocks,
    retry: RetryPolicy,
    producers: EventProducers,
    due_date_period: Duration,
}

impl<B, F, M> Debug for OrderSyncApi<B, F, M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderSyncApi ({:?})", self.retry)
    }
}

impl<B, F, M> OrderSyncApi<B, F, M> {
    pub fn new(db: B, finops: F, marketplace: M, producers: EventProducers) -> Self {
        Self {
            db,
            finops,
            marketplace,
            locks: OrderLocks::new(),
            retry: RetryPolicy::default(),
            producers,
            due_date_period: Duration::days(DEFAULT_DUE_DATE_DAYS),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_due_date_period(mut self, period: Duration) -> Self {
        self.due_date_period = period;
        self
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }
}

impl<B, F, M> OrderSyncApi<B, F, M>
where
    B: SyncDatabase,
    F: FinOpsOperations,
    M: MarketplaceOrders,
{
    pub async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, SyncError> {
        let order = self.db.fetch_order(order_id).await?;
        Ok(order)
    }

    pub async fn fetch_transitions(&self, order_id: &OrderId) -> Result<Vec<TransitionRecord>, SyncError> {
        let records = self.db.fetch_transitions(order_id).await?;
        Ok(records)
    }

    /// Records an authenticated draft-validation webhook.
    ///
    /// Unknown orders are registered first. A `Draft` order moves to `Validating` and gets its due date. A delivery
    /// that was already recorded for the same product, order and payload hash changes nothing.
    pub async fn accept_webhook_event(&self, event: WebhookEvent) -> Result<WebhookOutcome, SyncError> {
        let _guard = self.locks.acquire(&event.order_id).await;
        let new_order = NewOrder::new(event.order_id.clone(), event.product_id.clone());
        let (order, inserted) = self.db.insert_order_if_absent(new_order).await?;
        if inserted {
            debug!("🔄️📦️ Order {} registered from a webhook for {}", order.order_id, order.product_id);
        }
        if order.product_id != event.product_id {
            warn!(
                "🔄️📦️ Webhook for order {} claims product {}, but the order belongs to {}",
                order.order_id, event.product_id, order.product_id
            );
            return Err(SyncError::ProductMismatch {
                order_id: order.order_id,
                stored: order.product_id,
                claimed: event.product_id,
            });
        }
        if self.db.webhook_event_exists(&event).await? {
            info!("🔄️📦️ Duplicate webhook for order {} ignored", order.order_id);
            return Ok(WebhookOutcome::Duplicate(order));
        }
        let order = match order.state {
            SyncState::Draft => {
                let changes = OrderChanges::default().with_due_date(Utc::now() + self.due_date_period);
                let (order, _) =
                    self.transition(&order, SyncState::Validating, changes, "Draft validation webhook received").await?;
                order
            },
            _ => order,
        };
        self.db.record_webhook_event(&event).await?;
        if order.state == SyncState::Validating {
            Ok(WebhookOutcome::Accepted(order))
        } else {
            debug!("🔄️📦️ Webhook for order {} recorded. The order is already {}", order.order_id, order.state);
            Ok(WebhookOutcome::AlreadyProgressed(order))
        }
    }

    /// Advances the order by at most one step.
    ///
    /// * `Validating`: the marketplace order is fetched, the ordering parameters are checked and the FinOps operation
    ///   is found or created. The order moves to `Processing`. Orders that are not purchases are failed.
    /// * `Processing`: the operation status is queried. On success the marketplace order is completed and the order
    ///   moves to `Completed`. A failed or rejected operation moves it to `NeedsIntervention`.
    ///
    /// Overdue orders are failed. `Draft` and terminal orders are returned unchanged.
    pub async fn process_order(&self, order_id: &OrderId) -> Result<SyncOutcome, SyncError> {
        let _guard = self.locks.acquire(order_id).await;
        let order = self.db.fetch_order(order_id).await?.ok_or_else(|| SyncError::OrderNotFound(order_id.clone()))?;
        let previous = order.state;
        let order = self.step(order).await?;
        Ok(SyncOutcome { order, previous })
    }

    /// Registers marketplace orders that are not known yet and collects every order that may need work.
    ///
    /// The listing is attempted once. If it fails, nothing is registered and the error is returned.
    pub async fn discover_orders(&self, product_ids: &[ProductId]) -> Result<DiscoveredOrders, SyncError> {
        let listed = self.marketplace.list_actionable_orders(product_ids).await?;
        trace!("🔄️🔍️ {} actionable orders listed on the marketplace", listed.len());
        let mut seen = HashSet::new();
        let mut result = DiscoveredOrders::default();
        for summary in listed {
            if !product_ids.contains(&summary.product_id) {
                warn!("🔄️🔍️ Order {} is for unconfigured product {}. Ignoring it", summary.order_id, summary.product_id);
                continue;
            }
            let new_order = NewOrder::new(summary.order_id.clone(), summary.product_id.clone());
            let (order, inserted) = self.db.insert_order_if_absent(new_order).await?;
            if inserted {
                debug!("🔄️🔍️ Order {} ({}) registered as Draft", order.order_id, summary.status);
                result.registered += 1;
            }
            if !order.state.is_terminal() && seen.insert(order.order_id.clone()) {
                result.order_ids.push(order.order_id);
            }
        }
        let local = self.db.fetch_orders_in_states(&[SyncState::Validating, SyncState::Processing]).await?;
        for order in local {
            if seen.insert(order.order_id.clone()) {
                result.order_ids.push(order.order_id);
            }
        }
        Ok(result)
    }

    async fn step(&self, order: Order) -> Result<Order, SyncError> {
        if order.state.is_terminal() {
            trace!("🔄️ Order {} is {}. Nothing to do", order.order_id, order.state);
            return Ok(order);
        }
        if order.is_overdue(Utc::now()) {
            return self.fail(&order, "Due date is reached").await;
        }
        match order.state {
            SyncState::Validating => self.start_operation(order).await,
            SyncState::Processing => self.track_operation(order).await,
            _ => Ok(order),
        }
    }

    async fn start_operation(&self, order: Order) -> Result<Order, SyncError> {
        let order_id = &order.order_id;
        let marketplace = &self.marketplace;
        let finops = &self.finops;
        let details = match self.retry.run("Fetch marketplace order", || marketplace.fetch_order(order_id)).await {
            Ok(details) => details,
            Err(e) => return self.escalate(&order, "Could not fetch the marketplace order", e).await,
        };
        if let Some(reason) = details.unsupported_type_reason() {
            return self.fail(&order, &reason).await;
        }
        let missing = details.missing_parameters();
        if !missing.is_empty() {
            let errors = missing.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; ");
            let reason = format!("Ordering parameters are invalid: {errors}");
            return self.needs_intervention(&order, OrderChanges::default(), &reason).await;
        }
        let request = details.to_operation_request();
        let existing = match self.retry.run("Find FinOps operation", || finops.find_operation_for_order(order_id)).await {
            Ok(existing) => existing,
            Err(e) => return self.escalate(&order, "Could not look up the FinOps operation", e).await,
        };
        let operation = match existing {
            Some(operation) => {
                info!("🔄️ Order {order_id} already has FinOps operation {}. Reusing it", operation.id);
                operation
            },
            None => match self.retry.run("Create FinOps operation", || finops.create_operation(&request)).await {
                Ok(operation) => {
                    info!("🔄️ FinOps operation {} created for order {order_id}", operation.id);
                    operation
                },
                Err(e) => return self.escalate(&order, "Could not create the FinOps operation", e).await,
            },
        };
        let reason = format!("FinOps operation {} is {}", operation.id, operation.status);
        let changes = OrderChanges::default().with_operation(operation.id, operation.status);
        let (order, _) = self.transition(&order, SyncState::Processing, changes, &reason).await?;
        Ok(order)
    }

    async fn track_operation(&self, order: Order) -> Result<Order, SyncError> {
        let Some(operation_id) = order.operation_id.clone() else {
            return self.fail(&order, "Order is Processing, but has no FinOps operation").await;
        };
        let finops = &self.finops;
        let operation = match self.retry.run("Fetch FinOps operation", || finops.fetch_operation(&operation_id)).await {
            Ok(operation) => operation,
            Err(e) if e.is_transient() => {
                warn!("🔄️ Status of operation {operation_id} is unavailable. Order {} stays Processing. {e}", order.order_id);
                let synced = self.db.record_sync(&order.order_id, None).await?;
                return Ok(synced.unwrap_or(order));
            },
            Err(e) => return self.escalate(&order, "Could not fetch the FinOps operation", e).await,
        };
        match operation.status {
            RemoteOperationStatus::Succeeded => {
                let order_id = &order.order_id;
                let marketplace = &self.marketplace;
                match self.retry.run("Complete marketplace order", || marketplace.mark_fulfilled(order_id)).await {
                    Ok(()) => {
                        let changes = OrderChanges::default().with_status(RemoteOperationStatus::Succeeded);
                        let reason = format!("FinOps operation {operation_id} succeeded");
                        let (order, _) = self.transition(&order, SyncState::Completed, changes, &reason).await?;
                        Ok(order)
                    },
                    Err(e) => self.escalate(&order, "Could not complete the marketplace order", e).await,
                }
            },
            status if status.is_business_failure() => {
                let detail = operation.error_message.as_deref().unwrap_or("No reason was given");
                let reason = format!("FinOps operation {operation_id} is {status}. {detail}");
                self.needs_intervention(&order, OrderChanges::default().with_status(status), &reason).await
            },
            status => {
                trace!("🔄️ Operation {operation_id} for order {} is {status}", order.order_id);
                let synced = self.db.record_sync(&order.order_id, Some(status)).await?;
                Ok(synced.unwrap_or(order))
            },
        }
    }

    async fn escalate(&self, order: &Order, context: &str, error: RemoteError) -> Result<Order, SyncError> {
        let reason = format!("{context}. {error}");
        match error.class {
            ErrorClass::BusinessRejection => self.needs_intervention(order, OrderChanges::default(), &reason).await,
            ErrorClass::Transient | ErrorClass::Permanent => self.fail(order, &reason).await,
        }
    }

    async fn needs_intervention(&self, order: &Order, changes: OrderChanges, reason: &str) -> Result<Order, SyncError> {
        let changes = changes.with_error(reason);
        let (updated, applied) = self.transition(order, SyncState::NeedsIntervention, changes, reason).await?;
        if applied {
            if let Err(e) = self.marketplace.mark_needs_attention(&order.order_id, reason).await {
                warn!("🔄️ Could not move marketplace order {} to querying. {e}", order.order_id);
            }
        }
        Ok(updated)
    }

    async fn fail(&self, order: &Order, reason: &str) -> Result<Order, SyncError> {
        let changes = OrderChanges::default().with_error(reason);
        let (updated, applied) = self.transition(order, SyncState::Failed, changes, reason).await?;
        if applied {
            if let Err(e) = self.marketplace.mark_failed(&order.order_id, reason).await {
                warn!("🔄️ Could not fail marketplace order {}. {e}", order.order_id);
            }
        }
        Ok(updated)
    }

    /// Moves `order` to `target`. Returns the stored order and whether this call changed it.
    ///
    /// If the order has already reached `target`, or another writer changed its state first, nothing is written and
    /// the current order is returned.
    async fn transition(
        &self,
        order: &Order,
        target: SyncState,
        changes: OrderChanges,
        reason: &str,
    ) -> Result<(Order, bool), SyncError> {
        if order.state.has_reached(target) {
            trace!("🔄️ Order {} is already {}. {target} is a no-op", order.order_id, order.state);
            return Ok((order.clone(), false));
        }
        let updated = self.db.update_order_state(&order.order_id, order.state, target, changes, reason).await?;
        match updated {
            Some(updated) => {
                info!("🔄️ Order {} moved from {} to {target}. {reason}", updated.order_id, order.state);
                let event = NotificationEvent::for_transition(&updated, order.state, reason);
                self.producers.publish_notification(event).await;
                Ok((updated, true))
            },
            None => {
                let current = self
                    .db
                    .fetch_order(&order.order_id)
                    .await?
                    .ok_or_else(|| SyncError::OrderNotFound(order.order_id.clone()))?;
                debug!("🔄️ Order {} changed to {} underneath us. {target} not applied", current.order_id, current.state);
                Ok((current, false))
            },
        }
    }
}
