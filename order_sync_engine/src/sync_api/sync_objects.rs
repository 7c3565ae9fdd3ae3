use serde::{Deserialize, Serialize};

use crate::db_types::{Order, OrderId, SyncState};

/// The result of handing a validated webhook event to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WebhookOutcome {
    /// The event was recorded and the order is now `Validating`.
    Accepted(Order),
    /// The same delivery was seen before. Nothing was changed.
    Duplicate(Order),
    /// The event was recorded, but the order had already moved past `Validating`.
    AlreadyProgressed(Order),
}

impl WebhookOutcome {
    pub fn order(&self) -> &Order {
        match self {
            WebhookOutcome::Accepted(o) | WebhookOutcome::Duplicate(o) | WebhookOutcome::AlreadyProgressed(o) => o,
        }
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, WebhookOutcome::Duplicate(_))
    }
}

/// The result of one processing step for an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncOutcome {
    pub order: Order,
    pub previous: SyncState,
}

impl SyncOutcome {
    pub fn changed(&self) -> bool {
        self.order.state != self.previous
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleSummary {
    /// Orders seen on the marketplace that were not known locally
    pub registered: usize,
    /// Orders handed to the engine
    pub processed: usize,
    /// Orders whose state changed during the cycle
    pub transitioned: usize,
    /// Orders for which processing returned an error
    pub errors: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CycleOutcome {
    /// Another cycle was still running.
    Skipped,
    /// The marketplace listing failed. No order was touched.
    DiscoveryFailed(String),
    Completed(CycleSummary),
}

/// Orders found by a discovery pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveredOrders {
    /// How many of the listed orders were new and have been stored as `Draft`
    pub registered: usize,
    /// Non-terminal orders that should be handed to the engine, without duplicates
    pub order_ids: Vec<OrderId>,
}
