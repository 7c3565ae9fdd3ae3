use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db_types::{Order, OrderId, SyncState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelKind {
    Chat,
    Email,
}

impl Display for ChannelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChannelKind::Chat => write!(f, "chat"),
            ChannelKind::Email => write!(f, "email"),
        }
    }
}

/// Announces an order state transition. One is published for every transition the engine applies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationEvent {
    pub severity: Severity,
    pub order_id: OrderId,
    pub subject: String,
    pub body: String,
    pub targets: Vec<ChannelKind>,
    pub created_at: DateTime<Utc>,
}

impl NotificationEvent {
    pub fn for_transition(order: &Order, from: SyncState, reason: &str) -> Self {
        let severity = match order.state {
            SyncState::Failed => Severity::Error,
            SyncState::NeedsIntervention => Severity::Warning,
            _ => Severity::Info,
        };
        let targets = match severity {
            Severity::Info => vec![ChannelKind::Chat],
            Severity::Warning | Severity::Error => vec![ChannelKind::Chat, ChannelKind::Email],
        };
        let subject = format!("Order {} is {}", order.order_id, order.state);
        let mut body = format!(
            "Order {} for product {} moved from {from} to {}. {reason}",
            order.order_id, order.product_id, order.state
        );
        if let Some(op) = &order.operation_id {
            body.push_str(&format!("\nFinOps operation: {op}"));
        }
        Self { severity, order_id: order.order_id.clone(), subject, body, targets, created_at: Utc::now() }
    }
}
