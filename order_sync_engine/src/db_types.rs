use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use log::error;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Type, Serialize, Deserialize)]
        #[sqlx(transparent)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

//--------------------------------------   Identifiers       ---------------------------------------------------------
string_id!(
    /// The marketplace order id, e.g. `ORD-1234-5678-9012`
    OrderId
);
string_id!(
    /// The marketplace product id. Products are the tenants of the bridge.
    ProductId
);
string_id!(
    /// The id the FinOps backend assigned to an operation
    OperationId
);

#[derive(Debug, Clone, Error)]
#[error("Invalid value: {0}")]
pub struct ConversionError(String);

//--------------------------------------      SyncState       ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
pub enum SyncState {
    /// Known to the bridge, but no validated webhook has been received for it yet.
    Draft,
    /// A validated webhook was received. The FinOps operation has not been created yet.
    Validating,
    /// The FinOps operation exists and is being tracked.
    Processing,
    /// The FinOps operation succeeded and the marketplace order has been fulfilled.
    Completed,
    /// An unrecoverable error occurred.
    Failed,
    /// A business rule rejected the order. Someone has to look at it.
    NeedsIntervention,
}

impl SyncState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SyncState::Completed | SyncState::Failed | SyncState::NeedsIntervention)
    }

    /// Position in the lifecycle. All terminal states share the highest rank.
    pub fn rank(&self) -> u8 {
        match self {
            SyncState::Draft => 0,
            SyncState::Validating => 1,
            SyncState::Processing => 2,
            SyncState::Completed | SyncState::Failed | SyncState::NeedsIntervention => 3,
        }
    }

    /// True if an order in this state has already reached (or moved beyond) `target`.
    pub fn has_reached(&self, target: SyncState) -> bool {
        self.rank() >= target.rank()
    }
}

impl Display for SyncState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncState::Draft => write!(f, "Draft"),
            SyncState::Validating => write!(f, "Validating"),
            SyncState::Processing => write!(f, "Processing"),
            SyncState::Completed => write!(f, "Completed"),
            SyncState::Failed => write!(f, "Failed"),
            SyncState::NeedsIntervention => write!(f, "NeedsIntervention"),
        }
    }
}

impl FromStr for SyncState {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Draft" => Ok(Self::Draft),
            "Validating" => Ok(Self::Validating),
            "Processing" => Ok(Self::Processing),
            "Completed" => Ok(Self::Completed),
            "Failed" => Ok(Self::Failed),
            "NeedsIntervention" => Ok(Self::NeedsIntervention),
            s => Err(ConversionError(format!("Invalid sync state: {s}"))),
        }
    }
}

impl From<String> for SyncState {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid sync state: {value}. Defaulting to Draft");
            SyncState::Draft
        })
    }
}

//-------------------------------------- RemoteOperationStatus ------------------------------------------------------
/// The last known status of an order's FinOps operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum RemoteOperationStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
    Rejected,
    Unknown,
}

impl RemoteOperationStatus {
    pub fn is_business_failure(&self) -> bool {
        matches!(self, RemoteOperationStatus::Failed | RemoteOperationStatus::Rejected)
    }
}

impl Display for RemoteOperationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RemoteOperationStatus::Pending => "Pending",
            RemoteOperationStatus::Running => "Running",
            RemoteOperationStatus::Succeeded => "Succeeded",
            RemoteOperationStatus::Failed => "Failed",
            RemoteOperationStatus::Rejected => "Rejected",
            RemoteOperationStatus::Unknown => "Unknown",
        };
        f.write_str(s)
    }
}

//--------------------------------------        Order         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub state: SyncState,
    pub operation_id: Option<OperationId>,
    pub operation_status: Option<RemoteOperationStatus>,
    pub error_message: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub last_synced_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        !self.state.is_terminal() && self.due_date.map(|d| d <= now).unwrap_or(false)
    }
}

//--------------------------------------       NewOrder       ---------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub created_at: DateTime<Utc>,
}

impl NewOrder {
    pub fn new(order_id: OrderId, product_id: ProductId) -> Self {
        Self { order_id, product_id, created_at: Utc::now() }
    }
}

//--------------------------------------    OrderChanges      ---------------------------------------------------------
/// Columns to update alongside a state change. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default)]
pub struct OrderChanges {
    pub operation_id: Option<OperationId>,
    pub operation_status: Option<RemoteOperationStatus>,
    pub error_message: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
}

impl OrderChanges {
    pub fn with_operation(mut self, id: OperationId, status: RemoteOperationStatus) -> Self {
        self.operation_id = Some(id);
        self.operation_status = Some(status);
        self
    }

    pub fn with_status(mut self, status: RemoteOperationStatus) -> Self {
        self.operation_status = Some(status);
        self
    }

    pub fn with_error<S: Into<String>>(mut self, message: S) -> Self {
        self.error_message = Some(message.into());
        self
    }

    pub fn with_due_date(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(due_date);
        self
    }
}

//--------------------------------------    WebhookEvent      ---------------------------------------------------------
/// The durable record of an authenticated webhook delivery. Deliveries are unique per
/// `(product_id, order_id, payload_hash)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookEvent {
    pub product_id: ProductId,
    pub order_id: OrderId,
    /// Hex-encoded SHA-256 of the raw payload
    pub payload_hash: String,
    pub webhook_id: Option<String>,
    pub received_at: DateTime<Utc>,
}

//--------------------------------------  TransitionRecord    ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub id: i64,
    pub order_id: OrderId,
    pub from_state: SyncState,
    pub to_state: SyncState,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}
