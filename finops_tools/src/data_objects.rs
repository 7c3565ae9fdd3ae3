use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of `POST /ops/v1/operations`. The marketplace order id is used as the external id, which is what makes
/// operation creation idempotent from the caller's side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOperation {
    pub external_id: String,
    pub product_id: String,
    pub organization_name: String,
    pub currency: String,
    pub admin_contact: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
    Rejected,
    #[serde(other)]
    Unknown,
}

impl Display for OperationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OperationStatus::Pending => write!(f, "pending"),
            OperationStatus::Running => write!(f, "running"),
            OperationStatus::Succeeded => write!(f, "succeeded"),
            OperationStatus::Failed => write!(f, "failed"),
            OperationStatus::Rejected => write!(f, "rejected"),
            OperationStatus::Unknown => write!(f, "unknown"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationError {
    #[serde(default)]
    pub code: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    pub id: String,
    pub external_id: String,
    pub status: OperationStatus,
    #[serde(default)]
    pub error: Option<OperationError>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OperationList {
    #[serde(default)]
    pub items: Vec<Operation>,
}

/// Error body returned by the FinOps API on 4xx responses.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiErrorBody {
    pub error_code: String,
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn unknown_statuses_do_not_break_parsing() {
        let op: Operation =
            serde_json::from_str(r#"{"id":"OP-9","external_id":"ORD-2","status":"archived"}"#).unwrap();
        assert_eq!(op.status, OperationStatus::Unknown);
        let op: Operation = serde_json::from_str(
            r#"{"id":"OP-9","external_id":"ORD-2","status":"rejected","error":{"code":"E42","message":"no budget"}}"#,
        )
        .unwrap();
        assert_eq!(op.status, OperationStatus::Rejected);
        assert_eq!(op.error.unwrap().message, "no budget");
    }
}
