use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::db_types::{OperationId, OrderId, ProductId, RemoteOperationStatus};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub status: String,
}

/// The only marketplace order type that is provisioned. Change and termination orders are failed.
pub const PURCHASE_ORDER_TYPE: &str = "Purchase";

/// The parts of a marketplace order that are needed to create its FinOps operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDetails {
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub status: String,
    /// `Purchase`, `Change` or `Termination`
    pub order_type: String,
    pub organization_name: Option<String>,
    pub currency: Option<String>,
    pub admin_contact: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParameterError {
    pub code: &'static str,
    pub message: &'static str,
}

impl Display for ParameterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.code, self.message)
    }
}

const MISSING_ORGANIZATION_NAME: ParameterError =
    ParameterError { code: "FFC0001", message: "Organization name is required" };
const MISSING_CURRENCY: ParameterError = ParameterError { code: "FFC0002", message: "Currency is required" };
const MISSING_ADMIN_CONTACT: ParameterError =
    ParameterError { code: "FFC0003", message: "Administrator contact is required" };

pub const UNSUPPORTED_ORDER_TYPE_CODE: &str = "FFC0004";

impl OrderDetails {
    pub fn is_purchase(&self) -> bool {
        self.order_type == PURCHASE_ORDER_TYPE
    }

    /// The failure reason for orders that are not purchases.
    pub fn unsupported_type_reason(&self) -> Option<String> {
        let order_type = if self.order_type.is_empty() { "(none)" } else { self.order_type.as_str() };
        (!self.is_purchase())
            .then(|| format!("{UNSUPPORTED_ORDER_TYPE_CODE} Order type {order_type} is not supported"))
    }

    /// Ordering parameters that must be filled in before an operation can be created.
    pub fn missing_parameters(&self) -> Vec<ParameterError> {
        let missing = |v: &Option<String>| v.as_deref().map(|s| s.trim().is_empty()).unwrap_or(true);
        let mut errors = Vec::new();
        if missing(&self.organization_name) {
            errors.push(MISSING_ORGANIZATION_NAME);
        }
        if missing(&self.currency) {
            errors.push(MISSING_CURRENCY);
        }
        if missing(&self.admin_contact) {
            errors.push(MISSING_ADMIN_CONTACT);
        }
        errors
    }

    /// Builds the operation request. Call [`Self::missing_parameters`] first; absent values become empty strings.
    pub fn to_operation_request(&self) -> OperationRequest {
        OperationRequest {
            order_id: self.order_id.clone(),
            product_id: self.product_id.clone(),
            organization_name: self.organization_name.clone().unwrap_or_default(),
            currency: self.currency.clone().unwrap_or_default(),
            admin_contact: self.admin_contact.clone().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationRequest {
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub organization_name: String,
    pub currency: String,
    pub admin_contact: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteOperation {
    pub id: OperationId,
    pub status: RemoteOperationStatus,
    pub error_message: Option<String>,
}
