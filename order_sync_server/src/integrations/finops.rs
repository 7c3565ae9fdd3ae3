use finops_tools::{FinOpsApi, NewOperation, Operation, OperationStatus};
use log::*;
use order_sync_engine::{
    db_types::{OperationId, OrderId, RemoteOperationStatus},
    traits::{FinOpsOperations, OperationRequest, RemoteOperation},
};
use osb_common::RemoteError;

/// Implements [`FinOpsOperations`] on top of the FinOps API client. The order id is used as the operation's external
/// id.
#[derive(Clone)]
pub struct FinOpsConnector {
    api: FinOpsApi,
}

impl FinOpsConnector {
    pub fn new(api: FinOpsApi) -> Self {
        Self { api }
    }
}

impl FinOpsOperations for FinOpsConnector {
    async fn create_operation(&self, request: &OperationRequest) -> Result<RemoteOperation, RemoteError> {
        let operation = NewOperation {
            external_id: request.order_id.to_string(),
            product_id: request.product_id.to_string(),
            organization_name: request.organization_name.clone(),
            currency: request.currency.clone(),
            admin_contact: request.admin_contact.clone(),
        };
        let result = self.api.create_operation(&operation).await?;
        Ok(remote_operation(result))
    }

    async fn find_operation_for_order(&self, order_id: &OrderId) -> Result<Option<RemoteOperation>, RemoteError> {
        let result = self.api.find_operation_by_external_id(order_id.as_str()).await?;
        if let Some(op) = &result {
            debug!("🔄️ Found existing FinOps operation {} for order {order_id}", op.id);
        }
        Ok(result.map(remote_operation))
    }

    async fn fetch_operation(&self, operation_id: &OperationId) -> Result<RemoteOperation, RemoteError> {
        let result = self.api.get_operation(operation_id.as_str()).await?;
        Ok(remote_operation(result))
    }
}

fn remote_operation(op: Operation) -> RemoteOperation {
    RemoteOperation {
        id: OperationId::from(op.id),
        status: remote_status(op.status),
        error_message: op.error.map(|e| match e.code {
            Some(code) => format!("{code} {}", e.message),
            None => e.message,
        }),
    }
}

fn remote_status(status: OperationStatus) -> RemoteOperationStatus {
    match status {
        OperationStatus::Pending => RemoteOperationStatus::Pending,
        OperationStatus::Running => RemoteOperationStatus::Running,
        OperationStatus::Succeeded => RemoteOperationStatus::Succeeded,
        OperationStatus::Failed => RemoteOperationStatus::Failed,
        OperationStatus::Rejected => RemoteOperationStatus::Rejected,
        OperationStatus::Unknown => RemoteOperationStatus::Unknown,
    }
}
