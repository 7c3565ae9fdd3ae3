use std::sync::Arc;

use chrono::Utc;
use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION},
    Client,
    Method,
};
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    auth::ServiceTokenSigner,
    data_objects::ApiErrorBody,
    FinOpsApiError,
    FinOpsConfig,
    NewOperation,
    Operation,
    OperationList,
};

#[derive(Clone)]
pub struct FinOpsApi {
    config: FinOpsConfig,
    client: Arc<Client>,
    signer: Arc<ServiceTokenSigner>,
}

impl FinOpsApi {
    pub fn new(config: FinOpsConfig) -> Result<Self, FinOpsApiError> {
        let mut headers = HeaderMap::with_capacity(1);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let mut builder = Client::builder().default_headers(headers);
        if !config.timeout.is_zero() {
            builder = builder.timeout(config.timeout);
        }
        let client = builder.build().map_err(|e| FinOpsApiError::Initialization(e.to_string()))?;
        let signer = ServiceTokenSigner::new(&config);
        Ok(Self { config, client: Arc::new(client), signer: Arc::new(signer) })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/ops/v1{path}", self.config.base_url)
    }

    pub async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<B>,
    ) -> Result<T, FinOpsApiError> {
        let url = self.url(path);
        let token = self.signer.token_at(Utc::now())?;
        let request_id = format!("{:032x}", rand::random::<u128>());
        trace!("Sending FinOps query: {method} {url} [{request_id}]");
        let mut req = self
            .client
            .request(method, url)
            .header(AUTHORIZATION, format!("Bearer {}", token.token.reveal()))
            .header("X-Request-Id", request_id.as_str());
        if let Some(body) = body {
            req = req.json(&body);
        }
        let response = req.send().await?;
        if response.status().is_success() {
            trace!("FinOps query [{request_id}] successful. {}", response.status());
            let body = response.bytes().await?;
            serde_json::from_slice::<T>(&body).map_err(|e| FinOpsApiError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let text = response.text().await?;
            let (error_code, message) = match serde_json::from_str::<ApiErrorBody>(&text) {
                Ok(body) => {
                    let message = body.message.unwrap_or_else(|| text.clone());
                    (Some(body.error_code), message)
                },
                Err(_) => (None, text),
            };
            debug!("FinOps query [{request_id}] failed with {status}. {message}");
            Err(FinOpsApiError::QueryError { status, message, error_code })
        }
    }

    pub async fn create_operation(&self, operation: &NewOperation) -> Result<Operation, FinOpsApiError> {
        debug!("Creating FinOps operation for order {}", operation.external_id);
        let result = self.rest_query::<Operation, _>(Method::POST, "/operations", Some(operation)).await?;
        info!("Created FinOps operation {} for order {}", result.id, operation.external_id);
        Ok(result)
    }

    pub async fn get_operation(&self, operation_id: &str) -> Result<Operation, FinOpsApiError> {
        let path = format!("/operations/{}", urlencoding::encode(operation_id));
        debug!("Fetching FinOps operation {operation_id}");
        self.rest_query::<Operation, ()>(Method::GET, &path, None).await
    }

    /// Looks up the operation that was created for the given external (order) id, if any.
    pub async fn find_operation_by_external_id(&self, external_id: &str) -> Result<Option<Operation>, FinOpsApiError> {
        let path = format!("/operations?{}", external_id_query(external_id));
        let result = self.rest_query::<OperationList, ()>(Method::GET, &path, None).await?;
        Ok(result.items.into_iter().find(|op| op.external_id == external_id))
    }
}

/// RQL filter for the operation with the given external id. The id is percent-encoded so that RQL and query string
/// delimiters in it cannot change the filter.
pub fn external_id_query(external_id: &str) -> String {
    format!("eq(external_id,{})&limit=1", urlencoding::encode(external_id))
}
