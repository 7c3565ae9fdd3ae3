use osb_common::{classify_status, ErrorClass, RemoteError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FinOpsApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Could not mint service token: {0}")]
    TokenError(String),
    #[error("Request timed out: {0}")]
    Timeout(String),
    #[error("Could not connect to the FinOps API: {0}")]
    Connection(String),
    #[error("Invalid REST request: {0}")]
    RestRequestError(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Query failed. Error {status}. {message}")]
    QueryError { status: u16, message: String, error_code: Option<String> },
}

impl FinOpsApiError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Timeout(_) | Self::Connection(_) => ErrorClass::Transient,
            Self::QueryError { status, error_code, .. } => classify_status(*status, error_code.is_some()),
            _ => ErrorClass::Permanent,
        }
    }
}

impl From<reqwest::Error> for FinOpsApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout(e.to_string())
        } else if e.is_connect() {
            Self::Connection(e.to_string())
        } else if e.is_decode() {
            Self::JsonError(e.to_string())
        } else {
            Self::RestRequestError(e.to_string())
        }
    }
}

impl From<FinOpsApiError> for RemoteError {
    fn from(e: FinOpsApiError) -> Self {
        RemoteError::new(e.class(), e.to_string())
    }
}
