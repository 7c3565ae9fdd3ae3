use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use order_sync_engine::SyncError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Auth token not provided or not a bearer token")]
    CouldNotDeserializeAuthToken,
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("Authentication Error. {0}")]
    AuthenticationError(#[from] AuthError),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::CouldNotDeserializeAuthToken => StatusCode::BAD_REQUEST,
            Self::AuthenticationError(e) => match e {
                AuthError::UnknownTenant(_) => StatusCode::UNAUTHORIZED,
                AuthError::BadSignature(_) => StatusCode::UNAUTHORIZED,
                AuthError::TokenExpired => StatusCode::UNAUTHORIZED,
                AuthError::TenantMismatch { .. } => StatusCode::FORBIDDEN,
            },
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

/// Reasons for rejecting a webhook before it reaches the sync engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Unknown tenant: {0}")]
    UnknownTenant(String),
    #[error("Webhook token is invalid. {0}")]
    BadSignature(String),
    #[error("Webhook token has expired.")]
    TokenExpired,
    #[error("Webhook token was issued for {claimed}, not {tenant}.")]
    TenantMismatch { tenant: String, claimed: String },
}

impl From<SyncError> for ServerError {
    fn from(e: SyncError) -> Self {
        match e {
            SyncError::ProductMismatch { order_id, stored, claimed } => {
                Self::AuthenticationError(AuthError::TenantMismatch {
                    tenant: claimed.to_string(),
                    claimed: format!("the owner of order {order_id} ({stored})"),
                })
            },
            SyncError::OrderNotFound(id) => Self::NoRecordFound(format!("Order {id}")),
            e => Self::BackendError(e.to_string()),
        }
    }
}
