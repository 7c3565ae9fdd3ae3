use osb_common::{classify_status, ErrorClass, RemoteError};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MarketplaceApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Request timed out: {0}")]
    Timeout(String),
    #[error("Could not connect to the marketplace API: {0}")]
    Connection(String),
    #[error("Invalid REST request: {0}")]
    RestRequestError(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Query failed. Error {status}. {message}")]
    QueryError { status: u16, message: String, validation_errors: bool },
}

impl MarketplaceApiError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Timeout(_) | Self::Connection(_) => ErrorClass::Transient,
            Self::QueryError { status, validation_errors, .. } => classify_status(*status, *validation_errors),
            _ => ErrorClass::Permanent,
        }
    }

    /// Builds a `QueryError` from a problem-details response body. Bodies with an `errors` object are validation
    /// failures raised by the marketplace's business rules.
    pub fn from_response(status: u16, body: &str) -> Self {
        match serde_json::from_str::<Value>(body) {
            Ok(json) => {
                let title = json["title"].as_str().unwrap_or("Unknown error").to_string();
                let validation_errors = json["errors"].is_object();
                let message = match json.get("errors") {
                    Some(errors) if validation_errors => format!("{title}: {errors}"),
                    _ => title,
                };
                Self::QueryError { status, message, validation_errors }
            },
            Err(_) => Self::QueryError { status, message: body.to_string(), validation_errors: false },
        }
    }
}

impl From<reqwest::Error> for MarketplaceApiError {
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

impl From<MarketplaceApiError> for RemoteError {
    fn from(e: MarketplaceApiError) -> Self {
        RemoteError::new(e.class(), e.to_string())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn problem_details_with_errors_are_business_rejections() {
        let body = r#"{"type":"https://tools.ietf.org/html/rfc9110#section-15.5.1","title":"One or more validation errors occurred.","status":400,"traceId":"00-4b0d-01","errors":{"id":["Order is not in querying state"]}}"#;
        let err = MarketplaceApiError::from_response(400, body);
        assert_eq!(err.class(), ErrorClass::BusinessRejection);
        assert!(err.to_string().contains("Order is not in querying state"));
    }

    #[test]
    fn plain_failures() {
        assert_eq!(MarketplaceApiError::from_response(400, "bad").class(), ErrorClass::Permanent);
        assert_eq!(MarketplaceApiError::from_response(404, r#"{"title":"Not Found"}"#).class(), ErrorClass::Permanent);
        assert_eq!(MarketplaceApiError::from_response(503, "").class(), ErrorClass::Transient);
        assert_eq!(MarketplaceApiError::Timeout("slow".into()).class(), ErrorClass::Transient);
    }
}
