use std::fmt::Display;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How a failed remote call should be handled by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorClass {
    /// Timeouts, connection failures, throttling and server errors. Worth retrying.
    Transient,
    /// The request cannot succeed as sent. Retrying will not help.
    Permanent,
    /// The remote system understood the request and refused it on business grounds. A human needs to look at it.
    BusinessRejection,
}

impl Display for ErrorClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorClass::Transient => write!(f, "transient"),
            ErrorClass::Permanent => write!(f, "permanent"),
            ErrorClass::BusinessRejection => write!(f, "business rejection"),
        }
    }
}

/// Maps an HTTP error status to an [`ErrorClass`].
///
/// `structured_body` must be true when the response carried a machine-readable business error (an error code or a
/// problem-details `errors` object). Only then are 400, 409 and 422 treated as business rejections.
pub fn classify_status(status: u16, structured_body: bool) -> ErrorClass {
    match status {
        408 | 429 => ErrorClass::Transient,
        500..=599 => ErrorClass::Transient,
        400 | 409 | 422 if structured_body => ErrorClass::BusinessRejection,
        _ => ErrorClass::Permanent,
    }
}

/// A classified failure from one of the remote APIs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{class} error: {message}")]
pub struct RemoteError {
    pub class: ErrorClass,
    pub message: String,
}

impl RemoteError {
    pub fn new<S: Into<String>>(class: ErrorClass, message: S) -> Self {
        Self { class, message: message.into() }
    }

    pub fn transient<S: Into<String>>(message: S) -> Self {
        Self::new(ErrorClass::Transient, message)
    }

    pub fn permanent<S: Into<String>>(message: S) -> Self {
        Self::new(ErrorClass::Permanent, message)
    }

    pub fn business<S: Into<String>>(message: S) -> Self {
        Self::new(ErrorClass::BusinessRejection, message)
    }

    pub fn is_transient(&self) -> bool {
        self.class == ErrorClass::Transient
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn status_classification() {
        assert_eq!(classify_status(503, false), ErrorClass::Transient);
        assert_eq!(classify_status(500, true), ErrorClass::Transient);
        assert_eq!(classify_status(429, false), ErrorClass::Transient);
        assert_eq!(classify_status(408, false), ErrorClass::Transient);
        assert_eq!(classify_status(422, true), ErrorClass::BusinessRejection);
        assert_eq!(classify_status(409, true), ErrorClass::BusinessRejection);
        assert_eq!(classify_status(400, false), ErrorClass::Permanent);
        assert_eq!(classify_status(401, true), ErrorClass::Permanent);
        assert_eq!(classify_status(404, false), ErrorClass::Permanent);
    }

    #[test]
    fn display() {
        let err = RemoteError::transient("connection reset");
        assert_eq!(err.to_string(), "transient error: connection reset");
        assert!(err.is_transient());
        assert!(!RemoteError::business("nope").is_transient());
    }
}
