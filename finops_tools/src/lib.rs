//! Typed client for the FinOps Operations API.
//!
//! Requests are authenticated with a short-lived HS256 bearer token that the client mints itself from the configured
//! subject and secret (see [`ServiceTokenSigner`]). Every failure is reported as a [`FinOpsApiError`], which knows its
//! own [`osb_common::ErrorClass`].
mod api;
mod auth;
mod config;
mod data_objects;
mod error;

pub use api::FinOpsApi;
pub use auth::{AccessToken, ServiceTokenClaims, ServiceTokenSigner};
pub use config::FinOpsConfig;
pub use data_objects::{NewOperation, Operation, OperationError, OperationList, OperationStatus};
pub use error::FinOpsApiError;
