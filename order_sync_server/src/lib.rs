//! # Order sync bridge server
//!
//! This crate hosts the server for the order sync bridge. It is responsible for:
//! * Receiving draft-validation webhooks from the marketplace, authenticating them per product, and handing them to
//!   the sync engine.
//! * Running the poller that discovers marketplace orders and advances them through their lifecycle.
//! * Delivering notifications about order state changes to chat and email.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/v1/products/{product_id}/orders/validate`: The draft-validation webhook for the given product.
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod integrations;
pub mod middleware;
pub mod notifications;
pub mod poll_worker;
pub mod routes;
pub mod server;
pub mod tenants;
pub mod webhook_auth;

#[cfg(test)]
mod endpoint_tests;
