//! Bindings between the remote API clients and the sync engine's backend traits.
mod finops;
mod marketplace;

pub use finops::FinOpsConnector;
pub use marketplace::{order_details_from_marketplace_order, MarketplaceConnector, ACTIONABLE_STATUSES};
