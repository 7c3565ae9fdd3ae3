mod api;
mod config;
mod data_objects;
mod error;
mod rql;

pub use api::MarketplaceApi;
pub use config::MarketplaceConfig;
pub use data_objects::{
    MarketplaceOrder,
    OrderParameters,
    OrderStatusNotes,
    Page,
    PageMeta,
    Pagination,
    Parameter,
    Reference,
    ADMIN_CONTACT,
    CURRENCY,
    ORGANIZATION_NAME,
};
pub use error::MarketplaceApiError;
pub use rql::{in_list, orders_query};
