//! The secret registry.
//!
//! Maps each configured product (tenant) to its webhook signing secret and the FinOps credentials its orders are
//! synchronized with. Every tenant currently shares the single configured FinOps credential set. Built once at startup
//! and read-only afterwards. A product without a secret is a configuration error, so the server refuses to start rather than
//! accept webhooks it cannot verify.
use std::{collections::HashMap, sync::Arc};

use finops_tools::FinOpsConfig;
use log::*;
use osb_common::Secret;

use crate::errors::{AuthError, ServerError};

#[derive(Clone, Debug)]
pub struct TenantCredentials {
    pub product_id: String,
    pub webhook_secret: Secret<String>,
    pub finops_credential: Arc<FinOpsConfig>,
}

#[derive(Clone, Debug, Default)]
pub struct TenantRegistry {
    tenants: HashMap<String, TenantCredentials>,
    finops: Arc<FinOpsConfig>,
}

impl TenantRegistry {
    pub fn new(
        product_ids: &[String],
        secrets: &HashMap<String, Secret<String>>,
        finops: FinOpsConfig,
    ) -> Result<Self, ServerError> {
        let finops = Arc::new(finops);
        let mut tenants = HashMap::with_capacity(product_ids.len());
        for product_id in product_ids {
            let secret = secrets.get(product_id).filter(|s| !s.is_empty()).ok_or_else(|| {
                ServerError::ConfigurationError(format!("Product {product_id} has no webhook secret"))
            })?;
            let credentials = TenantCredentials {
                product_id: product_id.clone(),
                webhook_secret: secret.clone(),
                finops_credential: Arc::clone(&finops),
            };
            tenants.insert(product_id.clone(), credentials);
        }
        secrets.keys().filter(|p| !tenants.contains_key(*p)).for_each(|p| {
            warn!("🔐️ A webhook secret is configured for {p}, which is not in OSB_PRODUCT_IDS. It will be ignored.");
        });
        info!("🔐️ Tenant registry loaded with {} products", tenants.len());
        Ok(Self { tenants, finops })
    }

    pub fn resolve(&self, product_id: &str) -> Result<&TenantCredentials, AuthError> {
        self.tenants.get(product_id).ok_or_else(|| AuthError::UnknownTenant(product_id.to_string()))
    }

    /// The FinOps credential set used for the orders of every tenant.
    pub fn finops_credential(&self) -> Arc<FinOpsConfig> {
        Arc::clone(&self.finops)
    }

    pub fn product_ids(&self) -> Vec<String> {
        let mut ids = self.tenants.keys().cloned().collect::<Vec<_>>();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.tenants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tenants.is_empty()
    }
}
