use std::time::Duration;

use log::*;
use osb_common::Secret;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Default)]
pub struct FinOpsConfig {
    /// e.g. `https://api.finops.example.com`. No trailing slash.
    pub base_url: String,
    /// The `sub` claim of the minted service tokens.
    pub sub: String,
    pub secret: Secret<String>,
    /// Applied to every request.
    pub timeout: Duration,
}

impl FinOpsConfig {
    pub fn new_from_env_or_default() -> Self {
        let base_url = std::env::var("OSB_FINOPS_API_BASE_URL").unwrap_or_else(|_| {
            warn!("OSB_FINOPS_API_BASE_URL not set, using (probably useless) default");
            "http://localhost:8000".to_string()
        });
        let sub = std::env::var("OSB_FINOPS_SUB").unwrap_or_else(|_| {
            warn!("OSB_FINOPS_SUB not set, using (probably useless) default");
            "FTKN-0000-0000".to_string()
        });
        let secret = Secret::new(std::env::var("OSB_FINOPS_SECRET").unwrap_or_else(|_| {
            warn!("OSB_FINOPS_SECRET not set, using (probably useless) default");
            "00000000000000".to_string()
        }));
        let timeout = std::env::var("OSB_FINOPS_TIMEOUT")
            .ok()
            .and_then(|s| {
                s.parse::<u64>()
                    .map_err(|e| warn!("OSB_FINOPS_TIMEOUT ({s}) is not a number of seconds. {e}"))
                    .ok()
            })
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        Self { base_url: base_url.trim_end_matches('/').to_string(), sub, secret, timeout: Duration::from_secs(timeout) }
    }
}
