use std::time::Duration;

use log::*;
use osb_common::Secret;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_PAGE_SIZE: usize = 50;

#[derive(Debug, Clone, Default)]
pub struct MarketplaceConfig {
    /// e.g. `https://api.marketplace.example.com/public`. No trailing slash.
    pub base_url: String,
    pub api_token: Secret<String>,
    pub timeout: Duration,
    pub page_size: usize,
}

impl MarketplaceConfig {
    pub fn new_from_env_or_default() -> Self {
        let base_url = std::env::var("OSB_MARKETPLACE_API_BASE_URL").unwrap_or_else(|_| {
            warn!("OSB_MARKETPLACE_API_BASE_URL not set, using (probably useless) default");
            "http://localhost:8001/public".to_string()
        });
        let api_token = Secret::new(std::env::var("OSB_MARKETPLACE_API_TOKEN").unwrap_or_else(|_| {
            warn!("OSB_MARKETPLACE_API_TOKEN not set, using (probably useless) default");
            "idt:TKN-0000-0000".to_string()
        }));
        let timeout = std::env::var("OSB_MARKETPLACE_TIMEOUT")
            .ok()
            .and_then(|s| {
                s.parse::<u64>()
                    .map_err(|e| warn!("OSB_MARKETPLACE_TIMEOUT ({s}) is not a number of seconds. {e}"))
                    .ok()
            })
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token,
            timeout: Duration::from_secs(timeout),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}
