use std::{collections::HashMap, env, time::Duration};

use finops_tools::FinOpsConfig;
use log::*;
use marketplace_tools::MarketplaceConfig;
use order_sync_engine::RetryPolicy;
use osb_common::{parse_boolean_flag, parse_list, Secret};

const DEFAULT_OSB_HOST: &str = "127.0.0.1";
const DEFAULT_OSB_PORT: u16 = 8360;
const DEFAULT_POLL_INTERVAL_SECS: u64 = 120;
const DEFAULT_POLL_CONCURRENCY: usize = 4;
const DEFAULT_SHUTDOWN_GRACE_SECS: u64 = 30;
const DEFAULT_RETRY_BASE_MS: u64 = 1_000;
const DEFAULT_RETRY_CAP_SECS: u64 = 60;
const DEFAULT_RETRY_MAX_ATTEMPTS: u32 = 5;
const DEFAULT_DUE_DATE_DAYS: i64 = 30;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// The products (tenants) whose orders are synchronized
    pub product_ids: Vec<String>,
    /// Webhook signing secret per product id
    pub webhook_secrets: HashMap<String, Secret<String>>,
    pub finops: FinOpsConfig,
    pub marketplace: MarketplaceConfig,
    pub poll_interval: Duration,
    pub poll_concurrency: usize,
    /// How long an in-flight poll cycle may keep running after shutdown was requested
    pub shutdown_grace: Duration,
    pub retry: RetryPolicy,
    /// Orders that are not finished this many days after validation are failed
    pub due_date_days: i64,
    pub notifications: NotificationConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_OSB_HOST.to_string(),
            port: DEFAULT_OSB_PORT,
            database_url: String::default(),
            product_ids: Vec::new(),
            webhook_secrets: HashMap::new(),
            finops: FinOpsConfig::default(),
            marketplace: MarketplaceConfig::default(),
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            poll_concurrency: DEFAULT_POLL_CONCURRENCY,
            shutdown_grace: Duration::from_secs(DEFAULT_SHUTDOWN_GRACE_SECS),
            retry: RetryPolicy::default(),
            due_date_days: DEFAULT_DUE_DATE_DAYS,
            notifications: NotificationConfig::default(),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct NotificationConfig {
    pub chat_enabled: bool,
    pub teams_webhook_url: Secret<String>,
    pub email_enabled: bool,
    pub email_api_url: String,
    pub email_api_key: Secret<String>,
    pub email_from: String,
    pub email_recipients: Vec<String>,
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("OSB_HOST").ok().unwrap_or_else(|| DEFAULT_OSB_HOST.into());
        let port = env::var("OSB_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for OSB_PORT. {e} Using the default, {DEFAULT_OSB_PORT}, instead."
                    );
                    DEFAULT_OSB_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_OSB_PORT);
        let database_url = env::var("OSB_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ OSB_DATABASE_URL is not set. Please set it to the URL for the order sync database.");
            String::default()
        });
        let product_ids = env::var("OSB_PRODUCT_IDS").map(|s| parse_list(&s)).unwrap_or_else(|_| {
            error!("🪛️ OSB_PRODUCT_IDS is not set. No orders will be synchronized.");
            Vec::new()
        });
        let webhook_secrets = env::var("OSB_WEBHOOK_SECRETS")
            .ok()
            .map(|s| parse_webhook_secrets(&s))
            .unwrap_or_else(|| {
                error!("🪛️ OSB_WEBHOOK_SECRETS is not set. Every webhook will be rejected.");
                HashMap::new()
            });
        let poll_interval = Duration::from_secs(env_number("OSB_POLL_INTERVAL", DEFAULT_POLL_INTERVAL_SECS));
        let poll_concurrency = env_number("OSB_POLL_CONCURRENCY", DEFAULT_POLL_CONCURRENCY).max(1);
        let shutdown_grace = Duration::from_secs(env_number("OSB_SHUTDOWN_GRACE", DEFAULT_SHUTDOWN_GRACE_SECS));
        let retry = RetryPolicy::new(
            Duration::from_millis(env_number("OSB_RETRY_BASE_MS", DEFAULT_RETRY_BASE_MS)),
            Duration::from_secs(env_number("OSB_RETRY_CAP_SECS", DEFAULT_RETRY_CAP_SECS)),
            env_number("OSB_RETRY_MAX_ATTEMPTS", DEFAULT_RETRY_MAX_ATTEMPTS),
        );
        let due_date_days = env_number("OSB_DUE_DATE_DAYS", DEFAULT_DUE_DATE_DAYS);
        Self {
            host,
            port,
            database_url,
            product_ids,
            webhook_secrets,
            finops: FinOpsConfig::new_from_env_or_default(),
            marketplace: MarketplaceConfig::new_from_env_or_default(),
            poll_interval,
            poll_concurrency,
            shutdown_grace,
            retry,
            due_date_days,
            notifications: NotificationConfig::from_env_or_defaults(),
        }
    }
}

impl NotificationConfig {
    pub fn from_env_or_defaults() -> Self {
        let chat_enabled = parse_boolean_flag(env::var("OSB_CHAT_NOTIFICATIONS").ok(), false);
        let teams_webhook_url = Secret::new(env::var("OSB_TEAMS_WEBHOOK_URL").unwrap_or_default());
        if chat_enabled && teams_webhook_url.is_empty() {
            warn!("🪛️ Chat notifications are enabled, but OSB_TEAMS_WEBHOOK_URL is not set. They will be disabled.");
        }
        let email_enabled = parse_boolean_flag(env::var("OSB_EMAIL_NOTIFICATIONS").ok(), false);
        let email_api_url = env::var("OSB_EMAIL_API_URL").unwrap_or_default();
        let email_api_key = Secret::new(env::var("OSB_EMAIL_API_KEY").unwrap_or_default());
        let email_from = env::var("OSB_EMAIL_FROM").unwrap_or_default();
        let email_recipients = env::var("OSB_EMAIL_RECIPIENTS").map(|s| parse_list(&s)).unwrap_or_default();
        if email_enabled && (email_api_url.is_empty() || email_recipients.is_empty()) {
            warn!(
                "🪛️ Email notifications are enabled, but OSB_EMAIL_API_URL or OSB_EMAIL_RECIPIENTS is not set. They \
                 will be disabled."
            );
        }
        Self {
            chat_enabled: chat_enabled && !teams_webhook_url.is_empty(),
            teams_webhook_url,
            email_enabled: email_enabled && !email_api_url.is_empty() && !email_recipients.is_empty(),
            email_api_url,
            email_api_key,
            email_from,
            email_recipients,
        }
    }
}

/// Parses a JSON object of product id to webhook secret. Invalid JSON yields an empty map, which makes startup fail
/// when the tenant registry is built.
pub fn parse_webhook_secrets(s: &str) -> HashMap<String, Secret<String>> {
    serde_json::from_str::<HashMap<String, Secret<String>>>(s).unwrap_or_else(|e| {
        error!("🪛️ OSB_WEBHOOK_SECRETS is not a JSON object of product ids to secrets. {e}");
        HashMap::new()
    })
}

fn env_number<T>(name: &str, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Display,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(s) => s.trim().parse::<T>().unwrap_or_else(|e| {
            error!("🪛️ {s} is not a valid value for {name}. {e} Using the default, {default}, instead.");
            default
        }),
        Err(_) => {
            debug!("🪛️ {name} is not set. Using the default, {default}.");
            default
        },
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn webhook_secrets_are_parsed() {
        let secrets = parse_webhook_secrets(r#"{"PRD-1111-1111": "s1", "PRD-2222-2222": "s2"}"#);
        assert_eq!(secrets.len(), 2);
        assert_eq!(secrets["PRD-1111-1111"].reveal(), "s1");
        assert!(parse_webhook_secrets("PRD-1111-1111=s1").is_empty());
    }

    #[test]
    fn defaults() {
        let config = ServerConfig::new("0.0.0.0", 9000);
        assert_eq!(config.port, 9000);
        assert_eq!(config.poll_interval, Duration::from_secs(120));
        assert_eq!(config.poll_concurrency, 4);
        assert_eq!(config.shutdown_grace, Duration::from_secs(30));
        assert_eq!(config.retry, RetryPolicy::default());
        assert_eq!(config.due_date_days, 30);
    }
}
