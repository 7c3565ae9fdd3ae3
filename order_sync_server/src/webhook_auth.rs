//! Webhook authentication.
//!
//! Draft-validation webhooks carry an HS256 JWT in the `Authorization: Bearer` header, signed with the webhook secret
//! of the product the order belongs to. [`authenticate`] is a pure function of the registry, the token, the payload
//! and the current time. The checks run in a fixed order:
//!
//! 1. The product in the path must be a configured tenant, whatever the token says.
//! 2. The token must decode as a JWT.
//! 3. The `product_id` claim must match the product in the path. This is checked before the signature, so a token
//!    issued for one tenant is never accepted at another, even when both share a secret.
//! 4. The signature must verify against the tenant's secret.
//! 5. The token must not have expired, allowing for [`EXPIRY_LEEWAY_SECS`] of clock skew.
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use log::*;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{errors::AuthError, tenants::TenantRegistry};

pub const EXPIRY_LEEWAY_SECS: i64 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookClaims {
    pub product_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_id: Option<String>,
    pub iat: i64,
    pub exp: i64,
}

/// A webhook delivery that passed authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedEvent {
    pub product_id: String,
    pub webhook_id: Option<String>,
    pub payload: Vec<u8>,
    /// Hex-encoded SHA-256 of the payload
    pub payload_hash: String,
    pub received_at: DateTime<Utc>,
}

pub fn authenticate(
    registry: &TenantRegistry,
    tenant: &str,
    token: &str,
    payload: &[u8],
    now: DateTime<Utc>,
) -> Result<ValidatedEvent, AuthError> {
    let credentials = registry.resolve(tenant)?;
    let claims = read_unverified_claims(token)?;
    if claims.product_id != tenant {
        warn!("🔐️ Webhook token for {} was presented at {tenant}", claims.product_id);
        return Err(AuthError::TenantMismatch { tenant: tenant.to_string(), claimed: claims.product_id });
    }
    let claims = verify_signature(token, credentials.webhook_secret.reveal())?;
    if now.timestamp() >= claims.exp.saturating_add(EXPIRY_LEEWAY_SECS) {
        debug!("🔐️ Webhook token for {tenant} expired at {}", claims.exp);
        return Err(AuthError::TokenExpired);
    }
    trace!("🔐️ Webhook token for {tenant} is valid ✅️");
    Ok(ValidatedEvent {
        product_id: claims.product_id,
        webhook_id: claims.webhook_id,
        payload: payload.to_vec(),
        payload_hash: payload_hash(payload),
        received_at: now,
    })
}

pub fn payload_hash(payload: &[u8]) -> String {
    format!("{:x}", Sha256::digest(payload))
}

fn base_validation() -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();
    validation
}

fn read_unverified_claims(token: &str) -> Result<WebhookClaims, AuthError> {
    let mut validation = base_validation();
    validation.insecure_disable_signature_validation();
    jsonwebtoken::decode::<WebhookClaims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map(|data| data.claims)
        .map_err(|e| {
            debug!("🔐️ Webhook token could not be decoded. {e}");
            AuthError::BadSignature(format!("Token could not be decoded. {e}"))
        })
}

fn verify_signature(token: &str, secret: &str) -> Result<WebhookClaims, AuthError> {
    jsonwebtoken::decode::<WebhookClaims>(token, &DecodingKey::from_secret(secret.as_bytes()), &base_validation())
        .map(|data| data.claims)
        .map_err(|e| {
            debug!("🔐️ Webhook token signature check failed. {e}");
            AuthError::BadSignature(e.to_string())
        })
}
