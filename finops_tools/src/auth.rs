//! Service token minting for the FinOps API.
//!
//! The FinOps API accepts HS256 tokens signed with the account secret. Tokens live for five minutes; the signer keeps
//! the current one and mints a replacement once it is within [`REFRESH_MARGIN`] of expiring, so that a request is
//! never sent with a token that runs out in flight.
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use log::*;
use osb_common::Secret;
use serde::{Deserialize, Serialize};

use crate::{FinOpsApiError, FinOpsConfig};

pub const TOKEN_LIFETIME: Duration = Duration::minutes(5);
pub const REFRESH_MARGIN: Duration = Duration::seconds(60);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceTokenClaims {
    pub sub: String,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
}

#[derive(Debug, Clone)]
pub struct AccessToken {
    pub token: Secret<String>,
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    pub fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        now + REFRESH_MARGIN >= self.expires_at
    }
}

pub struct ServiceTokenSigner {
    sub: String,
    key: EncodingKey,
    current: Mutex<Option<AccessToken>>,
}

impl ServiceTokenSigner {
    pub fn new(config: &FinOpsConfig) -> Self {
        let key = EncodingKey::from_secret(config.secret.reveal().as_bytes());
        Self { sub: config.sub.clone(), key, current: Mutex::new(None) }
    }

    /// Returns a token that is valid for at least [`REFRESH_MARGIN`] after `now`, minting a new one if necessary.
    pub fn token_at(&self, now: DateTime<Utc>) -> Result<AccessToken, FinOpsApiError> {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(token) = current.as_ref().filter(|t| !t.needs_refresh(now)) {
            return Ok(token.clone());
        }
        let token = self.mint(now)?;
        debug!("🔑️ Minted new FinOps service token, valid until {}", token.expires_at);
        *current = Some(token.clone());
        Ok(token)
    }

    fn mint(&self, now: DateTime<Utc>) -> Result<AccessToken, FinOpsApiError> {
        let expires_at = now + TOKEN_LIFETIME;
        let claims = ServiceTokenClaims {
            sub: self.sub.clone(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.key)
            .map_err(|e| FinOpsApiError::TokenError(e.to_string()))?;
        Ok(AccessToken { token: Secret::new(token), expires_at })
    }
}

#[cfg(test)]
mod test {
    use jsonwebtoken::{DecodingKey, Validation};

    use super::*;

    fn signer() -> ServiceTokenSigner {
        let config = FinOpsConfig { sub: "FTKN-1234".into(), secret: Secret::new("finops-secret".into()), ..Default::default() };
        ServiceTokenSigner::new(&config)
    }

    #[test]
    fn token_is_reused_until_close_to_expiry() {
        let signer = signer();
        let t0 = Utc::now();
        let first = signer.token_at(t0).unwrap();
        let later = signer.token_at(t0 + Duration::minutes(2)).unwrap();
        assert_eq!(first.token.reveal(), later.token.reveal());
        assert_eq!(first.expires_at, later.expires_at);
    }

    #[test]
    fn token_is_refreshed_before_it_expires() {
        let signer = signer();
        let t0 = Utc::now();
        let first = signer.token_at(t0).unwrap();
        let refreshed = signer.token_at(t0 + Duration::seconds(241)).unwrap();
        assert!(refreshed.expires_at > first.expires_at);
        assert!(refreshed.expires_at - (t0 + Duration::seconds(241)) > REFRESH_MARGIN);
    }

    #[test]
    fn minted_claims() {
        let signer = signer();
        let token = signer.token_at(Utc::now()).unwrap();
        let validation = Validation::new(Algorithm::HS256);
        let data = jsonwebtoken::decode::<ServiceTokenClaims>(
            token.token.reveal(),
            &DecodingKey::from_secret(b"finops-secret"),
            &validation,
        )
        .unwrap();
        assert_eq!(data.claims.sub, "FTKN-1234");
        assert_eq!(data.claims.exp - data.claims.iat, 300);
        assert_eq!(data.claims.nbf, data.claims.iat);
    }
}
