use std::{future::Future, time::Duration};

use log::*;
use osb_common::RemoteError;

/// Bounded exponential backoff for remote calls.
///
/// Only [`Transient`](osb_common::ErrorClass::Transient) errors are retried. The delay before retry `n` is
/// `min(cap, base * 2^(n-1))`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub base: Duration,
    pub cap: Duration,
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { base: Duration::from_secs(1), cap: Duration::from_secs(60), max_attempts: 5 }
    }
}

impl RetryPolicy {
    pub fn new(base: Duration, cap: Duration, max_attempts: u32) -> Self {
        Self { base, cap, max_attempts: max_attempts.max(1) }
    }

    /// The delay after the `attempt`th failed attempt (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        let factor = 2u32.saturating_pow(exponent);
        self.base.saturating_mul(factor).min(self.cap)
    }

    pub async fn run<T, F, Fut>(&self, label: &str, mut call: F) -> Result<T, RemoteError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, RemoteError>>,
    {
        let mut attempt = 1;
        loop {
            match call().await {
                Ok(v) => return Ok(v),
                Err(e) if e.is_transient() && attempt < self.max_attempts => {
                    let delay = self.delay_for(attempt);
                    debug!("🔄️ {label} failed on attempt {attempt}/{}. Retrying in {delay:?}. {e}", self.max_attempts);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                },
                Err(e) => {
                    if e.is_transient() {
                        warn!("🔄️ {label} failed after {attempt} attempts. {e}");
                    }
                    return Err(e);
                },
            }
        }
    }
}
