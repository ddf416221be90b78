//! The seam between session management and HTTP.

use crate::{metadata::LoginRequest, Exchange, Result};
use async_trait::async_trait;

/// Submits login forms and reports the completed exchange.
///
/// Implementations must not follow redirects: the redirect target is how a
/// successful login is recognized. They are expected to resubmit on timeout
/// themselves; anything returned as `Err` ends the attempt.
///
/// [`HttpTransport`](crate::HttpTransport) is the reqwest-backed implementation.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Submits `request` and waits for the exchange to complete.
    async fn submit(&self, request: &LoginRequest) -> Result<Exchange>;

    /// Drops per-session transport state before a fresh login attempt.
    fn reset(&self) {}
}
