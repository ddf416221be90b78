//! Collaborators that run around a login: the connectivity probe and the
//! client-side bootstrap.

use crate::SessionCoordinator;
use async_trait::async_trait;

/// Checks the connection after a login redirect.
///
/// The probe receives the coordinator so it may log out (and report
/// `false`) or even log in again through the same attempt. The coordinator
/// tracks how deep such re-entry goes and only lets the outermost login
/// finish bootstrapping.
#[async_trait]
pub trait ConnectivityProbe: Send + Sync {
    /// Returns `true` if the connection is acceptable.
    ///
    /// On `false` the probe is expected to have logged the session out.
    async fn ping(&self, session: &SessionCoordinator) -> bool;
}

/// A probe that accepts every connection.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

#[async_trait]
impl ConnectivityProbe for AcceptAll {
    async fn ping(&self, _session: &SessionCoordinator) -> bool {
        true
    }
}

/// Client-side work tied to the login lifecycle.
#[async_trait]
pub trait SessionHooks: Send + Sync {
    /// Clears request-level and UI state before an attempt executes.
    fn reset(&self) {}

    /// Records the credentials for a later restart. Only called when the
    /// save-state preference is set.
    fn save_state(&self, _identity: &str, _secret: &str) {}

    /// Loads character state after a fresh login.
    async fn on_login_complete(&self, identity: &str);

    /// Refreshes state after a silent time-in.
    async fn on_timein_complete(&self, identity: &str);
}

/// Hooks that only log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogOnly;

#[async_trait]
impl SessionHooks for LogOnly {
    async fn on_login_complete(&self, identity: &str) {
        tracing::info!(identity, "Login complete");
    }

    async fn on_timein_complete(&self, identity: &str) {
        tracing::info!(identity, "Time-in complete");
    }
}
