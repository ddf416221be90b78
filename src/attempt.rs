//! A single re-executable login attempt.
//!
//! An attempt is built once per explicit login and kept by the coordinator.
//! Time-ins and re-logins run the same attempt again, so state it picks up
//! while running (the stealth override) carries over to later runs.

use crate::classify::classify;
use crate::error::describe_status;
use crate::metadata::LoginRequest;
use crate::notify::DisplayLevel;
use crate::prefs::{keys, Preferences};
use crate::retry::{action_for, RetryAction};
use crate::{Credentials, Result, SessionCoordinator};
use http::StatusCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::SystemTime;

const SENDING: &str = "Sending login request...";
const REATTEMPT: &str = "Login reattempt in ";

/// Which bootstrap runs after a successful execution.
///
/// Chosen by the coordinator each time it runs an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    /// A fresh login.
    Login,
    /// Silent re-establishment of an expired session.
    Timein,
}

impl std::fmt::Display for SessionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionMode::Login => f.write_str("login"),
            SessionMode::Timein => f.write_str("timein"),
        }
    }
}

/// How an execution ended when it did not end in a login rejection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// The server redirected to this target and post-processing ran.
    Redirected(String),

    /// The server answered with a status that is neither 200 nor a redirect.
    Abandoned(StatusCode),
}

/// Credentials plus the state that persists across executions.
#[derive(Debug)]
pub struct SessionAttempt {
    credentials: Credentials,
    stealthy: AtomicBool,
    issued_at: Mutex<Option<SystemTime>>,
}

impl SessionAttempt {
    pub fn new(credentials: Credentials) -> Self {
        let stealthy = credentials.stealthy();
        Self {
            credentials,
            stealthy: AtomicBool::new(stealthy),
            issued_at: Mutex::new(None),
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn identity(&self) -> &str {
        self.credentials.identity()
    }

    /// Whether this attempt itself asks for stealth. The stealth preference
    /// can still make a submission stealthy when this is `false`.
    pub fn stealthy(&self) -> bool {
        self.stealthy.load(Ordering::SeqCst)
    }

    /// Wall-clock time of the most recent submission, if any.
    pub fn issued_at(&self) -> Option<SystemTime> {
        *self.issued_at.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Builds the form for the next submission.
    pub fn build_request(&self, path: &str, prefs: &dyn Preferences) -> LoginRequest {
        let stealthy = self.stealthy() || prefs.get_bool(keys::STEALTH_LOGIN);
        LoginRequest::login(path, self.identity(), self.credentials.secret(), stealthy)
            .with_alternate_server(prefs.get_bool(keys::USE_ALTERNATE_SERVER))
    }

    /// Submits the attempt until the server gives an answer that does not
    /// ask for another try.
    ///
    /// There is no cap on resubmissions. Lockouts are paced by the
    /// countdowns the server asks for, and the alternate-server fallback
    /// resubmits to the default server.
    pub(crate) async fn run(
        &self,
        session: &SessionCoordinator,
        mode: SessionMode,
    ) -> Result<AttemptOutcome> {
        let prefs = session.preferences();
        let notifier = session.notifier();
        let mut submission = 0usize;

        loop {
            submission += 1;
            session.begin_execution(self);

            let request = self.build_request(&session.config().login_path, prefs);
            if prefs.get_bool(keys::PING_STEALTHY_TIMEIN) {
                self.stealthy.store(true, Ordering::SeqCst);
            }

            *self.issued_at.lock().unwrap_or_else(PoisonError::into_inner) =
                Some(SystemTime::now());
            notifier.update_display(DisplayLevel::Continue, SENDING);
            tracing::debug!(
                identity = self.identity(),
                %mode,
                submission,
                alternate_server = request.use_alternate_server,
                "Submitting login request"
            );

            let exchange = session.transport().submit(&request).await?;

            // an error page means the attempt is no longer outstanding
            if exchange.status == StatusCode::OK {
                session.clear_attempt_timestamp();
            }

            let outcome = classify(
                exchange.status,
                &exchange.body,
                exchange.redirect_location.as_deref(),
            );
            let action = action_for(outcome);
            tracing::debug!(
                submission,
                status = exchange.status.as_u16(),
                transport_retried = exchange.was_retried(),
                resubmit = action.is_retry(),
                "Login response classified"
            );

            match action {
                RetryAction::Proceed(target) => {
                    tracing::info!(identity = self.identity(), %mode, redirect = %target, "Login redirected");
                    session.complete_login(&request, &exchange, mode).await;
                    return Ok(AttemptOutcome::Redirected(target));
                }
                RetryAction::WaitThenRetry { wait } => {
                    tracing::warn!(
                        identity = self.identity(),
                        wait_secs = wait.as_secs(),
                        submission,
                        "Login deferred by server, waiting before resubmitting"
                    );
                    notifier.countdown(REATTEMPT, wait).await;
                }
                RetryAction::DisableAlternateServer => {
                    tracing::warn!(
                        identity = self.identity(),
                        "Alternate server refused, falling back to the default server"
                    );
                    prefs.set_bool(keys::USE_ALTERNATE_SERVER, false);
                }
                RetryAction::Fail(failure) => {
                    tracing::warn!(identity = self.identity(), reason = %failure, "Login rejected");
                    notifier.update_display(DisplayLevel::Abort, &failure.to_string());
                    return Err(failure.into());
                }
                RetryAction::Abandon(status) => {
                    tracing::warn!(
                        identity = self.identity(),
                        status = %describe_status(status),
                        "Login exchange ended without a page or redirect"
                    );
                    return Ok(AttemptOutcome::Abandoned(status));
                }
            }
        }
    }
}
