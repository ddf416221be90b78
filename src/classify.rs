//! Classification of completed login exchanges.
//!
//! The server answers a failed login with an HTML page whose only signal is
//! its prose, so classification is a sequence of substring checks. The first
//! matching rule wins.

use http::StatusCode;
use std::time::Duration;

/// How long the server asks us to wait after a fifteen-minute lockout.
pub const RATE_LIMIT_WAIT: Duration = Duration::from_secs(15 * 60);

/// How long to wait after a "wait a minute" or stale-session message.
pub const SESSION_CONFLICT_WAIT: Duration = Duration::from_secs(75);

const BAD_PASSWORD: &str = "Bad password";
const FIFTEEN_MINUTES: &str = "wait fifteen minutes";
const WAIT_A_MINUTE: &str = "wait a minute";
const WAIT_A_COUPLE: &str = "wait a couple of minutes";
const TOO_MANY: &str = "Too many";
const NO_PRIVILEGES: &str = "do not have the privileges";

/// The interpretation of one login exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// The server redirected into the game. Carries the redirect target.
    Success(String),

    /// The password was rejected.
    BadCredentials,

    /// Locked out for fifteen minutes.
    RateLimited(Duration),

    /// Logged in too recently, or an old session was not closed cleanly.
    SessionConflict(Duration),

    /// Too many failed logins. Carries the server's explanation.
    TooManyAttempts(String),

    /// The account may not use the alternate server.
    PrivilegeDenied,

    /// Nothing recognizable and no redirect.
    UnknownFailure,

    /// Neither a 200 page nor a redirect. The transport has already retried
    /// what it could, so there is nothing to classify.
    TransportFailure(StatusCode),
}

/// Classifies a completed login exchange.
///
/// ```
/// use http::StatusCode;
/// use timein::classify::{classify, LoginOutcome};
///
/// let outcome = classify(StatusCode::FOUND, "", Some("main.php"));
/// assert_eq!(outcome, LoginOutcome::Success("main.php".to_string()));
///
/// let outcome = classify(StatusCode::OK, "<b>Bad password</b>", None);
/// assert_eq!(outcome, LoginOutcome::BadCredentials);
/// ```
pub fn classify(status: StatusCode, body: &str, redirect: Option<&str>) -> LoginOutcome {
    if status != StatusCode::OK {
        return match redirect {
            Some(target) if status.is_redirection() => LoginOutcome::Success(target.to_string()),
            _ => LoginOutcome::TransportFailure(status),
        };
    }

    if body.contains(BAD_PASSWORD) {
        return LoginOutcome::BadCredentials;
    }

    if body.contains(FIFTEEN_MINUTES) {
        return LoginOutcome::RateLimited(RATE_LIMIT_WAIT);
    }

    if body.contains(WAIT_A_MINUTE) || body.contains(WAIT_A_COUPLE) {
        return LoginOutcome::SessionConflict(SESSION_CONFLICT_WAIT);
    }

    if let Some(message) = too_many_message(body) {
        return LoginOutcome::TooManyAttempts(message);
    }

    if body.contains(NO_PRIVILEGES) {
        return LoginOutcome::PrivilegeDenied;
    }

    match redirect {
        Some(target) => LoginOutcome::Success(target.to_string()),
        None => LoginOutcome::UnknownFailure,
    }
}

/// Text from the "Too many" marker up to the next tag.
fn too_many_message(body: &str) -> Option<String> {
    let start = body.find(TOO_MANY)?;
    let rest = &body[start..];
    let end = rest[1..].find('<').map(|i| i + 1).unwrap_or(rest.len());
    Some(rest[..end].to_string())
}
