//! What to do after each login exchange, and how the transport backs off.
//!
//! Two layers retry independently:
//!
//! - [`action_for`] is the login retry policy. It maps a classified
//!   [`LoginOutcome`] to a [`RetryAction`]. It has no retry limit: the
//!   loop in [`SessionAttempt`](crate::SessionAttempt) ends only on success or
//!   on an outcome that does not ask for a retry. The server's lockout
//!   messages come with real waits (fifteen minutes, seventy-five seconds),
//!   which keeps the loop slow enough in practice, so no counter is imposed.
//! - [`RetryStrategy`] paces the transport's own resubmission of exchanges
//!   that timed out or never connected.

use crate::classify::LoginOutcome;
use crate::error::LoginFailure;
use http::StatusCode;
use rand::Rng;
use std::time::Duration;

/// The login policy's decision for one classified exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryAction {
    /// Run success post-processing for this redirect target.
    Proceed(String),

    /// Show a countdown for `wait`, then resubmit the whole attempt.
    WaitThenRetry {
        /// How long to wait before resubmitting
        wait: Duration,
    },

    /// Turn off the alternate server preference and resubmit at once.
    DisableAlternateServer,

    /// Stop and tell the user why.
    Fail(LoginFailure),

    /// Stop quietly. The transport already handled what it could.
    Abandon(StatusCode),
}

impl RetryAction {
    /// Returns `true` if the attempt should be submitted again.
    pub fn is_retry(&self) -> bool {
        matches!(
            self,
            RetryAction::WaitThenRetry { .. } | RetryAction::DisableAlternateServer
        )
    }
}

/// Maps a classified outcome to the action the attempt takes next.
///
/// ```
/// use std::time::Duration;
/// use timein::classify::LoginOutcome;
/// use timein::retry::{action_for, RetryAction};
///
/// let action = action_for(LoginOutcome::RateLimited(Duration::from_secs(900)));
/// assert_eq!(action, RetryAction::WaitThenRetry { wait: Duration::from_secs(900) });
/// ```
pub fn action_for(outcome: LoginOutcome) -> RetryAction {
    match outcome {
        LoginOutcome::Success(target) => RetryAction::Proceed(target),
        LoginOutcome::BadCredentials => RetryAction::Fail(LoginFailure::BadPassword),
        LoginOutcome::RateLimited(wait) | LoginOutcome::SessionConflict(wait) => {
            RetryAction::WaitThenRetry { wait }
        }
        LoginOutcome::TooManyAttempts(message) => {
            RetryAction::Fail(LoginFailure::TooManyAttempts(message))
        }
        LoginOutcome::PrivilegeDenied => RetryAction::DisableAlternateServer,
        LoginOutcome::UnknownFailure => RetryAction::Fail(LoginFailure::Unknown),
        LoginOutcome::TransportFailure(status) => RetryAction::Abandon(status),
    }
}

/// How the transport spaces out resubmissions of timed-out exchanges.
///
/// # Examples
///
/// ```
/// use timein::RetryStrategy;
/// use std::time::Duration;
///
/// let linear = RetryStrategy::Linear {
///     delay: Duration::from_secs(1),
///     max_retries: 3,
/// };
/// assert_eq!(linear.delay_for_attempt(3), Some(Duration::from_secs(1)));
/// assert_eq!(linear.delay_for_attempt(4), None);
/// ```
#[derive(Debug, Clone, Default)]
pub enum RetryStrategy {
    /// Never resubmit.
    #[default]
    None,

    /// Wait `initial_delay * 2^(attempt - 1)`, capped at `max_delay`.
    ExponentialBackoff {
        /// The delay before the first retry.
        initial_delay: Duration,
        /// The maximum delay between retries.
        max_delay: Duration,
        /// The maximum number of retry attempts.
        max_retries: usize,
        /// Scale each delay by a random factor in 50%..=100%.
        jitter: bool,
    },

    /// Wait the same delay before every retry.
    Linear {
        /// The delay between retry attempts.
        delay: Duration,
        /// The maximum number of retry attempts.
        max_retries: usize,
    },
}

impl RetryStrategy {
    /// Returns the delay before retry `attempt` (1-indexed), or `None` once
    /// retries are exhausted.
    pub fn delay_for_attempt(&self, attempt: usize) -> Option<Duration> {
        match self {
            RetryStrategy::None => None,
            RetryStrategy::ExponentialBackoff {
                initial_delay,
                max_delay,
                max_retries,
                jitter,
            } => {
                if attempt > *max_retries {
                    return None;
                }

                let multiplier = 2u32.saturating_pow(attempt.saturating_sub(1) as u32);
                let delay = initial_delay.saturating_mul(multiplier).min(*max_delay);

                if *jitter {
                    let factor = rand::thread_rng().gen_range(0.5..=1.0);
                    Some(delay.mul_f64(factor))
                } else {
                    Some(delay)
                }
            }
            RetryStrategy::Linear { delay, max_retries } => {
                (attempt <= *max_retries).then_some(*delay)
            }
        }
    }

    pub fn max_retries(&self) -> usize {
        match self {
            RetryStrategy::None => 0,
            RetryStrategy::ExponentialBackoff { max_retries, .. } => *max_retries,
            RetryStrategy::Linear { max_retries, .. } => *max_retries,
        }
    }
}
