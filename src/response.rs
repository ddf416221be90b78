//! A completed login exchange.
//!
//! The [`Exchange`] keeps everything the classifier and the cookie store
//! need: status, raw body, headers, and the redirect target if any.

use http::{HeaderMap, StatusCode};
use std::time::Duration;

/// The result of submitting a [`LoginRequest`](crate::metadata::LoginRequest).
///
/// ```
/// use http::{HeaderMap, StatusCode};
/// use std::time::Duration;
/// use timein::Exchange;
///
/// let exchange = Exchange::new(
///     StatusCode::FOUND,
///     String::new(),
///     HeaderMap::new(),
///     Some("main.php".to_string()),
///     Duration::from_millis(40),
///     1,
/// );
/// assert!(exchange.is_redirect());
/// assert!(!exchange.was_retried());
/// ```
#[derive(Debug, Clone)]
pub struct Exchange {
    /// The HTTP status code.
    pub status: StatusCode,

    /// The raw response body.
    pub body: String,

    /// The response headers, including any `Set-Cookie`.
    pub headers: HeaderMap,

    /// The `Location` the server redirected to, if it did.
    pub redirect_location: Option<String>,

    /// Time from the first submission until this response arrived.
    pub latency: Duration,

    /// How many times the transport submitted the request, counting timeouts.
    pub attempts: usize,
}

impl Exchange {
    pub fn new(
        status: StatusCode,
        body: String,
        headers: HeaderMap,
        redirect_location: Option<String>,
        latency: Duration,
        attempts: usize,
    ) -> Self {
        Self {
            status,
            body,
            headers,
            redirect_location,
            latency,
            attempts,
        }
    }

    /// Shorthand for a 200 page with `body` and no redirect.
    pub fn page(body: impl Into<String>) -> Self {
        Self::new(
            StatusCode::OK,
            body.into(),
            HeaderMap::new(),
            None,
            Duration::ZERO,
            1,
        )
    }

    /// Shorthand for a 302 to `location`.
    pub fn redirect(location: impl Into<String>) -> Self {
        Self::new(
            StatusCode::FOUND,
            String::new(),
            HeaderMap::new(),
            Some(location.into()),
            Duration::ZERO,
            1,
        )
    }

    /// Returns `true` if the server sent a redirect target.
    pub fn is_redirect(&self) -> bool {
        self.redirect_location.is_some()
    }

    /// Returns `true` if the transport had to resubmit.
    pub fn was_retried(&self) -> bool {
        self.attempts > 1
    }
}
