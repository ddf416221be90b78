//! Error types for login exchanges and session management.
//!
//! Transport problems, fatal login rejections and the concurrent
//! re-establishment invariant violation all surface through [`Error`].

use http::StatusCode;

/// Why the server refused a login outright.
///
/// These are fatal to the attempt: the session stays not established and
/// the attempt is not resubmitted. The `Display` text is the message shown
/// to the user.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LoginFailure {
    /// The server rejected the password.
    #[error("Bad password.")]
    BadPassword,

    /// Too many failed logins in a short span. Carries the server's own
    /// explanation, cut at the next markup delimiter.
    #[error("{0}")]
    TooManyAttempts(String),

    /// The response matched no known pattern and carried no redirect.
    #[error("Encountered error in login.")]
    Unknown,
}

/// The main error type for login exchanges.
///
/// # Examples
///
/// ```
/// use timein::{Error, LoginFailure};
///
/// let err = Error::LoginRejected(LoginFailure::BadPassword);
/// assert_eq!(err.to_string(), "Login rejected: Bad password.");
/// assert!(!err.is_retryable());
/// ```
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A network-level error occurred (connection refused, DNS failure, etc.).
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The login exchange timed out.
    #[error("Request timed out")]
    Timeout,

    /// The transport gave up after retrying a timed-out or unreachable exchange.
    #[error("Max retries exceeded after {attempts} attempts: {last_error}")]
    MaxRetriesExceeded {
        /// The number of attempts made
        attempts: usize,
        /// The last error encountered
        last_error: Box<Error>,
    },

    /// The server refused the login. See [`LoginFailure`].
    #[error("Login rejected: {0}")]
    LoginRejected(#[from] LoginFailure),

    /// A redirect-triggered time-in found another login path already running.
    ///
    /// This means the request-serialization guarantee of the caller graph was
    /// broken. It is never expected in correct operation and callers should
    /// treat it as fatal to the process.
    #[error("Concurrent session re-establishment detected: {request_location} => {redirect_location}")]
    ConcurrentReestablishment {
        /// The request that observed the login redirect
        request_location: String,
        /// Where the server redirected it
        redirect_location: String,
    },

    /// Invalid configuration was provided.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// An invalid URL was provided.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl Error {
    /// Returns `true` if the transport should resubmit the exchange.
    ///
    /// Timeouts and connection failures are retryable. Everything the server
    /// actually answered is handled by the login retry policy instead.
    ///
    /// ```
    /// use timein::Error;
    ///
    /// assert!(Error::Timeout.is_retryable());
    /// assert!(!Error::ConfigurationError("bad".into()).is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Network(e) => e.is_connect() || e.is_timeout(),
            Error::Timeout => true,
            Error::MaxRetriesExceeded { .. } => false,
            Error::LoginRejected(_) => false,
            Error::ConcurrentReestablishment { .. } => false,
            Error::ConfigurationError(_) => false,
            Error::InvalidUrl(_) => false,
        }
    }

    /// Returns the login rejection if this error is one.
    pub fn login_failure(&self) -> Option<&LoginFailure> {
        match self {
            Error::LoginRejected(failure) => Some(failure),
            _ => None,
        }
    }

    /// Returns `true` for the concurrent re-establishment invariant violation.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, Error::ConcurrentReestablishment { .. })
    }

    pub(crate) fn from_transport(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Error::Timeout
        } else {
            Error::Network(error)
        }
    }
}

/// A status code that ended an attempt without a classification.
pub(crate) fn describe_status(status: StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => format!("{} {}", status.as_u16(), reason),
        None => status.as_u16().to_string(),
    }
}

/// A specialized `Result` type for login operations.
pub type Result<T> = std::result::Result<T, Error>;
