//! Login credentials and the stealth marker.

/// Suffix on a login name that asks the server not to announce the login
/// to the account's contacts.
pub const STEALTH_MARKER: &str = "/q";

/// An identity, its secret, and whether the login should be stealthy.
///
/// The identity never contains the stealth marker: it is stripped when the
/// credentials are built and folded into [`stealthy`](Self::stealthy).
///
/// ```
/// use timein::Credentials;
///
/// let creds = Credentials::new("wizard/q", "hunter2");
/// assert_eq!(creds.identity(), "wizard");
/// assert!(creds.stealthy());
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    identity: String,
    secret: String,
    stealthy: bool,
}

impl Credentials {
    /// Builds credentials from a login name that may carry the stealth marker.
    pub fn new(identity: impl Into<String>, secret: impl Into<String>) -> Self {
        let identity = identity.into();
        let stealthy = identity.contains(STEALTH_MARKER);
        let identity = if stealthy {
            identity.replace(STEALTH_MARKER, "")
        } else {
            identity
        };

        Self {
            identity,
            secret: secret.into(),
            stealthy,
        }
    }

    /// The identity with any stealth marker removed.
    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    /// Whether the supplied identity asked for a stealthy login.
    pub fn stealthy(&self) -> bool {
        self.stealthy
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("identity", &self.identity)
            .field("secret", &"<redacted>")
            .field("stealthy", &self.stealthy)
            .finish()
    }
}

/// Returns the login name to submit for `identity`.
pub(crate) fn login_name(identity: &str, stealthy: bool) -> String {
    if stealthy {
        format!("{identity}{STEALTH_MARKER}")
    } else {
        identity.to_string()
    }
}

/// Recovers the identity from a submitted login name.
///
/// Returns `None` for names that look like path traversal.
pub(crate) fn identity_from_login_name(name: &str) -> Option<String> {
    if name.contains("..") {
        return None;
    }

    let name = match name.strip_suffix(STEALTH_MARKER) {
        Some(stripped) => stripped.trim(),
        None => name,
    };
    Some(name.to_string())
}
