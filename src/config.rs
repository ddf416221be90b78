//! Session coordinator configuration.

use std::time::Duration;

/// Settings for a [`SessionCoordinator`](crate::SessionCoordinator).
///
/// # Examples
///
/// ```
/// use timein::SessionConfig;
/// use std::time::Duration;
///
/// let config = SessionConfig::builder()
///     .timein_window(Duration::from_secs(10))
///     .build();
/// assert_eq!(config.login_path, "login.php");
/// assert_eq!(config.timein_window, Duration::from_secs(10));
/// ```
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Path of the login endpoint.
    pub login_path: String,

    /// Redirects to the login page this soon after a login attempt are
    /// treated as echoes of that attempt rather than an expired session.
    ///
    /// Defaults to 30 seconds.
    pub timein_window: Duration,

    /// Buffer size of the session event channel.
    pub event_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            login_path: "login.php".to_string(),
            timein_window: Duration::from_secs(30),
            event_capacity: 16,
        }
    }
}

impl SessionConfig {
    pub fn builder() -> SessionConfigBuilder {
        SessionConfigBuilder::default()
    }
}

/// Builder for [`SessionConfig`].
#[derive(Default)]
pub struct SessionConfigBuilder {
    login_path: Option<String>,
    timein_window: Option<Duration>,
    event_capacity: Option<usize>,
}

impl SessionConfigBuilder {
    pub fn login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = Some(path.into());
        self
    }

    pub fn timein_window(mut self, window: Duration) -> Self {
        self.timein_window = Some(window);
        self
    }

    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = Some(capacity);
        self
    }

    pub fn build(self) -> SessionConfig {
        let default = SessionConfig::default();
        SessionConfig {
            login_path: self.login_path.unwrap_or(default.login_path),
            timein_window: self.timein_window.unwrap_or(default.timein_window),
            // broadcast channels panic on zero capacity
            event_capacity: self.event_capacity.unwrap_or(default.event_capacity).max(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::builder().build();
        assert_eq!(config.login_path, "login.php");
        assert_eq!(config.timein_window, Duration::from_secs(30));
        assert_eq!(config.event_capacity, 16);
    }

    #[test]
    fn test_zero_capacity_is_raised() {
        let config = SessionConfig::builder().event_capacity(0).build();
        assert_eq!(config.event_capacity, 1);
    }

    #[test]
    fn test_overrides() {
        let config = SessionConfig::builder()
            .login_path("/account/login")
            .timein_window(Duration::ZERO)
            .build();
        assert_eq!(config.login_path, "/account/login");
        assert!(config.timein_window.is_zero());
    }
}
