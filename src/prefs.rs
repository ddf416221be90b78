//! Persistent preferences consulted during login.
//!
//! Storage is owned by the embedding client; the session layer only reads
//! and writes a handful of keys through [`Preferences`].

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Preference keys read or written by the session layer.
pub mod keys {
    /// Always log in stealthily.
    pub const STEALTH_LOGIN: &str = "stealthLogin";
    /// Make every re-execution after the first stealthy.
    pub const PING_STEALTHY_TIMEIN: &str = "pingStealthyTimein";
    /// Route logins through the alternate (developer proxy) server.
    pub const USE_ALTERNATE_SERVER: &str = "useDevProxyServer";
    /// Record a save-state snapshot of the credentials on each login.
    pub const SAVE_STATE_ACTIVE: &str = "saveStateActive";
    /// Cached display name, scoped by identity.
    pub const DISPLAY_NAME: &str = "displayName";
}

/// Boolean flags and identity-scoped strings that survive restarts.
pub trait Preferences: Send + Sync {
    /// Returns the flag, or `false` if it was never set.
    fn get_bool(&self, key: &str) -> bool;

    fn set_bool(&self, key: &str, value: bool);

    /// Returns the string stored for `key` under `scope`.
    fn get_string(&self, scope: &str, key: &str) -> Option<String>;

    fn set_string(&self, scope: &str, key: &str, value: &str);
}

/// A [`Preferences`] implementation held in memory.
///
/// ```
/// use timein::prefs::{keys, MemoryPreferences, Preferences};
///
/// let prefs = MemoryPreferences::new().with_flag(keys::STEALTH_LOGIN, true);
/// assert!(prefs.get_bool(keys::STEALTH_LOGIN));
/// assert!(!prefs.get_bool(keys::USE_ALTERNATE_SERVER));
/// ```
#[derive(Debug, Default)]
pub struct MemoryPreferences {
    flags: RwLock<HashMap<String, bool>>,
    strings: RwLock<HashMap<(String, String), String>>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a flag while building.
    pub fn with_flag(self, key: &str, value: bool) -> Self {
        self.set_bool(key, value);
        self
    }
}

impl Preferences for MemoryPreferences {
    fn get_bool(&self, key: &str) -> bool {
        self.flags
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .copied()
            .unwrap_or(false)
    }

    fn set_bool(&self, key: &str, value: bool) {
        self.flags
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value);
    }

    fn get_string(&self, scope: &str, key: &str) -> Option<String> {
        self.strings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(scope.to_string(), key.to_string()))
            .cloned()
    }

    fn set_string(&self, scope: &str, key: &str, value: &str) {
        self.strings
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((scope.to_string(), key.to_string()), value.to_string());
    }
}
