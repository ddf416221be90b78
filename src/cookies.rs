//! Cookies carried over from successful login exchanges.

use crate::{Exchange, Result};
use http::header::SET_COOKIE;
use reqwest::cookie::CookieStore as _;
use std::sync::Arc;
use url::Url;

/// Receives the cookies of a successful login exchange.
pub trait CookieStore: Send + Sync {
    /// Records every `Set-Cookie` of `exchange`.
    fn apply(&self, exchange: &Exchange);
}

/// A cookie jar scoped to one game server, backed by [`reqwest::cookie::Jar`].
///
/// The same jar can be handed to
/// [`HttpTransportBuilder::cookie_jar`](crate::HttpTransportBuilder::cookie_jar)
/// so that later requests carry the session cookie.
///
/// ```
/// use http::HeaderValue;
/// use timein::{CookieJar, CookieStore, Exchange};
///
/// let mut exchange = Exchange::redirect("main.php");
/// exchange.headers.append("set-cookie", HeaderValue::from_static("PHPSESSID=abc; path=/"));
///
/// let jar = CookieJar::new("https://www.example-game.net/").unwrap();
/// jar.apply(&exchange);
/// assert_eq!(jar.get("PHPSESSID").as_deref(), Some("abc"));
/// ```
#[derive(Debug, Clone)]
pub struct CookieJar {
    jar: Arc<reqwest::cookie::Jar>,
    scope: Url,
}

impl CookieJar {
    /// Creates an empty jar for cookies set by `scope`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn new(scope: impl AsRef<str>) -> Result<Self> {
        Ok(Self {
            jar: Arc::new(reqwest::cookie::Jar::default()),
            scope: Url::parse(scope.as_ref())?,
        })
    }

    /// The value of cookie `name` as it would be sent back to the server.
    pub fn get(&self, name: &str) -> Option<String> {
        let header = self.header_value()?;
        header
            .split(';')
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.to_string())
    }

    /// The `Cookie` header the jar would send to its server.
    pub fn header_value(&self) -> Option<String> {
        self.jar
            .cookies(&self.scope)
            .and_then(|value| value.to_str().ok().map(str::to_string))
    }

    pub(crate) fn provider(&self) -> Arc<reqwest::cookie::Jar> {
        Arc::clone(&self.jar)
    }
}

impl CookieStore for CookieJar {
    fn apply(&self, exchange: &Exchange) {
        let mut headers = exchange.headers.get_all(SET_COOKIE).iter();
        tracing::trace!(scope = %self.scope, "Storing login cookies");
        self.jar.set_cookies(&mut headers, &self.scope);
    }
}
