//! reqwest-backed [`Transport`].
//!
//! [`HttpTransport`] posts the login form, never follows redirects (the
//! `Location` header is how a successful login shows itself), and resubmits
//! exchanges that time out or fail to connect according to its
//! [`RetryStrategy`].

use crate::{metadata::LoginRequest, retry::RetryStrategy, transport::Transport, CookieJar, Error, Exchange, Result};
use async_trait::async_trait;
use http::{header, HeaderMap, HeaderName, HeaderValue};
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;

/// An HTTP transport for login exchanges.
///
/// Cheap to clone; clones share the connection pool.
///
/// # Examples
///
/// ```no_run
/// use timein::{HttpTransport, RetryStrategy};
/// use std::time::Duration;
///
/// # fn example() -> Result<(), timein::Error> {
/// let transport = HttpTransport::builder()
///     .base_url("https://www.example-game.net")?
///     .alternate_base_url("https://dev.example-game.net")?
///     .timeout(Duration::from_secs(30))
///     .retry_strategy(RetryStrategy::Linear {
///         delay: Duration::from_secs(2),
///         max_retries: 5,
///     })
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct HttpTransport {
    inner: Arc<TransportInner>,
}

struct TransportInner {
    http_client: reqwest::Client,
    base_url: Url,
    alternate_base_url: Option<Url>,
    default_headers: HeaderMap,
    retry_strategy: RetryStrategy,
    timeout: Option<Duration>,
}

impl HttpTransport {
    pub fn builder() -> HttpTransportBuilder {
        HttpTransportBuilder::new()
    }

    /// The URL `request` will be posted to.
    pub fn url_for(&self, request: &LoginRequest) -> Result<Url> {
        let base = match (&self.inner.alternate_base_url, request.use_alternate_server) {
            (Some(alternate), true) => alternate,
            _ => &self.inner.base_url,
        };
        Ok(base.join(&request.path)?)
    }

    async fn execute_request(&self, url: &Url, request: &LoginRequest, attempt: usize) -> Result<reqwest::Response> {
        tracing::debug!(url = %url, attempt, "Posting login form");

        let mut builder = self
            .inner
            .http_client
            .post(url.clone())
            .headers(self.inner.default_headers.clone())
            .form(&request.fields);

        if let Some(timeout) = self.inner.timeout {
            builder = builder.timeout(timeout);
        }

        builder.send().await.map_err(Error::from_transport)
    }

    async fn read_exchange(response: reqwest::Response, latency: Duration, attempts: usize) -> Result<Exchange> {
        let status = response.status();
        let headers = response.headers().clone();
        let redirect_location = headers
            .get(header::LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        tracing::info!(
            status = status.as_u16(),
            latency_ms = latency.as_millis(),
            attempts,
            redirected = redirect_location.is_some(),
            "Received login response"
        );

        let body = response.text().await.map_err(Error::from_transport)?;
        Ok(Exchange::new(status, body, headers, redirect_location, latency, attempts))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn submit(&self, request: &LoginRequest) -> Result<Exchange> {
        let url = self.url_for(request)?;
        let start_time = Instant::now();
        let mut attempt = 0;

        loop {
            attempt += 1;

            let error = match self.execute_request(&url, request, attempt).await {
                Ok(response) => {
                    return Self::read_exchange(response, start_time.elapsed(), attempt).await;
                }
                Err(e) => e,
            };

            tracing::warn!(error = %error, attempt, url = %url, "Login exchange failed");

            if !error.is_retryable() {
                return Err(error);
            }

            match self.inner.retry_strategy.delay_for_attempt(attempt) {
                Some(delay) => {
                    tracing::info!(delay_ms = delay.as_millis(), attempt, "Resubmitting login after delay");
                    tokio::time::sleep(delay).await;
                }
                None if attempt == 1 => return Err(error),
                None => {
                    return Err(Error::MaxRetriesExceeded {
                        attempts: attempt,
                        last_error: Box::new(error),
                    });
                }
            }
        }
    }
}

/// Builder for an [`HttpTransport`].
///
/// By default timed-out exchanges are resubmitted up to three times, one
/// second apart.
pub struct HttpTransportBuilder {
    base_url: Option<Url>,
    alternate_base_url: Option<Url>,
    default_headers: HeaderMap,
    retry_strategy: RetryStrategy,
    timeout: Option<Duration>,
    cookie_jar: Option<CookieJar>,
}

impl HttpTransportBuilder {
    pub fn new() -> Self {
        Self {
            base_url: None,
            alternate_base_url: None,
            default_headers: HeaderMap::new(),
            retry_strategy: RetryStrategy::Linear {
                delay: Duration::from_secs(1),
                max_retries: 3,
            },
            timeout: None,
            cookie_jar: None,
        }
    }

    /// Sets the default server.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn base_url(mut self, url: impl AsRef<str>) -> Result<Self> {
        self.base_url = Some(Url::parse(url.as_ref())?);
        Ok(self)
    }

    /// Sets the server used when the alternate-server preference is on.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn alternate_base_url(mut self, url: impl AsRef<str>) -> Result<Self> {
        self.alternate_base_url = Some(Url::parse(url.as_ref())?);
        Ok(self)
    }

    /// Adds a header sent with every login exchange.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn default_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self> {
        let name = HeaderName::try_from(name.as_ref())
            .map_err(|e| Error::ConfigurationError(format!("Invalid header name: {}", e)))?;
        let value = HeaderValue::try_from(value.as_ref())
            .map_err(|e| Error::ConfigurationError(format!("Invalid header value: {}", e)))?;
        self.default_headers.insert(name, value);
        Ok(self)
    }

    pub fn retry_strategy(mut self, strategy: RetryStrategy) -> Self {
        self.retry_strategy = strategy;
        self
    }

    /// Sets the per-exchange timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Stores and sends cookies through `jar`.
    ///
    /// Without a jar the transport keeps its own private cookie store.
    pub fn cookie_jar(mut self, jar: &CookieJar) -> Self {
        self.cookie_jar = Some(jar.clone());
        self
    }

    /// Builds the transport.
    ///
    /// # Errors
    ///
    /// Returns an error if no base URL was provided or the HTTP client
    /// cannot be built.
    pub fn build(self) -> Result<HttpTransport> {
        let base_url = self
            .base_url
            .ok_or_else(|| Error::ConfigurationError("Base URL is required".to_string()))?;

        let builder = reqwest::Client::builder().redirect(reqwest::redirect::Policy::none());
        let builder = match self.cookie_jar {
            Some(jar) => builder.cookie_provider(jar.provider()),
            None => builder.cookie_store(true),
        };

        let http_client = builder
            .build()
            .map_err(|e| Error::ConfigurationError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(HttpTransport {
            inner: Arc::new(TransportInner {
                http_client,
                base_url,
                alternate_base_url: self.alternate_base_url,
                default_headers: self.default_headers,
                retry_strategy: self.retry_strategy,
                timeout: self.timeout,
            }),
        })
    }
}

impl Default for HttpTransportBuilder {
    fn default() -> Self {
        Self::new()
    }
}
