//! Process-wide authority over the login session.
//!
//! The [`SessionCoordinator`] answers "are we logged in?", remembers the
//! last login attempt so it can be replayed for time-ins and re-logins, and
//! keeps concurrent re-establishment from overlapping.
//!
//! # Re-entrancy
//!
//! Success post-processing calls the [`ConnectivityProbe`], and the probe
//! may log in again through the coordinator. No lock is held across an
//! `await`: flags are atomics and the remembered attempt is cloned out of
//! its mutex before it runs. A depth counter around the probe call makes
//! sure only the outermost login reaches the bootstrap hooks.
//!
//! The in-progress markers are counters, not booleans, so overlapping runs
//! that finish in any order leave them at zero.

use crate::attempt::{AttemptOutcome, SessionAttempt, SessionMode};
use crate::config::SessionConfig;
use crate::cookies::CookieStore;
use crate::credentials::identity_from_login_name;
use crate::hooks::{AcceptAll, ConnectivityProbe, LogOnly, SessionHooks};
use crate::metadata::{LoginRequest, FIELD_LOGIN_NAME};
use crate::notify::{Notifier, TracingNotifier};
use crate::prefs::{keys, MemoryPreferences, Preferences};
use crate::transport::Transport;
use crate::{Credentials, Error, Exchange, Result};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use tokio::sync::broadcast;

/// Topic of every [`SessionEvent`].
pub const SESSION_TOPIC: &str = "session";

/// Sent to subscribers whenever the coordinator sets the established flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionEvent {
    pub topic: &'static str,
    pub established: bool,
}

/// Owns the session state and runs login attempts.
///
/// Cloning is cheap and every clone shares the same state.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use timein::{Credentials, HttpTransport, SessionCoordinator};
///
/// # async fn example() -> Result<(), timein::Error> {
/// let transport = HttpTransport::builder()
///     .base_url("https://www.example-game.net")?
///     .build()?;
///
/// let session = SessionCoordinator::builder()
///     .transport(Arc::new(transport))
///     .build()?;
///
/// session.start_explicit_login(Credentials::new("wizard", "hunter2")).await?;
/// assert!(session.is_established());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct SessionCoordinator {
    inner: Arc<CoordinatorInner>,
}

struct CoordinatorInner {
    transport: Arc<dyn Transport>,
    preferences: Arc<dyn Preferences>,
    notifier: Arc<dyn Notifier>,
    cookies: Option<Arc<dyn CookieStore>>,
    probe: Arc<dyn ConnectivityProbe>,
    hooks: Arc<dyn SessionHooks>,
    config: SessionConfig,
    state: Mutex<SessionState>,
    established: AtomicBool,
    /// Time-ins and re-time-ins currently running.
    reestablishing: AtomicUsize,
    /// Bootstrap hooks currently running.
    bootstrapping: AtomicUsize,
    /// Set by a bootstrap collaborator through `set_bootstrapping`.
    bootstrap_announced: AtomicBool,
    ping_depth: AtomicUsize,
    events: broadcast::Sender<SessionEvent>,
}

#[derive(Default)]
struct SessionState {
    last_attempt: Option<Arc<SessionAttempt>>,
    /// Set when an execution starts; cleared once the server answers with a
    /// page, on logout, and when the connectivity probe fails.
    last_attempt_at: Option<Instant>,
}

/// Counts one running activity for the lifetime of the guard.
struct DepthGuard<'a> {
    depth: &'a AtomicUsize,
    /// How many were already running when this one entered.
    previous: usize,
}

impl<'a> DepthGuard<'a> {
    fn enter(depth: &'a AtomicUsize) -> Self {
        let previous = depth.fetch_add(1, Ordering::SeqCst);
        Self { depth, previous }
    }
}

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        self.depth.fetch_sub(1, Ordering::SeqCst);
    }
}

impl SessionCoordinator {
    pub fn builder() -> SessionCoordinatorBuilder {
        SessionCoordinatorBuilder::new()
    }

    /// Logs in with fresh credentials.
    ///
    /// The new attempt replaces any remembered one and becomes the attempt
    /// replayed by later time-ins. Rejections are shown through the
    /// [`Notifier`] and returned as [`Error::LoginRejected`].
    pub async fn start_explicit_login(&self, credentials: Credentials) -> Result<AttemptOutcome> {
        let attempt = Arc::new(SessionAttempt::new(credentials));
        let identity = attempt.identity();
        self.inner
            .preferences
            .set_string(identity, keys::DISPLAY_NAME, identity);
        self.state().last_attempt = Some(Arc::clone(&attempt));

        tracing::info!(identity, stealthy = attempt.stealthy(), "Starting login");
        attempt.run(self, SessionMode::Login).await
    }

    /// Handles a request that the server redirected to the login page.
    ///
    /// Returns whether the session is established afterwards. Nothing is
    /// submitted when no attempt is remembered, when a time-in is already
    /// running, or when the redirect falls inside the time-in window after
    /// the last attempt (it is an echo of that attempt, not an expiry).
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConcurrentReestablishment`] if a login bootstrap is
    /// running at the same time. That can only happen when the caller broke
    /// request serialization; treat it as fatal.
    pub async fn trigger_timein_from_redirect(
        &self,
        request_location: &str,
        redirect_location: &str,
    ) -> Result<bool> {
        let Some(attempt) = self.last_attempt() else {
            return Ok(self.is_established());
        };

        if self.is_reestablishing() {
            return Ok(self.is_established());
        }

        if let Some(at) = self.last_attempt_at() {
            if at.elapsed() < self.inner.config.timein_window {
                tracing::debug!(
                    request_location,
                    redirect_location,
                    "Login redirect inside the time-in window, ignoring"
                );
                return Ok(self.is_established());
            }
        }

        if self.is_bootstrapping() {
            tracing::error!(
                request_location,
                redirect_location,
                "Login redirect while another login is in progress"
            );
            return Err(Error::ConcurrentReestablishment {
                request_location: request_location.to_string(),
                redirect_location: redirect_location.to_string(),
            });
        }

        let guard = DepthGuard::enter(&self.inner.reestablishing);
        if guard.previous > 0 {
            return Ok(self.is_established());
        }

        tracing::info!(
            identity = attempt.identity(),
            request_location,
            redirect_location,
            "Session expired, timing in"
        );
        Ok(self.replay(&attempt, SessionMode::Timein).await)
    }

    /// Runs the remembered attempt again as a time-in.
    ///
    /// Returns whether the session is established afterwards. Without a
    /// remembered attempt nothing runs.
    pub async fn retimein(&self) -> bool {
        let Some(attempt) = self.last_attempt() else {
            return self.is_established();
        };

        let _guard = DepthGuard::enter(&self.inner.reestablishing);
        self.replay(&attempt, SessionMode::Timein).await
    }

    /// Runs the remembered attempt again as a full login.
    ///
    /// Unlike [`retimein`](Self::retimein) this does not mark a
    /// re-establishment as running; its callers already serialize it.
    pub async fn relogin(&self) -> bool {
        let Some(attempt) = self.last_attempt() else {
            return self.is_established();
        };

        self.replay(&attempt, SessionMode::Login).await
    }

    /// Marks the session logged out.
    pub fn mark_logged_out(&self) {
        self.set_established(false);
        self.clear_attempt_timestamp();
        tracing::info!("Session logged out");
    }

    /// Whether the client is currently authenticated.
    pub fn is_established(&self) -> bool {
        self.inner.established.load(Ordering::SeqCst)
    }

    /// Subscribes to changes of the established flag.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    /// Lets a bootstrap collaborator announce that a login is being set up.
    pub fn set_bootstrapping(&self, bootstrapping: bool) {
        self.inner
            .bootstrap_announced
            .store(bootstrapping, Ordering::SeqCst);
    }

    pub fn is_bootstrapping(&self) -> bool {
        self.inner.bootstrap_announced.load(Ordering::SeqCst)
            || self.inner.bootstrapping.load(Ordering::SeqCst) > 0
    }

    pub fn is_reestablishing(&self) -> bool {
        self.inner.reestablishing.load(Ordering::SeqCst) > 0
    }

    /// How many connectivity probes are currently running.
    pub fn ping_depth(&self) -> usize {
        self.inner.ping_depth.load(Ordering::SeqCst)
    }

    /// The attempt time-ins and re-logins will replay.
    pub fn last_attempt(&self) -> Option<Arc<SessionAttempt>> {
        self.state().last_attempt.clone()
    }

    /// When the last execution started, if it may still be outstanding.
    pub fn last_attempt_at(&self) -> Option<Instant> {
        self.state().last_attempt_at
    }

    /// Post-processing for a login exchange that ended in a redirect.
    ///
    /// Marks the session established, recovers the identity from the
    /// submitted form, runs the connectivity probe and finally the bootstrap
    /// hook for `mode`. Does nothing if the exchange has no redirect.
    pub async fn complete_login(&self, request: &LoginRequest, exchange: &Exchange, mode: SessionMode) {
        if !exchange.is_redirect() {
            return;
        }

        if let Some(cookies) = &self.inner.cookies {
            cookies.apply(exchange);
        }
        self.set_established(true);

        let Some(identity) = request
            .field(FIELD_LOGIN_NAME)
            .and_then(identity_from_login_name)
        else {
            tracing::warn!("Login redirect without a usable login name, skipping bootstrap");
            return;
        };

        let acceptable = {
            let _depth = DepthGuard::enter(&self.inner.ping_depth);
            self.inner.probe.ping(self).await
        };

        if !acceptable || !self.is_established() {
            if self.is_established() {
                tracing::warn!(identity = %identity, "Connectivity probe failed but left the session open");
                self.set_established(false);
            }
            tracing::info!(identity = %identity, "Connection rejected by probe, login abandoned");
            self.clear_attempt_timestamp();
            return;
        }

        if self.ping_depth() > 0 {
            tracing::debug!(identity = %identity, "Login completed inside a connectivity probe");
            return;
        }

        let _bootstrapping = DepthGuard::enter(&self.inner.bootstrapping);
        match mode {
            SessionMode::Timein => self.inner.hooks.on_timein_complete(&identity).await,
            SessionMode::Login => self.inner.hooks.on_login_complete(&identity).await,
        }
    }

    /// Clears per-execution state before an attempt submits.
    pub(crate) fn begin_execution(&self, attempt: &SessionAttempt) {
        if self.inner.established.swap(false, Ordering::SeqCst) {
            self.notify(false);
        }
        self.inner.transport.reset();
        self.inner.hooks.reset();

        if self.inner.preferences.get_bool(keys::SAVE_STATE_ACTIVE) {
            self.inner
                .hooks
                .save_state(attempt.identity(), attempt.credentials().secret());
        }

        self.state().last_attempt_at = Some(Instant::now());
    }

    pub(crate) fn clear_attempt_timestamp(&self) {
        self.state().last_attempt_at = None;
    }

    pub(crate) fn transport(&self) -> &dyn Transport {
        self.inner.transport.as_ref()
    }

    pub(crate) fn preferences(&self) -> &dyn Preferences {
        self.inner.preferences.as_ref()
    }

    pub(crate) fn notifier(&self) -> &dyn Notifier {
        self.inner.notifier.as_ref()
    }

    pub(crate) fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    async fn replay(&self, attempt: &SessionAttempt, mode: SessionMode) -> bool {
        if let Err(e) = attempt.run(self, mode).await {
            tracing::warn!(error = %e, identity = attempt.identity(), %mode, "Session re-establishment failed");
        }
        self.is_established()
    }

    fn set_established(&self, established: bool) {
        self.inner.established.store(established, Ordering::SeqCst);
        self.notify(established);
    }

    fn notify(&self, established: bool) {
        // no subscribers is fine
        let _ = self.inner.events.send(SessionEvent {
            topic: SESSION_TOPIC,
            established,
        });
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Builder for a [`SessionCoordinator`].
///
/// Only the transport is required. The other collaborators default to
/// in-memory preferences, a tracing notifier, a probe that accepts every
/// connection, and hooks that only log. Without a cookie store, cookies are
/// left to the transport.
pub struct SessionCoordinatorBuilder {
    transport: Option<Arc<dyn Transport>>,
    preferences: Option<Arc<dyn Preferences>>,
    notifier: Option<Arc<dyn Notifier>>,
    cookies: Option<Arc<dyn CookieStore>>,
    probe: Option<Arc<dyn ConnectivityProbe>>,
    hooks: Option<Arc<dyn SessionHooks>>,
    config: SessionConfig,
}

impl SessionCoordinatorBuilder {
    pub fn new() -> Self {
        Self {
            transport: None,
            preferences: None,
            notifier: None,
            cookies: None,
            probe: None,
            hooks: None,
            config: SessionConfig::default(),
        }
    }

    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn preferences(mut self, preferences: Arc<dyn Preferences>) -> Self {
        self.preferences = Some(preferences);
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn cookies(mut self, cookies: Arc<dyn CookieStore>) -> Self {
        self.cookies = Some(cookies);
        self
    }

    pub fn probe(mut self, probe: Arc<dyn ConnectivityProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    pub fn hooks(mut self, hooks: Arc<dyn SessionHooks>) -> Self {
        self.hooks = Some(hooks);
        self
    }

    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Builds the coordinator.
    ///
    /// # Errors
    ///
    /// Returns an error if no transport was provided.
    pub fn build(self) -> Result<SessionCoordinator> {
        let transport = self
            .transport
            .ok_or_else(|| Error::ConfigurationError("A transport is required".to_string()))?;
        let (events, _) = broadcast::channel(self.config.event_capacity.max(1));

        Ok(SessionCoordinator {
            inner: Arc::new(CoordinatorInner {
                transport,
                preferences: self
                    .preferences
                    .unwrap_or_else(|| Arc::new(MemoryPreferences::new())),
                notifier: self
                    .notifier
                    .unwrap_or_else(|| Arc::new(TracingNotifier::new())),
                cookies: self.cookies,
                probe: self.probe.unwrap_or_else(|| Arc::new(AcceptAll)),
                hooks: self.hooks.unwrap_or_else(|| Arc::new(LogOnly)),
                config: self.config,
                state: Mutex::new(SessionState::default()),
                established: AtomicBool::new(false),
                reestablishing: AtomicUsize::new(0),
                bootstrapping: AtomicUsize::new(0),
                bootstrap_announced: AtomicBool::new(false),
                ping_depth: AtomicUsize::new(0),
                events,
            }),
        })
    }
}

impl Default for SessionCoordinatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
