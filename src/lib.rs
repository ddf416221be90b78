//! # Timein - login session lifecycle for HTTP game clients
//!
//! Timein establishes a session with a game server that speaks HTML forms,
//! silently re-establishes it when the server expires it ("time-in"), and
//! re-enters it on demand. Login responses are loosely structured pages, so
//! each exchange is classified into a closed set of outcomes that drive a
//! retry loop: wait and resubmit, fall back to the default server, or give
//! up with a message for the user.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use timein::{Credentials, HttpTransport, SessionCoordinator};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), timein::Error> {
//!     let transport = HttpTransport::builder()
//!         .base_url("https://www.example-game.net")?
//!         .build()?;
//!
//!     let session = SessionCoordinator::builder()
//!         .transport(Arc::new(transport))
//!         .build()?;
//!
//!     // "/q" asks for a stealthy login
//!     session
//!         .start_explicit_login(Credentials::new("wizard/q", "hunter2"))
//!         .await?;
//!     println!("Logged in: {}", session.is_established());
//!
//!     // Later, a page request was redirected to login.php
//!     let back = session
//!         .trigger_timein_from_redirect("main.php", "login.php")
//!         .await?;
//!     println!("Session restored: {}", back);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Components
//!
//! - [`classify::classify`] turns a completed exchange into a [`LoginOutcome`].
//! - [`retry::action_for`] maps an outcome to the next [`RetryAction`].
//! - [`SessionAttempt`] builds the form and loops until a terminal action.
//! - [`SessionCoordinator`] owns the session flags, replays the last attempt
//!   for time-ins, and runs post-login processing.
//!
//! Everything outside the login decision itself sits behind a trait:
//! [`Transport`], [`CookieStore`], [`Notifier`], [`Preferences`],
//! [`ConnectivityProbe`] and [`SessionHooks`].
//!
//! ## Error Handling
//!
//! ```no_run
//! use timein::{Credentials, Error, SessionCoordinator};
//!
//! # async fn example(session: SessionCoordinator) {
//! match session.start_explicit_login(Credentials::new("wizard", "x")).await {
//!     Ok(_) if session.is_established() => println!("Welcome back"),
//!     Ok(outcome) => println!("No session: {:?}", outcome),
//!     Err(Error::LoginRejected(failure)) => eprintln!("{}", failure),
//!     Err(e) => eprintln!("Transport problem: {}", e),
//! }
//! # }
//! ```

mod attempt;
pub mod classify;
mod client;
mod config;
mod cookies;
mod coordinator;
mod credentials;
mod error;
pub mod hooks;
pub mod metadata;
pub mod notify;
pub mod prefs;
mod response;
pub mod retry;
mod transport;

pub use attempt::{AttemptOutcome, SessionAttempt, SessionMode};
pub use classify::LoginOutcome;
pub use client::{HttpTransport, HttpTransportBuilder};
pub use config::{SessionConfig, SessionConfigBuilder};
pub use cookies::{CookieJar, CookieStore};
pub use coordinator::{SessionCoordinator, SessionCoordinatorBuilder, SessionEvent, SESSION_TOPIC};
pub use credentials::{Credentials, STEALTH_MARKER};
pub use error::{Error, LoginFailure, Result};
pub use hooks::{ConnectivityProbe, SessionHooks};
pub use notify::{DisplayLevel, Notifier, TracingNotifier};
pub use prefs::{MemoryPreferences, Preferences};
pub use response::Exchange;
pub use retry::{RetryAction, RetryStrategy};
pub use transport::Transport;
