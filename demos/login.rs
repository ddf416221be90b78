//! Logs in against a game server, then handles a login-page redirect.
//!
//! This example shows how to:
//! - Configure the HTTP transport and the session coordinator
//! - Log in with a stealthy identity
//! - Watch session events
//! - Hand a redirect to the coordinator for a time-in
//!
//! Run with: `cargo run --example login -- <base-url> <name> <password>`

use std::sync::Arc;
use std::time::Duration;
use timein::{Credentials, Error, HttpTransport, SessionCoordinator};

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter("timein=debug,login=info")
        .init();

    let mut args = std::env::args().skip(1);
    let (Some(base_url), Some(name), Some(password)) = (args.next(), args.next(), args.next())
    else {
        eprintln!("Usage: login <base-url> <name> <password>");
        return Ok(());
    };

    let transport = HttpTransport::builder()
        .base_url(base_url)?
        .timeout(Duration::from_secs(30))
        .build()?;

    let session = SessionCoordinator::builder()
        .transport(Arc::new(transport))
        .build()?;

    let mut events = session.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            println!("[{}] established = {}", event.topic, event.established);
        }
    });

    println!("=== Login ===");
    match session.start_explicit_login(Credentials::new(name, password)).await {
        Ok(outcome) => println!("Outcome: {:?}", outcome),
        Err(Error::LoginRejected(failure)) => {
            println!("Rejected: {}", failure);
            return Ok(());
        }
        Err(e) => return Err(e),
    }
    println!("Logged in: {}", session.is_established());
    println!();

    println!("=== Time-in ===");
    // A redirect this soon after the login is ignored
    let established = session
        .trigger_timein_from_redirect("main.php", "login.php")
        .await?;
    println!("Established after redirect: {}", established);

    session.mark_logged_out();
    println!("Re-time-in succeeded: {}", session.retimein().await);

    Ok(())
}
