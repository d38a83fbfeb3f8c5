//! Example: dialing a listener that comes up late
//!
//! Starts a TCP listener after a short delay and dials it with backoff, then
//! shows a cancelled dial against a port that never opens.
//!
//! Run with:
//! ```bash
//! RUST_LOG=debug cargo run -p redial-transport --example dial_example
//! ```

use redial_core::retry::BackoffPolicy;
use redial_transport::{Dialer, NetConnector};
use std::error::Error;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // Reserve a free port, then release it so the first dials are refused.
    let addr = TcpListener::bind("127.0.0.1:0").await?.local_addr()?;

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(700)).await;
        if let Ok(listener) = TcpListener::bind(addr).await {
            println!("listener up on {}", addr);
            let _ = listener.accept().await;
        }
    });

    let dialer = Dialer::new(
        NetConnector::new().with_connect_timeout(Duration::from_secs(1)),
        BackoffPolicy::builder()
            .minimum(Duration::from_millis(50))
            .max_delay(Duration::from_secs(2))
            .jitter(true)
            .build(),
    );

    let start = Instant::now();
    let conn = dialer.dial("tcp", &addr.to_string()).await;
    println!(
        "connected to {} after {:?}",
        conn.peer_addr()?,
        start.elapsed()
    );

    // Nothing will ever listen here; give up after half a second.
    let closed = TcpListener::bind("127.0.0.1:0").await?.local_addr()?;
    let shutdown = CancellationToken::new();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(500)).await;
        trigger.cancel();
    });

    match dialer.dial_until("tcp", &closed.to_string(), &shutdown).await {
        Ok(_) => println!("unexpectedly connected to {}", closed),
        Err(err) => println!("{} (last error: {:?})", err, err.last_error),
    }

    Ok(())
}
