//! Example: retrying with exponential backoff
//!
//! This example demonstrates:
//! 1. Bounded retry with a stack-local failure counter
//! 2. A stateful backoff reused across sequences with `reset`
//! 3. Jitter spread (run multiple times to see variance)
//!
//! Run with:
//! ```bash
//! cargo run -p redial-core --example retry_example
//! ```

use redial_core::prelude::*;
use std::error::Error;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};

/// A simulated service that fails the first few times
struct FlakyService {
    attempts: AtomicU32,
    fail_count: u32,
}

impl FlakyService {
    fn new(fail_count: u32) -> Self {
        Self {
            attempts: AtomicU32::new(0),
            fail_count,
        }
    }

    async fn call(&self) -> Result<String, std::io::Error> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);

        if attempt < self.fail_count {
            println!("  Attempt {}: FAILED", attempt + 1);
            Err(std::io::Error::other(format!(
                "transient error on attempt {}",
                attempt + 1
            )))
        } else {
            println!("  Attempt {}: SUCCESS", attempt + 1);
            Ok("payload".to_string())
        }
    }

    fn total_attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }
}

/// Example 1: bounded retry
async fn example_bounded_retry() -> Result<(), Box<dyn Error>> {
    println!("\n=== Example 1: Bounded Retry ===\n");

    let policy = BackoffPolicy::new(Duration::from_millis(100), 5);
    let service = FlakyService::new(2);

    let start = Instant::now();
    let result = policy.execute(|| service.call()).await?;
    let elapsed = start.elapsed();

    println!("\nResult: {}", result);
    println!("Total attempts: {}", service.total_attempts());
    println!("Total time: {:?}", elapsed);
    println!("Expected delays: 200ms (after failure 1) + 400ms (after failure 2) = ~600ms");

    println!("\nExhausting a budget of 3:");
    let hopeless = FlakyService::new(u32::MAX);
    let err = BackoffPolicy::new(Duration::from_millis(10), 3)
        .execute(|| hopeless.call())
        .await
        .unwrap_err();
    println!("Last error: {}", err);

    Ok(())
}

/// Example 2: stateful backoff
fn example_stateful() {
    println!("\n=== Example 2: Stateful Backoff ===\n");

    let mut backoff = Backoff::new(BackoffPolicy::new(Duration::from_millis(100), 5));
    for _ in 0..4 {
        let delay = backoff.next_delay();
        println!("  failures={} next delay={:?}", backoff.failures(), delay);
    }

    backoff.reset();
    println!("After reset: next delay={:?}", backoff.next_delay());
}

/// Example 3: jitter spread
fn example_jitter() {
    println!("\n=== Example 3: Jitter Spread ===\n");

    for strategy in [JitterStrategy::FloorAnchored, JitterStrategy::HalfRange] {
        let policy = BackoffPolicy::builder()
            .minimum(Duration::from_millis(100))
            .jitter(true)
            .strategy(strategy)
            .build();

        let samples: Vec<u128> = (0..10).map(|_| policy.delay(3).as_millis()).collect();
        println!("{:?} delay(3) samples (ms): {:?}", strategy, samples);
    }
    println!("Deterministic delay(3) would be 800ms.");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    example_bounded_retry().await?;
    example_stateful();
    example_jitter();
    Ok(())
}
