//! Dialing with exponential backoff
//!
//! [`Dialer`] pairs a [`Connector`] with a [`BackoffPolicy`]. The unbounded
//! forms keep retrying until a connection is made; a required downstream is
//! treated as something that must eventually come up. Use
//! [`Dialer::dial_until`] to keep an exit, or [`Dialer::dial_bounded`] to give
//! up after the policy's failure budget.

use crate::error::DialCancelled;
use crate::traits::Connector;
use redial_core::retry::{Backoff, BackoffPolicy};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Connection dialer with exponential backoff
///
/// # Examples
///
/// ```rust,no_run
/// use redial_core::retry::BackoffPolicy;
/// use redial_transport::{Dialer, NetConnector};
/// use std::time::Duration;
///
/// # async fn example() {
/// let dialer = Dialer::new(
///     NetConnector::new(),
///     BackoffPolicy::builder()
///         .minimum(Duration::from_millis(100))
///         .max_delay(Duration::from_secs(30))
///         .jitter(true)
///         .build(),
/// );
///
/// // Returns only once the database accepts a connection.
/// let conn = dialer.dial("tcp", "db.internal:5432").await;
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Dialer<C> {
    connector: C,
    policy: BackoffPolicy,
}

impl<C: Connector> Dialer<C> {
    /// Create a dialer
    pub fn new(connector: C, policy: BackoffPolicy) -> Self {
        Self { connector, policy }
    }

    /// The backoff policy
    pub fn policy(&self) -> &BackoffPolicy {
        &self.policy
    }

    /// The underlying connector
    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Dial until a connection succeeds
    ///
    /// After the `n`th failure the dialer sleeps for `policy.delay(n)` and
    /// tries again, with no upper bound on attempts. The policy's
    /// `max_failures` is ignored. Set `max_delay` on the policy to keep the
    /// wait between attempts reasonable during long outages.
    pub async fn dial(&self, network: &str, address: &str) -> C::Connection {
        let mut failures: u32 = 0;
        loop {
            match self.connector.connect(network, address).await {
                Ok(conn) => {
                    log_connected(network, address, failures);
                    return conn;
                }
                Err(err) => {
                    failures = failures.saturating_add(1);
                    let delay = self.policy.delay(failures);
                    debug!(network, address, failures, ?delay, error = %err, "dial failed, backing off");
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// Dial until a connection succeeds or `cancel` fires
    ///
    /// Same schedule as [`dial`](Self::dial). The token is checked before
    /// every attempt and raced against both the attempt in flight and the
    /// sleep that follows a failure.
    pub async fn dial_until(
        &self,
        network: &str,
        address: &str,
        cancel: &CancellationToken,
    ) -> Result<C::Connection, DialCancelled<C::Error>> {
        let mut attempts: u32 = 0;
        let mut last_error = None;

        loop {
            if cancel.is_cancelled() {
                return Err(cancelled(network, address, attempts, last_error));
            }

            attempts = attempts.saturating_add(1);
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                result = self.connector.connect(network, address) => Some(result),
            };

            match outcome {
                None => return Err(cancelled(network, address, attempts, last_error)),
                Some(Ok(conn)) => {
                    log_connected(network, address, attempts - 1);
                    return Ok(conn);
                }
                Some(Err(err)) => {
                    let delay = self.policy.delay(attempts);
                    debug!(network, address, failures = attempts, ?delay, error = %err, "dial failed, backing off");
                    last_error = Some(err);

                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => {
                            return Err(cancelled(network, address, attempts, last_error));
                        }
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }
    }

    /// Dial with the policy's failure budget
    ///
    /// Runs through [`BackoffPolicy::execute`]: at most `max_failures`
    /// attempts, returning the last connector error unchanged once the budget
    /// is spent.
    pub async fn dial_bounded(
        &self,
        network: &str,
        address: &str,
    ) -> Result<C::Connection, C::Error> {
        let result = self
            .policy
            .execute(|| self.connector.connect(network, address))
            .await;
        if result.is_ok() {
            debug!(network, address, "connected");
        }
        result
    }

    /// Dial until a connection succeeds, charging failures to `backoff`
    ///
    /// Delays come from `backoff` (its policy and its running count), not
    /// from this dialer's policy. The count is left as-is on success; call
    /// [`Backoff::reset`] before reusing it for an unrelated sequence.
    pub async fn dial_with(
        &self,
        backoff: &mut Backoff,
        network: &str,
        address: &str,
    ) -> C::Connection {
        let mut failures: u32 = 0;
        loop {
            match self.connector.connect(network, address).await {
                Ok(conn) => {
                    log_connected(network, address, failures);
                    return conn;
                }
                Err(err) => {
                    failures = failures.saturating_add(1);
                    let delay = backoff.next_delay();
                    debug!(
                        network,
                        address,
                        failures = backoff.failures(),
                        ?delay,
                        error = %err,
                        "dial failed, backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

fn cancelled<E>(
    network: &str,
    address: &str,
    attempts: u32,
    last_error: Option<E>,
) -> DialCancelled<E> {
    debug!(network, address, attempts, "dial cancelled");
    DialCancelled {
        network: network.to_string(),
        address: address.to_string(),
        attempts,
        last_error,
    }
}

fn log_connected(network: &str, address: &str, failures: u32) {
    if failures == 0 {
        debug!(network, address, "connected");
    } else {
        info!(network, address, failures, "connected after retries");
    }
}
