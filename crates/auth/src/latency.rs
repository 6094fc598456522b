//! Simulated network latency.

use std::time::Duration;

/// Wait `delay` to imitate a server round trip that isn't happening.
///
/// One deferred completion: no cancellation, no retry, no timeout.
pub async fn fake_latency(delay: Duration) {
    tracing::debug!(?delay, "simulating server round trip");
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}
