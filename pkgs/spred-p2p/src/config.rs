//! Timing and retry knobs for the coordination layer.

use crate::retry::RetryPolicy;
use std::time::Duration;

/// Service configuration. Defaults reproduce the production timings;
/// tests compress them to keep paused-clock runs instant.
#[derive(Debug, Clone)]
pub struct P2pConfig {
    /// Budget for one native `start_discovering_peers` call.
    pub discovery_timeout: Duration,
    /// Retries after the first failed discovery attempt.
    pub discovery_retry: RetryPolicy,
    /// Cadence of the background peer list refresh while discovering.
    pub peer_refresh_interval: Duration,
    /// Devices not re-reported within this window drop off the list.
    pub device_ttl: Duration,
    /// Poll cadence while waiting for a connection to form.
    pub connect_poll_interval: Duration,
    /// Total budget for a connection attempt.
    pub connect_timeout: Duration,
    /// Settle time between smart-connect tiers.
    pub smart_connect_pause: Duration,
    /// Port-in-use retries around `send_file`.
    pub send_retry: RetryPolicy,
    /// Transient-failure retries around `receive_file`.
    pub receive_retry: RetryPolicy,
    /// Settle time after opening hotspot settings, before re-checking.
    pub hotspot_recheck_delay: Duration,
}

impl Default for P2pConfig {
    fn default() -> Self {
        Self {
            discovery_timeout: Duration::from_secs(15),
            discovery_retry: RetryPolicy::fixed(3, Duration::ZERO),
            peer_refresh_interval: Duration::from_secs(5),
            device_ttl: crate::state::DEVICE_TTL,
            connect_poll_interval: Duration::from_millis(500),
            connect_timeout: Duration::from_secs(10),
            smart_connect_pause: Duration::from_secs(2),
            send_retry: RetryPolicy::fixed(2, Duration::from_secs(2)),
            receive_retry: RetryPolicy::linear(
                3,
                Duration::from_secs(2),
                Duration::from_secs(1),
            ),
            hotspot_recheck_delay: Duration::from_secs(1),
        }
    }
}
