//! Host metrics sources.
//!
//! `SysinfoHost` reads the live machine; `FakeHost` (behind the `test-utils`
//! feature) replays scripted readings for tests.

pub mod sysinfo_host;
#[cfg(feature = "test-utils")]
pub mod test_utils;

pub use crate::core::{CollectError, HostMetrics, HostReadings};
pub use sysinfo_host::SysinfoHost;

/// Rounds a percentage to one decimal place.
pub(crate) fn round_percent(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// `used / total` as a percentage, or `None` when `total` is zero.
pub(crate) fn percent_of(used: u64, total: u64) -> Option<f64> {
    if total == 0 {
        return None;
    }
    Some(round_percent(used as f64 / total as f64 * 100.0))
}
