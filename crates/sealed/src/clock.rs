//! Time source for envelope timestamps and expiration checks.

use chrono::Utc;

/// Source of "now" in milliseconds since the Unix epoch.
///
/// Implementations must be safe to share across threads; [`EnvelopeCipher`]
/// holds one behind an `Arc`.
///
/// [`EnvelopeCipher`]: crate::EnvelopeCipher
#[cfg_attr(test, mockall::automock)]
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

/// Wall-clock time in UTC.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}
