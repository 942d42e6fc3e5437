//! Reconnect timing.

use std::time::Duration;

/// How long to wait before the next connection attempt.
///
/// Both variants retry forever; only an explicit stop ends a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconnectPolicy {
    /// Same delay before every attempt.
    Fixed(Duration),
    /// Doubling delay starting at `initial`, capped at `max`.
    Exponential {
        /// Delay before the first retry.
        initial: Duration,
        /// Upper bound on any delay.
        max: Duration,
    },
}

impl ReconnectPolicy {
    /// One second between attempts.
    pub const DEFAULT_DELAY: Duration = Duration::from_secs(1);

    /// Delay before retry number `attempt` (0 = first retry after a drop).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        match *self {
            Self::Fixed(delay) => delay,
            Self::Exponential { initial, max } => {
                let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
                initial.saturating_mul(factor).min(max)
            }
        }
    }

    /// Build a policy from millisecond settings.
    ///
    /// With no maximum (or a maximum not above the base) the delay is fixed.
    pub fn from_millis(delay_ms: u64, max_delay_ms: Option<u64>) -> Self {
        let initial = Duration::from_millis(delay_ms);
        match max_delay_ms.map(Duration::from_millis) {
            Some(max) if max > initial => Self::Exponential { initial, max },
            _ => Self::Fixed(initial),
        }
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::Fixed(Self::DEFAULT_DELAY)
    }
}
