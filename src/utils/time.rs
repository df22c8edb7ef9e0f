//! Latency helpers.

use std::time::{Duration, Instant};

/// Whole milliseconds in `duration`, saturating at `u64::MAX`.
pub fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

pub fn elapsed_ms(started: Instant) -> u64 {
    duration_ms(started.elapsed())
}
