//! Shared cooldown tracking for outbound sends.
//!
//! One deadline covers every destination channel: a throttle observed while
//! sending to one channel pauses delivery to all of them. The deadline is
//! written from the delivery worker and from send-completion tasks, so it is
//! kept in an atomic and only ever moved forward.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::time::Instant;

/// Rate-limit governor holding a single cooldown deadline.
#[derive(Debug)]
pub struct RateLimitGovernor {
    /// Reference point for the stored deadline.
    origin: Instant,
    /// Deadline in milliseconds since `origin` (0 = never throttled).
    deadline_ms: AtomicU64,
}

impl Default for RateLimitGovernor {
    fn default() -> Self {
        Self::new()
    }
}

impl RateLimitGovernor {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            deadline_ms: AtomicU64::new(0),
        }
    }

    /// Time left before the next send may be attempted, if any.
    pub fn remaining(&self) -> Option<Duration> {
        let deadline = Duration::from_millis(self.deadline_ms.load(Ordering::Acquire));
        let elapsed = self.origin.elapsed();
        if elapsed < deadline {
            Some(deadline - elapsed)
        } else {
            None
        }
    }

    /// Record a throttle signal: no send before `now + retry_after`.
    ///
    /// Concurrent callers never shorten an existing cooldown. Returns the
    /// cooldown actually in force after the update.
    pub fn throttle(&self, retry_after: Duration) -> Duration {
        let elapsed = self.origin.elapsed();
        let candidate = ceil_millis(elapsed).saturating_add(ceil_millis(retry_after));
        let previous = self.deadline_ms.fetch_max(candidate, Ordering::AcqRel);
        let deadline = Duration::from_millis(previous.max(candidate));
        deadline.saturating_sub(elapsed)
    }
}

fn ceil_millis(duration: Duration) -> u64 {
    let millis = duration.as_millis();
    let rounded = if duration.subsec_nanos() % 1_000_000 == 0 {
        millis
    } else {
        millis + 1
    };
    u64::try_from(rounded).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_no_cooldown_initially() {
        let governor = RateLimitGovernor::new();
        assert!(governor.remaining().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_throttle_sets_deadline() {
        let governor = RateLimitGovernor::new();
        governor.throttle(Duration::from_millis(2000));

        assert_eq!(governor.remaining(), Some(Duration::from_millis(2000)));

        tokio::time::advance(Duration::from_millis(1500)).await;
        assert_eq!(governor.remaining(), Some(Duration::from_millis(500)));

        tokio::time::advance(Duration::from_millis(500)).await;
        assert!(governor.remaining().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shorter_throttle_does_not_shorten_cooldown() {
        let governor = RateLimitGovernor::new();
        governor.throttle(Duration::from_secs(5));

        let in_force = governor.throttle(Duration::from_secs(1));

        assert_eq!(in_force, Duration::from_secs(5));
        assert_eq!(governor.remaining(), Some(Duration::from_secs(5)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_longer_throttle_extends_cooldown() {
        let governor = RateLimitGovernor::new();
        governor.throttle(Duration::from_secs(1));
        governor.throttle(Duration::from_secs(3));

        assert_eq!(governor.remaining(), Some(Duration::from_secs(3)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_throttles_keep_latest_deadline() {
        let governor = Arc::new(RateLimitGovernor::new());

        let handles: Vec<_> = (1..=16u64)
            .map(|secs| {
                let governor = Arc::clone(&governor);
                tokio::spawn(async move {
                    governor.throttle(Duration::from_secs(secs));
                })
            })
            .collect();
        for result in futures::future::join_all(handles).await {
            result.unwrap();
        }

        assert_eq!(governor.remaining(), Some(Duration::from_secs(16)));
    }

    #[test]
    fn test_ceil_millis() {
        assert_eq!(ceil_millis(Duration::from_millis(7)), 7);
        assert_eq!(ceil_millis(Duration::from_micros(7001)), 8);
        assert_eq!(ceil_millis(Duration::ZERO), 0);
    }
}
