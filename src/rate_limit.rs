use dashmap::DashMap;
use std::time::{Duration, Instant};

/// Outcome of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Admitted { remaining: u32 },
    Rejected { retry_after_minutes: u64 },
}

/// Sliding-log rate limiter keyed by client identity.
///
/// Each identity maps to the timestamps of its admitted requests. On every
/// check the log is pruned to the trailing window before the count is
/// compared against the limit, so the window slides continuously instead of
/// resetting on a boundary. Rejected checks are never recorded - only
/// admitted requests consume budget, so a client probing while throttled
/// cannot lock itself out indefinitely.
pub struct RateLimiter {
    log: DashMap<String, Vec<Instant>>,
    limit: usize,
    window: Duration,
}

impl RateLimiter {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            log: DashMap::new(),
            limit: limit as usize,
            window,
        }
    }

    pub fn limit(&self) -> u32 {
        self.limit as u32
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn check(&self, identity: &str) -> Decision {
        self.check_at(identity, Instant::now())
    }

    /// Admission check with an injected clock.
    ///
    /// The entry guard holds the identity's shard for the whole
    /// prune/compare/append sequence, so two concurrent requests cannot both
    /// take the last slot. The guard is dropped before this returns; no lock
    /// is ever held across an upstream call.
    pub fn check_at(&self, identity: &str, now: Instant) -> Decision {
        let mut entry = self.log.entry(identity.to_string()).or_default();

        // drop timestamps that have aged out of the window
        entry.retain(|&t| now.duration_since(t) < self.window);

        if entry.len() >= self.limit {
            // the oldest admitted request decides when a slot frees up
            let oldest = *entry.iter().min().unwrap_or(&now);
            let until_reset = (oldest + self.window).saturating_duration_since(now);
            let retry_after_minutes = (until_reset.as_millis() as u64).div_ceil(60_000).max(1);
            return Decision::Rejected { retry_after_minutes };
        }

        entry.push(now);
        Decision::Admitted {
            remaining: (self.limit - entry.len()) as u32,
        }
    }

    /// Remove identities whose every timestamp has aged out of the window.
    /// Pruning is otherwise lazy, so an identity never seen again would hold
    /// its map slot forever without this.
    pub fn evict_stale(&self, now: Instant) {
        self.log
            .retain(|_, stamps| stamps.iter().any(|&t| now.duration_since(t) < self.window));
    }

    #[cfg(test)]
    fn tracked_identities(&self) -> usize {
        self.log.len()
    }
}

/// Periodic eviction of stale identities, spawned as a background task.
pub async fn sweep_loop(limiter: std::sync::Arc<RateLimiter>, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;
        limiter.evict_stale(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_secs(900);

    fn limiter() -> RateLimiter {
        RateLimiter::new(6, WINDOW)
    }

    #[test]
    fn admits_up_to_limit_with_decreasing_remaining() {
        let rl = limiter();
        let now = Instant::now();
        for expected in (0..6).rev() {
            assert_eq!(
                rl.check_at("client", now),
                Decision::Admitted { remaining: expected }
            );
        }
        assert!(matches!(rl.check_at("client", now), Decision::Rejected { .. }));
    }

    #[test]
    fn rejections_do_not_consume_budget() {
        let rl = limiter();
        let start = Instant::now();
        for _ in 0..6 {
            rl.check_at("client", start);
        }

        // probing while throttled leaves the log untouched
        for _ in 0..10 {
            assert!(matches!(rl.check_at("client", start), Decision::Rejected { .. }));
        }

        // once the oldest stamp ages out, a slot frees up
        let later = start + WINDOW;
        assert!(matches!(rl.check_at("client", later), Decision::Admitted { .. }));
    }

    #[test]
    fn retry_after_is_ceil_of_remaining_window() {
        let rl = limiter();
        let start = Instant::now();
        for _ in 0..6 {
            rl.check_at("client", start);
        }

        // nearly the full window left rounds up to 15 minutes
        assert_eq!(
            rl.check_at("client", start + Duration::from_millis(1)),
            Decision::Rejected { retry_after_minutes: 15 }
        );

        // 14m30s left still rounds up to 15; 13m59s rounds up to 14
        assert_eq!(
            rl.check_at("client", start + Duration::from_secs(30)),
            Decision::Rejected { retry_after_minutes: 15 }
        );
        assert_eq!(
            rl.check_at("client", start + Duration::from_secs(61)),
            Decision::Rejected { retry_after_minutes: 14 }
        );

        // never reports zero, even just before the slot frees
        assert_eq!(
            rl.check_at("client", start + WINDOW - Duration::from_millis(1)),
            Decision::Rejected { retry_after_minutes: 1 }
        );
    }

    #[test]
    fn identities_have_independent_budgets() {
        let rl = RateLimiter::new(2, WINDOW);
        let now = Instant::now();
        assert!(matches!(rl.check_at("a", now), Decision::Admitted { remaining: 1 }));
        assert!(matches!(rl.check_at("a", now), Decision::Admitted { remaining: 0 }));
        assert!(matches!(rl.check_at("a", now), Decision::Rejected { .. }));
        assert!(matches!(rl.check_at("b", now), Decision::Admitted { remaining: 1 }));
    }

    #[test]
    fn window_slides_instead_of_resetting() {
        let rl = RateLimiter::new(2, WINDOW);
        let start = Instant::now();
        rl.check_at("client", start);
        rl.check_at("client", start + Duration::from_secs(600));
        assert!(matches!(
            rl.check_at("client", start + Duration::from_secs(700)),
            Decision::Rejected { .. }
        ));
        // the first stamp ages out at start+900; the one from t=600 still counts
        assert!(matches!(
            rl.check_at("client", start + Duration::from_secs(901)),
            Decision::Admitted { remaining: 0 }
        ));
    }

    #[test]
    fn evict_stale_drops_aged_out_identities() {
        let rl = limiter();
        let start = Instant::now();
        rl.check_at("old", start);
        rl.check_at("fresh", start + WINDOW);
        assert_eq!(rl.tracked_identities(), 2);

        rl.evict_stale(start + WINDOW + Duration::from_secs(1));
        assert_eq!(rl.tracked_identities(), 1);
    }
}
