//! Adaptive request spacing for the market-chart provider
//!
//! The upstream enforces an aggressive per-IP budget, so all market-chart
//! requests in the process share one gate: a minimum gap between requests
//! that doubles on explicit rate-limit responses and decays back toward the
//! minimum on sustained success.

use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::{debug, warn};

struct GateState {
    next_allowed_at: Instant,
    current_gap: Duration,
}

/// Shared inter-request spacing gate
pub struct RateGate {
    min_gap: Duration,
    max_gap: Duration,
    state: Mutex<GateState>,
}

impl RateGate {
    pub fn new(min_gap: Duration, max_gap: Duration) -> Self {
        Self {
            min_gap,
            max_gap,
            state: Mutex::new(GateState {
                next_allowed_at: Instant::now(),
                current_gap: min_gap,
            }),
        }
    }

    /// Reserve the next request slot, sleeping until it opens.
    ///
    /// The slot is reserved while the lock is held so concurrent callers
    /// queue in order; the sleep itself happens outside the lock.
    pub async fn acquire(&self) {
        let wait = {
            let mut state = self.state.lock().await;
            let now = Instant::now();
            let wait = state.next_allowed_at.saturating_duration_since(now);
            let slot = state.next_allowed_at.max(now);
            state.next_allowed_at = slot + state.current_gap;
            wait
        };
        if !wait.is_zero() {
            debug!("Rate gate: waiting {:?}", wait);
            tokio::time::sleep(wait).await;
        }
    }

    /// Double the gap after an explicit rate-limit response and push the
    /// next slot out by the widened gap.
    pub async fn widen(&self) {
        let mut state = self.state.lock().await;
        state.current_gap = (state.current_gap * 2).min(self.max_gap);
        state.next_allowed_at = Instant::now() + state.current_gap;
        warn!("Rate gate widened to {:?}", state.current_gap);
    }

    /// Decay the gap toward the minimum after a successful request.
    pub async fn relax(&self) {
        let mut state = self.state.lock().await;
        let reduced = state.current_gap.mul_f64(0.875);
        state.current_gap = reduced.max(self.min_gap);
    }

    /// Current gap, for tests and diagnostics
    pub async fn current_gap(&self) -> Duration {
        self.state.lock().await.current_gap
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate() -> RateGate {
        RateGate::new(Duration::from_millis(100), Duration::from_millis(800))
    }

    #[tokio::test]
    async fn test_widen_doubles_and_caps() {
        let gate = gate();
        gate.widen().await;
        assert_eq!(gate.current_gap().await, Duration::from_millis(200));
        gate.widen().await;
        gate.widen().await;
        assert_eq!(gate.current_gap().await, Duration::from_millis(800));
        gate.widen().await;
        assert_eq!(gate.current_gap().await, Duration::from_millis(800));
    }

    #[tokio::test]
    async fn test_relax_decays_to_minimum() {
        let gate = gate();
        gate.widen().await;
        gate.widen().await;
        for _ in 0..30 {
            gate.relax().await;
        }
        assert_eq!(gate.current_gap().await, Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_acquire_spaces_requests() {
        let gate = RateGate::new(Duration::from_millis(25), Duration::from_millis(200));
        let start = Instant::now();
        gate.acquire().await;
        gate.acquire().await;
        gate.acquire().await;
        // Third acquire waits for two full gaps
        assert!(start.elapsed() >= Duration::from_millis(50));
    }
}
