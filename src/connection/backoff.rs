//! Reconnect delay policy and the single pending reconnect deadline

use std::time::Duration;
use tokio::time::{Instant, sleep_until};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackoffPolicy {
    pub min: Duration,
    pub max: Duration,
    pub factor: f64,
}

impl BackoffPolicy {
    /// Builds a policy with `max >= min` and a factor of at least 1
    pub fn new(min: Duration, max: Duration, factor: f64) -> Self {
        let factor = if factor.is_finite() { factor.max(1.0) } else { 1.0 };
        Self {
            min,
            max: max.max(min),
            factor,
        }
    }
}

/// Consecutive-failure delay: starts at `min`, grows by `factor`, capped at `max`
#[derive(Debug, Clone)]
pub struct Backoff {
    policy: BackoffPolicy,
    current: Duration,
}

impl Backoff {
    pub fn new(policy: BackoffPolicy) -> Self {
        Self {
            current: policy.min,
            policy,
        }
    }

    /// Delay for this failure; the following one waits longer
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        let grown_ms = (self.current.as_millis() as f64 * self.policy.factor).round() as u64;
        self.current = Duration::from_millis(grown_ms).min(self.policy.max);
        delay
    }

    /// Called on a successful open
    pub fn reset(&mut self) {
        self.current = self.policy.min;
    }

    pub fn current(&self) -> Duration {
        self.current
    }
}

/// At most one pending reconnect; scheduling replaces the previous deadline
#[derive(Debug, Default)]
pub struct ReconnectTimer {
    deadline: Option<Instant>,
}

impl ReconnectTimer {
    pub fn schedule(&mut self, delay: Duration) {
        self.deadline = Some(Instant::now() + delay);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Resolves when the pending deadline passes; never resolves when idle
    pub async fn fired(&mut self) {
        match self.deadline {
            Some(deadline) => {
                sleep_until(deadline).await;
                self.deadline = None;
            }
            None => std::future::pending::<()>().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> BackoffPolicy {
        BackoffPolicy::new(Duration::from_millis(800), Duration::from_millis(4000), 1.4)
    }

    #[test]
    fn test_delays_non_decreasing_and_bounded() {
        let mut backoff = Backoff::new(policy());
        let mut previous = Duration::ZERO;
        for _ in 0..20 {
            let delay = backoff.next_delay();
            assert!(delay >= previous);
            assert!(delay <= Duration::from_millis(4000));
            previous = delay;
        }
        assert_eq!(previous, Duration::from_millis(4000));
    }

    #[test]
    fn test_growth_sequence() {
        let mut backoff = Backoff::new(policy());
        assert_eq!(backoff.next_delay(), Duration::from_millis(800));
        assert_eq!(backoff.next_delay(), Duration::from_millis(1120));
        assert_eq!(backoff.next_delay(), Duration::from_millis(1568));
    }

    #[test]
    fn test_reset_after_open() {
        let mut backoff = Backoff::new(policy());
        for _ in 0..5 {
            backoff.next_delay();
        }
        backoff.reset();
        assert_eq!(backoff.next_delay(), Duration::from_millis(800));
    }

    #[test]
    fn test_policy_normalized() {
        let policy = BackoffPolicy::new(Duration::from_secs(2), Duration::from_secs(1), 0.2);
        assert_eq!(policy.max, Duration::from_secs(2));
        assert_eq!(policy.factor, 1.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_schedule_replaces_pending_deadline() {
        let mut timer = ReconnectTimer::default();
        timer.schedule(Duration::from_secs(10));
        let first = timer.deadline();
        timer.schedule(Duration::from_millis(800));

        assert!(timer.is_pending());
        assert!(timer.deadline() < first);

        let started = Instant::now();
        timer.fired().await;
        assert_eq!(started.elapsed(), Duration::from_millis(800));
        assert!(!timer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_timer_never_fires() {
        let mut timer = ReconnectTimer::default();
        timer.schedule(Duration::from_millis(800));
        timer.cancel();

        let fired = tokio::time::timeout(Duration::from_secs(5), timer.fired()).await;
        assert!(fired.is_err());
    }
}
