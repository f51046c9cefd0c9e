//! Reconnection policy for the engine link.

use std::time::Duration;

pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(2000);
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_millis(10_000);
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub max_attempts: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl ReconnectPolicy {
    /// Delay before the given 1-based attempt: linear in the attempt number,
    /// capped at `max_delay`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt).min(self.max_delay)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    RetryAfter(Duration),
    /// Attempts are exhausted. Nothing more happens until a re-arm.
    GiveUp,
}

/// Tracks consecutive failed connection attempts.
#[derive(Debug, Clone)]
pub struct Supervisor {
    policy: ReconnectPolicy,
    attempts: u32,
    parked: bool,
}

impl Supervisor {
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self {
            policy,
            attempts: 0,
            parked: false,
        }
    }

    pub fn set_policy(&mut self, policy: ReconnectPolicy) {
        self.policy = policy;
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// True once attempts ran out and no re-arm has happened since.
    pub fn is_parked(&self) -> bool {
        self.parked
    }

    /// The link dropped or a connect failed: decide whether to try again.
    pub fn next_attempt(&mut self) -> RetryDecision {
        if self.parked {
            return RetryDecision::GiveUp;
        }
        if self.attempts >= self.policy.max_attempts {
            tracing::warn!(
                "Giving up on engine after {} reconnect attempts",
                self.attempts
            );
            self.parked = true;
            return RetryDecision::GiveUp;
        }
        self.attempts += 1;
        let delay = self.policy.delay_for(self.attempts);
        tracing::info!(
            "Reconnecting to engine in {:?} (attempt {}/{})",
            delay,
            self.attempts,
            self.policy.max_attempts
        );
        RetryDecision::RetryAfter(delay)
    }

    /// A connection came up.
    pub fn on_connected(&mut self) {
        self.attempts = 0;
        self.parked = false;
    }

    /// Explicit re-arm after giving up.
    pub fn rearm(&mut self) {
        tracing::info!("Reconnect supervisor re-armed");
        self.attempts = 0;
        self.parked = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_capped_backoff() {
        let policy = ReconnectPolicy::default();
        assert_eq!(policy.delay_for(1), Duration::from_millis(2000));
        assert_eq!(policy.delay_for(3), Duration::from_millis(6000));
        assert_eq!(policy.delay_for(5), Duration::from_millis(10_000));
        assert_eq!(policy.delay_for(9), Duration::from_millis(10_000));
    }

    #[test]
    fn test_gives_up_after_max_attempts() {
        let mut sup = Supervisor::new(ReconnectPolicy::default());
        let delays: Vec<_> = (0..5).map(|_| sup.next_attempt()).collect();
        assert_eq!(
            delays,
            vec![
                RetryDecision::RetryAfter(Duration::from_millis(2000)),
                RetryDecision::RetryAfter(Duration::from_millis(4000)),
                RetryDecision::RetryAfter(Duration::from_millis(6000)),
                RetryDecision::RetryAfter(Duration::from_millis(8000)),
                RetryDecision::RetryAfter(Duration::from_millis(10_000)),
            ]
        );
        assert_eq!(sup.next_attempt(), RetryDecision::GiveUp);
        assert!(sup.is_parked());
        assert_eq!(sup.next_attempt(), RetryDecision::GiveUp);
    }

    #[test]
    fn test_success_resets_counter() {
        let mut sup = Supervisor::new(ReconnectPolicy::default());
        sup.next_attempt();
        sup.next_attempt();
        sup.on_connected();
        assert_eq!(sup.attempts(), 0);
        assert_eq!(
            sup.next_attempt(),
            RetryDecision::RetryAfter(Duration::from_millis(2000))
        );
    }

    #[test]
    fn test_rearm_after_giving_up() {
        let mut sup = Supervisor::new(ReconnectPolicy {
            max_attempts: 1,
            ..Default::default()
        });
        sup.next_attempt();
        assert_eq!(sup.next_attempt(), RetryDecision::GiveUp);
        sup.rearm();
        assert!(!sup.is_parked());
        assert!(matches!(sup.next_attempt(), RetryDecision::RetryAfter(_)));
    }
}
