use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What to do when a thread already has a generation in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPolicy {
    /// Refuse the new submission
    #[default]
    Reject,
    /// Cancel the running generation and start the new one
    CancelAndReplace,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Runs allowed to execute at the same time
    pub max_concurrency: usize,
    /// Runs allowed to wait for a free slot
    pub queue_depth: usize,
    pub settle_delay: Duration,
    pub session_policy: SessionPolicy,
    pub listing_limit: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 4,
            queue_depth: 16,
            settle_delay: Duration::from_secs(3),
            session_policy: SessionPolicy::Reject,
            listing_limit: 50,
        }
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = max.max(1);
        self
    }

    pub fn with_queue_depth(mut self, depth: usize) -> Self {
        self.queue_depth = depth;
        self
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    pub fn with_session_policy(mut self, policy: SessionPolicy) -> Self {
        self.session_policy = policy;
        self
    }

    pub fn with_listing_limit(mut self, limit: usize) -> Self {
        self.listing_limit = limit;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_queue_limits() {
        let config = PipelineConfig::default();
        assert_eq!(config.max_concurrency, 4);
        assert_eq!(config.queue_depth, 16);
        assert_eq!(config.session_policy, SessionPolicy::Reject);
    }

    #[test]
    fn test_concurrency_never_zero() {
        let config = PipelineConfig::new().with_max_concurrency(0);
        assert_eq!(config.max_concurrency, 1);
    }
}
