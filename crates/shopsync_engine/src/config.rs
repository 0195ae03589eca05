//! Configuration for loading and syncing.

/// What the applier does when a single entity fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Abort the walk and return the error.
    #[default]
    FailFast,
    /// Record the failure and carry on with siblings and independent subtrees.
    ContinueOnFailure,
}

/// Configuration for a reconciliation run.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Failure policy for the applier.
    pub failure_policy: FailurePolicy,
    /// Number of concurrent workers used while loading.
    pub workers: usize,
}

impl SyncConfig {
    /// Creates a configuration with defaults (fail fast, 10 workers).
    pub fn new() -> Self {
        Self {
            failure_policy: FailurePolicy::FailFast,
            workers: 10,
        }
    }

    /// Sets the failure policy.
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Shorthand for [`FailurePolicy::ContinueOnFailure`].
    pub fn continue_on_failure(self) -> Self {
        self.with_failure_policy(FailurePolicy::ContinueOnFailure)
    }

    /// Sets the worker count. Zero is raised to one.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sync_config_builder() {
        let config = SyncConfig::new();
        assert_eq!(config.failure_policy, FailurePolicy::FailFast);
        assert_eq!(config.workers, 10);

        let config = SyncConfig::new().continue_on_failure().with_workers(0);
        assert_eq!(config.failure_policy, FailurePolicy::ContinueOnFailure);
        assert_eq!(config.workers, 1);
    }
}
