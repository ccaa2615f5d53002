use std::time::Duration;

use crate::error::ProviderError;

/// Retry policy for a single execution task.
///
/// `attempt` is the number of attempts already made (1 after the first
/// failure).
pub trait RetryStrategyPlugin: Send + Sync {
    fn name(&self) -> &str;

    /// Delay before the next attempt, or `None` to stop retrying.
    fn next_delay(&self, attempt: u32, error: &ProviderError) -> Option<Duration>;

    /// Total attempts including the first.
    fn max_attempts(&self) -> u32;

    fn should_retry(&self, attempt: u32, error: &ProviderError) -> bool {
        attempt < self.max_attempts() && error.is_retryable() && !self.is_fatal_error(error)
    }

    fn is_fatal_error(&self, _error: &ProviderError) -> bool {
        false
    }
}
