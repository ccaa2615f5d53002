pub mod retry;

pub use retry::{ExponentialBackoffPlugin, LinearRetryPlugin, RetryConfig};
