use std::time::Duration;

use crate::config::ExecutionConfig;

/// Knobs for one execution fan-out.
#[derive(Debug, Clone)]
pub struct ExecutionOpts {
    pub concurrency: usize,
    pub iterations: u32,
    pub timeout: Duration,
    /// Show an indicatif progress bar on stderr.
    pub show_progress: bool,
    /// Emit a progress log line every N finished tasks.
    pub log_every: usize,
}

impl Default for ExecutionOpts {
    fn default() -> Self {
        Self::from_config(&ExecutionConfig::default())
    }
}

impl ExecutionOpts {
    pub fn from_config(cfg: &ExecutionConfig) -> Self {
        Self {
            concurrency: cfg.concurrency.max(1),
            iterations: cfg.iterations.max(1),
            timeout: Duration::from_millis(cfg.timeout_ms),
            show_progress: false,
            log_every: 5,
        }
    }
}
