//! Bounded-concurrency execution of provider calls.
//!
//! ```text
//! queries × providers × iterations
//!   ↓
//! QueryTask (one per triple)
//!   ↓
//! run_bounded (Semaphore + FuturesUnordered)
//!   ↓  timeout + retry per task
//! QueryResult (success or recorded failure)
//!   ↓
//! ExecutionRun::finalize → results/results.json, results/by-provider/*.json
//! ```

mod engine;
mod progress;
mod scheduler;
pub mod traits;
mod types;

pub use engine::{ExecutionEngine, ExecutionEngineBuilder};
pub use progress::ProgressMonitor;
pub use scheduler::run_bounded;
pub use traits::{emit, OutputRendererPlugin, RenderEvent, RetryStrategyPlugin};
pub use types::ExecutionOpts;
