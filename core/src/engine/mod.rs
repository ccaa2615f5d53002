//! Single-brand run entry point: resume/preload (pre) → staged pipeline
//! (run) → metadata finalisation (post).

mod post;
mod pre;
mod run;
mod types;

pub use run::{build_pipeline, GeoEngine};
pub use types::{GeoRunArgs, GeoRunOutcome};
