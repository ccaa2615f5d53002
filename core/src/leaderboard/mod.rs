//! Category-wide leaderboard: a six-phase resumable flow that discovers the
//! brands AI models recommend and ranks them.

mod category;
mod orchestrator;
mod phase;

pub use category::{fetch_category_context, CATEGORY_PROMPT_MARKER};
pub use orchestrator::{LeaderboardArgs, LeaderboardOrchestrator, DEFAULT_MAX_BRANDS};
pub use phase::LeaderboardPhase;
