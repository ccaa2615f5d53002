pub mod analysis;
pub mod api;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod executor;
pub mod extract;
pub mod leaderboard;
pub mod pipeline;
pub mod provider;
pub mod queries;
pub mod report;
pub mod stages;
pub mod storage;
pub mod types;
pub mod util;

#[cfg(test)]
pub(crate) mod testing;
