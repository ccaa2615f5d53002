use std::fmt;
use std::str::FromStr;

use crate::error::GeoError;

/// Leaderboard phases in execution order. The string forms are the
/// `stop_after` contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LeaderboardPhase {
    CategoryContext,
    QueryGeneration,
    Execution,
    Extraction,
    Analysis,
    Ranking,
}

impl LeaderboardPhase {
    pub const ALL: [LeaderboardPhase; 6] = [
        Self::CategoryContext,
        Self::QueryGeneration,
        Self::Execution,
        Self::Extraction,
        Self::Analysis,
        Self::Ranking,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::CategoryContext => "category-context",
            Self::QueryGeneration => "query-generation",
            Self::Execution => "execution",
            Self::Extraction => "extraction",
            Self::Analysis => "analysis",
            Self::Ranking => "ranking",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::CategoryContext => "Resolve category context",
            Self::QueryGeneration => "Generate leaderboard queries",
            Self::Execution => "Query every provider",
            Self::Extraction => "Extract and deduplicate brands",
            Self::Analysis => "Analyze each brand",
            Self::Ranking => "Rank brands and write reports",
        }
    }
}

impl fmt::Display for LeaderboardPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LeaderboardPhase {
    type Err = GeoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| {
                let valid: Vec<&str> = Self::ALL.iter().map(|p| p.as_str()).collect();
                GeoError::Config(format!(
                    "unknown leaderboard phase '{s}' for stop_after. Valid: {}",
                    valid.join(", ")
                ))
            })
    }
}
