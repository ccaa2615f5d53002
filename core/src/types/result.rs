use serde::{Deserialize, Serialize};

use super::SCHEMA_VERSION;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

/// Outcome of one (query, provider, iteration) task.
///
/// Success and failure share the record; `error.is_some()` is the
/// discriminant and a failed result carries an empty `response`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub query_id: String,
    pub query_text: String,
    pub provider: String,
    pub model: String,
    pub response: String,
    pub latency_ms: u64,
    #[serde(default)]
    pub token_usage: Option<TokenUsage>,
    #[serde(default = "default_iteration")]
    pub iteration: u32,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default = "default_attempts")]
    pub attempts: u32,
}

fn default_iteration() -> u32 {
    1
}

fn default_attempts() -> u32 {
    1
}

impl QueryResult {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// A successful result with a non-empty body, usable by analysis.
    pub fn is_usable(&self) -> bool {
        self.error.is_none() && !self.response.trim().is_empty()
    }

    /// Stable id used to key per-response artifacts such as ranked lists.
    pub fn response_key(&self) -> String {
        format!("{}:{}:{}", self.provider, self.query_id, self.iteration)
    }

    pub fn task_key(&self) -> (String, String, u32) {
        (self.query_id.clone(), self.provider.clone(), self.iteration)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    #[default]
    Running,
    Completed,
    Partial,
    Failed,
}

impl ExecutionStatus {
    /// completed iff no failures and at least one success; failed iff no
    /// successes; partial otherwise.
    pub fn derive(completed: usize, failed: usize) -> Self {
        match (completed, failed) {
            (0, _) => Self::Failed,
            (_, 0) => Self::Completed,
            _ => Self::Partial,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionRun {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,
    pub run_id: String,
    pub brand: String,
    pub providers: Vec<String>,
    pub total_queries: usize,
    #[serde(default)]
    pub completed_queries: usize,
    #[serde(default)]
    pub failed_queries: usize,
    #[serde(default)]
    pub results: Vec<QueryResult>,
    #[serde(default)]
    pub started_at: String,
    #[serde(default)]
    pub completed_at: Option<String>,
    #[serde(default)]
    pub status: ExecutionStatus,
}

fn default_schema_version() -> String {
    SCHEMA_VERSION.to_string()
}

impl ExecutionRun {
    pub fn new(
        run_id: impl Into<String>,
        brand: impl Into<String>,
        providers: Vec<String>,
        total_queries: usize,
    ) -> Self {
        Self {
            schema_version: default_schema_version(),
            run_id: run_id.into(),
            brand: brand.into(),
            providers,
            total_queries,
            completed_queries: 0,
            failed_queries: 0,
            results: Vec::with_capacity(total_queries),
            started_at: chrono::Utc::now().to_rfc3339(),
            completed_at: None,
            status: ExecutionStatus::Running,
        }
    }

    /// Tally counts and derive the status from the collected results.
    pub fn finalize(&mut self) {
        self.completed_queries = self.results.iter().filter(|r| r.is_success()).count();
        self.failed_queries = self.results.len() - self.completed_queries;
        self.status = ExecutionStatus::derive(self.completed_queries, self.failed_queries);
        self.completed_at = Some(chrono::Utc::now().to_rfc3339());
    }

    pub fn usable_results(&self) -> impl Iterator<Item = &QueryResult> {
        self.results.iter().filter(|r| r.is_usable())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_derivation() {
        assert_eq!(ExecutionStatus::derive(3, 0), ExecutionStatus::Completed);
        assert_eq!(ExecutionStatus::derive(2, 1), ExecutionStatus::Partial);
        assert_eq!(ExecutionStatus::derive(0, 4), ExecutionStatus::Failed);
        assert_eq!(ExecutionStatus::derive(0, 0), ExecutionStatus::Failed);
    }

    #[test]
    fn older_results_without_attempts_still_load() {
        let raw = r#"{
            "query_id": "q1", "query_text": "best crm", "provider": "openai",
            "model": "gpt", "response": "HubSpot", "latency_ms": 12
        }"#;
        let r: QueryResult = serde_json::from_str(raw).unwrap();
        assert_eq!(r.iteration, 1);
        assert_eq!(r.attempts, 1);
        assert!(r.is_usable());
        assert_eq!(r.response_key(), "openai:q1:1");
    }
}
