use serde::{Deserialize, Serialize};

use super::SCHEMA_VERSION;

/// Contents of `metadata.json` at the root of every run directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub run_id: String,
    #[serde(default = "default_kind")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub brands: Vec<String>,
    pub started_at: String,
    #[serde(default)]
    pub completed_at: Option<String>,
    pub status: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
    #[serde(default = "default_schema")]
    pub schema_version: String,
}

fn default_kind() -> String {
    "run".to_string()
}

fn default_schema() -> String {
    SCHEMA_VERSION.to_string()
}

impl RunMetadata {
    pub fn new(run_id: impl Into<String>, kind: &str, started_at: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            kind: kind.to_string(),
            brand: None,
            category: None,
            brands: Vec::new(),
            started_at: started_at.into(),
            completed_at: None,
            status: "running".to_string(),
            errors: Vec::new(),
            schema_version: default_schema(),
        }
    }

    pub fn finish(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self.completed_at = Some(chrono::Utc::now().to_rfc3339());
        self
    }
}
