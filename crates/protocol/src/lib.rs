use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Algorithm name used when a search request omits one.
pub const DEFAULT_ALGORITHM: &str = "exact";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct StoreRequest {
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct StoreResponse {
    pub id: String,
}

/// `k` is signed so that non-positive values reach the engine and fail there
/// as `invalid_k` rather than as a decoding error.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub text: String,
    pub k: i64,
    #[serde(default = "default_algorithm")]
    pub algorithm: String,
    /// Explore-width for approximate search; server default when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub breadth: Option<usize>,
}

fn default_algorithm() -> String {
    DEFAULT_ALGORITHM.to_string()
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SearchHit {
    pub id: String,
    pub score: f32,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct SearchResponse {
    pub results: Vec<SearchHit>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: String,
    pub vectors: usize,
    pub dimension: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ErrorEnvelope {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorEnvelope {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            hint: None,
        }
    }

    #[must_use]
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

pub fn serialize_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(Into::into)
}
