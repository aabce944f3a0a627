use serde::{Deserialize, Serialize};

/// A stored vector together with the text it was embedded from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredVector {
    pub vector: Vec<f32>,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VectorEntry {
    pub id: String,
    pub vector: Vec<f32>,
    pub text: String,
}

impl VectorEntry {
    pub fn new(id: impl Into<String>, vector: Vec<f32>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            vector,
            text: text.into(),
        }
    }

    pub(crate) fn into_parts(self) -> (String, StoredVector) {
        (
            self.id,
            StoredVector {
                vector: self.vector,
                text: self.text,
            },
        )
    }
}

/// One ranked hit. `score` is cosine similarity: higher is closer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: String,
    pub score: f32,
}
