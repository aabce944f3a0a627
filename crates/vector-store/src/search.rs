use crate::error::{Result, VectorStoreError};
use crate::hnsw_index::{HnswIndex, DEFAULT_BREADTH};
use crate::keys::KeyMap;
use crate::similarity::{cosine_similarity, is_finite, is_zero};
use crate::store::VectorStore;
use crate::types::SearchResult;
use std::fmt;

/// A way of answering "which stored vectors are closest to this one".
pub trait NearestNeighbors {
    /// Up to `k` results ordered by non-increasing similarity.
    fn nearest(&self, query: &[f32], k: usize) -> Result<Vec<SearchResult>>;
}

/// Which [`NearestNeighbors`] implementation serves a query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SearchAlgorithm {
    /// Full scan over the store.
    #[default]
    Exact,
    /// Graph walk over the index with the given explore-width.
    Approximate { breadth: usize },
}

impl SearchAlgorithm {
    pub const fn approximate() -> Self {
        Self::Approximate {
            breadth: DEFAULT_BREADTH,
        }
    }

    /// Accepts `exact`/`knn` and `approximate`/`ann`, case-insensitively.
    pub fn parse(name: &str, breadth: usize) -> Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "exact" | "knn" => Ok(Self::Exact),
            "approximate" | "ann" => Ok(Self::Approximate { breadth }),
            _ => Err(VectorStoreError::UnknownAlgorithm(name.to_string())),
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Approximate { .. } => "approximate",
        }
    }
}

impl fmt::Display for SearchAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact => f.write_str("exact"),
            Self::Approximate { breadth } => write!(f, "approximate(breadth={breadth})"),
        }
    }
}

/// Brute-force cosine ranking; O(n·D) per query.
#[derive(Debug, Clone, Copy)]
pub struct ExactSearch<'a> {
    store: &'a VectorStore,
}

impl<'a> ExactSearch<'a> {
    pub const fn new(store: &'a VectorStore) -> Self {
        Self { store }
    }
}

impl NearestNeighbors for ExactSearch<'_> {
    fn nearest(&self, query: &[f32], k: usize) -> Result<Vec<SearchResult>> {
        validate_query(query, k, self.store.dimension())?;

        let mut results = self
            .store
            .iter()
            .map(|(id, stored)| {
                cosine_similarity(query, &stored.vector).map(|score| SearchResult {
                    id: id.to_string(),
                    score,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        // Higher similarity first; id order only makes ties reproducible.
        results.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id)));
        results.truncate(k);
        Ok(results)
    }
}

/// Index walk whose numeric keys are resolved back to ids via [`KeyMap`].
#[derive(Debug, Clone, Copy)]
pub struct ApproximateSearch<'a> {
    index: &'a HnswIndex,
    keys: &'a KeyMap,
    breadth: usize,
}

impl<'a> ApproximateSearch<'a> {
    pub const fn new(index: &'a HnswIndex, keys: &'a KeyMap, breadth: usize) -> Self {
        Self {
            index,
            keys,
            breadth,
        }
    }
}

impl NearestNeighbors for ApproximateSearch<'_> {
    fn nearest(&self, query: &[f32], k: usize) -> Result<Vec<SearchResult>> {
        validate_query(query, k, self.index.dimension())?;

        let matches = self.index.search(query, k, self.breadth)?;
        let mut results = Vec::with_capacity(matches.len());
        for (key, score) in matches {
            match self.keys.id_of(key) {
                Some(id) => results.push(SearchResult {
                    id: id.to_string(),
                    score,
                }),
                None => log::warn!("Index returned unmapped key {key:#x}; skipping"),
            }
        }
        Ok(results)
    }
}

fn validate_query(query: &[f32], k: usize, dimension: Option<usize>) -> Result<()> {
    if k == 0 {
        return Err(VectorStoreError::InvalidK);
    }
    if let Some(expected) = dimension {
        if query.len() != expected {
            return Err(VectorStoreError::DimensionMismatch {
                expected,
                actual: query.len(),
            });
        }
    }
    if !is_finite(query) {
        return Err(VectorStoreError::NonFiniteVector);
    }
    if is_zero(query) {
        return Err(VectorStoreError::ZeroVector);
    }
    Ok(())
}
