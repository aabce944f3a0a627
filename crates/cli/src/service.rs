use crate::config::Config;
use anyhow::{Context as AnyhowContext, Result};
use kanaja_protocol::{
    HealthResponse, SearchHit, SearchRequest, SearchResponse, StoreRequest, StoreResponse,
};
use kanaja_vector_store::{EmbeddingModel, SearchAlgorithm, VectorDb, VectorStoreError};
use std::path::PathBuf;

/// Request-level facade over the vector database and the embedder.
///
/// All methods are blocking; async callers go through `spawn_blocking`.
pub struct Service {
    db: VectorDb,
    embedder: EmbeddingModel,
    store_path: Option<PathBuf>,
    default_breadth: usize,
}

impl Service {
    /// Loads the word table (fatal on failure) and, when configured and
    /// present, the persisted store.
    pub fn open(config: &Config) -> Result<Self> {
        let embedder = EmbeddingModel::from_path(&config.words).with_context(|| {
            format!("Failed to load word vectors from {}", config.words.display())
        })?;
        let service = Self::new(
            embedder,
            VectorDb::with_params(config.hnsw),
            config.store.clone(),
            config.default_breadth,
        );

        if let Some(path) = &service.store_path {
            if path.exists() {
                service
                    .db
                    .load(path)
                    .with_context(|| format!("Failed to load store from {}", path.display()))?;
            } else {
                log::info!("No store at {path:?} yet; starting empty");
            }
        }
        Ok(service)
    }

    pub fn new(
        embedder: EmbeddingModel,
        db: VectorDb,
        store_path: Option<PathBuf>,
        default_breadth: usize,
    ) -> Self {
        Self {
            db,
            embedder,
            store_path,
            default_breadth,
        }
    }

    /// Stores the text. With a store path the file is written first, so an
    /// entry the caller never got an id for is never kept.
    pub fn store(&self, request: &StoreRequest) -> Result<StoreResponse, VectorStoreError> {
        let id = match &self.store_path {
            Some(path) => self.db.add_text_and_save(&self.embedder, &request.text, path)?,
            None => self.db.add_text(&self.embedder, &request.text)?,
        };
        Ok(StoreResponse { id })
    }

    pub fn search(&self, request: &SearchRequest) -> Result<SearchResponse, VectorStoreError> {
        let k = usize::try_from(request.k)
            .ok()
            .filter(|k| *k > 0)
            .ok_or(VectorStoreError::InvalidK)?;
        let breadth = request.breadth.unwrap_or(self.default_breadth);
        let algorithm = SearchAlgorithm::parse(&request.algorithm, breadth)?;

        let results = self
            .db
            .search_text(&self.embedder, &request.text, k, algorithm)?
            .into_iter()
            .map(|result| SearchHit {
                id: result.id,
                score: result.score,
            })
            .collect();
        Ok(SearchResponse { results })
    }

    pub fn health(&self) -> HealthResponse {
        HealthResponse {
            status: "ok".to_string(),
            vectors: self.db.len(),
            dimension: self.db.dimension(),
        }
    }

    /// Writes the store out if a path is configured.
    pub fn persist(&self) -> Result<(), VectorStoreError> {
        match &self.store_path {
            Some(path) => self.db.save(path),
            None => Ok(()),
        }
    }
}
