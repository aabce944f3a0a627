//! # Kanaja Vector Store
//!
//! Small in-memory vector similarity engine for short texts.
//!
//! ## Features
//!
//! - **Word-vector embeddings**: mean-pooled GloVe-style vectors, zero-padded
//!   to a multiple of 4
//! - **Exact k-NN** by full cosine scan
//! - **Approximate search** over a navigable proximity graph
//! - **Persistent storage** with JSON serialization (the graph is rebuilt on load)
//! - **Reader-writer locking** around store and index
//!
//! ## Architecture
//!
//! ```text
//! text
//!   │
//!   ├──> EmbeddingModel (word table, mean pooling)
//!   │      └─> Vec<f32> (len % 4 == 0)
//!   │
//!   └──> VectorDb (RwLock)
//!          ├─> VectorStore  id -> {vector, text}  ──> ExactSearch
//!          ├─> KeyMap       id <-> u64 key
//!          └─> HnswIndex    u64 key -> graph node ──> ApproximateSearch
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use kanaja_vector_store::{EmbeddingModel, SearchAlgorithm, VectorDb};
//!
//! fn main() -> kanaja_vector_store::Result<()> {
//!     let embedder = EmbeddingModel::from_path("glove.6B.50d.txt")?;
//!     let db = VectorDb::new();
//!
//!     db.add_text(&embedder, "hello world")?;
//!     db.add_text(&embedder, "greetings friend")?;
//!
//!     let results = db.search_text(&embedder, "greetings earthling", 1, SearchAlgorithm::Exact)?;
//!     for result in results {
//!         println!("{}: {:.3}", result.id, result.score);
//!     }
//!
//!     db.save("vectors.json")?;
//!     Ok(())
//! }
//! ```

mod db;
mod embeddings;
mod error;
mod hnsw_index;
mod keys;
pub mod persistence;
mod search;
mod similarity;
mod store;
mod types;

pub use db::VectorDb;
pub use embeddings::{padded_dimension, Embedder, EmbeddingModel, EMBEDDING_ALIGNMENT};
pub use error::{ErrorKind, Result, VectorStoreError};
pub use hnsw_index::{
    HnswIndex, HnswParams, DEFAULT_BREADTH, DEFAULT_EF_CONSTRUCTION, DEFAULT_MAX_NEIGHBORS,
};
pub use keys::{IndexKey, KeyMap};
pub use search::{ApproximateSearch, ExactSearch, NearestNeighbors, SearchAlgorithm};
pub use similarity::cosine_similarity;
pub use store::VectorStore;
pub use types::{SearchResult, StoredVector, VectorEntry};
