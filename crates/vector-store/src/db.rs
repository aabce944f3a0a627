use crate::embeddings::Embedder;
use crate::error::{Result, VectorStoreError};
use crate::hnsw_index::{HnswIndex, HnswParams};
use crate::keys::KeyMap;
use crate::search::{ApproximateSearch, ExactSearch, NearestNeighbors, SearchAlgorithm};
use crate::store::VectorStore;
use crate::types::{SearchResult, StoredVector, VectorEntry};
use parking_lot::RwLock;
use std::io::{Read, Write};
use std::path::Path;

struct DbState {
    store: VectorStore,
    keys: KeyMap,
    index: HnswIndex,
}

impl DbState {
    fn new(params: HnswParams) -> Self {
        Self {
            store: VectorStore::new(),
            keys: KeyMap::new(),
            index: HnswIndex::new(params),
        }
    }

    fn insert(&mut self, entry: VectorEntry) -> Result<()> {
        self.store.check_new(&entry.id, &entry.vector)?;
        let key = self.keys.assign(&entry.id);
        self.index.insert(key, &entry.vector)?;
        self.store.add(entry)
    }

    /// Rebuilds key map and index from the store, in id order so key
    /// probing is reproducible.
    fn rebuild_index(&mut self) -> Result<()> {
        self.keys.clear();
        self.index.clear();
        let mut ids = self.store.ids();
        ids.sort_unstable();
        for id in ids {
            let Some(stored) = self.store.get(&id) else {
                continue;
            };
            let key = self.keys.assign(&id);
            self.index.insert(key, &stored.vector)?;
        }
        Ok(())
    }
}

/// Store plus approximate index, kept in lockstep behind one reader-writer
/// lock: searches share the read side, inserts and loads take the write side,
/// so no reader ever sees a half-linked node.
pub struct VectorDb {
    state: RwLock<DbState>,
    params: HnswParams,
}

impl Default for VectorDb {
    fn default() -> Self {
        Self::new()
    }
}

impl VectorDb {
    pub fn new() -> Self {
        Self::with_params(HnswParams::default())
    }

    pub fn with_params(params: HnswParams) -> Self {
        Self {
            state: RwLock::new(DbState::new(params)),
            params,
        }
    }

    pub fn add(&self, entry: VectorEntry) -> Result<()> {
        let id = entry.id.clone();
        self.state.write().insert(entry)?;
        log::debug!("Added vector '{id}'");
        Ok(())
    }

    /// Embeds `text`, stores it under a fresh UUID and returns that id.
    pub fn add_text(&self, embedder: &impl Embedder, text: &str) -> Result<String> {
        let vector = embedder.embed(text)?;
        let id = uuid::Uuid::new_v4().to_string();
        self.add(VectorEntry::new(id.clone(), vector, text))?;
        Ok(id)
    }

    /// Like [`VectorDb::add_text`], but first writes the store including the
    /// new entry to `path`. The entry only becomes visible once that write
    /// succeeds, so a failed save leaves the database unchanged.
    pub fn add_text_and_save(
        &self,
        embedder: &impl Embedder,
        text: &str,
        path: impl AsRef<Path>,
    ) -> Result<String> {
        let vector = embedder.embed(text)?;
        let id = uuid::Uuid::new_v4().to_string();

        let mut state = self.state.write();
        state.store.check_new(&id, &vector)?;
        let pending = StoredVector {
            vector,
            text: text.to_string(),
        };
        state.store.save_with(&id, &pending, path.as_ref())?;
        state.insert(VectorEntry::new(id.clone(), pending.vector, pending.text))?;
        log::debug!("Added vector '{id}'");
        Ok(id)
    }

    pub fn search(
        &self,
        query: &[f32],
        k: usize,
        algorithm: SearchAlgorithm,
    ) -> Result<Vec<SearchResult>> {
        let state = self.state.read();
        let results = match algorithm {
            SearchAlgorithm::Exact => ExactSearch::new(&state.store).nearest(query, k),
            SearchAlgorithm::Approximate { breadth } => {
                ApproximateSearch::new(&state.index, &state.keys, breadth).nearest(query, k)
            }
        }?;
        log::debug!(
            "{algorithm} search (k={k}) over {} vectors returned {} results",
            state.store.len(),
            results.len()
        );
        Ok(results)
    }

    pub fn search_text(
        &self,
        embedder: &impl Embedder,
        text: &str,
        k: usize,
        algorithm: SearchAlgorithm,
    ) -> Result<Vec<SearchResult>> {
        if k == 0 {
            return Err(VectorStoreError::InvalidK);
        }
        let query = embedder.embed(text)?;
        self.search(&query, k, algorithm)
    }

    pub fn get(&self, id: &str) -> Option<StoredVector> {
        self.state.read().store.get(id).cloned()
    }

    pub fn ids(&self) -> Vec<String> {
        self.state.read().store.ids()
    }

    pub fn len(&self) -> usize {
        self.state.read().store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().store.is_empty()
    }

    pub fn dimension(&self) -> Option<usize> {
        self.state.read().store.dimension()
    }

    pub fn clear(&self) {
        *self.state.write() = DbState::new(self.params);
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        self.state.read().store.save(path)
    }

    pub fn save_to_writer(&self, writer: impl Write) -> Result<()> {
        self.state.read().store.save_to_writer(writer)
    }

    /// Replaces the whole store with the file's contents and rebuilds the
    /// index from it. On error the current contents are kept.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<()> {
        self.replace(VectorStore::load(path)?)
    }

    pub fn load_from_reader(&self, reader: impl Read) -> Result<()> {
        self.replace(VectorStore::load_from_reader(reader)?)
    }

    fn replace(&self, store: VectorStore) -> Result<()> {
        let mut next = DbState {
            store,
            keys: KeyMap::new(),
            index: HnswIndex::new(self.params),
        };
        next.rebuild_index()?;
        log::info!("Rebuilt approximate index over {} vectors", next.index.len());
        *self.state.write() = next;
        Ok(())
    }
}
