use crate::error::{Result, VectorStoreError};
use crate::persistence::{self, VectorMap};
use crate::similarity::is_finite;
use crate::types::{StoredVector, VectorEntry};
use std::io::{Read, Write};
use std::path::Path;

/// In-memory `id -> (vector, text)` map; the source of truth for search.
///
/// Entries are only ever added, never updated in place. The dimension is
/// fixed by the first entry and checked on every later insert.
#[derive(Debug, Default, Clone)]
pub struct VectorStore {
    vectors: VectorMap,
    dimension: Option<usize>,
}

impl VectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an already-decoded map, rejecting mixed dimensions and
    /// non-finite components.
    pub fn from_map(vectors: VectorMap) -> Result<Self> {
        let mut dimension = None;
        for stored in vectors.values() {
            check_vector(&mut dimension, &stored.vector)?;
        }
        Ok(Self { vectors, dimension })
    }

    pub fn add(&mut self, entry: VectorEntry) -> Result<()> {
        let dimension = self.check_new(&entry.id, &entry.vector)?;
        let (id, stored) = entry.into_parts();
        self.vectors.insert(id, stored);
        self.dimension = dimension;
        Ok(())
    }

    /// Validates a prospective entry without inserting it and returns the
    /// store dimension it would leave behind.
    pub(crate) fn check_new(&self, id: &str, vector: &[f32]) -> Result<Option<usize>> {
        if self.vectors.contains_key(id) {
            return Err(VectorStoreError::DuplicateId(id.to_string()));
        }
        let mut dimension = self.dimension;
        check_vector(&mut dimension, vector)?;
        Ok(dimension)
    }

    pub fn get(&self, id: &str) -> Option<&StoredVector> {
        self.vectors.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.vectors.contains_key(id)
    }

    /// Snapshot view over every entry, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &StoredVector)> + '_ {
        self.vectors.iter().map(|(id, stored)| (id.as_str(), stored))
    }

    pub fn ids(&self) -> Vec<String> {
        self.vectors.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub const fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    pub fn clear(&mut self) {
        self.vectors.clear();
        self.dimension = None;
    }

    pub fn save_to_writer(&self, writer: impl Write) -> Result<()> {
        persistence::to_writer(&self.vectors, writer)
    }

    /// Decodes a store from `reader`. The result replaces nothing; callers
    /// swap it in wholesale.
    pub fn load_from_reader(reader: impl Read) -> Result<Self> {
        Self::from_map(persistence::from_reader(reader)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        log::info!("Saving VectorStore to {path:?}");
        persistence::save_to_path(&self.vectors, path)?;
        log::info!("VectorStore saved successfully ({} vectors)", self.len());
        Ok(())
    }

    /// Writes the current entries plus one not yet added to `path`.
    pub(crate) fn save_with(&self, id: &str, pending: &StoredVector, path: &Path) -> Result<()> {
        log::info!("Saving VectorStore to {path:?}");
        let entries = self
            .vectors
            .iter()
            .map(|(id, stored)| (id.as_str(), stored))
            .chain(std::iter::once((id, pending)));
        persistence::save_entries_to_path(entries, path)?;
        log::info!("VectorStore saved successfully ({} vectors)", self.len() + 1);
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        log::info!("Loading VectorStore from {path:?}");
        let store = Self::from_map(persistence::load_from_path(path)?)?;
        log::info!("Loaded {} vectors", store.len());
        Ok(store)
    }
}

fn check_vector(dimension: &mut Option<usize>, vector: &[f32]) -> Result<()> {
    if !is_finite(vector) {
        return Err(VectorStoreError::NonFiniteVector);
    }
    let actual = vector.len();
    match *dimension {
        Some(expected) if expected != actual => {
            Err(VectorStoreError::DimensionMismatch { expected, actual })
        }
        Some(_) => Ok(()),
        None => {
            *dimension = Some(actual);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn entry(id: &str, vector: &[f32]) -> VectorEntry {
        VectorEntry::new(id, vector.to_vec(), format!("text for {id}"))
    }

    #[test]
    fn add_and_get() {
        let mut store = VectorStore::new();
        store.add(entry("a", &[1.0, 0.0, 0.0, 0.0])).unwrap();
        store.add(entry("b", &[0.0, 1.0, 0.0, 0.0])).unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.dimension(), Some(4));
        assert_eq!(store.get("b").unwrap().text, "text for b");
        assert!(store.get("c").is_none());

        let mut ids = store.ids();
        ids.sort();
        assert_eq!(ids, ["a", "b"]);
        assert_eq!(store.iter().count(), 2);
    }

    #[test]
    fn duplicate_id_leaves_store_unchanged() {
        let mut store = VectorStore::new();
        store.add(entry("a", &[1.0, 2.0, 3.0, 4.0])).unwrap();
        let before = store.get("a").cloned();

        let err = store
            .add(VectorEntry::new("a", vec![9.0, 9.0, 9.0, 9.0], "other"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateId);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("a").cloned(), before);
    }

    #[test]
    fn dimension_is_fixed_by_first_entry() {
        let mut store = VectorStore::new();
        store.add(entry("a", &[1.0, 2.0, 3.0, 4.0])).unwrap();
        let err = store.add(entry("b", &[1.0, 2.0])).unwrap_err();
        assert!(matches!(
            err,
            VectorStoreError::DimensionMismatch {
                expected: 4,
                actual: 2
            }
        ));
        assert_eq!(store.len(), 1);

        store.clear();
        assert_eq!(store.dimension(), None);
        store.add(entry("b", &[1.0, 2.0])).unwrap();
        assert_eq!(store.dimension(), Some(2));
    }

    #[test]
    fn mixed_dimensions_are_rejected_on_load() {
        let raw = br#"{"a":{"vector":[1.0,2.0],"text":"x"},"b":{"vector":[1.0],"text":"y"}}"#;
        let err = VectorStore::load_from_reader(&raw[..]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DimensionMismatch);
    }

    #[test]
    fn non_finite_vectors_are_rejected() {
        let mut store = VectorStore::new();
        store.add(entry("a", &[1.0, 0.0, 0.0, 0.0])).unwrap();
        for bad in [f32::NAN, f32::INFINITY, f32::NEG_INFINITY] {
            let err = store.add(entry("b", &[bad, 1.0, 0.0, 0.0])).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::NonFiniteVector);
        }
        assert_eq!(store.len(), 1);

        // Out of f32 range decodes as infinity.
        let raw = br#"{"a":{"vector":[1e39,0.0],"text":"x"}}"#;
        let err = VectorStore::load_from_reader(&raw[..]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NonFiniteVector);
    }

    #[test]
    fn save_with_includes_the_pending_entry_only_on_disk() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store.json");

        let mut store = VectorStore::new();
        store.add(entry("a", &[1.0, 0.0, 0.0, 0.0])).unwrap();
        let (id, pending) = entry("b", &[0.0, 1.0, 0.0, 0.0]).into_parts();
        store.save_with(&id, &pending, &path).unwrap();

        assert_eq!(store.len(), 1);
        let loaded = VectorStore::load(&path).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.get("b"), Some(&pending));
    }

    #[test]
    fn save_and_load_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let store_path = temp_dir.path().join("store.json");

        let mut store = VectorStore::new();
        store.add(entry("a", &[0.5, -0.25, 0.0, 1.0])).unwrap();
        store.add(entry("b", &[0.1, 0.2, 0.3, 0.4])).unwrap();
        store.save(&store_path).unwrap();

        let loaded = VectorStore::load(&store_path).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.dimension(), Some(4));
        for (id, stored) in store.iter() {
            let other = loaded.get(id).unwrap();
            assert_eq!(other.text, stored.text);
            for (x, y) in other.vector.iter().zip(&stored.vector) {
                assert!((x - y).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn writer_round_trip() {
        let mut store = VectorStore::new();
        store.add(entry("only", &[1.0, 1.0, 1.0, 1.0])).unwrap();
        let mut bytes = Vec::new();
        store.save_to_writer(&mut bytes).unwrap();
        let loaded = VectorStore::load_from_reader(bytes.as_slice()).unwrap();
        assert_eq!(loaded.get("only"), store.get("only"));
    }
}
