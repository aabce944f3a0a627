use crate::error::{Result, VectorStoreError};
use crate::keys::IndexKey;
use crate::similarity::{cosine_similarity, is_finite, is_zero};
use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap, HashSet};

pub const DEFAULT_MAX_NEIGHBORS: usize = 16;
pub const DEFAULT_EF_CONSTRUCTION: usize = 64;
/// Explore-width used when the caller does not pick one.
pub const DEFAULT_BREADTH: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HnswParams {
    /// Upper bound on each node's outgoing links.
    pub max_neighbors: usize,
    /// Frontier width used while wiring a new node in.
    pub ef_construction: usize,
}

impl Default for HnswParams {
    fn default() -> Self {
        Self {
            max_neighbors: DEFAULT_MAX_NEIGHBORS,
            ef_construction: DEFAULT_EF_CONSTRUCTION,
        }
    }
}

#[derive(Debug, Clone)]
struct Node {
    key: IndexKey,
    vector: Vec<f32>,
    neighbors: Vec<u32>,
}

#[derive(Debug, Clone, Copy)]
struct Scored {
    slot: u32,
    score: f32,
}

impl Eq for Scored {}

impl PartialEq for Scored {
    fn eq(&self, other: &Self) -> bool {
        self.slot == other.slot && self.score.to_bits() == other.score.to_bits()
    }
}

impl Ord for Scored {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.score.total_cmp(&other.score) {
            // Lower slot (earlier insert) ranks higher on ties.
            Ordering::Equal => other.slot.cmp(&self.slot),
            ord => ord,
        }
    }
}

impl PartialOrd for Scored {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Navigable proximity graph over cosine similarity.
///
/// Single layer: the first non-zero vector is the entry point and every node
/// keeps at most `max_neighbors` links to the closest nodes found while it was
/// inserted (plus reverse links, pruned back to the bound). Zero vectors are
/// kept but never linked, since their similarity is undefined.
#[derive(Debug, Clone)]
pub struct HnswIndex {
    params: HnswParams,
    dimension: Option<usize>,
    nodes: Vec<Node>,
    slots: HashMap<IndexKey, u32>,
    entry: Option<u32>,
}

impl Default for HnswIndex {
    fn default() -> Self {
        Self::new(HnswParams::default())
    }
}

impl HnswIndex {
    pub fn new(params: HnswParams) -> Self {
        Self {
            params: HnswParams {
                max_neighbors: params.max_neighbors.max(1),
                ef_construction: params.ef_construction.max(1),
            },
            dimension: None,
            nodes: Vec::new(),
            slots: HashMap::new(),
            entry: None,
        }
    }

    pub const fn params(&self) -> HnswParams {
        self.params
    }

    /// Add vector to index under `key`.
    pub fn insert(&mut self, key: IndexKey, vector: &[f32]) -> Result<()> {
        if self.slots.contains_key(&key) {
            return Err(VectorStoreError::DuplicateKey(key));
        }
        if !is_finite(vector) {
            return Err(VectorStoreError::NonFiniteVector);
        }
        if let Some(expected) = self.dimension {
            if vector.len() != expected {
                return Err(VectorStoreError::DimensionMismatch {
                    expected,
                    actual: vector.len(),
                });
            }
        }
        let slot = self.nodes.len() as u32;

        if self.dimension.is_none() {
            self.dimension = Some(vector.len());
        }
        self.nodes.push(Node {
            key,
            vector: vector.to_vec(),
            neighbors: Vec::new(),
        });
        self.slots.insert(key, slot);

        if is_zero(vector) {
            log::debug!("Index key {key:#x} has a zero vector; left unlinked");
            return Ok(());
        }
        let Some(entry) = self.entry else {
            self.entry = Some(slot);
            return Ok(());
        };

        let width = self.params.ef_construction.max(self.params.max_neighbors * 2);
        let mut candidates = self.search_layer(vector, entry, width);
        candidates.retain(|cand| cand.slot != slot);
        candidates.sort_by(|a, b| b.cmp(a));
        candidates.truncate(self.params.max_neighbors);

        let linked: Vec<u32> = candidates.iter().map(|cand| cand.slot).collect();
        self.nodes[slot as usize].neighbors.clone_from(&linked);
        for neighbor in linked {
            let list = &mut self.nodes[neighbor as usize].neighbors;
            if !list.contains(&slot) {
                list.push(slot);
            }
            if list.len() > self.params.max_neighbors {
                self.prune(neighbor);
            }
        }
        Ok(())
    }

    /// Returns up to `k` `(key, similarity)` pairs, best first.
    ///
    /// `breadth` bounds the candidate frontier (never below `k`). Once it
    /// covers the whole index the scan is exhaustive and matches an exact
    /// search.
    pub fn search(&self, query: &[f32], k: usize, breadth: usize) -> Result<Vec<(IndexKey, f32)>> {
        if k == 0 {
            return Err(VectorStoreError::InvalidK);
        }
        if let Some(expected) = self.dimension {
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

        let width = breadth.max(k);
        let mut results = if width >= self.nodes.len() {
            self.scan_all(query)
        } else if let Some(entry) = self.entry {
            self.search_layer(query, entry, width)
        } else {
            Vec::new()
        };

        results.sort_by(|a, b| b.cmp(a));
        results.truncate(k);
        Ok(results
            .into_iter()
            .map(|scored| (self.nodes[scored.slot as usize].key, scored.score))
            .collect())
    }

    pub fn contains(&self, key: IndexKey) -> bool {
        self.slots.contains_key(&key)
    }

    /// Number of outgoing links of the node stored under `key`.
    pub fn degree(&self, key: IndexKey) -> Option<usize> {
        self.slots
            .get(&key)
            .map(|slot| self.nodes[*slot as usize].neighbors.len())
    }

    pub const fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    /// Get number of vectors in index
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if index is empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Clear all vectors
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.slots.clear();
        self.entry = None;
        self.dimension = None;
    }

    /// `None` only for stored zero vectors; queries are validated up front.
    fn similarity(&self, query: &[f32], slot: u32) -> Option<f32> {
        cosine_similarity(query, &self.nodes[slot as usize].vector).ok()
    }

    fn scan_all(&self, query: &[f32]) -> Vec<Scored> {
        (0..self.nodes.len() as u32)
            .filter_map(|slot| {
                self.similarity(query, slot)
                    .map(|score| Scored { slot, score })
            })
            .collect()
    }

    /// Best-first walk from `entry` keeping the `width` closest nodes seen.
    fn search_layer(&self, query: &[f32], entry: u32, width: usize) -> Vec<Scored> {
        let Some(entry_score) = self.similarity(query, entry) else {
            return Vec::new();
        };
        let start = Scored {
            slot: entry,
            score: entry_score,
        };

        let mut visited = HashSet::from([entry]);
        let mut candidates = BinaryHeap::from([start]);
        let mut results: BinaryHeap<Reverse<Scored>> = BinaryHeap::from([Reverse(start)]);

        while let Some(best) = candidates.pop() {
            let worst_score = results.peek().map_or(f32::MIN, |worst| worst.0.score);
            if best.score < worst_score && results.len() >= width {
                break;
            }
            for &neighbor in &self.nodes[best.slot as usize].neighbors {
                if !visited.insert(neighbor) {
                    continue;
                }
                let Some(score) = self.similarity(query, neighbor) else {
                    continue;
                };
                if results.len() < width || score > worst_score {
                    let scored = Scored {
                        slot: neighbor,
                        score,
                    };
                    candidates.push(scored);
                    results.push(Reverse(scored));
                    if results.len() > width {
                        results.pop();
                    }
                }
            }
        }

        results.into_iter().map(|scored| scored.0).collect()
    }

    fn prune(&mut self, slot: u32) {
        let node = &self.nodes[slot as usize];
        let mut ranked: Vec<Scored> = node
            .neighbors
            .iter()
            .map(|&neighbor| Scored {
                slot: neighbor,
                score: self.similarity(&node.vector, neighbor).unwrap_or(f32::MIN),
            })
            .collect();
        ranked.sort_by(|a, b| b.cmp(a));
        ranked.truncate(self.params.max_neighbors);
        self.nodes[slot as usize].neighbors = ranked.into_iter().map(|s| s.slot).collect();
    }
}
