use std::collections::HashMap;

/// Numeric node key used by the approximate index.
pub type IndexKey = u64;

/// Bidirectional `id <-> key` map kept in lockstep with the index.
///
/// Keys start as the FNV-1a hash of the id. If that key is already owned by
/// another id, it is re-mixed with splitmix64 until a free one turns up, so
/// every key resolves to exactly one id.
#[derive(Debug, Default, Clone)]
pub struct KeyMap {
    by_id: HashMap<String, IndexKey>,
    by_key: HashMap<IndexKey, String>,
}

impl KeyMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the key for `id`, allocating one on first sight.
    pub fn assign(&mut self, id: &str) -> IndexKey {
        self.assign_from_hash(id, fnv1a_64(id.as_bytes()))
    }

    fn assign_from_hash(&mut self, id: &str, hash: IndexKey) -> IndexKey {
        if let Some(key) = self.by_id.get(id) {
            return *key;
        }

        let mut key = hash;
        let mut state = hash;
        while self.by_key.contains_key(&key) {
            key = splitmix64(&mut state);
        }
        if key != hash {
            log::debug!("Index key collision for id '{id}', probed {hash:#x} -> {key:#x}");
        }

        self.by_id.insert(id.to_string(), key);
        self.by_key.insert(key, id.to_string());
        key
    }

    pub fn key_of(&self, id: &str) -> Option<IndexKey> {
        self.by_id.get(id).copied()
    }

    pub fn id_of(&self, key: IndexKey) -> Option<&str> {
        self.by_key.get(&key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn clear(&mut self) {
        self.by_id.clear();
        self.by_key.clear();
    }
}

pub(crate) fn fnv1a_64(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

pub(crate) const fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
