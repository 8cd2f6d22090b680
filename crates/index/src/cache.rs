use dashmap::DashMap;
use sha2::{Digest, Sha256};
use std::sync::Arc;

/// Process-lifetime embedding cache keyed by `(text, pos)`. Clones share
/// the underlying map, so one cache can back several pipeline instances.
#[derive(Clone)]
pub struct EmbeddingCache {
    embeddings: Arc<DashMap<String, Vec<f32>>>,
    max_entries: usize,
}

impl EmbeddingCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            embeddings: Arc::new(DashMap::new()),
            max_entries,
        }
    }

    pub fn set(&self, text: &str, pos: &str, embedding: Vec<f32>) {
        if self.embeddings.len() >= self.max_entries {
            // Simple eviction: clear 25% when full
            let to_remove: Vec<_> = self
                .embeddings
                .iter()
                .take(self.max_entries / 4)
                .map(|r| r.key().clone())
                .collect();
            for key in to_remove {
                self.embeddings.remove(&key);
            }
        }
        let key = self.hash_key(text, pos);
        self.embeddings.insert(key, embedding);
    }

    pub fn get(&self, text: &str, pos: &str) -> Option<Vec<f32>> {
        let key = self.hash_key(text, pos);
        self.embeddings.get(&key).map(|r| r.value().clone())
    }

    fn hash_key(&self, text: &str, pos: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        hasher.update([0u8]);
        hasher.update(pos.as_bytes());
        hex::encode(hasher.finalize())
    }

    pub fn len(&self) -> usize {
        self.embeddings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.embeddings.is_empty()
    }

    pub fn clear(&self) {
        self.embeddings.clear();
    }
}

impl Default for EmbeddingCache {
    fn default() -> Self {
        Self::new(10_000)
    }
}
