pub mod cache;
pub mod embeddings;
pub mod knn;

pub use cache::EmbeddingCache;
pub use embeddings::EmbeddingClient;
pub use knn::{brute_force_top_k, l2_normalize_rows, InnerProductIndex};

use std::collections::HashMap;

/// Embeddings for a set of word types, keyed by `(text, pos)`. The
/// semantic edge builder consumes one of these; how the vectors were
/// obtained (live embedder, cache, test stub) is not its concern.
#[derive(Debug, Clone, Default)]
pub struct EmbeddingSet {
    vectors: HashMap<(String, String), Vec<f32>>,
}

impl EmbeddingSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, text: &str, pos: &str, vector: Vec<f32>) {
        self.vectors
            .insert((text.to_string(), pos.to_string()), vector);
    }

    pub fn get(&self, text: &str, pos: &str) -> Option<&[f32]> {
        self.vectors
            .get(&(text.to_string(), pos.to_string()))
            .map(|v| v.as_slice())
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}
