use ndarray::{Array2, ArrayView1, Axis};

/// L2-normalize every row in place. After this, cosine(a, b) = dot(a, b).
/// Zero-norm rows are left untouched; callers filter them out beforehand.
pub fn l2_normalize_rows(mut matrix: Array2<f32>) -> Array2<f32> {
    for mut row in matrix.axis_iter_mut(Axis(0)) {
        let norm = row.dot(&row).sqrt();
        if norm > 0.0 {
            row.mapv_inplace(|v| v / norm);
        }
    }
    matrix
}

/// Exact inner-product index over normalized vectors: a flat scan, which
/// at the word counts this engine sees (well under 10k) beats anything
/// approximate. Results include the self-match; callers skip it.
pub struct InnerProductIndex {
    vectors: Array2<f32>,
}

impl InnerProductIndex {
    pub fn build(vectors: Array2<f32>) -> Self {
        Self { vectors }
    }

    pub fn len(&self) -> usize {
        self.vectors.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.nrows() == 0
    }

    /// Top-k most similar rows to `query`, sorted by descending score.
    pub fn search(&self, query: ArrayView1<f32>, k: usize) -> Vec<(usize, f32)> {
        let scores = self.vectors.dot(&query);
        top_k(scores.iter().copied().enumerate(), k)
    }

    /// Top-k neighbor list for every indexed row.
    pub fn search_all(&self, k: usize) -> Vec<Vec<(usize, f32)>> {
        (0..self.vectors.nrows())
            .map(|i| self.search(self.vectors.row(i), k))
            .collect()
    }
}

/// Brute-force variant: one `W x W` matrix product, then a per-row top-k.
/// Same result set as the index path, different memory/time profile.
pub fn brute_force_top_k(matrix: &Array2<f32>, k: usize) -> Vec<Vec<(usize, f32)>> {
    let sims = matrix.dot(&matrix.t());
    sims.axis_iter(Axis(0))
        .map(|row| top_k(row.iter().copied().enumerate(), k))
        .collect()
}

/// Descending by score; ties broken by ascending index so repeat runs
/// produce identical neighbor lists.
fn top_k(scores: impl Iterator<Item = (usize, f32)>, k: usize) -> Vec<(usize, f32)> {
    let mut scored: Vec<(usize, f32)> = scores.collect();
    scored.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.0.cmp(&b.0))
    });
    scored.truncate(k);
    scored
}
