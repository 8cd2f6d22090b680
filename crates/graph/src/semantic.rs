use index::{brute_force_top_k, l2_normalize_rows, EmbeddingSet, InnerProductIndex};
use ndarray::Array2;
use tracing::{info, warn};

use crate::model::{EdgeKind, NodeId, NodeKind, TextGraph};

#[derive(Debug, Clone)]
pub struct SemanticParams {
    pub similarity_threshold: f64,
    pub top_k: usize,
    pub use_fast_index: bool,
}

impl Default for SemanticParams {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.85,
            top_k: 5,
            use_fast_index: true,
        }
    }
}

/// Stage C: connect same-POS words whose normalized embeddings land in
/// each other's top-k above the threshold. The produced edge set is a
/// union over per-word neighbor lists, so it does not depend on word
/// iteration order. Returns the number of edges added.
pub fn build_semantic_edges(
    graph: &mut TextGraph,
    embeddings: &EmbeddingSet,
    params: &SemanticParams,
) -> usize {
    if params.top_k == 0 {
        return 0;
    }

    // Rows of the matrix: word nodes that have a usable vector. Zero-norm
    // vectors mean "no embedding" and are skipped rather than normalized
    // into NaN.
    let mut row_nodes: Vec<NodeId> = Vec::new();
    let mut vectors: Vec<&[f32]> = Vec::new();
    let mut dim = 0usize;

    for node in graph.nodes() {
        if node.kind != NodeKind::Word {
            continue;
        }
        let Some(vector) = embeddings.get(&node.text, &node.pos) else {
            continue;
        };
        if vector.iter().all(|v| *v == 0.0) {
            continue;
        }
        if dim == 0 {
            dim = vector.len();
        } else if vector.len() != dim {
            warn!(
                word = %node.text,
                expected = dim,
                got = vector.len(),
                "embedding dimension mismatch, skipping word"
            );
            continue;
        }
        row_nodes.push(node.id);
        vectors.push(vector);
    }

    if row_nodes.len() < 2 {
        return 0;
    }

    let mut matrix = Array2::<f32>::zeros((row_nodes.len(), dim));
    for (i, vector) in vectors.iter().enumerate() {
        for (j, v) in vector.iter().enumerate() {
            matrix[[i, j]] = *v;
        }
    }
    let matrix = l2_normalize_rows(matrix);

    // +1 accounts for the self-match every query returns.
    let k = params.top_k + 1;
    let neighbor_lists = if params.use_fast_index {
        InnerProductIndex::build(matrix).search_all(k)
    } else {
        brute_force_top_k(&matrix, k)
    };

    let mut edges_added = 0;
    for (i, neighbors) in neighbor_lists.iter().enumerate() {
        let a = row_nodes[i];
        let pos_a = graph.node(a).pos.clone();

        for &(j, similarity) in neighbors {
            if j == i {
                continue;
            }
            let similarity = similarity as f64;
            if similarity < params.similarity_threshold {
                continue;
            }
            let b = row_nodes[j];
            if graph.node(b).pos != pos_a {
                continue;
            }
            if graph.has_edge(a, b, EdgeKind::Semantic) {
                continue;
            }
            if graph.connect_semantic(a, b, round4(similarity)) {
                edges_added += 1;
            }
        }
    }

    info!(
        words = row_nodes.len(),
        edges_added,
        threshold = params.similarity_threshold,
        top_k = params.top_k,
        "semantic edge pass done"
    );
    edges_added
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph_with_words(words: &[(&str, &str)]) -> TextGraph {
        let mut g = TextGraph::new();
        g.set_claim("claim");
        for (text, pos) in words {
            g.add_word(text, pos, text);
        }
        g
    }

    fn one_hot(dim: usize, hot: usize) -> Vec<f32> {
        let mut v = vec![0.0; dim];
        v[hot] = 1.0;
        v
    }

    #[test]
    fn test_identical_embeddings_connect() {
        let mut g = graph_with_words(&[("nước", "N"), ("nước_sạch", "N")]);
        let mut set = EmbeddingSet::new();
        set.insert("nước", "N", one_hot(4, 0));
        set.insert("nước_sạch", "N", one_hot(4, 0));

        let added = build_semantic_edges(&mut g, &set, &SemanticParams::default());

        assert_eq!(added, 1);
        let edge = g.edges().iter().find(|e| e.kind == EdgeKind::Semantic).unwrap();
        assert_eq!(edge.similarity, Some(1.0));
    }

    #[test]
    fn test_different_pos_never_connect() {
        let mut g = graph_with_words(&[("cấp", "N"), ("cấp", "V")]);
        let mut set = EmbeddingSet::new();
        set.insert("cấp", "N", one_hot(4, 1));
        set.insert("cấp", "V", one_hot(4, 1));

        let added = build_semantic_edges(&mut g, &set, &SemanticParams::default());
        assert_eq!(added, 0);
    }

    #[test]
    fn test_below_threshold_filtered() {
        let mut g = graph_with_words(&[("a", "N"), ("b", "N")]);
        let mut set = EmbeddingSet::new();
        set.insert("a", "N", vec![1.0, 0.0]);
        set.insert("b", "N", vec![0.8, 0.6]); // cosine 0.8

        let added = build_semantic_edges(&mut g, &set, &SemanticParams::default());
        assert_eq!(added, 0);
    }

    #[test]
    fn test_top_k_zero_adds_nothing() {
        let mut g = graph_with_words(&[("a", "N"), ("b", "N")]);
        let mut set = EmbeddingSet::new();
        set.insert("a", "N", one_hot(2, 0));
        set.insert("b", "N", one_hot(2, 0));

        let params = SemanticParams {
            top_k: 0,
            ..SemanticParams::default()
        };
        assert_eq!(build_semantic_edges(&mut g, &set, &params), 0);
    }

    #[test]
    fn test_zero_vector_skipped() {
        let mut g = graph_with_words(&[("a", "N"), ("b", "N"), ("c", "N")]);
        let mut set = EmbeddingSet::new();
        set.insert("a", "N", vec![0.0, 0.0]);
        set.insert("b", "N", one_hot(2, 0));
        set.insert("c", "N", one_hot(2, 0));

        let added = build_semantic_edges(&mut g, &set, &SemanticParams::default());

        assert_eq!(added, 1);
        let b = g.word_id("b", "N").unwrap();
        let c = g.word_id("c", "N").unwrap();
        assert!(g.has_edge(b, c, EdgeKind::Semantic));
        let a = g.word_id("a", "N").unwrap();
        assert!(!g.has_edge(a, b, EdgeKind::Semantic));
    }

    #[test]
    fn test_fast_and_brute_force_produce_same_edges() {
        let words: Vec<(String, String)> = (0..6).map(|i| (format!("w{}", i), "N".to_string())).collect();
        let mut set = EmbeddingSet::new();
        for (i, (text, pos)) in words.iter().enumerate() {
            // Three near-duplicate pairs
            let mut v = vec![0.0f32; 4];
            v[i / 2] = 1.0;
            v[3] = if i % 2 == 0 { 0.0 } else { 0.05 };
            set.insert(text, pos, v);
        }

        let build = |fast: bool| {
            let mut g = TextGraph::new();
            g.set_claim("claim");
            for (text, pos) in &words {
                g.add_word(text, pos, text);
            }
            let params = SemanticParams {
                use_fast_index: fast,
                ..SemanticParams::default()
            };
            build_semantic_edges(&mut g, &set, &params);
            let mut pairs: Vec<(usize, usize)> = g
                .edges()
                .iter()
                .filter(|e| e.kind == EdgeKind::Semantic)
                .map(|e| (e.source.min(e.target), e.source.max(e.target)))
                .collect();
            pairs.sort();
            pairs
        };

        assert_eq!(build(true), build(false));
    }

    #[test]
    fn test_threshold_one_keeps_only_exact_matches() {
        let mut g = graph_with_words(&[("a", "N"), ("b", "N"), ("c", "N")]);
        let mut set = EmbeddingSet::new();
        set.insert("a", "N", vec![1.0, 0.0]);
        set.insert("b", "N", vec![2.0, 0.0]); // same direction, exact after normalize
        set.insert("c", "N", vec![0.999, 0.045]);

        let params = SemanticParams {
            similarity_threshold: 1.0,
            ..SemanticParams::default()
        };
        let added = build_semantic_edges(&mut g, &set, &params);

        assert_eq!(added, 1);
        let a = g.word_id("a", "N").unwrap();
        let b = g.word_id("b", "N").unwrap();
        assert!(g.has_edge(a, b, EdgeKind::Semantic));
    }
}
