use serde::Serialize;
use std::collections::{HashMap, HashSet};

use crate::model::{EdgeKind, NodeKind, TextGraph};

#[derive(Debug, Clone, Serialize)]
pub struct GraphStatistics {
    pub total_nodes: usize,
    pub total_edges: usize,
    pub word_nodes: usize,
    pub sentence_nodes: usize,
    pub claim_nodes: usize,
    pub entity_nodes: usize,
    pub structural_edges: usize,
    pub dependency_edges: usize,
    pub entity_edges: usize,
    pub semantic_edges: usize,
    pub unique_words: usize,
    pub shared_words: Vec<SharedWord>,
    pub shared_words_count: usize,
    pub average_words_per_sentence: f64,
    pub most_common_relations: Vec<RelationCount>,
    pub semantic: SemanticStats,
}

/// A word type occurring in both the claim and at least one sentence.
#[derive(Debug, Clone, Serialize)]
pub struct SharedWord {
    pub word: String,
    pub pos: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RelationCount {
    pub relation: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SemanticStats {
    pub total_edges: usize,
    pub min_similarity: f64,
    pub mean_similarity: f64,
    pub max_similarity: f64,
    pub histogram: Vec<HistogramBin>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistogramBin {
    pub range: String,
    pub count: usize,
}

/// Full statistics report over a built graph. `threshold` anchors the
/// similarity histogram bins.
pub fn statistics(graph: &TextGraph, threshold: f64) -> GraphStatistics {
    let word_nodes = graph.count_nodes_of_kind(NodeKind::Word);
    let sentence_nodes = graph.count_nodes_of_kind(NodeKind::Sentence);

    let unique_words: HashSet<&str> = graph
        .nodes()
        .iter()
        .filter(|n| n.kind == NodeKind::Word)
        .map(|n| n.text.as_str())
        .collect();

    let shared_words = shared_words(graph);

    let mut relation_counts: HashMap<&str, usize> = HashMap::new();
    for edge in graph.edges() {
        if edge.kind == EdgeKind::Dependency {
            *relation_counts.entry(edge.relation.as_str()).or_insert(0) += 1;
        }
    }
    let mut most_common_relations: Vec<RelationCount> = relation_counts
        .into_iter()
        .map(|(relation, count)| RelationCount {
            relation: relation.to_string(),
            count,
        })
        .collect();
    most_common_relations.sort_by(|a, b| b.count.cmp(&a.count).then(a.relation.cmp(&b.relation)));
    most_common_relations.truncate(10);

    GraphStatistics {
        total_nodes: graph.node_count(),
        total_edges: graph.edge_count(),
        word_nodes,
        sentence_nodes,
        claim_nodes: graph.count_nodes_of_kind(NodeKind::Claim),
        entity_nodes: graph.count_nodes_of_kind(NodeKind::Entity),
        structural_edges: graph.count_edges_of_kind(EdgeKind::Structural),
        dependency_edges: graph.count_edges_of_kind(EdgeKind::Dependency),
        entity_edges: graph.count_edges_of_kind(EdgeKind::Entity),
        semantic_edges: graph.count_edges_of_kind(EdgeKind::Semantic),
        unique_words: unique_words.len(),
        shared_words_count: shared_words.len(),
        shared_words,
        average_words_per_sentence: word_nodes as f64 / sentence_nodes.max(1) as f64,
        most_common_relations,
        semantic: semantic_statistics(graph, threshold),
    }
}

/// Word nodes structurally connected to both the claim and a sentence.
pub fn shared_words(graph: &TextGraph) -> Vec<SharedWord> {
    let mut shared = Vec::new();

    for node in graph.nodes() {
        if node.kind != NodeKind::Word {
            continue;
        }
        let mut in_sentence = false;
        let mut in_claim = false;
        for &(neighbor, edge_idx) in graph.neighbors(node.id) {
            if graph.edge(edge_idx).kind != EdgeKind::Structural {
                continue;
            }
            match graph.node(neighbor).kind {
                NodeKind::Sentence => in_sentence = true,
                NodeKind::Claim => in_claim = true,
                _ => {}
            }
        }
        if in_sentence && in_claim {
            shared.push(SharedWord {
                word: node.text.clone(),
                pos: node.pos.clone(),
            });
        }
    }

    shared
}

/// Count, min/mean/max, and a 0.05-binned histogram over [threshold, 1].
pub fn semantic_statistics(graph: &TextGraph, threshold: f64) -> SemanticStats {
    let similarities: Vec<f64> = graph
        .edges()
        .iter()
        .filter(|e| e.kind == EdgeKind::Semantic)
        .filter_map(|e| e.similarity)
        .collect();

    let mut bins: Vec<(f64, f64)> = Vec::new();
    let mut lo = threshold;
    while lo < 1.0 {
        let hi = (lo + 0.05).min(1.0);
        bins.push((lo, hi));
        lo = hi;
    }

    let mut histogram: Vec<HistogramBin> = bins
        .iter()
        .map(|(lo, hi)| HistogramBin {
            range: format!("{:.2}-{:.2}", lo, hi),
            count: 0,
        })
        .collect();

    for &sim in &similarities {
        let idx = bins
            .iter()
            .position(|&(lo, hi)| sim >= lo && (sim < hi || (hi >= 1.0 && sim <= hi)))
            .unwrap_or(bins.len().saturating_sub(1));
        if let Some(bin) = histogram.get_mut(idx) {
            bin.count += 1;
        }
    }

    if similarities.is_empty() {
        return SemanticStats {
            total_edges: 0,
            min_similarity: 0.0,
            mean_similarity: 0.0,
            max_similarity: 0.0,
            histogram,
        };
    }

    let sum: f64 = similarities.iter().sum();
    SemanticStats {
        total_edges: similarities.len(),
        min_similarity: similarities.iter().cloned().fold(f64::INFINITY, f64::min),
        mean_similarity: sum / similarities.len() as f64,
        max_similarity: similarities.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
        histogram,
    }
}
