use graph::{NodeId, NodeKind, TextGraph};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingMethod {
    Frequency,
    AvgScore,
    MaxScore,
    TotalScore,
    Combined,
}

impl Default for RankingMethod {
    fn default() -> Self {
        RankingMethod::Frequency
    }
}

/// Stage E output: one context sentence with its aggregated path
/// statistics.
#[derive(Debug, Clone, Serialize)]
pub struct RankedSentence {
    pub sentence_id: usize,
    pub node_id: NodeId,
    pub text: String,
    pub frequency: usize,
    pub avg_score: f64,
    pub max_score: f64,
    pub total_score: f64,
    pub combined_score: f64,
}

/// Aggregate the sentences the paths pass through and rank them. The
/// aggregation ignores path order; ties sort by ascending sentence id.
pub fn rank_sentences(graph: &TextGraph, paths: &[Path], method: RankingMethod) -> Vec<RankedSentence> {
    struct Accumulator {
        node_id: NodeId,
        frequency: usize,
        total: f64,
        max: f64,
    }

    let mut by_sentence: BTreeMap<usize, Accumulator> = BTreeMap::new();

    for path in paths {
        for &node_id in &path.nodes {
            if graph.node(node_id).kind != NodeKind::Sentence {
                continue;
            }
            let ordinal = graph
                .sentence_ordinal(node_id)
                .expect("sentence nodes carry an ordinal");
            let entry = by_sentence.entry(ordinal).or_insert(Accumulator {
                node_id,
                frequency: 0,
                total: 0.0,
                max: f64::NEG_INFINITY,
            });
            entry.frequency += 1;
            entry.total += path.score;
            entry.max = entry.max.max(path.score);
        }
    }

    let mut ranked: Vec<RankedSentence> = by_sentence
        .into_iter()
        .map(|(sentence_id, acc)| {
            let avg = acc.total / acc.frequency as f64;
            RankedSentence {
                sentence_id,
                node_id: acc.node_id,
                text: graph.node(acc.node_id).text.clone(),
                frequency: acc.frequency,
                avg_score: avg,
                max_score: acc.max,
                total_score: acc.total,
                combined_score: acc.frequency as f64 * avg,
            }
        })
        .collect();

    ranked.sort_by(|a, b| {
        let key = |s: &RankedSentence| match method {
            RankingMethod::Frequency => s.frequency as f64,
            RankingMethod::AvgScore => s.avg_score,
            RankingMethod::MaxScore => s.max_score,
            RankingMethod::TotalScore => s.total_score,
            RankingMethod::Combined => s.combined_score,
        };
        key(b)
            .partial_cmp(&key(a))
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.sentence_id.cmp(&b.sentence_id))
    });

    ranked
}
