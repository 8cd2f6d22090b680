use graph::{Edge, EdgeKind, NodeId, NodeKind, TextGraph};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info};

use crate::path::{pattern_of, Path, PathEdge};

/// Additive step-scoring weights. The defaults are the calibration that
/// reproduces the weak/medium/strong evidence bands at 5 / 10 / 15.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub step_cost: f64,
    pub word_overlap_bonus: f64,
    pub entity_bonus: f64,
    pub sentence_bonus: f64,
    pub semantic_weight: f64,
    pub dependency_bonus: f64,
    pub terminal_sentence_bonus: f64,
    pub admissibility_margin: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            step_cost: 0.1,
            word_overlap_bonus: 1.0,
            entity_bonus: 2.0,
            sentence_bonus: 5.0,
            semantic_weight: 2.0,
            dependency_bonus: 0.5,
            terminal_sentence_bonus: 3.0,
            admissibility_margin: 5.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchParams {
    pub beam_width: usize,
    pub max_depth: usize,
    pub max_paths: usize,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            beam_width: 10,
            max_depth: 6,
            max_paths: 20,
        }
    }
}

/// Frontier candidate. `seq` is the insertion order used as the final
/// tie-break so repeat runs produce identical rankings.
#[derive(Clone)]
struct Candidate {
    nodes: Vec<NodeId>,
    edges: Vec<PathEdge>,
    score: f64,
    reached_sentence: bool,
    visited_entity: bool,
    seq: u64,
}

/// Stage D: beam search from the claim node toward sentence nodes.
pub struct BeamSearchEngine<'a> {
    graph: &'a TextGraph,
    params: SearchParams,
    weights: ScoreWeights,
    claim_tokens: HashSet<String>,
}

impl<'a> BeamSearchEngine<'a> {
    pub fn new(graph: &'a TextGraph, params: SearchParams, weights: ScoreWeights) -> Self {
        let claim_tokens = graph
            .claim_id()
            .map(|id| {
                graph
                    .node(id)
                    .text
                    .split_whitespace()
                    .map(|t| t.to_lowercase())
                    .collect()
            })
            .unwrap_or_default();

        Self {
            graph,
            params,
            weights,
            claim_tokens,
        }
    }

    /// Best paths sorted by descending score, at most `max_paths`. Paths
    /// that never touched a sentence are returned only when no
    /// sentence-terminated path exists at all.
    pub fn search(&self) -> Vec<Path> {
        let Some(claim) = self.graph.claim_id() else {
            return Vec::new();
        };

        let mut seq: u64 = 0;
        let mut live = vec![Candidate {
            nodes: vec![claim],
            edges: Vec::new(),
            score: 0.0,
            reached_sentence: false,
            visited_entity: false,
            seq,
        }];
        let mut completed: Vec<Candidate> = Vec::new();

        for depth in 1..=self.params.max_depth {
            let mut pool: Vec<Candidate> = Vec::new();

            for path in &live {
                let last = *path.nodes.last().expect("candidate paths are never empty");

                for &(neighbor, edge_idx) in self.graph.neighbors(last) {
                    // No revisits within a path
                    if path.nodes.contains(&neighbor) {
                        continue;
                    }
                    let edge = self.graph.edge(edge_idx);
                    let kind = self.graph.node(neighbor).kind;

                    seq += 1;
                    let mut extended = path.clone();
                    extended.nodes.push(neighbor);
                    extended.edges.push(PathEdge(last, neighbor, edge.kind));
                    extended.score += self.step_gain(edge, neighbor);
                    extended.reached_sentence |= kind == NodeKind::Sentence;
                    extended.visited_entity |= kind == NodeKind::Entity;
                    extended.seq = seq;

                    // Sentences are sinks and relays at once: the path is
                    // emitted as completed but may keep extending.
                    if kind == NodeKind::Sentence {
                        completed.push(extended.clone());
                    }
                    pool.push(extended);
                }
            }

            if pool.is_empty() {
                // Dead frontier; `live` keeps the unextendable paths for
                // the partial-path fallback below.
                break;
            }

            sort_candidates(&mut pool);
            pool.truncate(self.params.beam_width);
            debug!(
                depth,
                frontier = pool.len(),
                completed = completed.len(),
                top_score = pool.first().map(|p| p.score).unwrap_or(0.0),
                "expanded frontier"
            );
            live = pool;

            if self.should_stop_early(&completed, &live, self.params.max_depth - depth) {
                debug!(depth, "no live path can still beat the completed set");
                break;
            }
        }

        let mut result: Vec<Candidate> = completed;
        if result.is_empty() && !self.graph.sentence_ids().is_empty() {
            // Sentences exist but none was reached: fall back to the
            // best partial paths, if any step was taken at all. A graph
            // without sentences yields an empty list instead.
            result = live.into_iter().filter(|p| p.nodes.len() > 1).collect();
        }

        for path in &mut result {
            if path.reached_sentence {
                path.score += self.weights.terminal_sentence_bonus;
            }
        }
        sort_candidates(&mut result);
        result.truncate(self.params.max_paths);

        info!(paths = result.len(), "beam search done");
        result.into_iter().map(|c| self.finalize(c)).collect()
    }

    /// Recompute a path's score from its nodes and edges alone. Used to
    /// check that scoring is a pure function of the path.
    pub fn rescore(&self, path: &Path) -> f64 {
        let mut score = 0.0;
        for PathEdge(from, to, kind) in &path.edges {
            let edge = self
                .graph
                .find_edge(*from, *to, *kind)
                .expect("path edges exist in the graph");
            score += self.step_gain(edge, *to);
        }
        let reached = path
            .nodes
            .iter()
            .any(|&id| self.graph.node(id).kind == NodeKind::Sentence);
        if reached {
            score += self.weights.terminal_sentence_bonus;
        }
        score
    }

    fn step_gain(&self, edge: &Edge, to: NodeId) -> f64 {
        let w = &self.weights;
        let mut gain = -w.step_cost;

        let node = self.graph.node(to);
        match node.kind {
            NodeKind::Word => {
                if self.claim_tokens.contains(&node.text.to_lowercase()) {
                    gain += w.word_overlap_bonus;
                }
            }
            NodeKind::Entity => gain += w.entity_bonus,
            NodeKind::Sentence => gain += w.sentence_bonus,
            NodeKind::Claim => {}
        }

        match edge.kind {
            EdgeKind::Semantic => gain += edge.similarity.unwrap_or(0.0) * w.semantic_weight,
            EdgeKind::Dependency => gain += w.dependency_bonus,
            _ => {}
        }

        gain
    }

    /// Stop once `max_paths` completed paths exist and no live path's
    /// optimistic bound beats the worst of the current top set plus the
    /// admissibility margin.
    fn should_stop_early(
        &self,
        completed: &[Candidate],
        live: &[Candidate],
        remaining_depth: usize,
    ) -> bool {
        if self.params.max_paths == 0
            || completed.len() < self.params.max_paths
            || live.is_empty()
        {
            return false;
        }

        let mut final_scores: Vec<f64> = completed
            .iter()
            .map(|c| c.score + self.weights.terminal_sentence_bonus)
            .collect();
        final_scores.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
        let cutoff = final_scores[self.params.max_paths - 1];

        let per_step = self.optimistic_step_gain();
        let best_bound = live
            .iter()
            .map(|c| {
                c.score + remaining_depth as f64 * per_step + self.weights.terminal_sentence_bonus
            })
            .fold(f64::NEG_INFINITY, f64::max);

        best_bound <= cutoff + self.weights.admissibility_margin
    }

    /// The most a single step can contribute: land on a sentence over a
    /// perfect-similarity semantic edge.
    fn optimistic_step_gain(&self) -> f64 {
        let w = &self.weights;
        let node_gain = w.sentence_bonus.max(w.entity_bonus).max(w.word_overlap_bonus);
        let edge_gain = w.semantic_weight.max(w.dependency_bonus).max(0.0);
        -w.step_cost + node_gain + edge_gain
    }

    fn finalize(&self, candidate: Candidate) -> Path {
        let pattern = pattern_of(self.graph, &candidate.nodes);
        Path {
            nodes: candidate.nodes,
            edges: candidate.edges,
            score: candidate.score,
            reached_sentence: candidate.reached_sentence,
            visited_entity: candidate.visited_entity,
            pattern,
        }
    }
}

/// Descending score, then shorter length, then earlier insertion.
fn sort_candidates(candidates: &mut [Candidate]) {
    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.nodes.len().cmp(&b.nodes.len()))
            .then(a.seq.cmp(&b.seq))
    });
}
