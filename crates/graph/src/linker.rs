use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::model::TextGraph;

/// One entity as reported by the external extractor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityRecord {
    pub name: String,
    #[serde(rename = "type")]
    pub entity_type: String,
}

/// Stage B: add Entity nodes and mention edges. Dedup is by exact name;
/// mention detection is a case-insensitive substring match against each
/// sentence's surface text. Returns the number of mention edges added.
pub fn link_entities(graph: &mut TextGraph, entities: &[EntityRecord]) -> usize {
    let mut edges_added = 0;

    for record in entities {
        let name = record.name.trim();
        if name.is_empty() {
            continue;
        }
        let entity_node = graph.add_entity(name, record.entity_type.trim());
        let needle = name.to_lowercase();

        for sentence_node in graph.sentence_ids().to_vec() {
            let haystack = graph.node(sentence_node).text.to_lowercase();
            if haystack.contains(&needle) && graph.connect_entity(entity_node, sentence_node) {
                debug!(entity = name, sentence = sentence_node, "linked entity mention");
                edges_added += 1;
            }
        }
    }

    info!(entities = entities.len(), edges_added, "entity linking done");
    edges_added
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EdgeKind, NodeKind};

    fn record(name: &str, entity_type: &str) -> EntityRecord {
        EntityRecord {
            name: name.to_string(),
            entity_type: entity_type.to_string(),
        }
    }

    fn graph_with_sentences(texts: &[&str]) -> TextGraph {
        let mut g = TextGraph::new();
        g.set_claim("claim");
        for text in texts {
            g.add_sentence(text);
        }
        g
    }

    #[test]
    fn test_substring_match_is_case_insensitive() {
        let mut g = graph_with_sentences(&["Sawaco thông báo ngưng cấp nước."]);
        let added = link_entities(&mut g, &[record("SAWACO", "ORG")]);

        assert_eq!(added, 1);
        assert_eq!(g.count_nodes_of_kind(NodeKind::Entity), 1);
        assert_eq!(g.count_edges_of_kind(EdgeKind::Entity), 1);
    }

    #[test]
    fn test_every_mentioning_sentence_gets_exactly_one_edge() {
        let mut g = graph_with_sentences(&[
            "SAWACO thông báo.",
            "Không liên quan.",
            "Theo SAWACO, nước sạch.",
        ]);
        let added = link_entities(&mut g, &[record("SAWACO", "ORG")]);

        assert_eq!(added, 2);
        assert_eq!(g.count_edges_of_kind(EdgeKind::Entity), 2);
    }

    #[test]
    fn test_duplicate_names_collapse_to_one_node() {
        let mut g = graph_with_sentences(&["SAWACO thông báo."]);
        let added = link_entities(&mut g, &[record("SAWACO", "ORG"), record("SAWACO", "ORG")]);

        assert_eq!(g.count_nodes_of_kind(NodeKind::Entity), 1);
        assert_eq!(added, 1);
    }

    #[test]
    fn test_blank_names_are_skipped() {
        let mut g = graph_with_sentences(&["SAWACO thông báo."]);
        let added = link_entities(&mut g, &[record("   ", "ORG")]);

        assert_eq!(added, 0);
        assert_eq!(g.count_nodes_of_kind(NodeKind::Entity), 0);
    }

    #[test]
    fn test_empty_extractor_result_leaves_graph_unchanged() {
        let mut g = graph_with_sentences(&["SAWACO thông báo."]);
        let before_nodes = g.node_count();
        let added = link_entities(&mut g, &[]);

        assert_eq!(added, 0);
        assert_eq!(g.node_count(), before_nodes);
    }
}
