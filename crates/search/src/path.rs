use graph::{EdgeKind, NodeId, TextGraph};
use serde::Serialize;

/// One traversal step, serialized as `[from, to, kind]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathEdge(pub NodeId, pub NodeId, pub EdgeKind);

/// A finished beam-search path from the claim node.
#[derive(Debug, Clone, Serialize)]
pub struct Path {
    pub nodes: Vec<NodeId>,
    pub edges: Vec<PathEdge>,
    pub score: f64,
    pub reached_sentence: bool,
    pub visited_entity: bool,
    pub pattern: String,
}

impl Path {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains(&node)
    }
}

/// Kind-letter pattern of a node sequence, e.g. `C->W->E->S`.
pub fn pattern_of(graph: &TextGraph, nodes: &[NodeId]) -> String {
    nodes
        .iter()
        .map(|&id| graph.node(id).kind.letter().to_string())
        .collect::<Vec<_>>()
        .join("->")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_letters() {
        let mut g = TextGraph::new();
        let c = g.set_claim("claim");
        let s = g.add_sentence("sentence");
        let w = g.add_word("nước", "N", "nước");
        let e = g.add_entity("SAWACO", "ORG");

        assert_eq!(pattern_of(&g, &[c, w, e, s]), "C->W->E->S");
    }

    #[test]
    fn test_path_edge_serializes_as_triple() {
        let edge = PathEdge(0, 3, EdgeKind::Semantic);
        let json = serde_json::to_string(&edge).unwrap();
        assert_eq!(json, r#"[0,3,"semantic"]"#);
    }
}
