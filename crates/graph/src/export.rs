use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::model::{Edge, EdgeKind, Node, NodeKind, TextGraph};

/// Attribute-complete graph export. Every node carries `kind`, `text`,
/// `pos`, `lemma`, `type` and every edge `kind`, `relation`,
/// `similarity`; attributes that do not apply serialize as empty
/// strings, never as a null, so external graph tooling round-trips.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphExport {
    pub nodes: Vec<NodeRecord>,
    pub edges: Vec<EdgeRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: usize,
    pub kind: String,
    pub text: String,
    pub pos: String,
    pub lemma: String,
    #[serde(rename = "type")]
    pub entity_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub source: usize,
    pub target: usize,
    pub kind: String,
    pub relation: String,
    pub similarity: String,
}

impl GraphExport {
    pub fn from_graph(graph: &TextGraph) -> Self {
        let nodes = graph
            .nodes()
            .iter()
            .map(|node| NodeRecord {
                id: node.id,
                kind: node.kind.as_str().to_string(),
                text: node.text.clone(),
                pos: node.pos.clone(),
                lemma: node.lemma.clone(),
                entity_type: node.entity_type.clone(),
            })
            .collect();

        let edges = graph
            .edges()
            .iter()
            .map(|edge| EdgeRecord {
                source: edge.source,
                target: edge.target,
                kind: edge.kind.as_str().to_string(),
                relation: edge.relation.clone(),
                similarity: edge
                    .similarity
                    .map(|s| format!("{:.4}", s))
                    .unwrap_or_default(),
            })
            .collect();

        Self { nodes, edges }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize graph export")
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse graph export")
    }

    /// Rebuild an in-memory graph from an export. Node ids must be the
    /// contiguous creation order the exporter wrote.
    pub fn into_graph(self) -> Result<TextGraph> {
        let mut graph = TextGraph::new();

        for (position, record) in self.nodes.into_iter().enumerate() {
            if record.id != position {
                bail!(
                    "node ids must be contiguous: expected {}, found {}",
                    position,
                    record.id
                );
            }
            let kind = NodeKind::parse(&record.kind)
                .with_context(|| format!("unknown node kind '{}'", record.kind))?;
            graph.insert_node_raw(Node {
                id: record.id,
                kind,
                text: record.text,
                pos: record.pos,
                lemma: record.lemma,
                entity_type: record.entity_type,
            });
        }

        for record in self.edges {
            let kind = EdgeKind::parse(&record.kind)
                .with_context(|| format!("unknown edge kind '{}'", record.kind))?;
            let similarity = if record.similarity.is_empty() {
                None
            } else {
                Some(
                    record
                        .similarity
                        .parse::<f64>()
                        .with_context(|| format!("bad similarity '{}'", record.similarity))?,
                )
            };
            graph.insert_edge(Edge {
                source: record.source,
                target: record.target,
                kind,
                relation: record.relation,
                similarity,
            });
        }

        Ok(graph)
    }
}

pub fn save_graph(graph: &TextGraph, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    let json = GraphExport::from_graph(graph).to_json()?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}

pub fn load_graph(path: &Path) -> Result<TextGraph> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    GraphExport::from_json(&json)?.into_graph()
}
