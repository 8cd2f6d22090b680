use anyhow::{Context, Result};
use graph::TextGraph;
use serde::Serialize;
use std::path::Path as FsPath;

use crate::beam::SearchParams;
use crate::path::Path;

/// The JSON document written once per run.
#[derive(Debug, Clone, Serialize)]
pub struct PathExportDocument {
    pub claim: String,
    pub parameters: ParametersExport,
    pub paths: Vec<PathRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ParametersExport {
    pub beam_width: usize,
    pub max_depth: usize,
    pub max_paths: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct PathRecord {
    #[serde(flatten)]
    pub path: Path,
    pub node_details: Vec<NodeDetail>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NodeDetail {
    pub id: usize,
    pub kind: String,
    pub text: String,
}

pub fn build_export(graph: &TextGraph, params: &SearchParams, paths: &[Path]) -> PathExportDocument {
    let claim = graph
        .claim_id()
        .map(|id| graph.node(id).text.clone())
        .unwrap_or_default();

    let records = paths
        .iter()
        .map(|path| PathRecord {
            path: path.clone(),
            node_details: path
                .nodes
                .iter()
                .map(|&id| {
                    let node = graph.node(id);
                    NodeDetail {
                        id,
                        kind: node.kind.as_str().to_string(),
                        text: node.text.clone(),
                    }
                })
                .collect(),
        })
        .collect();

    PathExportDocument {
        claim,
        parameters: ParametersExport {
            beam_width: params.beam_width,
            max_depth: params.max_depth,
            max_paths: params.max_paths,
        },
        paths: records,
    }
}

pub fn save_paths(document: &PathExportDocument, path: &FsPath) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    let json = serde_json::to_string_pretty(document).context("Failed to serialize path export")?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}

/// Human-readable summary of the top paths. The layout is stable so runs
/// can be diffed.
pub fn write_summary(graph: &TextGraph, params: &SearchParams, paths: &[Path]) -> String {
    let mut out = String::new();

    out.push_str("BEAM SEARCH PATH ANALYSIS\n");
    out.push_str(&"=".repeat(60));
    out.push('\n');
    out.push_str(&format!("Beam width: {}\n", params.beam_width));
    out.push_str(&format!("Max depth: {}\n", params.max_depth));
    out.push_str(&format!("Max paths: {}\n", params.max_paths));
    out.push_str(&format!("Paths found: {}\n\n", paths.len()));

    for (i, path) in paths.iter().take(10).enumerate() {
        out.push_str(&format!("PATH #{} (score: {:.3})\n", i + 1, path.score));
        out.push_str(&"-".repeat(40));
        out.push('\n');
        out.push_str(&format!("Length: {} nodes\n", path.nodes.len()));
        out.push_str(&format!("Pattern: {}\n", path.pattern));
        out.push_str(&format!(
            "Reached sentence: {}\n",
            if path.reached_sentence { "yes" } else { "no" }
        ));
        out.push_str(&format!(
            "Visited entity: {}\n",
            if path.visited_entity { "yes" } else { "no" }
        ));

        for (j, &node_id) in path.nodes.iter().enumerate() {
            let node = graph.node(node_id);
            let text: String = node.text.chars().take(50).collect();
            out.push_str(&format!(
                "  {:2}: [{}] {}\n",
                j,
                node.kind.as_str().to_uppercase(),
                text
            ));
            if let Some(edge) = path.edges.get(j) {
                out.push_str(&format!("      -({})->\n", edge.2.as_str()));
            }
        }
        out.push('\n');
    }

    out
}

pub fn save_summary(summary: &str, path: &FsPath) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    std::fs::write(path, summary).with_context(|| format!("Failed to write {}", path.display()))
}
