use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::warn;

pub type NodeId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Word,
    Sentence,
    Claim,
    Entity,
}

impl NodeKind {
    /// Single-letter code used in path patterns.
    pub fn letter(&self) -> char {
        match self {
            NodeKind::Word => 'W',
            NodeKind::Sentence => 'S',
            NodeKind::Claim => 'C',
            NodeKind::Entity => 'E',
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Word => "word",
            NodeKind::Sentence => "sentence",
            NodeKind::Claim => "claim",
            NodeKind::Entity => "entity",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "word" => Some(NodeKind::Word),
            "sentence" => Some(NodeKind::Sentence),
            "claim" => Some(NodeKind::Claim),
            "entity" => Some(NodeKind::Entity),
            _ => None,
        }
    }
}

/// One node of the heterogeneous graph. Attributes not applicable to a
/// kind stay empty: `pos`/`lemma` are word-only, `entity_type` entity-only.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    pub text: String,
    pub pos: String,
    pub lemma: String,
    pub entity_type: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    Structural,
    Dependency,
    Entity,
    Semantic,
}

impl EdgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::Structural => "structural",
            EdgeKind::Dependency => "dependency",
            EdgeKind::Entity => "entity",
            EdgeKind::Semantic => "semantic",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "structural" => Some(EdgeKind::Structural),
            "dependency" => Some(EdgeKind::Dependency),
            "entity" => Some(EdgeKind::Entity),
            "semantic" => Some(EdgeKind::Semantic),
            _ => None,
        }
    }
}

/// Undirected for traversal; `source`/`target` keep the semantic
/// direction (dependent -> head for dependency edges).
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub source: NodeId,
    pub target: NodeId,
    pub kind: EdgeKind,
    pub relation: String,
    pub similarity: Option<f64>,
}

/// Heterogeneous text graph over one (context, claim) pair. Built once by
/// the pipeline stages, then read-only for search and ranking.
pub struct TextGraph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    adjacency: Vec<Vec<(NodeId, usize)>>,
    edge_keys: HashSet<(NodeId, NodeId, EdgeKind)>,
    word_ids: HashMap<(String, String), NodeId>,
    sentence_ids: Vec<NodeId>,
    sentence_ordinals: HashMap<NodeId, usize>,
    entity_ids: HashMap<String, NodeId>,
    claim_id: Option<NodeId>,
}

impl TextGraph {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            adjacency: Vec::new(),
            edge_keys: HashSet::new(),
            word_ids: HashMap::new(),
            sentence_ids: Vec::new(),
            sentence_ordinals: HashMap::new(),
            entity_ids: HashMap::new(),
            claim_id: None,
        }
    }

    /// Add a word type node. Identity is the `(text, pos)` pair; a
    /// duplicate add returns the existing node.
    pub fn add_word(&mut self, text: &str, pos: &str, lemma: &str) -> NodeId {
        let key = (text.to_string(), pos.to_string());
        if let Some(&id) = self.word_ids.get(&key) {
            return id;
        }
        let id = self.push_node(Node {
            id: 0,
            kind: NodeKind::Word,
            text: text.to_string(),
            pos: pos.to_string(),
            lemma: lemma.to_string(),
            entity_type: String::new(),
        });
        self.word_ids.insert(key, id);
        id
    }

    /// Add a sentence node; the ordinal is its position in input order.
    pub fn add_sentence(&mut self, text: &str) -> NodeId {
        let id = self.push_node(Node {
            id: 0,
            kind: NodeKind::Sentence,
            text: text.to_string(),
            pos: String::new(),
            lemma: String::new(),
            entity_type: String::new(),
        });
        self.sentence_ordinals.insert(id, self.sentence_ids.len());
        self.sentence_ids.push(id);
        id
    }

    /// Set the single claim node. Graphs are single-shot: a second call
    /// is ignored and the existing claim is returned.
    pub fn set_claim(&mut self, text: &str) -> NodeId {
        if let Some(id) = self.claim_id {
            warn!("claim node already set, keeping the existing one");
            return id;
        }
        let id = self.push_node(Node {
            id: 0,
            kind: NodeKind::Claim,
            text: text.to_string(),
            pos: String::new(),
            lemma: String::new(),
            entity_type: String::new(),
        });
        self.claim_id = Some(id);
        id
    }

    /// Add an entity node, deduplicated by exact name.
    pub fn add_entity(&mut self, name: &str, entity_type: &str) -> NodeId {
        if let Some(&id) = self.entity_ids.get(name) {
            return id;
        }
        let id = self.push_node(Node {
            id: 0,
            kind: NodeKind::Entity,
            text: name.to_string(),
            pos: String::new(),
            lemma: String::new(),
            entity_type: entity_type.to_string(),
        });
        self.entity_ids.insert(name.to_string(), id);
        id
    }

    /// Structural edge: word occurs in this sentence or in the claim.
    pub fn connect(&mut self, word: NodeId, utterance: NodeId) -> bool {
        self.insert_edge(Edge {
            source: word,
            target: utterance,
            kind: EdgeKind::Structural,
            relation: String::new(),
            similarity: None,
        })
    }

    /// Dependency edge from dependent to head within one sentence.
    pub fn connect_dependency(&mut self, dependent: NodeId, head: NodeId, relation: &str) -> bool {
        self.insert_edge(Edge {
            source: dependent,
            target: head,
            kind: EdgeKind::Dependency,
            relation: relation.to_string(),
            similarity: None,
        })
    }

    /// Entity mention edge: entity name appears in the sentence text.
    pub fn connect_entity(&mut self, entity: NodeId, sentence: NodeId) -> bool {
        self.insert_edge(Edge {
            source: entity,
            target: sentence,
            kind: EdgeKind::Entity,
            relation: String::new(),
            similarity: None,
        })
    }

    /// Semantic similarity edge between two same-POS words.
    pub fn connect_semantic(&mut self, a: NodeId, b: NodeId, similarity: f64) -> bool {
        self.insert_edge(Edge {
            source: a,
            target: b,
            kind: EdgeKind::Semantic,
            relation: String::new(),
            similarity: Some(similarity),
        })
    }

    /// At most one edge of a kind per unordered endpoint pair.
    pub fn has_edge(&self, a: NodeId, b: NodeId, kind: EdgeKind) -> bool {
        self.edge_keys.contains(&Self::edge_key(a, b, kind))
    }

    /// The edge of a kind between two nodes, regardless of direction.
    pub fn find_edge(&self, a: NodeId, b: NodeId, kind: EdgeKind) -> Option<&Edge> {
        self.adjacency.get(a)?.iter().find_map(|&(neighbor, idx)| {
            let edge = &self.edges[idx];
            (neighbor == b && edge.kind == kind).then_some(edge)
        })
    }

    pub(crate) fn insert_edge(&mut self, edge: Edge) -> bool {
        if edge.source >= self.nodes.len() || edge.target >= self.nodes.len() {
            warn!(
                source = edge.source,
                target = edge.target,
                "dropping edge with unknown endpoint"
            );
            return false;
        }
        let key = Self::edge_key(edge.source, edge.target, edge.kind);
        if !self.edge_keys.insert(key) {
            return false;
        }
        let edge_idx = self.edges.len();
        self.adjacency[edge.source].push((edge.target, edge_idx));
        self.adjacency[edge.target].push((edge.source, edge_idx));
        self.edges.push(edge);
        true
    }

    /// Re-insert a node from an export. Ids must arrive in creation order.
    pub(crate) fn insert_node_raw(&mut self, node: Node) -> NodeId {
        match node.kind {
            NodeKind::Word => {
                let key = (node.text.clone(), node.pos.clone());
                let id = self.push_node(node);
                self.word_ids.insert(key, id);
                id
            }
            NodeKind::Sentence => {
                let id = self.push_node(node);
                self.sentence_ordinals.insert(id, self.sentence_ids.len());
                self.sentence_ids.push(id);
                id
            }
            NodeKind::Claim => {
                let id = self.push_node(node);
                if self.claim_id.is_none() {
                    self.claim_id = Some(id);
                }
                id
            }
            NodeKind::Entity => {
                let key = node.text.clone();
                let id = self.push_node(node);
                self.entity_ids.insert(key, id);
                id
            }
        }
    }

    fn push_node(&mut self, mut node: Node) -> NodeId {
        let id = self.nodes.len();
        node.id = id;
        self.nodes.push(node);
        self.adjacency.push(Vec::new());
        id
    }

    fn edge_key(a: NodeId, b: NodeId, kind: EdgeKind) -> (NodeId, NodeId, EdgeKind) {
        if a <= b {
            (a, b, kind)
        } else {
            (b, a, kind)
        }
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn edge(&self, idx: usize) -> &Edge {
        &self.edges[idx]
    }

    /// Neighbors of a node as `(neighbor_id, edge_index)` pairs, in edge
    /// insertion order.
    pub fn neighbors(&self, id: NodeId) -> &[(NodeId, usize)] {
        &self.adjacency[id]
    }

    pub fn claim_id(&self) -> Option<NodeId> {
        self.claim_id
    }

    pub fn sentence_ids(&self) -> &[NodeId] {
        &self.sentence_ids
    }

    /// Input-order ordinal of a sentence node.
    pub fn sentence_ordinal(&self, id: NodeId) -> Option<usize> {
        self.sentence_ordinals.get(&id).copied()
    }

    pub fn word_id(&self, text: &str, pos: &str) -> Option<NodeId> {
        self.word_ids
            .get(&(text.to_string(), pos.to_string()))
            .copied()
    }

    pub fn entity_id(&self, name: &str) -> Option<NodeId> {
        self.entity_ids.get(name).copied()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn count_nodes_of_kind(&self, kind: NodeKind) -> usize {
        self.nodes.iter().filter(|n| n.kind == kind).count()
    }

    pub fn count_edges_of_kind(&self, kind: EdgeKind) -> usize {
        self.edges.iter().filter(|e| e.kind == kind).count()
    }
}

impl Default for TextGraph {
    fn default() -> Self {
        Self::new()
    }
}
