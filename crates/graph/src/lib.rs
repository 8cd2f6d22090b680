pub mod builder;
pub mod export;
pub mod linker;
pub mod model;
pub mod semantic;
pub mod stats;

pub use builder::{GraphBuilder, PosFilter};
pub use export::{load_graph, save_graph, EdgeRecord, GraphExport, NodeRecord};
pub use linker::{link_entities, EntityRecord};
pub use model::{Edge, EdgeKind, Node, NodeId, NodeKind, TextGraph};
pub use semantic::{build_semantic_edges, SemanticParams};
pub use stats::{
    semantic_statistics, shared_words, statistics, GraphStatistics, SemanticStats, SharedWord,
};
