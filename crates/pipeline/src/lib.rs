pub mod boundary;
pub mod config;
pub mod diagnostics;
pub mod error;

pub use boundary::CollaboratorBoundary;
pub use config::{substitute_timestamp, ExternalConfig, PipelineConfig, RetryConfig};
pub use diagnostics::Diagnostics;
pub use error::{PipelineError, Result};

use annotate::Annotation;
use chrono::Utc;
use extract::{ExtractedEntity, ExtractorClient};
use graph::{
    build_semantic_edges, link_entities, statistics, EntityRecord, GraphBuilder, GraphStatistics,
    NodeKind, TextGraph,
};
use index::{EmbeddingCache, EmbeddingClient, EmbeddingSet};
use search::{rank_sentences, BeamSearchEngine, Path, RankedSentence};
use std::path::Path as FsPath;
use tracing::{info, warn};

/// Ceiling for the live-fetched embedding matrix; exceeding it is a
/// fatal `ResourceExhausted` rather than an allocator abort.
const MAX_EMBEDDING_MATRIX_BYTES: usize = 2 << 30;

/// Where stage B gets its entities. `Fixed` feeds a canned raw extractor
/// reply through the same strict-JSON parsing a live reply would see.
pub enum EntityProvider {
    Live(ExtractorClient),
    Fixed(String),
    Disabled,
}

/// Where stage C gets its vectors.
pub enum EmbeddingProvider {
    Live(EmbeddingClient),
    Fixed(EmbeddingSet),
    Disabled,
}

/// One (context, claim) pair, already annotated.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub context_text: String,
    pub context: Annotation,
    pub claim: Annotation,
}

/// Everything a run produces: the finished graph plus the ranked
/// evidence and the run's diagnostics.
pub struct AnalysisOutcome {
    pub graph: TextGraph,
    pub paths: Vec<Path>,
    pub ranked_sentences: Vec<RankedSentence>,
    pub statistics: GraphStatistics,
    pub diagnostics: Diagnostics,
}

/// Stages A through E over one worker. A pipeline owns no shared mutable
/// state beyond the embedding cache, which is safe to share across
/// instances.
pub struct Pipeline {
    config: PipelineConfig,
    entities: EntityProvider,
    embeddings: EmbeddingProvider,
    cache: EmbeddingCache,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        let external = &config.external;
        let extractor = ExtractorClient::new(
            external.base_url.clone(),
            external.extract_model.clone(),
        );
        let embedder = EmbeddingClient::new(
            external.base_url.clone(),
            external.embed_model.clone(),
        );
        Self {
            entities: EntityProvider::Live(extractor),
            embeddings: EmbeddingProvider::Live(embedder),
            cache: EmbeddingCache::default(),
            config,
        }
    }

    /// Build with explicit providers; used by tests and by callers that
    /// share an embedding cache across pipelines.
    pub fn with_providers(
        config: PipelineConfig,
        entities: EntityProvider,
        embeddings: EmbeddingProvider,
        cache: EmbeddingCache,
    ) -> Self {
        Self {
            config,
            entities,
            embeddings,
            cache,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub async fn run(&self, request: &AnalysisRequest) -> Result<AnalysisOutcome> {
        request
            .context
            .validate()
            .map_err(|e| PipelineError::AnnotatorInput(format!("context: {e:#}")))?;
        request
            .claim
            .validate()
            .map_err(|e| PipelineError::AnnotatorInput(format!("claim: {e:#}")))?;
        if request.claim.is_empty() {
            return Err(PipelineError::AnnotatorInput(
                "claim annotation has no tokens".to_string(),
            ));
        }

        let mut diagnostics = Diagnostics::new();

        // Stage A: graph skeleton from the annotations
        let builder = GraphBuilder::new(self.config.pos_filter());
        let mut graph = builder.build(&request.context, &request.claim);
        info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "graph built"
        );

        // Stage B: entity nodes and mention edges
        if self.config.entities_enabled && !graph.sentence_ids().is_empty() {
            match self.fetch_entities(&request.context_text).await {
                None => {}
                Some(Ok(entities)) => {
                    let records: Vec<EntityRecord> = entities
                        .into_iter()
                        .map(|e| EntityRecord {
                            name: e.name,
                            entity_type: e.entity_type,
                        })
                        .collect();
                    link_entities(&mut graph, &records);
                }
                Some(Err(e)) => {
                    warn!(error = %e, "entity extraction failed, continuing without entities");
                    diagnostics.record_external_unavailable(e.to_string());
                }
            }
        }

        // Stage C: semantic similarity edges
        if self.config.top_k > 0 {
            if let Some(embeddings) = self.collect_embeddings(&graph, &mut diagnostics).await? {
                build_semantic_edges(&mut graph, &embeddings, &self.config.semantic_params());
            }
        }

        // Stage D: beam search from the claim
        let engine = BeamSearchEngine::new(
            &graph,
            self.config.search_params(),
            self.config.weights.clone(),
        );
        let paths = engine.search();

        // Stage E: aggregate sentences over the path set
        let ranked_sentences = rank_sentences(&graph, &paths, self.config.ranking_method);

        let statistics = statistics(&graph, self.config.similarity_threshold);

        if self.config.auto_save_graph {
            let path = substitute_timestamp(&self.config.auto_save_path, Utc::now());
            match graph::save_graph(&graph, FsPath::new(&path)) {
                Ok(()) => info!(path = %path, "graph export saved"),
                Err(e) => {
                    warn!(error = %e, path = %path, "graph auto-save failed");
                    diagnostics.record_serialization_error(format!("graph auto-save: {e:#}"));
                }
            }
        }

        Ok(AnalysisOutcome {
            graph,
            paths,
            ranked_sentences,
            statistics,
            diagnostics,
        })
    }

    async fn fetch_entities(&self, context_text: &str) -> Option<Result<Vec<ExtractedEntity>>> {
        match &self.entities {
            EntityProvider::Disabled => None,
            EntityProvider::Fixed(raw) => Some(extract::parse_entities(raw).map_err(|e| {
                PipelineError::ExternalUnavailable(format!("entity extractor: {e:#}"))
            })),
            EntityProvider::Live(extractor) => {
                let boundary = CollaboratorBoundary::from_config(
                    "entity extractor",
                    &self.config.external.retry,
                );
                Some(
                    boundary
                        .call(|| extractor.extract_entities(context_text))
                        .await,
                )
            }
        }
    }

    /// Vectors for every word node. A live embedder failure degrades to
    /// "no semantic edges" (returns None); only the matrix-size guard is
    /// fatal.
    async fn collect_embeddings(
        &self,
        graph: &TextGraph,
        diagnostics: &mut Diagnostics,
    ) -> Result<Option<EmbeddingSet>> {
        match &self.embeddings {
            EmbeddingProvider::Disabled => Ok(None),
            EmbeddingProvider::Fixed(set) => Ok(Some(set.clone())),
            EmbeddingProvider::Live(client) => {
                let words: Vec<(String, String)> = graph
                    .nodes()
                    .iter()
                    .filter(|n| n.kind == NodeKind::Word)
                    .map(|n| (n.text.clone(), n.pos.clone()))
                    .collect();

                let boundary =
                    CollaboratorBoundary::from_config("embedder", &self.config.external.retry);
                let mut set = EmbeddingSet::new();
                let mut dim = 0usize;

                for (text, pos) in &words {
                    if let Some(vector) = self.cache.get(text, pos) {
                        set.insert(text, pos, vector);
                        continue;
                    }
                    match boundary.call(|| client.embed(text, pos)).await {
                        Ok(vector) => {
                            if dim == 0 {
                                dim = vector.len();
                                let bytes =
                                    words.len() * dim * std::mem::size_of::<f32>();
                                if bytes > MAX_EMBEDDING_MATRIX_BYTES {
                                    return Err(PipelineError::ResourceExhausted(format!(
                                        "embedding matrix of {} words x {} dims needs {} bytes",
                                        words.len(),
                                        dim,
                                        bytes
                                    )));
                                }
                            }
                            self.cache.set(text, pos, vector.clone());
                            set.insert(text, pos, vector);
                        }
                        Err(e) => {
                            warn!(error = %e, word = %text, "embedder failed, skipping semantic edges");
                            diagnostics.record_external_unavailable(e.to_string());
                            return Ok(None);
                        }
                    }
                }

                Ok(Some(set))
            }
        }
    }

    /// Explicit graph export; failures surface as `Serialization`.
    pub fn export_graph(&self, graph: &TextGraph, path: &FsPath) -> Result<()> {
        graph::save_graph(graph, path).map_err(|e| PipelineError::Serialization(format!("{e:#}")))
    }

    /// Path JSON document plus its human-readable summary.
    pub fn export_paths(
        &self,
        outcome: &AnalysisOutcome,
        json_path: &FsPath,
        summary_path: &FsPath,
    ) -> Result<()> {
        let params = self.config.search_params();
        let document = search::build_export(&outcome.graph, &params, &outcome.paths);
        search::save_paths(&document, json_path)
            .map_err(|e| PipelineError::Serialization(format!("{e:#}")))?;
        let summary = search::write_summary(&outcome.graph, &params, &outcome.paths);
        search::save_summary(&summary, summary_path)
            .map_err(|e| PipelineError::Serialization(format!("{e:#}")))
    }
}
