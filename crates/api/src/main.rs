mod metrics;

use annotate::Annotation;
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use extract::ExtractorClient;
use graph::GraphStatistics;
use index::{EmbeddingCache, EmbeddingClient};
use pipeline::{
    AnalysisRequest, Diagnostics, EmbeddingProvider, EntityProvider, Pipeline, PipelineConfig,
    PipelineError,
};
use search::{Path, RankedSentence};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use metrics::{Metrics, TimedOperation};

#[derive(Clone)]
struct AppState {
    config: PipelineConfig,
    cache: EmbeddingCache,
    metrics: Arc<Metrics>,
}

#[derive(Serialize)]
struct HealthResponse {
    extractor: String,
    embedder: String,
}

#[derive(Deserialize)]
struct AnalyzeRequest {
    /// Raw context text, used for entity extraction
    context: String,
    /// Annotator output for the context sentences
    context_annotation: Annotation,
    /// Annotator output for the claim
    claim_annotation: Annotation,
    /// Optional per-request overrides
    config: Option<PipelineConfig>,
}

#[derive(Serialize)]
struct AnalyzeResponse {
    statistics: GraphStatistics,
    ranked_sentences: Vec<RankedSentence>,
    paths: Vec<Path>,
    diagnostics: Diagnostics,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let state = AppState {
        config: PipelineConfig::default(),
        cache: EmbeddingCache::default(),
        metrics: Metrics::new(),
    };

    let app = Router::new()
        .route("/health", get(health_check))
        .route("/analyze", post(analyze))
        .route("/metrics", get(metrics_snapshot))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000")
        .await
        .expect("Failed to bind port 3000");

    tracing::info!("Server listening on http://localhost:3000");

    axum::serve(listener, app).await.expect("Server crashed");
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    // Both collaborators live behind the same base URL by default; probe
    // it once per collaborator so per-model overrides still show up.
    let probe = |url: String| async move {
        match reqwest::get(&url).await {
            Ok(resp) if resp.status().is_success() => "ok".to_string(),
            Ok(resp) => format!("error: status {}", resp.status()),
            Err(e) => format!("error: {}", e),
        }
    };

    let base = state.config.external.base_url.clone();
    Json(HealthResponse {
        extractor: probe(base.clone()).await,
        embedder: probe(base).await,
    })
}

async fn analyze(
    State(state): State<AppState>,
    Json(req): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, StatusCode> {
    let config = req.config.unwrap_or_else(|| state.config.clone());
    let pipeline = build_pipeline(config, state.cache.clone());

    let request = AnalysisRequest {
        context_text: req.context,
        context: req.context_annotation,
        claim: req.claim_annotation,
    };

    let timer = TimedOperation::start();
    match pipeline.run(&request).await {
        Ok(outcome) => {
            state.metrics.record_request(true);
            state.metrics.record_analyze(
                timer.elapsed(),
                outcome.paths.len(),
                outcome.ranked_sentences.len(),
                outcome.diagnostics.external_unavailable,
            );
            Ok(Json(AnalyzeResponse {
                statistics: outcome.statistics,
                ranked_sentences: outcome.ranked_sentences,
                paths: outcome.paths,
                diagnostics: outcome.diagnostics,
            }))
        }
        Err(e) => {
            state.metrics.record_request(false);
            tracing::error!(error = %e, "analysis failed");
            Err(match e {
                PipelineError::AnnotatorInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
                PipelineError::ExternalUnavailable(_) => StatusCode::BAD_GATEWAY,
                PipelineError::ResourceExhausted(_) => StatusCode::INSUFFICIENT_STORAGE,
                PipelineError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
            })
        }
    }
}

async fn metrics_snapshot(State(state): State<AppState>) -> Json<metrics::MetricsSnapshot> {
    Json(state.metrics.snapshot())
}

/// Live collaborators from the request's (or default) config, sharing
/// the process-wide embedding cache.
fn build_pipeline(config: PipelineConfig, cache: EmbeddingCache) -> Pipeline {
    let external = &config.external;
    let extractor = ExtractorClient::new(
        external.base_url.clone(),
        external.extract_model.clone(),
    );
    let embedder = EmbeddingClient::new(
        external.base_url.clone(),
        external.embed_model.clone(),
    );
    Pipeline::with_providers(
        config,
        EntityProvider::Live(extractor),
        EmbeddingProvider::Live(embedder),
        cache,
    )
}
