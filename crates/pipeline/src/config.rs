use chrono::{DateTime, Utc};
use graph::{PosFilter, SemanticParams};
use search::{RankingMethod, ScoreWeights, SearchParams};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub pos_filter_enabled: bool,
    pub pos_filter_tags: Vec<String>,
    pub entities_enabled: bool,
    pub similarity_threshold: f64,
    pub top_k: usize,
    pub use_fast_index: bool,
    pub beam_width: usize,
    pub max_depth: usize,
    pub max_paths: usize,
    pub ranking_method: RankingMethod,
    pub weights: ScoreWeights,
    pub auto_save_graph: bool,
    pub auto_save_path: String,
    pub external: ExternalConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            pos_filter_enabled: true,
            pos_filter_tags: PosFilter::DEFAULT_TAGS
                .iter()
                .map(|t| t.to_string())
                .collect(),
            entities_enabled: true,
            similarity_threshold: 0.85,
            top_k: 5,
            use_fast_index: true,
            beam_width: 10,
            max_depth: 6,
            max_paths: 20,
            ranking_method: RankingMethod::Frequency,
            weights: ScoreWeights::default(),
            auto_save_graph: false,
            auto_save_path: "output/text_graph_{timestamp}.json".to_string(),
            external: ExternalConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn pos_filter(&self) -> PosFilter {
        if self.pos_filter_enabled {
            PosFilter::with_tags(self.pos_filter_tags.iter().cloned())
        } else {
            PosFilter::disabled()
        }
    }

    pub fn semantic_params(&self) -> SemanticParams {
        SemanticParams {
            similarity_threshold: self.similarity_threshold,
            top_k: self.top_k,
            use_fast_index: self.use_fast_index,
        }
    }

    pub fn search_params(&self) -> SearchParams {
        SearchParams {
            beam_width: self.beam_width,
            max_depth: self.max_depth,
            max_paths: self.max_paths,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExternalConfig {
    pub base_url: String,
    pub extract_model: String,
    pub embed_model: String,
    pub retry: RetryConfig,
}

impl Default for ExternalConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            extract_model: "llama3".to_string(),
            embed_model: "phobert-base".to_string(),
            retry: RetryConfig::default(),
        }
    }
}

/// Attempt budget and pacing for the collaborator boundary. The deadline
/// bounds each individual call; an overrun is a recoverable failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: usize,
    pub attempt_timeout_secs: u64,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            attempt_timeout_secs: 60,
            initial_backoff_ms: 1000,
            max_backoff_ms: 10000,
        }
    }
}

/// Replace `{timestamp}` in an export path with a sortable UTC stamp.
pub fn substitute_timestamp(path: &str, now: DateTime<Utc>) -> String {
    path.replace("{timestamp}", &now.format("%Y%m%d_%H%M%S").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_defaults_match_documented_values() {
        let config = PipelineConfig::default();
        assert!(config.pos_filter_enabled);
        assert_eq!(config.similarity_threshold, 0.85);
        assert_eq!(config.top_k, 5);
        assert_eq!(config.beam_width, 10);
        assert_eq!(config.max_depth, 6);
        assert_eq!(config.max_paths, 20);
        assert!(config.pos_filter_tags.contains(&"Np".to_string()));
    }

    #[test]
    fn test_partial_json_overrides_only_named_fields() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{"top_k": 3, "beam_width": 4}"#).unwrap();
        assert_eq!(config.top_k, 3);
        assert_eq!(config.beam_width, 4);
        assert_eq!(config.max_depth, 6);
        assert!(config.use_fast_index);
    }

    #[test]
    fn test_timestamp_substitution() {
        let now = Utc.with_ymd_and_hms(2025, 3, 26, 4, 0, 0).unwrap();
        assert_eq!(
            substitute_timestamp("output/text_graph_{timestamp}.json", now),
            "output/text_graph_20250326_040000.json"
        );
        assert_eq!(substitute_timestamp("plain.json", now), "plain.json");
    }
}
