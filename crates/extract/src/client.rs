use anyhow::{bail, Context, Result};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::prompt;
use crate::schema::ExtractedEntity;

/// HTTP client for the entity extractor, an Ollama-compatible model
/// server. The engine consults it exactly once per context; when the
/// reply is not the expected entity array, the client spends one
/// corrective round-trip before giving up, and the caller degrades to
/// zero entities from there.
#[derive(Clone)]
pub struct ExtractorClient {
    endpoint: String,
    model: String,
    sampling: Sampling,
    http: reqwest::Client,
}

/// Entity extraction wants reproducible output, so sampling is pinned
/// cold with a bounded reply length.
#[derive(Clone, Copy, Serialize)]
struct Sampling {
    temperature: f32,
    num_predict: u32,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    format: &'a str,
    options: Sampling,
}

impl ExtractorClient {
    pub fn new(base_url: String, model: String) -> Self {
        Self {
            endpoint: format!("{}/api/generate", base_url.trim_end_matches('/')),
            model,
            sampling: Sampling {
                temperature: 0.0,
                num_predict: 1000,
            },
            http: reqwest::Client::new(),
        }
    }

    pub fn default() -> Self {
        Self::new(
            "http://localhost:11434".to_string(),
            "llama3".to_string(),
        )
    }

    /// Ask the extractor for the entities of one context document.
    pub async fn extract_entities(&self, context_text: &str) -> Result<Vec<ExtractedEntity>> {
        let reply = self
            .complete(&prompt::build_entity_prompt(context_text))
            .await?;

        let entities = match crate::parse_entities(&reply) {
            Ok(entities) => entities,
            Err(first_error) => {
                warn!(
                    error = %first_error,
                    "extractor reply was not an entity array, asking for a correction"
                );
                let corrected = self
                    .complete(&prompt::build_retry_prompt(&reply))
                    .await
                    .context("correction round-trip failed")?;
                crate::parse_entities(&corrected)
                    .context("extractor reply stayed malformed after one correction")?
            }
        };

        info!(count = entities.len(), "extracted entities");
        Ok(entities)
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let request = CompletionRequest {
            model: &self.model,
            prompt,
            stream: false,
            format: "json",
            options: self.sampling,
        };

        let response = self
            .http
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .with_context(|| format!("entity extractor at {} is unreachable", self.endpoint))?;

        let status = response.status();
        if !status.is_success() {
            bail!("entity extractor answered {}", status);
        }

        let body: Value = response
            .json()
            .await
            .context("entity extractor envelope was not JSON")?;
        match body.get("response").and_then(Value::as_str) {
            Some(text) => Ok(text.to_string()),
            None => bail!("entity extractor envelope had no response field"),
        }
    }
}
