use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Client for the external contextual word embedder. The POS tag is part
/// of the request so homographs with different tags embed independently.
#[derive(Clone)]
pub struct EmbeddingClient {
    base_url: String,
    model: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct EmbeddingRequest {
    model: String,
    prompt: String,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

impl EmbeddingClient {
    pub fn new(base_url: String, model: String) -> Self {
        Self {
            base_url,
            model,
            client: reqwest::Client::new(),
        }
    }

    pub fn default() -> Self {
        Self::new(
            "http://localhost:11434".to_string(),
            "phobert-base".to_string(),
        )
    }

    /// Embed one word type. Deterministic per `(text, pos)` input.
    pub async fn embed(&self, text: &str, pos: &str) -> Result<Vec<f32>> {
        let url = format!("{}/api/embeddings", self.base_url);

        let request = EmbeddingRequest {
            model: self.model.clone(),
            // The tag rides along after a control separator so requests
            // stay distinct per tag without polluting the word text.
            prompt: format!("{}\u{1}{}", text, pos),
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .context("Failed to send embedding request")?;

        if !response.status().is_success() {
            anyhow::bail!("Embedding request failed: {}", response.status());
        }

        let embedding_response: EmbeddingResponse = response
            .json()
            .await
            .context("Failed to parse embedding response")?;

        Ok(embedding_response.embedding)
    }

    /// Probe the embedder and report its native dimension.
    pub async fn get_dimension(&self) -> Result<usize> {
        let test_embedding = self.embed("test", "N").await?;
        Ok(test_embedding.len())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}
