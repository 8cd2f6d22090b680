pub mod client;
pub mod prompt;
pub mod schema;

pub use client::ExtractorClient;
pub use schema::ExtractedEntity;

use anyhow::{Context, Result};
use regex::Regex;
use std::collections::HashSet;

/// Parse an extractor reply: strip markdown code fences some models wrap
/// around their output, require a JSON array of `{name, type}` objects,
/// drop blank names, and dedup by exact name keeping first occurrence.
pub fn parse_entities(response: &str) -> Result<Vec<ExtractedEntity>> {
    let cleaned = strip_code_fences(response);

    let parsed: Vec<ExtractedEntity> =
        serde_json::from_str(cleaned.trim()).context("Extractor response is not a JSON array of {name, type} objects")?;

    let mut seen: HashSet<String> = HashSet::new();
    let mut entities = Vec::new();
    for mut entity in parsed {
        entity.name = entity.name.trim().to_string();
        entity.entity_type = entity.entity_type.trim().to_string();
        if entity.name.is_empty() {
            continue;
        }
        if seen.insert(entity.name.clone()) {
            entities.push(entity);
        }
    }

    Ok(entities)
}

fn strip_code_fences(response: &str) -> String {
    let re = Regex::new(r"(?s)^\s*```(?:json)?\s*(.*?)\s*```\s*$").unwrap();
    match re.captures(response) {
        Some(caps) => caps[1].to_string(),
        None => response.to_string(),
    }
}
