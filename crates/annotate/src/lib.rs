pub mod token;

pub use token::{AnnotatedSentence, Annotation, Token};

use anyhow::{Context, Result};
use serde_json::Value;
use std::collections::BTreeMap;

/// Parse the annotator's native output: a JSON object mapping sentence
/// index (as a string key) to an array of token records.
pub fn parse_annotator_output(json: &str) -> Result<Annotation> {
    let value: Value = serde_json::from_str(json).context("annotator output is not valid JSON")?;

    let map = value
        .as_object()
        .context("annotator output must be an object keyed by sentence index")?;

    // String keys sort lexicographically; re-key numerically so sentence
    // order survives ("10" after "9").
    let mut ordered: BTreeMap<usize, Vec<Token>> = BTreeMap::new();
    for (key, tokens) in map {
        let idx: usize = key
            .parse()
            .with_context(|| format!("sentence key '{}' is not an index", key))?;
        let tokens: Vec<Token> = serde_json::from_value(tokens.clone())
            .with_context(|| format!("sentence {} has malformed token records", idx))?;
        ordered.insert(idx, tokens);
    }

    let annotation = Annotation::new(
        ordered
            .into_values()
            .map(AnnotatedSentence::new)
            .collect::<Vec<_>>(),
    );
    annotation.validate()?;
    Ok(annotation)
}
