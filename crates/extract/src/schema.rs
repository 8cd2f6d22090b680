use serde::{Deserialize, Serialize};

/// One entity from the extractor's strict-JSON response. `entity_type`
/// is a free-form tag: PERSON, ORG, LOC, DATE, NUMBER, PRODUCT, EVENT.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedEntity {
    pub name: String,
    #[serde(rename = "type", default)]
    pub entity_type: String,
}
