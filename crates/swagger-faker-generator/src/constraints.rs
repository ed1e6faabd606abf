use serde::{Deserialize, Serialize};

/// Generation limits handed to the generator with every request.
///
/// Serialized in camelCase, matching the JSON-schema keywords each field
/// caps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Constraints {
    pub max_items: i64,
    pub min_items: i64,
    pub unique_items: bool,
    pub multiple_of: i64,
    pub maximum: i64,
    pub minimum: i64,
    /// Percent chance (0-100) that an optional property is emitted.
    pub chance_required: i64,
    pub max_length: i64,
    pub min_length: i64,
}

impl Default for Constraints {
    fn default() -> Self {
        Self {
            max_items: 10,
            min_items: 0,
            unique_items: false,
            multiple_of: 1,
            maximum: 1_000_000,
            minimum: 0,
            chance_required: 80,
            max_length: 255,
            min_length: 0,
        }
    }
}
