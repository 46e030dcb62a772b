//! Model catalog served at `/v1/models`

use serde::{Deserialize, Serialize};

/// One entry of the OpenAI model list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelEntry {
    pub id: String,
    #[serde(default = "default_object")]
    pub object: String,
    pub created: u64,
    pub owned_by: String,
}

fn default_object() -> String {
    "model".to_string()
}

impl ModelEntry {
    #[must_use]
    pub fn new(id: impl Into<String>, created: u64, owned_by: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            object: default_object(),
            created,
            owned_by: owned_by.into(),
        }
    }
}

/// `GET /v1/models` response body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelList {
    pub object: String,
    pub data: Vec<ModelEntry>,
}

impl ModelList {
    #[must_use]
    pub fn new(data: Vec<ModelEntry>) -> Self {
        Self {
            object: "list".to_string(),
            data,
        }
    }
}

/// Models the upstream web chat offers
#[must_use]
pub fn default_models() -> Vec<ModelEntry> {
    vec![
        ModelEntry::new("deepseek-chat", 1_735_693_261, "deepseek"),
        ModelEntry::new("deepseek-coder", 1_735_693_262, "deepseek"),
    ]
}
