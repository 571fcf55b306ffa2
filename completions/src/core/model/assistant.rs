use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Read-only record from the user/organization/assistant directory (§3,
/// out of scope per §1 — this is the shape the core expects from it, not
/// an owned table).
#[cfg_attr(feature = "http", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assistant {
    pub id: i64,
    pub owner: String,
    pub name: String,
    #[serde(default)]
    pub system_prompt: String,
    #[serde(default)]
    pub prompt_template: String,
    #[serde(default = "default_rag_processor")]
    pub rag_processor_name: String,
    #[serde(default = "default_prompt_processor")]
    pub prompt_processor_name: String,
    #[serde(default = "default_connector")]
    pub connector_name: String,
    pub llm_name: String,
    /// Comma-separated collection ids (§3); use [Assistant::rag_collection_ids]
    /// rather than splitting this directly.
    #[serde(default)]
    pub rag_collections: String,
    #[serde(default = "default_top_k")]
    pub rag_top_k: u32,
    #[serde(default)]
    #[cfg_attr(feature = "http", schema(value_type = Object))]
    pub metadata: Value,
}

fn default_rag_processor() -> String {
    "simple_rag".to_string()
}

fn default_prompt_processor() -> String {
    "simple_augment".to_string()
}

fn default_connector() -> String {
    "openai".to_string()
}

fn default_top_k() -> u32 {
    5
}

impl Assistant {
    /// `lamb_assistant.<id>`, the OpenAI-style model id this assistant is
    /// addressed by over the completion API (§2 supplement).
    pub fn model_id(&self) -> String {
        format!("lamb_assistant.{}", self.id)
    }

    /// Parses `rag_collections` into the list of collection ids to fan the
    /// RAG query out to (§4.7 step c). Blank entries are skipped.
    pub fn rag_collection_ids(&self) -> Vec<String> {
        self.rag_collections
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    }

    pub fn rag_disabled(&self) -> bool {
        self.rag_processor_name == "no_rag"
    }
}

/// Parses the `<id>` out of a `lamb_assistant.<id>` model string, as sent
/// in `POST /v1/chat/completions`'s `model` field.
pub fn parse_assistant_model_id(model: &str) -> Option<i64> {
    model.strip_prefix("lamb_assistant.")?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_and_parses_model_id() {
        let assistant = Assistant {
            id: 42,
            owner: "alice".into(),
            name: "tutor".into(),
            system_prompt: String::new(),
            prompt_template: String::new(),
            rag_processor_name: default_rag_processor(),
            prompt_processor_name: default_prompt_processor(),
            connector_name: default_connector(),
            llm_name: "gpt-4o-mini".into(),
            rag_collections: "1, 2 ,3".into(),
            rag_top_k: 5,
            metadata: Value::Null,
        };

        assert_eq!(assistant.model_id(), "lamb_assistant.42");
        assert_eq!(parse_assistant_model_id(&assistant.model_id()), Some(42));
        assert_eq!(assistant.rag_collection_ids(), vec!["1", "2", "3"]);
    }

    #[test]
    fn no_rag_disables_fan_out() {
        let mut assistant_rag_name = default_rag_processor();
        assert_ne!(assistant_rag_name, "no_rag");
        assistant_rag_name = "no_rag".to_string();
        assert_eq!(assistant_rag_name, "no_rag");
    }
}
