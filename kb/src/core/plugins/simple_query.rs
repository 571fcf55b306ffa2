use serde::Deserialize;
use serde_json::{json, Value};

use crate::core::plugin::{QueryParams, QueryPlugin};
use crate::error::KbError;
use crate::map_err;

const DEFAULT_TOP_K: u32 = 5;
const DEFAULT_THRESHOLD: f32 = 0.0;

#[derive(Debug, Deserialize)]
struct SimpleQueryParams {
    #[serde(default = "default_top_k")]
    top_k: u32,
    #[serde(default = "default_threshold")]
    threshold: f32,
}

fn default_top_k() -> u32 {
    DEFAULT_TOP_K
}

fn default_threshold() -> f32 {
    DEFAULT_THRESHOLD
}

/// Resolves `{top_k, threshold}` with no further behavior (§4.5).
pub struct SimpleQuery;

impl QueryPlugin for SimpleQuery {
    fn name(&self) -> &'static str {
        "simple_query"
    }

    fn description(&self) -> &'static str {
        "Plain top-k similarity search with an optional score threshold."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "top_k": { "type": "integer", "default": DEFAULT_TOP_K },
                "threshold": { "type": "number", "default": DEFAULT_THRESHOLD }
            },
            "required": []
        })
    }

    fn resolve(&self, params: &Value) -> Result<QueryParams, KbError> {
        let params: SimpleQueryParams = if params.is_null() {
            SimpleQueryParams {
                top_k: DEFAULT_TOP_K,
                threshold: DEFAULT_THRESHOLD,
            }
        } else {
            map_err!(serde_json::from_value(params.clone()))
        };

        Ok(QueryParams {
            top_k: params.top_k,
            threshold: params.threshold,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_params_empty() {
        let resolved = SimpleQuery.resolve(&json!({})).unwrap();
        assert_eq!(resolved.top_k, DEFAULT_TOP_K);
        assert_eq!(resolved.threshold, DEFAULT_THRESHOLD);
    }

    #[test]
    fn honors_explicit_params() {
        let resolved = SimpleQuery
            .resolve(&json!({ "top_k": 10, "threshold": 0.5 }))
            .unwrap();
        assert_eq!(resolved.top_k, 10);
        assert_eq!(resolved.threshold, 0.5);
    }
}
