use serde::{Deserialize, Serialize};

/// The literal value callers may use in any [ProviderDescriptor] field to mean
/// "substitute the process-wide default for this field at creation time".
pub const DEFAULT_SENTINEL: &str = "default";

/// Identifies an embedding provider and the model to call on it.
///
/// `vendor` is deliberately a string rather than a closed enum: the set of
/// supported vendors is an operational concern (which HTTP connector is
/// wired up), not a type-level one. [`EmbeddingError::InvalidProvider`] is
/// returned for any vendor the running process doesn't have a connector
/// for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderDescriptor {
    pub vendor: String,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl ProviderDescriptor {
    pub fn new(vendor: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            vendor: vendor.into(),
            model: model.into(),
            endpoint: None,
            api_key: None,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Replace every field holding the literal [DEFAULT_SENTINEL] with the
    /// value from `defaults`. Fields that aren't `"default"` are left
    /// untouched.
    pub fn substitute_defaults(&mut self, defaults: &ProviderDescriptor) {
        if self.vendor == DEFAULT_SENTINEL {
            self.vendor = defaults.vendor.clone();
        }
        if self.model == DEFAULT_SENTINEL {
            self.model = defaults.model.clone();
        }
        match &self.endpoint {
            Some(e) if e == DEFAULT_SENTINEL => self.endpoint = defaults.endpoint.clone(),
            None => self.endpoint = defaults.endpoint.clone(),
            _ => {}
        }
        match &self.api_key {
            Some(k) if k == DEFAULT_SENTINEL => self.api_key = defaults.api_key.clone(),
            None => self.api_key = defaults.api_key.clone(),
            _ => {}
        }
    }

    /// `true` if no field still carries the unresolved `"default"` sentinel.
    pub fn is_resolved(&self) -> bool {
        self.vendor != DEFAULT_SENTINEL
            && self.model != DEFAULT_SENTINEL
            && self.endpoint.as_deref() != Some(DEFAULT_SENTINEL)
            && self.api_key.as_deref() != Some(DEFAULT_SENTINEL)
    }
}
