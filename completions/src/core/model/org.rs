use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The name of the setup every [OrgConfig] is guaranteed to carry (§3).
pub const DEFAULT_SETUP: &str = "default";

/// `setups[name].providers[vendor]` (§3). Mirrors `kb_embedders::ProviderDescriptor`
/// in spirit but shaped for the completion layer: a provider here names the
/// *set* of models an organization allows plus the credentials to reach it,
/// rather than one fixed model.
#[cfg_attr(feature = "http", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    #[serde(default)]
    pub models: Vec<String>,
    #[serde(default)]
    pub default_model: Option<String>,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
}

/// `setups[name].knowledge_base` (§3): the `kb` instance this organization's
/// RAG queries are sent to.
#[cfg_attr(feature = "http", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeBaseConfig {
    pub server_url: String,
    pub api_token: String,
}

#[cfg_attr(feature = "http", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Setup {
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
    pub knowledge_base: KnowledgeBaseConfig,
}

/// An organization's effective configuration (§3 "Organization config").
/// Always carries a `"default"` setup.
#[cfg_attr(feature = "http", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrgConfig {
    pub setups: HashMap<String, Setup>,
    #[serde(default)]
    pub features: HashMap<String, bool>,
}

impl OrgConfig {
    pub fn setup(&self, name: &str) -> Option<&Setup> {
        self.setups.get(name)
    }
}

/// Process-wide provider defaults (§6 Environment defaults), substituted
/// in for the system tenant when a provider key is absent from its own
/// organization config (§4.6). Rebuilt atomically by `POST /v1/pipelines/reload`.
#[derive(Debug, Clone, Default)]
pub struct ProcessDefaults {
    pub providers: HashMap<String, ProviderConfig>,
    pub knowledge_base: KnowledgeBaseConfig,
    pub features: HashMap<String, bool>,
}

/// The result of [crate::core::service::org_config_resolver::OrgConfigResolver::resolve]:
/// effective `{providers, knowledge_base, features}` for one tenant, after
/// system-tenant fallback has already been applied (§4.6).
#[derive(Debug, Clone, Default)]
pub struct ResolvedConfig {
    pub providers: HashMap<String, ProviderConfig>,
    pub knowledge_base: KnowledgeBaseConfig,
    pub features: HashMap<String, bool>,
}

impl ResolvedConfig {
    pub fn provider(&self, vendor: &str) -> Option<&ProviderConfig> {
        self.providers.get(vendor)
    }
}
