use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use crate::core::model::org::{ProcessDefaults, ProviderConfig, ResolvedConfig, DEFAULT_SETUP};
use crate::core::provider::DirectoryLookup;
use crate::error::CompletionError;

/// Organization Config Resolver (§4.6): owner → organization → effective
/// `{providers, knowledge_base, features}`, with system-tenant fallback to
/// process-wide defaults for any provider the organization leaves
/// unconfigured. Mirrors `kb`'s [crate::core::service::catalog] in shape —
/// one small service sitting directly on a repo-like trait ([DirectoryLookup]
/// here, `CollectionRepo` there) — but adds a per-request cache since §4.6
/// explicitly calls one out ("no cross-request caching is required").
pub struct OrgConfigResolver<D: ?Sized> {
    directory: Arc<D>,
    defaults: Arc<tokio::sync::RwLock<ProcessDefaults>>,
    cache: Mutex<HashMap<(String, String), ResolvedConfig>>,
}

impl<D> OrgConfigResolver<D>
where
    D: DirectoryLookup + ?Sized,
{
    pub fn new(directory: Arc<D>, defaults: Arc<tokio::sync::RwLock<ProcessDefaults>>) -> Self {
        Self {
            directory,
            defaults,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// `Resolve(assistant_owner, setup_name)` (§4.6). Cached per
    /// `(owner, setup)` for the lifetime of this resolver instance, which
    /// callers construct fresh per request.
    pub async fn resolve(&self, assistant_owner: &str, setup_name: &str) -> Result<ResolvedConfig, CompletionError> {
        let cache_key = (assistant_owner.to_string(), setup_name.to_string());
        if let Some(cached) = self.cache.lock().await.get(&cache_key) {
            return Ok(cached.clone());
        }

        let organization = self.directory.get_organization_for_owner(assistant_owner).await?;
        let is_system = self.directory.is_system_tenant(&organization);
        let org_config = self.directory.get_organization_config(&organization).await?;

        let defaults = self.defaults.read().await;

        let setup = org_config.as_ref().and_then(|c| c.setup(setup_name));

        let mut providers: HashMap<String, ProviderConfig> = setup.map(|s| s.providers.clone()).unwrap_or_default();

        if is_system {
            for (vendor, default_provider) in &defaults.providers {
                providers.entry(vendor.clone()).or_insert_with(|| default_provider.clone());
            }
        }

        let knowledge_base = setup
            .map(|s| s.knowledge_base.clone())
            .filter(|kb| !kb.server_url.is_empty())
            .unwrap_or_else(|| {
                if is_system {
                    defaults.knowledge_base.clone()
                } else {
                    Default::default()
                }
            });

        let features = org_config
            .map(|c| c.features)
            .unwrap_or_else(|| if is_system { defaults.features.clone() } else { HashMap::new() });

        let resolved = ResolvedConfig {
            providers,
            knowledge_base,
            features,
        };

        debug!(owner = assistant_owner, organization, setup_name, is_system, "resolved org config");

        self.cache.lock().await.insert(cache_key, resolved.clone());

        Ok(resolved)
    }

    pub async fn resolve_default(&self, assistant_owner: &str) -> Result<ResolvedConfig, CompletionError> {
        self.resolve(assistant_owner, DEFAULT_SETUP).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::org::{KnowledgeBaseConfig, OrgConfig, Setup};
    use crate::core::provider::StaticDirectory;

    fn process_defaults() -> ProcessDefaults {
        let mut providers = HashMap::new();
        providers.insert(
            "openai".to_string(),
            ProviderConfig {
                models: vec!["gpt-4o-mini".into()],
                default_model: Some("gpt-4o-mini".into()),
                endpoint: Some("https://api.openai.com".into()),
                api_key: Some("sk-system".into()),
            },
        );
        ProcessDefaults {
            providers,
            knowledge_base: KnowledgeBaseConfig {
                server_url: "http://localhost:42069".into(),
                api_token: "sys-token".into(),
            },
            features: HashMap::new(),
        }
    }

    #[tokio::test]
    async fn system_tenant_falls_back_to_process_defaults() {
        let directory = StaticDirectory::new("system");
        let resolver = OrgConfigResolver::new(Arc::new(directory), Arc::new(tokio::sync::RwLock::new(process_defaults())));

        let resolved = resolver.resolve_default("alice").await.unwrap();
        assert!(resolved.providers.contains_key("openai"));
        assert_eq!(resolved.knowledge_base.server_url, "http://localhost:42069");
    }

    #[tokio::test]
    async fn non_system_tenant_without_config_gets_nothing() {
        let directory = StaticDirectory::new("system").with_owner("bob", "acme", OrgConfig::default());
        let resolver = OrgConfigResolver::new(Arc::new(directory), Arc::new(tokio::sync::RwLock::new(process_defaults())));

        let resolved = resolver.resolve_default("bob").await.unwrap();
        assert!(resolved.providers.is_empty());
        assert!(resolved.knowledge_base.server_url.is_empty());
    }

    #[tokio::test]
    async fn non_system_tenant_uses_own_setup_providers() {
        let mut org_config = OrgConfig::default();
        org_config.setups.insert(
            DEFAULT_SETUP.to_string(),
            Setup {
                providers: HashMap::from([(
                    "openai".to_string(),
                    ProviderConfig {
                        models: vec!["gpt-4o".into()],
                        default_model: Some("gpt-4o".into()),
                        endpoint: None,
                        api_key: Some("sk-acme".into()),
                    },
                )]),
                knowledge_base: KnowledgeBaseConfig {
                    server_url: "http://kb.acme.internal".into(),
                    api_token: "acme-token".into(),
                },
            },
        );
        let directory = StaticDirectory::new("system").with_owner("carol", "acme", org_config);
        let resolver = OrgConfigResolver::new(Arc::new(directory), Arc::new(tokio::sync::RwLock::new(process_defaults())));

        let resolved = resolver.resolve_default("carol").await.unwrap();
        assert_eq!(resolved.providers["openai"].api_key.as_deref(), Some("sk-acme"));
        assert_eq!(resolved.knowledge_base.server_url, "http://kb.acme.internal");
    }
}
