use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::info;

use crate::core::model::assistant::Assistant;
use crate::core::model::org::OrgConfig;
use crate::core::provider::DirectoryLookup;
use crate::error::{CompletionErr, CompletionError};

/// On-disk shape of the directory file (`{organizations, assistants}`):
/// `organizations` maps an owner id to `{organization, config}`,
/// `assistants` is a flat list keyed by their own `id` field.
#[derive(Debug, Clone, Default, Deserialize)]
struct DirectoryFile {
    #[serde(default)]
    organizations: HashMap<String, OrganizationEntry>,
    #[serde(default)]
    assistants: Vec<Assistant>,
}

#[derive(Debug, Clone, Deserialize)]
struct OrganizationEntry {
    organization: String,
    #[serde(default)]
    config: Option<OrgConfig>,
}

#[derive(Debug, Clone, Default)]
struct Snapshot {
    organizations: HashMap<String, OrganizationEntry>,
    assistants: HashMap<i64, Assistant>,
}

/// Production [DirectoryLookup]: reads a JSON file at startup and on
/// `POST /v1/pipelines/reload`, the "documented extension point for a real
/// directory service. A real deployment would swap
/// this for a client hitting the actual org/user/assistant service; the
/// trait boundary is what makes that a drop-in replacement.
#[derive(Clone)]
pub struct JsonDirectory {
    path: Option<String>,
    system_tenant: String,
    snapshot: Arc<RwLock<Arc<Snapshot>>>,
}

impl JsonDirectory {
    pub async fn new(path: Option<String>, system_tenant: impl Into<String>) -> Self {
        let system_tenant = system_tenant.into();
        let snapshot = Self::load(path.as_deref()).await;
        Self {
            path,
            system_tenant,
            snapshot: Arc::new(RwLock::new(Arc::new(snapshot))),
        }
    }

    /// Re-reads the directory file from disk, swapping the in-memory
    /// snapshot atomically (§2 "rebuilds the record atomically").
    pub async fn reload(&self) -> Result<(), CompletionError> {
        let snapshot = Self::load(self.path.as_deref()).await;
        *self.snapshot.write().await = Arc::new(snapshot);
        info!(path = ?self.path, "reloaded directory");
        Ok(())
    }

    async fn load(path: Option<&str>) -> Snapshot {
        let Some(path) = path else {
            info!("no directory_path configured, starting with an empty directory");
            return Snapshot::default();
        };

        let contents = match tokio::fs::read_to_string(path).await {
            Ok(contents) => contents,
            Err(e) => {
                tracing::warn!(path, error = %e, "failed reading directory file, starting empty");
                return Snapshot::default();
            }
        };

        let parsed: DirectoryFile = match serde_json::from_str(&contents) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!(path, error = %e, "failed parsing directory file, starting empty");
                return Snapshot::default();
            }
        };

        Snapshot {
            organizations: parsed.organizations,
            assistants: parsed.assistants.into_iter().map(|a| (a.id, a)).collect(),
        }
    }
}

#[async_trait::async_trait]
impl DirectoryLookup for JsonDirectory {
    async fn get_organization_for_owner(&self, owner: &str) -> Result<String, CompletionError> {
        let snapshot = self.snapshot.read().await;
        Ok(snapshot
            .organizations
            .get(owner)
            .map(|entry| entry.organization.clone())
            .unwrap_or_else(|| self.system_tenant.clone()))
    }

    async fn get_organization_config(&self, organization: &str) -> Result<Option<OrgConfig>, CompletionError> {
        let snapshot = self.snapshot.read().await;
        Ok(snapshot
            .organizations
            .values()
            .find(|entry| entry.organization == organization)
            .and_then(|entry| entry.config.clone()))
    }

    fn is_system_tenant(&self, organization: &str) -> bool {
        organization == self.system_tenant
    }

    async fn get_assistant(&self, id: i64) -> Result<Assistant, CompletionError> {
        let snapshot = self.snapshot.read().await;
        snapshot
            .assistants
            .get(&id)
            .cloned()
            .ok_or_else(|| CompletionError::new(file!(), line!(), column!(), CompletionErr::NotFound(format!("assistant '{id}'"))))
    }

    async fn list_assistants(&self, owner: Option<&str>) -> Result<Vec<Assistant>, CompletionError> {
        let snapshot = self.snapshot.read().await;
        Ok(snapshot
            .assistants
            .values()
            .filter(|a| owner.map_or(true, |owner| a.owner == owner))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn loads_organizations_and_assistants_from_file() {
        let mut file = tempfile_path();
        write!(file.1, r#"{{
            "organizations": {{"alice": {{"organization": "acme", "config": null}}}},
            "assistants": [{{"id": 1, "owner": "alice", "name": "tutor", "llmName": "gpt-4o-mini"}}]
        }}"#)
        .unwrap();

        let directory = JsonDirectory::new(Some(file.0.clone()), "system").await;
        assert_eq!(directory.get_organization_for_owner("alice").await.unwrap(), "acme");
        assert_eq!(directory.get_organization_for_owner("bob").await.unwrap(), "system");
        let assistant = directory.get_assistant(1).await.unwrap();
        assert_eq!(assistant.name, "tutor");
    }

    fn tempfile_path() -> (String, std::fs::File) {
        let path = std::env::temp_dir().join(format!("completions-directory-test-{}.json", std::process::id()));
        let file = std::fs::File::create(&path).unwrap();
        (path.to_string_lossy().into_owned(), file)
    }
}
