use crate::core::model::assistant::Assistant;
use crate::core::model::org::OrgConfig;
use crate::error::CompletionError;

/// The user/organization/assistant directory (§1: "accessed through a
/// read-only lookup interface", out of scope for this crate). `kb`'s
/// equivalent seam is [kb::core::vector::VectorDb]/[kb::core::document::store::DocumentStore] —
/// here the external collaborator is a whole directory service rather than
/// a storage backend, so the trait is correspondingly read-only end to end.
#[async_trait::async_trait]
pub trait DirectoryLookup {
    /// Resolves a user-or-owner identifier to the organization id/name that
    /// owns its configuration (§4.6 step "look up user → organization").
    async fn get_organization_for_owner(&self, owner: &str) -> Result<String, CompletionError>;

    /// The organization's own config, if one has been set. `None` means
    /// "no configuration recorded for this organization" (distinct from an
    /// organization that doesn't exist, which is a [CompletionErr::NotFound]).
    async fn get_organization_config(&self, organization: &str) -> Result<Option<OrgConfig>, CompletionError>;

    /// `true` if `organization` is the distinguished system tenant whose
    /// missing provider keys fall back to process-wide defaults (§3, §4.6).
    fn is_system_tenant(&self, organization: &str) -> bool;

    async fn get_assistant(&self, id: i64) -> Result<Assistant, CompletionError>;

    /// Assistants exposed as models by `GET /v1/models` (§2 supplement,
    /// §6): every assistant owned by `owner`, or every known assistant if
    /// `owner` is `None` (the directory has no authenticated caller
    /// identity to scope to, since auth here is a single process-wide
    /// bearer key rather than per-user — §1).
    async fn list_assistants(&self, owner: Option<&str>) -> Result<Vec<Assistant>, CompletionError>;
}

/// A fixed, in-memory [DirectoryLookup] used by tests so they don't need a
/// real directory service. Production wiring is [crate::app::directory::JsonDirectory],
/// the "documented extension point" this trait exists for.
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    pub organizations: std::collections::HashMap<String, (String, OrgConfig)>,
    pub assistants: std::collections::HashMap<i64, Assistant>,
    pub system_tenant: String,
}

impl StaticDirectory {
    pub fn new(system_tenant: impl Into<String>) -> Self {
        Self {
            organizations: Default::default(),
            assistants: Default::default(),
            system_tenant: system_tenant.into(),
        }
    }

    pub fn with_owner(mut self, owner: impl Into<String>, organization: impl Into<String>, config: OrgConfig) -> Self {
        self.organizations.insert(owner.into(), (organization.into(), config));
        self
    }

    pub fn with_assistant(mut self, assistant: Assistant) -> Self {
        self.assistants.insert(assistant.id, assistant);
        self
    }
}

#[async_trait::async_trait]
impl DirectoryLookup for StaticDirectory {
    async fn get_organization_for_owner(&self, owner: &str) -> Result<String, CompletionError> {
        match self.organizations.get(owner) {
            Some((org, _)) => Ok(org.clone()),
            None => Ok(self.system_tenant.clone()),
        }
    }

    async fn get_organization_config(&self, organization: &str) -> Result<Option<OrgConfig>, CompletionError> {
        Ok(self
            .organizations
            .values()
            .find(|(org, _)| org == organization)
            .map(|(_, config)| config.clone()))
    }

    fn is_system_tenant(&self, organization: &str) -> bool {
        organization == self.system_tenant
    }

    async fn get_assistant(&self, id: i64) -> Result<Assistant, CompletionError> {
        self.assistants
            .get(&id)
            .cloned()
            .ok_or_else(|| CompletionError::new(file!(), line!(), column!(), crate::error::CompletionErr::NotFound(format!("assistant '{id}'"))))
    }

    async fn list_assistants(&self, owner: Option<&str>) -> Result<Vec<Assistant>, CompletionError> {
        Ok(self
            .assistants
            .values()
            .filter(|a| owner.map_or(true, |owner| a.owner == owner))
            .cloned()
            .collect())
    }
}
