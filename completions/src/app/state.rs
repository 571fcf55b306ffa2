use std::sync::Arc;

use tokio::sync::RwLock;
use tracing_subscriber::EnvFilter;

use crate::app::directory::JsonDirectory;
use crate::app::kb_client::HttpKbClient;
use crate::config::StartArgs;
use crate::core::connector::ConnectorRegistry;
use crate::core::connectors::{bypass::BypassConnector, local::LocalConnector, ollama::OllamaConnector, openai::OpenAiConnector};
use crate::core::model::org::ProcessDefaults;
use crate::core::service::rag_orchestrator::RagOrchestrator;
use crate::error::CompletionError;

/// Wires the [JsonDirectory], the [HttpKbClient] and every registered
/// [crate::core::connector::Connector] into the one [RagOrchestrator] the
/// HTTP layer calls. Mirrors `kb`'s `AppState` in shape: one `Clone`-cheap
/// struct of `Arc`s built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub directory: Arc<JsonDirectory>,
    pub defaults: Arc<RwLock<ProcessDefaults>>,
    pub orchestrator: Arc<RagOrchestrator<JsonDirectory, HttpKbClient>>,
    pub api_key: Arc<String>,
    args: Arc<StartArgs>,
}

impl AppState {
    pub async fn new(args: &StartArgs) -> Self {
        tracing_subscriber::fmt().with_env_filter(EnvFilter::new(args.log())).init();

        let directory = Arc::new(JsonDirectory::new(args.directory_path(), args.system_tenant()).await);
        let defaults = Arc::new(RwLock::new(args.process_defaults()));
        let kb_client = HttpKbClient::new();
        let connectors = Arc::new(Self::build_connectors());

        let orchestrator = Arc::new(RagOrchestrator::new(directory.clone(), defaults.clone(), kb_client, connectors));

        Self {
            directory,
            defaults,
            orchestrator,
            api_key: Arc::new(args.api_key()),
            args: Arc::new(args.clone()),
        }
    }

    fn build_connectors() -> ConnectorRegistry {
        let mut connectors = ConnectorRegistry::new();
        connectors.register(Arc::new(OpenAiConnector::new()));
        connectors.register(Arc::new(OllamaConnector::new()));
        connectors.register(Arc::new(LocalConnector::new()));
        connectors.register(Arc::new(BypassConnector));
        connectors
    }

    /// `POST /v1/pipelines/reload` (§6): rebuilds the directory snapshot
    /// and the process-wide provider defaults atomically (§9 "global
    /// mutable state").
    pub async fn reload(&self) -> Result<(), CompletionError> {
        self.directory.reload().await?;
        *self.defaults.write().await = self.args.process_defaults();
        Ok(())
    }
}
