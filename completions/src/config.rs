use clap::Parser;

const DEFAULT_ADDRESS: &str = "0.0.0.0:9099";
const DEFAULT_OPENAI_ENDPOINT: &str = "https://api.openai.com";
const DEFAULT_OLLAMA_ENDPOINT: &str = "http://localhost:11434";

/// Process-wide startup configuration, mirroring `kb`'s `StartArgs`: every
/// field is an optional CLI flag that falls back to an env var, with a
/// panic for the handful that have no sane default.
#[derive(Debug, Clone, Parser)]
#[command(name = "completions", version = "0.1", about = "RAG completion orchestrator", long_about = None)]
pub struct StartArgs {
    /// RUST_LOG string to use as the env filter.
    #[arg(short, long)]
    log: Option<String>,

    /// Address to listen on.
    #[arg(short, long)]
    address: Option<String>,

    /// Bearer token callers must present in `Authorization: Bearer <token>`.
    #[arg(short = 'k', long)]
    api_key: Option<String>,

    /// Path to the JSON directory file (`{organizations, assistants}`) the
    /// process-level `DirectoryLookup` implementation loads at startup and
    /// on `POST /v1/pipelines/reload`.
    #[arg(short = 'd', long)]
    directory_path: Option<String>,

    /// Name of the distinguished system tenant whose organization config
    /// falls back to process-wide defaults (§3 "system tenant").
    #[arg(long)]
    system_tenant: Option<String>,

    #[arg(long)]
    openai_endpoint: Option<String>,

    #[arg(long)]
    openai_api_key: Option<String>,

    #[arg(long)]
    openai_models: Option<String>,

    #[arg(long)]
    openai_default_model: Option<String>,

    #[arg(long)]
    ollama_endpoint: Option<String>,

    #[arg(long)]
    ollama_models: Option<String>,

    #[arg(long)]
    ollama_default_model: Option<String>,

    /// Knowledge-base server URL the system tenant's `kb` queries go to.
    #[arg(long)]
    kb_server_url: Option<String>,

    /// Knowledge-base API token for the system tenant.
    #[arg(long)]
    kb_api_token: Option<String>,

    /// Comma-separated list of origins allowed by CORS.
    #[arg(long)]
    allowed_origins: Option<String>,
}

impl StartArgs {
    pub fn log(&self) -> String {
        self.log
            .clone()
            .unwrap_or_else(|| std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()))
    }

    pub fn address(&self) -> String {
        self.address
            .clone()
            .unwrap_or_else(|| std::env::var("ADDRESS").unwrap_or_else(|_| DEFAULT_ADDRESS.to_string()))
    }

    pub fn api_key(&self) -> String {
        self.api_key
            .clone()
            .unwrap_or_else(|| std::env::var("API_KEY").expect("Missing API_KEY in env"))
    }

    pub fn directory_path(&self) -> Option<String> {
        self.directory_path
            .clone()
            .or_else(|| std::env::var("DIRECTORY_PATH").ok())
    }

    pub fn allowed_origins(&self) -> Vec<String> {
        match &self.allowed_origins {
            Some(origins) => origins.split(',').map(String::from).collect(),
            None => match std::env::var("ALLOWED_ORIGINS") {
                Ok(origins) => origins.split(',').map(String::from).collect(),
                Err(_) => vec![],
            },
        }
    }

    pub fn system_tenant(&self) -> String {
        self.system_tenant
            .clone()
            .or_else(|| std::env::var("SYSTEM_TENANT").ok())
            .unwrap_or_else(|| "system".to_string())
    }

    /// Process-wide provider defaults (§6 Environment defaults), loaded
    /// once at startup and rebuildable via `POST /v1/pipelines/reload`
    /// (§9 "global mutable state").
    pub fn process_defaults(&self) -> crate::core::model::org::ProcessDefaults {
        use crate::core::model::org::{KnowledgeBaseConfig, ProviderConfig};
        use std::collections::HashMap;

        let mut providers = HashMap::new();

        providers.insert(
            "openai".to_string(),
            ProviderConfig {
                models: split_csv(
                    self.openai_models
                        .clone()
                        .or_else(|| std::env::var("OPENAI_MODELS").ok()),
                ),
                default_model: self
                    .openai_default_model
                    .clone()
                    .or_else(|| std::env::var("OPENAI_DEFAULT_MODEL").ok()),
                endpoint: Some(
                    self.openai_endpoint
                        .clone()
                        .or_else(|| std::env::var("OPENAI_ENDPOINT").ok())
                        .unwrap_or_else(|| DEFAULT_OPENAI_ENDPOINT.to_string()),
                ),
                api_key: self
                    .openai_api_key
                    .clone()
                    .or_else(|| std::env::var("OPENAI_APIKEY").ok()),
            },
        );

        providers.insert(
            "ollama".to_string(),
            ProviderConfig {
                models: split_csv(
                    self.ollama_models
                        .clone()
                        .or_else(|| std::env::var("OLLAMA_MODELS").ok()),
                ),
                default_model: self
                    .ollama_default_model
                    .clone()
                    .or_else(|| std::env::var("OLLAMA_DEFAULT_MODEL").ok()),
                endpoint: Some(
                    self.ollama_endpoint
                        .clone()
                        .or_else(|| std::env::var("OLLAMA_ENDPOINT").ok())
                        .unwrap_or_else(|| DEFAULT_OLLAMA_ENDPOINT.to_string()),
                ),
                api_key: None,
            },
        );

        let knowledge_base = KnowledgeBaseConfig {
            server_url: self
                .kb_server_url
                .clone()
                .or_else(|| std::env::var("LAMB_KB_SERVER_URL").ok())
                .unwrap_or_else(|| "http://localhost:42069".to_string()),
            api_token: self
                .kb_api_token
                .clone()
                .or_else(|| std::env::var("LAMB_KB_API_TOKEN").ok())
                .unwrap_or_default(),
        };

        crate::core::model::org::ProcessDefaults {
            providers,
            knowledge_base,
            features: HashMap::new(),
        }
    }
}

fn split_csv(raw: Option<String>) -> Vec<String> {
    raw.map(|s| s.split(',').map(str::trim).filter(|s| !s.is_empty()).map(String::from).collect())
        .unwrap_or_default()
}
