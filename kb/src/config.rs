use clap::Parser;

/// Default background worker pool size when `WORKER_COUNT` isn't set and
/// the CPU count can't be determined.
pub const DEFAULT_WORKER_COUNT: usize = 4;

const DEFAULT_UPLOAD_PATH: &str = "static";

const DEFAULT_ADDRESS: &str = "0.0.0.0:42069";

#[derive(Debug, Parser)]
#[command(name = "kb", version = "0.1", about = "Multi-tenant knowledge base server", long_about = None)]
pub struct StartArgs {
    /// SQLite database URL, e.g. `sqlite://kb.db`.
    #[arg(short, long)]
    db_url: Option<String>,

    /// RUST_LOG string to use as the env filter.
    #[arg(short, long)]
    log: Option<String>,

    /// Root directory uploads are saved under (`static/<owner>/<collection>/...`).
    #[arg(short, long)]
    upload_path: Option<String>,

    /// Address to listen on.
    #[arg(short, long)]
    address: Option<String>,

    /// CORS allowed origins, comma separated.
    #[arg(short = 'c', long)]
    allowed_origins: Option<String>,

    /// Bearer token callers must present in `Authorization: Bearer <token>`.
    #[arg(short = 'k', long)]
    api_key: Option<String>,

    /// Background ingestion worker pool size.
    #[arg(short = 'n', long)]
    worker_count: Option<usize>,

    /// Qdrant URL.
    #[cfg(feature = "qdrant")]
    #[arg(short, long)]
    qdrant_url: Option<String>,

    /// Comma separated list of plugin names to disable (`DISABLED_PLUGINS`).
    #[arg(long)]
    disabled_plugins: Option<String>,

    /// Process-wide default embedding vendor, used when a caller's
    /// `embeddings_model` carries the `"default"` sentinel.
    #[arg(long)]
    embeddings_vendor: Option<String>,

    #[arg(long)]
    embeddings_model: Option<String>,

    #[arg(long)]
    embeddings_endpoint: Option<String>,

    #[arg(long)]
    embeddings_api_key: Option<String>,
}

impl StartArgs {
    pub fn db_url(&self) -> String {
        match &self.db_url {
            Some(url) => url.to_string(),
            None => match std::env::var("DATABASE_URL") {
                Ok(url) => url,
                Err(_) => panic!("Database url not found; Pass --db-url or set DATABASE_URL"),
            },
        }
    }

    pub fn log(&self) -> String {
        match &self.log {
            Some(log) => log.to_string(),
            None => std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        }
    }

    pub fn upload_path(&self) -> String {
        match &self.upload_path {
            Some(path) => path.to_string(),
            None => std::env::var("UPLOAD_PATH").unwrap_or_else(|_| DEFAULT_UPLOAD_PATH.to_string()),
        }
    }

    #[cfg(feature = "qdrant")]
    pub fn qdrant_url(&self) -> String {
        match &self.qdrant_url {
            Some(url) => url.to_string(),
            None => match std::env::var("QDRANT_URL") {
                Ok(url) => url,
                Err(_) => panic!("Qdrant url not found; Pass --qdrant-url (-q) or set QDRANT_URL"),
            },
        }
    }

    pub fn address(&self) -> String {
        match &self.address {
            Some(addr) => addr.to_string(),
            None => std::env::var("ADDRESS").unwrap_or_else(|_| DEFAULT_ADDRESS.to_string()),
        }
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

    pub fn api_key(&self) -> String {
        match &self.api_key {
            Some(key) => key.to_string(),
            None => std::env::var("API_KEY").expect("Missing API_KEY in env"),
        }
    }

    pub fn worker_count(&self) -> usize {
        if let Some(n) = self.worker_count {
            return n;
        }
        if let Ok(n) = std::env::var("WORKER_COUNT") {
            if let Ok(n) = n.parse() {
                return n;
            }
        }
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(super::config::DEFAULT_WORKER_COUNT)
    }

    pub fn disabled_plugins(&self) -> std::collections::HashSet<String> {
        let raw = self
            .disabled_plugins
            .clone()
            .or_else(|| std::env::var("DISABLED_PLUGINS").ok())
            .unwrap_or_default();
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    }

    /// Process-wide default embedding provider descriptor, substituted into
    /// any `embeddings_model` that still carries the `"default"` sentinel
    /// after a `CreateCollection` call.
    pub fn default_embeddings(&self) -> kb_embedders::ProviderDescriptor {
        let vendor = self
            .embeddings_vendor
            .clone()
            .or_else(|| std::env::var("EMBEDDINGS_VENDOR").ok())
            .unwrap_or_else(|| "ollama".to_string());
        let model = self
            .embeddings_model
            .clone()
            .or_else(|| std::env::var("EMBEDDINGS_MODEL").ok())
            .unwrap_or_else(|| "nomic-embed-text".to_string());
        let endpoint = self
            .embeddings_endpoint
            .clone()
            .or_else(|| std::env::var("EMBEDDINGS_ENDPOINT").ok());
        let api_key = self
            .embeddings_api_key
            .clone()
            .or_else(|| std::env::var("EMBEDDINGS_APIKEY").ok());

        let mut descriptor = kb_embedders::ProviderDescriptor::new(vendor, model);
        if let Some(endpoint) = endpoint {
            descriptor = descriptor.with_endpoint(endpoint);
        }
        if let Some(api_key) = api_key {
            descriptor = descriptor.with_api_key(api_key);
        }
        descriptor
    }
}
