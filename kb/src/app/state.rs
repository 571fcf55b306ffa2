use std::sync::Arc;

use kb_embedders::ProviderDescriptor;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::app::document::store::FsDocumentStore;
use crate::app::repo::sqlite::SqliteRepo;
use crate::config::StartArgs;
use crate::core::document::store::DocumentStore;
use crate::core::model::collection::Visibility;
use crate::core::plugin::{IngestPlugin, PluginRegistry, QueryPlugin};
use crate::core::plugins::{
    markitdown_ingest::MarkitdownIngest, mockai_json_ingest::MockaiJsonIngest,
    simple_ingest::SimpleIngest, simple_query::SimpleQuery, url_ingest::UrlIngest,
    youtube_transcript_ingest::YoutubeTranscriptIngest,
};
use crate::core::service::catalog::CatalogService;
use crate::core::service::ingest::IngestService;
use crate::core::service::query::QueryService;
use crate::core::vector::VectorDb;
use crate::DEFAULT_COLLECTION_NAME;

const DEFAULT_COLLECTION_OWNER: &str = "system";

/// Wires every concrete adapter into the three services the HTTP layer
/// calls (§4.1, §4.4, §4.5). `Clone` is cheap: every field is an `Arc` or
/// a pool handle, matching the services' own bound on `R: Clone`.
#[derive(Clone)]
pub struct AppState {
    pub catalog: CatalogService<SqliteRepo>,
    pub ingest: IngestService<SqliteRepo>,
    pub query: QueryService<SqliteRepo>,
    pub plugins: Arc<PluginRegistry>,
    pub api_key: Arc<String>,
}

impl AppState {
    pub async fn new(args: &StartArgs) -> Self {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new(args.log()))
            .init();

        let repo = crate::app::repo::sqlite::init(&args.db_url()).await;

        let vector = Self::init_vector(args);
        let store: Arc<dyn DocumentStore + Send + Sync> =
            Arc::new(FsDocumentStore::new(&args.upload_path()));
        let plugins = Arc::new(Self::build_plugins(args));
        let embedding_defaults = args.default_embeddings();

        let catalog = CatalogService::new(repo.clone(), vector.clone(), store.clone(), embedding_defaults);
        let ingest = IngestService::new(
            repo.clone(),
            vector.clone(),
            store,
            plugins.clone(),
            args.worker_count(),
        );
        let query = QueryService::new(repo, vector, plugins.clone());

        Self::bootstrap_default_collection(&catalog).await;

        Self {
            catalog,
            ingest,
            query,
            plugins,
            api_key: Arc::new(args.api_key()),
        }
    }

    #[cfg(feature = "qdrant")]
    fn init_vector(args: &StartArgs) -> Arc<dyn VectorDb + Send + Sync> {
        crate::app::vector::qdrant::init(&args.qdrant_url())
    }

    fn build_plugins(args: &StartArgs) -> PluginRegistry {
        let disabled = args.disabled_plugins();
        let mut registry = PluginRegistry::new();

        let ingest_plugins: Vec<Arc<dyn IngestPlugin + Send + Sync>> = vec![
            Arc::new(SimpleIngest),
            Arc::new(MarkitdownIngest),
            Arc::new(MockaiJsonIngest),
            Arc::new(UrlIngest::default()),
            Arc::new(YoutubeTranscriptIngest),
        ];
        for plugin in ingest_plugins {
            if disabled.contains(plugin.name()) {
                info!("ingestion plugin '{}' disabled", plugin.name());
                continue;
            }
            registry.register_ingest(plugin);
        }

        let query_plugins: Vec<Arc<dyn QueryPlugin + Send + Sync>> = vec![Arc::new(SimpleQuery)];
        for plugin in query_plugins {
            if disabled.contains(plugin.name()) {
                info!("query plugin '{}' disabled", plugin.name());
                continue;
            }
            registry.register_query(plugin);
        }

        registry
    }

    /// Ensures the process always has a usable collection to fall back on.
    /// A pre-existing default collection (from a prior run) is left alone.
    async fn bootstrap_default_collection(catalog: &CatalogService<SqliteRepo>) {
        use kb_embedders::DEFAULT_SENTINEL;

        match catalog
            .create_collection(
                DEFAULT_COLLECTION_NAME,
                DEFAULT_COLLECTION_OWNER,
                Some("Created automatically on startup"),
                Visibility::Public,
                ProviderDescriptor::new(DEFAULT_SENTINEL, DEFAULT_SENTINEL),
            )
            .await
        {
            Ok(_) => info!("created default collection '{DEFAULT_COLLECTION_NAME}'"),
            Err(e) if matches!(e.error, crate::error::KbErr::Conflict(_)) => {
                info!("default collection '{DEFAULT_COLLECTION_NAME}' already exists")
            }
            Err(e) => warn!("failed creating default collection: {e}"),
        }
    }
}
