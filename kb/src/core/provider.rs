use super::{document::store::DocumentStore, vector::VectorDb};
use crate::error::KbError;
use std::sync::Arc;

pub type DynVectorDb = Arc<dyn VectorDb + Send + Sync>;
pub type DynDocumentStore = Arc<dyn DocumentStore + Send + Sync>;

/// Provider factories decouple concrete implementations from the business
/// logic. Concrete instances are obtained per-collection by provider ID
/// stored on the [Collection][crate::core::model::collection::Collection]
/// itself.
pub trait ProviderFactory<T> {
    /// Get a provider from this factory.
    fn get_provider(&self, input: &str) -> Result<T, KbError>;

    /// List all registered provider IDs.
    fn list_provider_ids(&self) -> Vec<&'static str>;

    /// Register a provider in this factory.
    fn register(&mut self, id: &'static str, provider: T);
}

/// Holds the factories for all available providers.
///
/// Embedding providers are notably absent here: embedding vendors are
/// dispatched directly from a collection's [ProviderDescriptor][kb_embedders::ProviderDescriptor]
/// via [kb_embedders::factory::Embedder::build], since they're plain HTTP
/// clients rather than stateful registered backends.
#[derive(Clone)]
pub struct ProviderState {
    /// Vector database provider.
    pub vector: Arc<dyn ProviderFactory<DynVectorDb> + Send + Sync>,

    /// Document storage provider.
    pub document: Arc<dyn ProviderFactory<DynDocumentStore> + Send + Sync>,
}
