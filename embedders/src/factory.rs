use crate::descriptor::ProviderDescriptor;
use crate::error::EmbeddingError;
use crate::ollama::OllamaEmbedder;
use crate::openai::OpenAiEmbedder;

const VENDOR_OPENAI: &str = "openai";
const VENDOR_OLLAMA: &str = "ollama";
const VENDOR_LOCAL: &str = "local";

/// Dispatches a resolved [ProviderDescriptor] to a concrete HTTP embedding
/// client. One instance is built per call rather than cached, since a
/// descriptor's endpoint and key can vary per tenant and the underlying
/// client is a thin [reqwest::Client] wrapper.
pub enum Embedder {
    OpenAi(OpenAiEmbedder),
    Ollama(OllamaEmbedder),
}

impl Embedder {
    /// Build a client for `descriptor`. Returns [EmbeddingError::InvalidProvider]
    /// for any vendor this process doesn't have a connector for. `descriptor`
    /// must already be resolved (see [ProviderDescriptor::is_resolved]) — the
    /// caller, not this factory, is responsible for substituting defaults.
    pub fn build(descriptor: &ProviderDescriptor) -> Result<Self, EmbeddingError> {
        match descriptor.vendor.as_str() {
            VENDOR_OPENAI => {
                let key = descriptor.api_key.as_deref().ok_or_else(|| {
                    EmbeddingError::InvalidProvider(
                        "openai embedding provider requires an api_key".to_string(),
                    )
                })?;
                Ok(Embedder::OpenAi(OpenAiEmbedder::new(
                    descriptor.endpoint.as_deref(),
                    key,
                )))
            }
            // "local" shares ollama's unauthenticated, single-endpoint contract — it
            // names a self-hosted server rather than a distinct wire protocol.
            VENDOR_OLLAMA | VENDOR_LOCAL => Ok(Embedder::Ollama(OllamaEmbedder::new(
                descriptor.endpoint.as_deref(),
            ))),
            other => Err(EmbeddingError::InvalidProvider(other.to_string())),
        }
    }

    pub async fn embed(
        &self,
        content: &[&str],
        model: &str,
    ) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        match self {
            Embedder::OpenAi(e) => e.embed(content, model).await,
            Embedder::Ollama(e) => e.embed(content, model).await,
        }
    }

    /// Validate a descriptor by embedding a single sentinel string, and
    /// return its output dimension. Used at collection-creation time to
    /// confirm the configured vendor/model pair actually works and to
    /// discover the vector size the store should be provisioned with.
    pub async fn probe_dimension(
        descriptor: &ProviderDescriptor,
    ) -> Result<usize, EmbeddingError> {
        let embedder = Self::build(descriptor)?;
        let vectors = embedder.embed(&["dimension probe"], &descriptor.model).await?;
        vectors
            .first()
            .map(|v| v.len())
            .ok_or_else(|| EmbeddingError::InvalidModel(descriptor.model.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unknown_vendor() {
        let descriptor = ProviderDescriptor::new("bedrock", "titan-embed");
        let err = Embedder::build(&descriptor).unwrap_err();
        assert!(matches!(err, EmbeddingError::InvalidProvider(_)));
    }

    #[test]
    fn rejects_openai_without_api_key() {
        let descriptor = ProviderDescriptor::new("openai", "text-embedding-3-small");
        let err = Embedder::build(&descriptor).unwrap_err();
        assert!(matches!(err, EmbeddingError::InvalidProvider(_)));
    }

    #[test]
    fn builds_ollama_without_api_key() {
        let descriptor = ProviderDescriptor::new("ollama", "nomic-embed-text");
        assert!(Embedder::build(&descriptor).is_ok());
    }

    #[test]
    fn builds_local_like_ollama() {
        let descriptor = ProviderDescriptor::new("local", "nomic-embed-text");
        assert!(Embedder::build(&descriptor).is_ok());
    }
}
