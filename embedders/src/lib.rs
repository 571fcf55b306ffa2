//! HTTP-only embedding clients, dispatched by vendor.
//!
//! This crate deliberately has no in-process inference path: every
//! embedding call is an outbound HTTP request to a provider the caller
//! names via a [descriptor::ProviderDescriptor].

pub mod descriptor;
pub mod error;
pub mod factory;
pub mod ollama;
pub mod openai;

pub use descriptor::{ProviderDescriptor, DEFAULT_SENTINEL};
pub use error::EmbeddingError;
pub use factory::Embedder;
pub use ollama::OllamaEmbedder;
pub use openai::OpenAiEmbedder;
