//! OpenAPI schema aggregator for `/swagger-ui`, mirroring `kb`'s
//! `app/server/api.rs` in shape: a single schema-only `#[derive(OpenApi)]`
//! rather than per-route `#[utoipa::path]` annotations.

use super::dto::{ChatCompletionResponse, CitationSummary, HealthResponse, ReloadResponse};
use crate::core::model::chat::{
    ChatCompletionChunk, ChatCompletionParams, ChatCompletionRequest, ChatMessage, ChunkChoice, ChunkDelta, ModelDescriptor, ModelList,
};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(components(schemas(
    ChatMessage,
    ChatCompletionRequest,
    ChatCompletionParams,
    ChatCompletionChunk,
    ChunkChoice,
    ChunkDelta,
    ChatCompletionResponse,
    CitationSummary,
    ModelDescriptor,
    ModelList,
    ReloadResponse,
    HealthResponse,
)))]
pub struct ApiDoc;
