//! OpenAPI schema aggregator for the `/swagger-ui` route. Handlers are not
//! individually annotated with `#[utoipa::path]`; this crate keeps a
//! lighter-weight schema-only form since the HTTP surface here is small
//! enough that per-route examples don't carry their weight.

use super::dto::{
    AddDocumentsPayload, AddDocumentsResponse, CreateCollectionPayload, HealthResponse,
    IngestBasePayload, IngestUrlPayload, QueryPayload,
};
use crate::core::model::collection::{
    Collection, CollectionList, CollectionUpdate, DeleteCollectionResponse, Visibility,
};
use crate::core::model::file_registry::{
    DeleteFileResponse, FileContent, FileRegistryEntry, FileStatus, IngestChunk, IngestResponse,
};
use crate::core::service::query::{QueryResponse, QueryResult, QueryTiming};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(components(schemas(
    Collection,
    CollectionList,
    CollectionUpdate,
    DeleteCollectionResponse,
    Visibility,
    CreateCollectionPayload,
    FileRegistryEntry,
    FileStatus,
    IngestChunk,
    IngestResponse,
    IngestUrlPayload,
    IngestBasePayload,
    DeleteFileResponse,
    FileContent,
    AddDocumentsPayload,
    AddDocumentsResponse,
    QueryPayload,
    QueryResponse,
    QueryResult,
    QueryTiming,
    HealthResponse,
)))]
pub struct ApiDoc;
