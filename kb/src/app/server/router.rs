//! HTTP API. Every route except `/health` requires `Authorization:
//! Bearer <api_key>`; the check is a single middleware layered over the
//! protected router, ahead of the tracing/cors layers, with the
//! unprotected routes merged in after.

use std::str::FromStr;

use axum::{
    extract::{Multipart, Path, Query, State},
    http::{HeaderValue, Method, Request, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{classify::ServerErrorsFailureClass, cors::CorsLayer, trace::TraceLayer};
use tracing::Span;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use uuid::Uuid;

use super::api::ApiDoc;
use super::dto::{
    AddDocumentsPayload, AddDocumentsResponse, CollectionListQuery, CreateCollectionPayload,
    DeleteFileQuery, FileListQuery, HealthResponse, IngestBasePayload, IngestUrlPayload,
    PluginNameQuery, QueryPayload, StatusUpdateQuery,
};
use crate::app::state::AppState;
use crate::core::model::collection::CollectionUpdate;
use crate::core::model::file_registry::FileStatus;
use crate::core::repo::collection::CollectionListParams;
use crate::err;
use crate::error::{KbErr, KbError};

pub fn router(state: AppState, origins: Vec<String>) -> Router {
    let origins = origins
        .into_iter()
        .map(|origin| {
            tracing::info!("Adding {origin} to allowed origins");
            HeaderValue::from_str(&origin)
        })
        .map(Result::unwrap);

    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::AllowOrigin::list(origins))
        .allow_headers(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::PUT]);

    let protected = Router::new()
        .route("/collections", get(list_collections).post(create_collection))
        .route(
            "/collections/:id",
            get(get_collection).put(update_collection).delete(delete_collection),
        )
        .route("/collections/:id/ingest-file", post(ingest_file))
        .route("/collections/:id/ingest-url", post(ingest_url))
        .route("/collections/:id/ingest-base", post(ingest_base))
        .route("/collections/:id/documents", post(add_documents))
        .route("/collections/:id/query", post(query_collection))
        .route("/collections/:id/files", get(list_files))
        .route("/collections/:id/files/:file_id", delete(delete_file))
        .route("/files/:file_id/status", put(update_file_status))
        .route("/files/:file_id/content", get(file_content))
        .route("/ingestion/plugins", get(ingestion_plugins))
        .route("/query/plugins", get(query_plugins))
        .layer(axum::extract::DefaultBodyLimit::max(100_000_000))
        .layer(middleware::from_fn_with_state(state.clone(), auth_check))
        .with_state(state);

    protected
        .layer(
            TraceLayer::new_for_http()
                .on_request(|req: &axum::http::Request<_>, _span: &Span| {
                    tracing::info!("{} {}", req.method(), req.uri().path());
                })
                .on_response(
                    |res: &axum::http::Response<_>, latency: std::time::Duration, _span: &Span| {
                        tracing::info!("{} | {}ms", res.status(), latency.as_millis());
                    },
                )
                .on_failure(
                    |error: ServerErrorsFailureClass, _latency: std::time::Duration, _span: &Span| {
                        tracing::error!("request failed: {error}")
                    },
                ),
        )
        .layer(cors)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(health))
}

/// Bearer-token check producing a caller identity (§1: auth itself is out
/// of scope beyond this gate — there is no directory lookup here, only the
/// tenant-scoping check the HTTP API calls "authenticated").
async fn auth_check(
    State(state): State<AppState>,
    req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, KbError> {
    let header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let token = header.and_then(|h| h.strip_prefix("Bearer "));

    match token {
        Some(token) if token == state.api_key.as_str() => Ok(next.run(req).await),
        _ => Err(KbError::new(file!(), line!(), column!(), KbErr::Unauthorized)),
    }
}

async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn create_collection(
    State(state): State<AppState>,
    Json(payload): Json<CreateCollectionPayload>,
) -> Result<impl IntoResponse, KbError> {
    let collection = state
        .catalog
        .create_collection(
            &payload.name,
            &payload.owner,
            payload.description.as_deref(),
            payload.visibility,
            payload.embeddings_model,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(collection)))
}

async fn list_collections(
    State(state): State<AppState>,
    Query(query): Query<CollectionListQuery>,
) -> Result<impl IntoResponse, KbError> {
    let list = state
        .catalog
        .list_collections(CollectionListParams {
            owner: query.owner.as_deref(),
            visibility: query.visibility,
            skip: query.skip,
            limit: query.limit,
        })
        .await?;
    Ok(Json(list))
}

async fn get_collection(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, KbError> {
    Ok(Json(state.catalog.get_collection(id).await?))
}

/// Exposes the `UpdateCollection` catalog contract over HTTP (name,
/// description, visibility, endpoint, api_key); see DESIGN.md.
async fn update_collection(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(update): Json<CollectionUpdate>,
) -> Result<impl IntoResponse, KbError> {
    Ok(Json(state.catalog.update_collection(id, update).await?))
}

/// Same note as [update_collection]: exposes `DeleteCollection` (§4.1),
/// returning the `{removed_embeddings, removed_files[]}` summary.
async fn delete_collection(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, KbError> {
    Ok(Json(state.catalog.delete_collection(id).await?))
}

async fn ingest_file(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, KbError> {
    let mut file_bytes: Option<Vec<u8>> = None;
    let mut filename = String::new();
    let mut content_type: Option<String> = None;
    let mut plugin_name: Option<String> = None;
    let mut plugin_params = Value::Object(Default::default());

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        KbError::new(file!(), line!(), column!(), KbErr::BadInput(format!("multipart: {e}")))
    })? {
        match field.name().unwrap_or_default() {
            "file" => {
                filename = field.file_name().unwrap_or("upload").to_string();
                content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await.map_err(|e| {
                    KbError::new(file!(), line!(), column!(), KbErr::BadInput(format!("multipart: {e}")))
                })?;
                file_bytes = Some(bytes.to_vec());
            }
            "plugin_name" => {
                plugin_name = Some(field.text().await.map_err(|e| {
                    KbError::new(file!(), line!(), column!(), KbErr::BadInput(format!("multipart: {e}")))
                })?);
            }
            "plugin_params" => {
                let text = field.text().await.map_err(|e| {
                    KbError::new(file!(), line!(), column!(), KbErr::BadInput(format!("multipart: {e}")))
                })?;
                if !text.trim().is_empty() {
                    plugin_params = serde_json::from_str(&text)?;
                }
            }
            _ => {}
        }
    }

    let bytes = file_bytes.ok_or_else(|| {
        KbError::new(file!(), line!(), column!(), KbErr::BadInput("missing 'file' field".into()))
    })?;
    let plugin_name = plugin_name.ok_or_else(|| {
        KbError::new(file!(), line!(), column!(), KbErr::BadInput("missing 'plugin_name' field".into()))
    })?;

    let collection = state.catalog.get_collection(id).await?;

    let response = state
        .ingest
        .submit_file_ingest(
            id,
            &collection.owner,
            &filename,
            content_type.as_deref(),
            &bytes,
            &plugin_name,
            plugin_params,
        )
        .await?;

    Ok((StatusCode::ACCEPTED, Json(response)))
}

async fn ingest_url(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<IngestUrlPayload>,
) -> Result<impl IntoResponse, KbError> {
    if payload.urls.is_empty() {
        return err!(BadInput, "urls must not be empty");
    }

    let plugin_name = payload.plugin_name.unwrap_or_else(|| "url_ingest".to_string());
    let mut params = match payload.plugin_params {
        Value::Object(map) => map,
        _ => Default::default(),
    };
    params.insert("urls".to_string(), json!(payload.urls));

    let collection = state.catalog.get_collection(id).await?;
    let response = state
        .ingest
        .submit_base_ingest(id, &collection.owner, &plugin_name, Value::Object(params))
        .await?;

    Ok((StatusCode::ACCEPTED, Json(response)))
}

async fn ingest_base(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<IngestBasePayload>,
) -> Result<impl IntoResponse, KbError> {
    let collection = state.catalog.get_collection(id).await?;
    let response = state
        .ingest
        .submit_base_ingest(id, &collection.owner, &payload.plugin_name, payload.plugin_params)
        .await?;

    Ok((StatusCode::ACCEPTED, Json(response)))
}

async fn add_documents(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddDocumentsPayload>,
) -> Result<impl IntoResponse, KbError> {
    let documents_added = state.ingest.add_documents(id, payload.documents).await?;
    Ok(Json(AddDocumentsResponse {
        documents_added,
        success: true,
    }))
}

async fn query_collection(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(plugin): Query<PluginNameQuery>,
    Json(payload): Json<QueryPayload>,
) -> Result<impl IntoResponse, KbError> {
    let params = payload.merged_plugin_params();
    let response = state
        .query
        .query(id, &payload.query_text, &plugin.plugin_name, &params)
        .await?;
    Ok(Json(response))
}

async fn list_files(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<FileListQuery>,
) -> Result<impl IntoResponse, KbError> {
    Ok(Json(state.ingest.list_files(id, query.status).await?))
}

async fn delete_file(
    State(state): State<AppState>,
    Path((collection_id, file_id)): Path<(Uuid, Uuid)>,
    Query(query): Query<DeleteFileQuery>,
) -> Result<impl IntoResponse, KbError> {
    let entry = state.ingest.get_file(file_id).await?;
    if entry.collection_id != collection_id {
        return err!(NotFound, "file '{}' not found in collection '{}'", file_id, collection_id);
    }
    Ok(Json(state.ingest.delete_file(file_id, query.hard).await?))
}

async fn update_file_status(
    State(state): State<AppState>,
    Path(file_id): Path<Uuid>,
    Query(query): Query<StatusUpdateQuery>,
) -> Result<impl IntoResponse, KbError> {
    // Manual transitions are restricted to `deleted`; every other status
    // is system-controlled by the ingestion background step (§4.4).
    if query.status != "deleted" {
        return err!(
            BadInput,
            "manual status updates may only set 'deleted', got '{}'",
            query.status
        );
    }
    let status = FileStatus::from_str(&query.status)?;
    Ok(Json(state.ingest.set_file_status(file_id, status).await?))
}

async fn file_content(
    State(state): State<AppState>,
    Path(file_id): Path<Uuid>,
) -> Result<impl IntoResponse, KbError> {
    Ok(Json(state.ingest.get_file_content(file_id).await?))
}

async fn ingestion_plugins(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.plugins.list_ingest())
}

async fn query_plugins(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.plugins.list_query())
}
