//! Completion API (§6). Every route except `/health` requires
//! `Authorization: Bearer <api_key>`, same auth-gate placement as `kb`'s
//! router.

use std::convert::Infallible;

use axum::{
    body::Body,
    extract::{Query, State},
    http::{HeaderValue, Method, Request, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use tower_http::{classify::ServerErrorsFailureClass, cors::CorsLayer, trace::TraceLayer};
use tracing::Span;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::api::ApiDoc;
use super::dto::{ChatCompletionResponse, CitationSummary, HealthResponse, ModelsQuery, ReloadResponse};
use crate::app::state::AppState;
use crate::core::connector::ChunkStream;
use crate::core::model::assistant::parse_assistant_model_id;
use crate::core::model::chat::{ChatCompletionChunk, ChatCompletionRequest, ModelDescriptor, ModelList, SSE_DONE};
use crate::core::service::rag_orchestrator::OrchestratorResponse;
use crate::err;
use crate::error::{CompletionErr, CompletionError};

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
        .allow_methods([Method::GET, Method::POST]);

    let protected = Router::new()
        .route("/v1/models", get(list_models))
        .route("/models", get(list_models))
        .route("/v1/chat/completions", post(chat_completions))
        .route("/chat/completions", post(chat_completions))
        .route("/v1/pipelines/reload", post(reload))
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

async fn auth_check(State(state): State<AppState>, req: Request<Body>, next: Next) -> Result<Response, CompletionError> {
    let header = req.headers().get(axum::http::header::AUTHORIZATION).and_then(|v| v.to_str().ok());
    let token = header.and_then(|h| h.strip_prefix("Bearer "));

    match token {
        Some(token) if token == state.api_key.as_str() => Ok(next.run(req).await),
        _ => err!(Unauthorized),
    }
}

async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// `GET /v1/models` / `GET /models` (§6, §2 supplement): lists assistants
/// as OpenAI-style models. `owner` narrows the listing; omitted, every
/// known assistant is returned (§1: auth here is a single process-wide
/// key, not a per-caller identity to scope to).
async fn list_models(State(state): State<AppState>, Query(query): Query<ModelsQuery>) -> Result<impl IntoResponse, CompletionError> {
    let assistants = state.directory.list_assistants(query.owner.as_deref()).await?;
    let data = assistants
        .into_iter()
        .map(|a| ModelDescriptor {
            id: a.model_id(),
            object: "model",
            owned_by: a.owner,
        })
        .collect();

    Ok(Json(ModelList { object: "list", data }))
}

/// `POST /v1/chat/completions` / `POST /chat/completions` (§6). Streamed
/// responses are `text/event-stream`; buffered ones are plain JSON with
/// the RAG fan-out summary attached.
async fn chat_completions(State(state): State<AppState>, Json(payload): Json<ChatCompletionRequest>) -> Result<Response, CompletionError> {
    let assistant_id = parse_assistant_model_id(&payload.model)
        .ok_or_else(|| CompletionError::new(file!(), line!(), column!(), CompletionErr::BadInput(format!("not a lamb assistant model id: '{}'", payload.model))))?;

    let messages = payload.resolved_messages();
    let stream = payload.stream;
    let body = payload.extra.clone();

    let (response, citations) = state.orchestrator.run(assistant_id, messages, stream, body).await?;

    let citations: Vec<CitationSummary> = citations.iter().map(CitationSummary::from).collect();

    match response {
        OrchestratorResponse::Buffered(chunk) => Ok(Json(ChatCompletionResponse { chunk, citations }).into_response()),
        OrchestratorResponse::Stream(inner) => Ok(sse_response(inner, payload.model.clone(), citations)),
    }
}

/// `POST /v1/pipelines/reload` (§6): administrative reload of the
/// directory snapshot and process-wide provider defaults.
async fn reload(State(state): State<AppState>) -> Result<impl IntoResponse, CompletionError> {
    state.reload().await?;
    Ok(Json(ReloadResponse { status: "ok" }))
}

/// Builds the `text/event-stream` response for a streaming completion
/// (§4.8, §7): every upstream chunk forwarded verbatim, a synthesized
/// `finish_reason = "stop"` chunk appended once the connector's stream is
/// exhausted (connectors themselves never emit it — see `ollama.rs`'s
/// `parse_ndjson`), and a terminal `[DONE]` frame in every exit path,
/// including mid-stream upstream failure.
fn sse_response(inner: ChunkStream, model_id: String, citations: Vec<CitationSummary>) -> Response {
    let failed: Vec<&str> = citations.iter().filter(|c| c.error.is_some()).map(|c| c.collection_id.as_str()).collect();
    let failed_header = failed.join(",");

    let body = Body::from_stream(to_sse_frames(inner, model_id));

    let mut response = Response::builder()
        .status(StatusCode::OK)
        .header(axum::http::header::CONTENT_TYPE, "text/event-stream")
        .header(axum::http::header::CACHE_CONTROL, "no-cache")
        .body(body)
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response());

    if !failed_header.is_empty() {
        if let Ok(value) = HeaderValue::from_str(&failed_header) {
            response.headers_mut().insert("x-rag-failed-collections", value);
        }
    }

    response
}

enum SsePhase {
    Body(ChunkStream, String, String),
    AwaitingDone,
    Done,
}

fn to_sse_frames(inner: ChunkStream, model_id: String) -> impl Stream<Item = Result<Bytes, Infallible>> {
    let id = uuid::Uuid::new_v4().to_string();
    futures_util::stream::unfold(SsePhase::Body(inner, id, model_id), |phase| async move {
        match phase {
            SsePhase::Body(mut inner, id, model) => match inner.next().await {
                Some(Ok(chunk)) => {
                    let next_id = chunk.id.clone();
                    let next_model = chunk.model.clone();
                    let bytes = Bytes::from(chunk.to_sse());
                    Some((Ok(bytes), SsePhase::Body(inner, next_id, next_model)))
                }
                Some(Err(e)) => {
                    let err_chunk = ChatCompletionChunk::single(id, model, format!("upstream error: {e}"));
                    Some((Ok(Bytes::from(err_chunk.to_sse())), SsePhase::AwaitingDone))
                }
                None => {
                    let stop_chunk = ChatCompletionChunk::stop(id, model);
                    Some((Ok(Bytes::from(stop_chunk.to_sse())), SsePhase::AwaitingDone))
                }
            },
            SsePhase::AwaitingDone => Some((Ok(Bytes::from(SSE_DONE)), SsePhase::Done)),
            SsePhase::Done => None,
        }
    })
}
