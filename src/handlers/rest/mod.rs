use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use axum_macros::debug_handler;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use std::sync::Arc;

use crate::{
    dto::{ErrorResponse, HealthResponse, NoteResponse, SaveNoteRequest},
    service::NoteService,
};

#[derive(OpenApi)]
#[openapi(
    paths(get_note, put_note, health),
    components(schemas(NoteResponse, SaveNoteRequest, HealthResponse, ErrorResponse)),
    tags(
        (name = "notes", description = "Shared notes API")
    )
)]
pub struct ApiDoc;

/// Routes plus the Swagger UI. Layers (trace, CORS) are applied by the
/// caller.
pub fn router(service: Arc<NoteService>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/notes/{note_name}", get(get_note).put(put_note))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .with_state(service)
}

#[utoipa::path(
    get,
    path = "/notes/{note_name}",
    params(
        ("note_name" = String, Path, description = "Note name, used verbatim as the lookup key")
    ),
    responses(
        (status = 200, description = "Note found", body = NoteResponse),
        (status = 404, description = "Note has never been saved", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "notes"
)]
#[debug_handler]
pub async fn get_note(
    State(service): State<Arc<NoteService>>,
    Path(note_name): Path<String>,
) -> Response {
    match service.load_note(&note_name).await {
        Ok(Some(note)) => (StatusCode::OK, Json(note)).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                message: "Note not found".to_owned(),
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("failed to load note: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    message: "Error loading note".to_owned(),
                }),
            )
                .into_response()
        }
    }
}

#[utoipa::path(
    put,
    path = "/notes/{note_name}",
    params(
        ("note_name" = String, Path, description = "Note name, used verbatim as the lookup key")
    ),
    request_body = SaveNoteRequest,
    responses(
        (status = 200, description = "Note upserted", body = NoteResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "notes"
)]
#[debug_handler]
pub async fn put_note(
    State(service): State<Arc<NoteService>>,
    Path(note_name): Path<String>,
    body: Bytes,
) -> Response {
    // Missing body, missing field and non-string content all coerce to
    // an empty write, never to a rejection.
    let content = serde_json::from_slice::<SaveNoteRequest>(&body)
        .map(|request| request.content_or_default())
        .unwrap_or_default();

    match service.save_note(&note_name, &content).await {
        Ok(note) => (StatusCode::OK, Json(note)).into_response(),
        Err(e) => {
            tracing::error!("failed to save note: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    message: "Error saving note".to_owned(),
                }),
            )
                .into_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Process liveness and store connectivity", body = HealthResponse)
    ),
    tag = "notes"
)]
#[debug_handler]
pub async fn health(State(service): State<Arc<NoteService>>) -> Response {
    (StatusCode::OK, Json(service.health().await)).into_response()
}
