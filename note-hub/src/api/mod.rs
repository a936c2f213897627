//! HTTP API layer exposing folder/note hierarchy endpoints.

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Path, State},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use note_hub_core::error::HierarchyError;
use note_hub_core::hierarchy::{CancelFlag, CascadeOutcome};
use note_hub_core::model::{parse_id, Block, Folder, Note, UserSpace};
use note_hub_core::service::{DeleteFolderError, NoteHubService};
use note_hub_core::tenant::resolve_tenant;

use crate::auth::TokenVerifier;

/// Authentication context extracted from request headers: a verified
/// bearer token, or the `X-User-Id` fallback for local use.
#[derive(Clone, Debug)]
pub struct AuthContext {
    pub user_id: String,
}

impl FromRequestParts<AppState> for AuthContext {
    type Rejection = StatusCode;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let headers = &parts.headers;
        if let Some(auth) = headers.get("Authorization").and_then(|v| v.to_str().ok()) {
            if let Some(token) = auth.strip_prefix("Bearer ") {
                if let Some(claims) = state.verifier.verify(token).await {
                    return Ok(Self {
                        user_id: claims.sub,
                    });
                }
            }
        }
        headers
            .get("X-User-Id")
            .and_then(|v| v.to_str().ok())
            .map(|s| Self {
                user_id: s.to_string(),
            })
            .ok_or(StatusCode::UNAUTHORIZED)
    }
}

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<NoteHubService>,
    pub verifier: Arc<dyn TokenVerifier>,
}

/// Caller-facing failure with the status the error kind maps to.
pub struct ApiError {
    status: StatusCode,
    body: serde_json::Value,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            body: json!({ "error": message.into() }),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl From<HierarchyError> for ApiError {
    fn from(err: HierarchyError) -> Self {
        let status = match &err {
            HierarchyError::InvalidIdentifier(_)
            | HierarchyError::SelfParent { .. }
            | HierarchyError::CyclicParent { .. } => StatusCode::BAD_REQUEST,
            HierarchyError::NotFound { .. } => StatusCode::NOT_FOUND,
            HierarchyError::OwnershipViolation { .. } => StatusCode::UNAUTHORIZED,
            HierarchyError::DanglingReference { .. } | HierarchyError::Store(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self::new(status, err.to_string())
    }
}

impl From<DeleteFolderError> for ApiError {
    fn from(err: DeleteFolderError) -> Self {
        match err {
            DeleteFolderError::Rejected(inner) => inner.into(),
            // surface the partial result so the caller can decide on
            // cleanup or retry
            DeleteFolderError::Aborted(aborted) => Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                body: json!({
                    "error": aborted.to_string(),
                    "deleted": aborted.partial,
                }),
            },
        }
    }
}

#[derive(Deserialize)]
struct CreateFolderRequest {
    name: String,
    #[serde(rename = "parentId")]
    parent_id: Option<String>,
}

#[derive(Deserialize)]
struct RenameRequest {
    name: String,
}

#[derive(Deserialize)]
struct MoveRequest {
    #[serde(rename = "parentId")]
    parent_id: Option<String>,
}

#[derive(Deserialize)]
struct CreateNoteRequest {
    title: String,
    #[serde(rename = "parentId")]
    parent_id: Option<String>,
    #[serde(default)]
    content: Vec<Block>,
}

#[derive(Deserialize)]
struct RenameNoteRequest {
    title: String,
}

#[derive(Deserialize)]
struct NoteContentRequest {
    title: String,
    content: Vec<Block>,
}

pub fn router(service: Arc<NoteHubService>, verifier: Arc<dyn TokenVerifier>) -> Router {
    let state = AppState { service, verifier };
    Router::new()
        .route("/folders", post(create_folder))
        .route("/folders/{id}", delete(delete_folder))
        .route("/folders/{id}/rename", put(rename_folder))
        .route("/folders/{id}/move", put(move_folder))
        .route("/notes", post(create_note))
        .route(
            "/notes/{id}",
            get(find_note).delete(delete_note),
        )
        .route("/notes/{id}/rename", put(rename_note))
        .route("/notes/{id}/content", put(update_note_content))
        .route("/notes/{id}/move", put(move_note))
        .route("/space", get(space_content).delete(delete_space))
        .with_state(state)
}

/// An absent or empty parent means the root of the space.
fn parse_parent(raw: Option<&str>) -> Result<Option<Uuid>, HierarchyError> {
    match raw {
        None | Some("") => Ok(None),
        Some(s) => parse_id(s).map(Some),
    }
}

async fn tenant_of(state: &AppState, auth: &AuthContext) -> Result<UserSpace, ApiError> {
    Ok(resolve_tenant(state.service.store(), &auth.user_id).await?)
}

fn folder_reply(status: StatusCode, folder: Folder, message: &str) -> Response {
    (status, Json(json!({ "folder": folder, "message": message }))).into_response()
}

fn note_reply(status: StatusCode, note: Note, message: &str) -> Response {
    (status, Json(json!({ "note": note, "message": message }))).into_response()
}

fn outcome_reply(outcome: CascadeOutcome, message: &str) -> Response {
    (
        StatusCode::OK,
        Json(json!({ "deleted": outcome, "message": message })),
    )
        .into_response()
}

async fn create_folder(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(req): Json<CreateFolderRequest>,
) -> Result<Response, ApiError> {
    let space = tenant_of(&state, &auth).await?;
    let parent = parse_parent(req.parent_id.as_deref())?;
    let folder = state.service.create_folder(&space, &req.name, parent).await?;
    Ok(folder_reply(StatusCode::CREATED, folder, "Folder created"))
}

async fn rename_folder(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<String>,
    Json(req): Json<RenameRequest>,
) -> Result<Response, ApiError> {
    let space = tenant_of(&state, &auth).await?;
    let id = parse_id(&id)?;
    let folder = state.service.rename_folder(&space, id, &req.name).await?;
    Ok(folder_reply(StatusCode::OK, folder, "Folder renamed"))
}

async fn move_folder(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<String>,
    Json(req): Json<MoveRequest>,
) -> Result<Response, ApiError> {
    let space = tenant_of(&state, &auth).await?;
    let id = parse_id(&id)?;
    let parent = parse_parent(req.parent_id.as_deref())?;
    let folder = state.service.move_folder(&space, id, parent).await?;
    Ok(folder_reply(StatusCode::OK, folder, "Folder moved"))
}

async fn delete_folder(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let space = tenant_of(&state, &auth).await?;
    let id = parse_id(&id)?;
    let outcome = state
        .service
        .delete_folder(&space, id, &CancelFlag::new())
        .await?;
    Ok(outcome_reply(outcome, "Folder deleted"))
}

async fn create_note(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(req): Json<CreateNoteRequest>,
) -> Result<Response, ApiError> {
    let space = tenant_of(&state, &auth).await?;
    let parent = parse_parent(req.parent_id.as_deref())?;
    let note = state
        .service
        .create_note(&space, &req.title, parent, req.content)
        .await?;
    Ok(note_reply(StatusCode::CREATED, note, "Note created"))
}

async fn find_note(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let space = tenant_of(&state, &auth).await?;
    let id = parse_id(&id)?;
    let note = state.service.find_note(&space, id).await?;
    Ok((StatusCode::OK, Json(json!({ "note": note }))).into_response())
}

async fn rename_note(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<String>,
    Json(req): Json<RenameNoteRequest>,
) -> Result<Response, ApiError> {
    let space = tenant_of(&state, &auth).await?;
    let id = parse_id(&id)?;
    let note = state.service.rename_note(&space, id, &req.title).await?;
    Ok(note_reply(StatusCode::OK, note, "Note title updated"))
}

async fn update_note_content(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<String>,
    Json(req): Json<NoteContentRequest>,
) -> Result<Response, ApiError> {
    let space = tenant_of(&state, &auth).await?;
    let id = parse_id(&id)?;
    let note = state
        .service
        .update_note_content(&space, id, &req.title, req.content)
        .await?;
    Ok(note_reply(StatusCode::OK, note, "Note updated"))
}

async fn move_note(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<String>,
    Json(req): Json<MoveRequest>,
) -> Result<Response, ApiError> {
    let space = tenant_of(&state, &auth).await?;
    let id = parse_id(&id)?;
    let parent = parse_parent(req.parent_id.as_deref())?;
    let note = state.service.move_note(&space, id, parent).await?;
    Ok(note_reply(StatusCode::OK, note, "Note moved"))
}

async fn delete_note(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let space = tenant_of(&state, &auth).await?;
    let id = parse_id(&id)?;
    let note = state.service.delete_note(&space, id).await?;
    Ok(note_reply(StatusCode::OK, note, "Note deleted"))
}

async fn space_content(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<Response, ApiError> {
    let space = tenant_of(&state, &auth).await?;
    let view = state.service.space_content(&space).await?;
    Ok((
        StatusCode::OK,
        Json(json!({
            "userSpace": space,
            "tree": view.tree,
            "parentLookup": view.parent_lookup,
        })),
    )
        .into_response())
}

async fn delete_space(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<Response, ApiError> {
    let space = tenant_of(&state, &auth).await?;
    let outcome = state
        .service
        .delete_space(&space, &CancelFlag::new())
        .await?;
    Ok(outcome_reply(outcome, "User Space deleted"))
}
