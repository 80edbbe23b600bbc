use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use exitpass_core::error::{ErrorKind, ExitPassError};
use exitpass_core::models::actor::Actor;
use exitpass_core::models::audit::PermitEvent;
use exitpass_core::models::permit::{PermitAction, PermitRequest};
use exitpass_core::views::PermitSearch;
use exitpass_db::repository::{SurrealPermitEventRepository, SurrealPermitRepository};
use exitpass_workflow::{DisabledAnnotator, ErrorBody, PermitCommand, PermitService};
use serde::Deserialize;
use surrealdb::Connection;
use uuid::Uuid;

pub type AppService<C> =
    PermitService<SurrealPermitRepository<C>, SurrealPermitEventRepository<C>, DisabledAnnotator>;

pub struct AppState<C: Connection> {
    pub service: Arc<AppService<C>>,
}

impl<C: Connection> Clone for AppState<C> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
        }
    }
}

/// Failure of a workflow call, rendered as `ErrorBody` JSON.
#[derive(Debug)]
pub struct ApiError(ExitPassError);

impl From<ExitPassError> for ApiError {
    fn from(err: ExitPassError) -> Self {
        Self(err)
    }
}

pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::Unauthorized => StatusCode::FORBIDDEN,
        ErrorKind::InvalidTransition | ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::CollaboratorFailure => StatusCode::BAD_GATEWAY,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody::from(&self.0);
        let status = status_for(body.kind);
        if status.is_server_error() {
            tracing::error!(error = %self.0, "Request failed");
        }
        (status, Json(body)).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct ActorRequest {
    pub actor: Actor,
}

#[derive(Debug, Deserialize)]
pub struct PermitQuery {
    pub actor: Actor,
    pub permit_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub actor: Actor,
    #[serde(default)]
    pub filters: PermitSearch,
}

pub fn router<C: Connection>(state: AppState<C>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/v1/commands", post(execute::<C>))
        .route("/v1/permit", post(permit::<C>))
        .route("/v1/dashboard", post(dashboard::<C>))
        .route("/v1/search", post(search::<C>))
        .route("/v1/actions", post(actions::<C>))
        .route("/v1/history", post(history::<C>))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn execute<C: Connection>(
    State(state): State<AppState<C>>,
    Json(command): Json<PermitCommand>,
) -> Result<Json<PermitRequest>, ApiError> {
    let action = command.action();
    let actor_id = command.actor().id;
    match state.service.execute(command).await {
        Ok(permit) => Ok(Json(permit)),
        Err(e) => {
            tracing::info!(%action, %actor_id, error = %e, "Command refused");
            Err(e.into())
        }
    }
}

async fn permit<C: Connection>(
    State(state): State<AppState<C>>,
    Json(req): Json<PermitQuery>,
) -> Result<Json<PermitRequest>, ApiError> {
    Ok(Json(state.service.get(&req.actor, req.permit_id).await?))
}

async fn dashboard<C: Connection>(
    State(state): State<AppState<C>>,
    Json(req): Json<ActorRequest>,
) -> Result<Json<Vec<PermitRequest>>, ApiError> {
    Ok(Json(state.service.dashboard(&req.actor).await?))
}

async fn search<C: Connection>(
    State(state): State<AppState<C>>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<Vec<PermitRequest>>, ApiError> {
    Ok(Json(state.service.search(&req.actor, &req.filters).await?))
}

async fn actions<C: Connection>(
    State(state): State<AppState<C>>,
    Json(req): Json<PermitQuery>,
) -> Result<Json<Vec<PermitAction>>, ApiError> {
    Ok(Json(
        state
            .service
            .available_actions(&req.actor, req.permit_id)
            .await?,
    ))
}

async fn history<C: Connection>(
    State(state): State<AppState<C>>,
    Json(req): Json<PermitQuery>,
) -> Result<Json<Vec<PermitEvent>>, ApiError> {
    Ok(Json(state.service.history(&req.actor, req.permit_id).await?))
}
