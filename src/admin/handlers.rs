use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use tracing::{instrument, warn};
use uuid::Uuid;

use super::dto::{
    AdminStatusResponse, CreateAdminRequest, CreateAdminResponse, DeleteUserResponse,
    ResumeWithOwner,
};
use super::services;
use crate::{auth::repo_types::User, error::AppError, state::AppState};

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/resumes", get(list_resumes))
        .route("/admin/users", get(list_users))
        .route("/admin/users/:id", delete(delete_user))
        .route("/admin/status", get(status))
        .route("/admin/create", post(create_admin))
}

#[instrument(skip(state))]
pub async fn list_resumes(
    State(state): State<AppState>,
) -> Result<Json<Vec<ResumeWithOwner>>, AppError> {
    Ok(Json(services::list_all_active_with_owners(state.store.as_ref()).await?))
}

#[instrument(skip(state))]
pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<User>>, AppError> {
    Ok(Json(services::list_users(state.store.as_ref()).await?))
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeleteUserResponse>, AppError> {
    let deleted_resumes = services::delete_user_cascade(state.store.as_ref(), id).await?;
    Ok(Json(DeleteUserResponse {
        message: "User and associated resumes deleted successfully",
        deleted_resumes,
    }))
}

#[instrument(skip(state))]
pub async fn status(State(state): State<AppState>) -> Result<Json<AdminStatusResponse>, AppError> {
    let admin_exists = services::admin_status(state.store.as_ref()).await?;
    Ok(Json(AdminStatusResponse { admin_exists }))
}

/// An empty body uses the configured defaults; a body that does not parse is rejected.
#[instrument(skip(state, body))]
pub async fn create_admin(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<CreateAdminResponse>), AppError> {
    let req = if body.iter().all(u8::is_ascii_whitespace) {
        CreateAdminRequest::default()
    } else {
        serde_json::from_slice::<CreateAdminRequest>(&body).map_err(|e| {
            warn!(error = %e, "malformed admin creation body");
            AppError::Validation("Malformed JSON body".into())
        })?
    };
    let user =
        services::create_admin_manually(state.store.as_ref(), &state.config.admin, req).await?;
    Ok((
        StatusCode::CREATED,
        Json(CreateAdminResponse { message: "Admin user created successfully", user }),
    ))
}
