use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use tracing::{instrument, warn};
use uuid::Uuid;

use super::dto::{MessageResponse, UploadResponse};
use super::repo_types::{NewResume, Resume};
use super::services;
use crate::{error::AppError, state::AppState};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/resumes/user/:user_id", get(list_active))
        .route("/resumes/user/:user_id/archived", get(list_archived))
        .route("/resumes/:id/download", get(download))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/resumes", post(upload))
        .route("/resumes/:id/archive", put(archive))
        .route("/resumes/:id/restore", put(restore))
        .route("/resumes/:id", delete(permanent_delete))
        .layer(DefaultBodyLimit::max(20 * 1024 * 1024)) // 20MB
}

fn bad_multipart<E: std::fmt::Display>(e: E) -> AppError {
    warn!(error = %e, "malformed multipart body");
    AppError::Validation("Malformed multipart body".into())
}

/// POST /resumes (multipart)
/// Fields: `userId`, optional `description`, `file`.
#[instrument(skip(state, mp))]
pub async fn upload(
    State(state): State<AppState>,
    mut mp: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), AppError> {
    let mut user_id: Option<Uuid> = None;
    let mut description = String::new();
    let mut file: Option<(String, String, Vec<u8>)> = None;

    while let Some(field) = mp.next_field().await.map_err(bad_multipart)? {
        let name = field.name().map(|s| s.to_string());
        match name.as_deref() {
            Some("userId") => {
                let raw = field.text().await.map_err(bad_multipart)?;
                let id = raw
                    .trim()
                    .parse::<Uuid>()
                    .map_err(|_| AppError::Validation("userId must be a UUID".into()))?;
                user_id = Some(id);
            }
            Some("description") => {
                description = field.text().await.map_err(bad_multipart)?;
            }
            Some("file") => {
                let file_name = field.file_name().unwrap_or("resume").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field.bytes().await.map_err(bad_multipart)?;
                file = Some((file_name, content_type, data.to_vec()));
            }
            _ => {}
        }
    }

    let Some((file_name, content_type, file_data)) = file else {
        warn!("upload without file");
        return Err(AppError::Validation("No file uploaded".into()));
    };
    let Some(user_id) = user_id else {
        warn!("upload without userId");
        return Err(AppError::Validation("userId is required".into()));
    };

    let resume = services::upload(
        state.store.as_ref(),
        NewResume { user_id, file_name, content_type, description, file_data },
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse { message: "Resume uploaded successfully", resume }),
    ))
}

#[instrument(skip(state))]
pub async fn list_active(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<Resume>>, AppError> {
    Ok(Json(services::list_active(state.store.as_ref(), user_id).await?))
}

#[instrument(skip(state))]
pub async fn list_archived(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<Resume>>, AppError> {
    Ok(Json(services::list_archived(state.store.as_ref(), user_id).await?))
}

#[instrument(skip(state))]
pub async fn download(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let file = services::download(state.store.as_ref(), id).await?;

    let content_type = HeaderValue::from_str(&file.content_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
    let disposition = content_disposition(&file.file_name);

    Ok((
        [(header::CONTENT_TYPE, content_type), (header::CONTENT_DISPOSITION, disposition)],
        file.file_data,
    )
        .into_response())
}

/// `attachment` header with an ASCII `filename` fallback and the exact name in
/// RFC 5987 `filename*` form.
fn content_disposition(file_name: &str) -> HeaderValue {
    let fallback: String = file_name
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();

    let mut encoded = String::with_capacity(file_name.len());
    for b in file_name.bytes() {
        if b.is_ascii_alphanumeric() || b"!#$&+-.^_`|~".contains(&b) {
            encoded.push(b as char);
        } else {
            encoded.push_str(&format!("%{b:02X}"));
        }
    }

    HeaderValue::from_str(&format!(
        "attachment; filename=\"{fallback}\"; filename*=UTF-8''{encoded}"
    ))
    .unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}

#[instrument(skip(state))]
pub async fn archive(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    services::archive(state.store.as_ref(), id).await?;
    Ok(Json(MessageResponse { message: "Resume archived successfully" }))
}

#[instrument(skip(state))]
pub async fn restore(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    services::restore(state.store.as_ref(), id).await?;
    Ok(Json(MessageResponse { message: "Resume restored successfully" }))
}

#[instrument(skip(state))]
pub async fn permanent_delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    services::permanent_delete(state.store.as_ref(), id).await?;
    Ok(Json(MessageResponse { message: "Resume permanently deleted" }))
}
