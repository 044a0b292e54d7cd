use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::resumes::repo_types::{NewResume, Resume, ResumeFile, ResumeQuery};
use crate::store::DocumentStore;

fn not_found(resume_id: Uuid) -> AppError {
    warn!(%resume_id, "resume not found");
    AppError::NotFound("Resume not found".into())
}

/// The owner reference is not checked; a resume may point at a user that does not exist.
pub async fn upload(store: &dyn DocumentStore, resume: NewResume) -> Result<Resume, AppError> {
    let size = resume.file_data.len();
    let created = store.insert_resume(resume).await?;
    info!(resume_id = %created.id, user_id = %created.user_id, size, "resume uploaded");
    Ok(created)
}

pub async fn list_active(store: &dyn DocumentStore, user_id: Uuid) -> Result<Vec<Resume>, AppError> {
    Ok(store.list_resumes(ResumeQuery::active_for(user_id)).await?)
}

pub async fn list_archived(
    store: &dyn DocumentStore,
    user_id: Uuid,
) -> Result<Vec<Resume>, AppError> {
    Ok(store.list_resumes(ResumeQuery::archived_for(user_id)).await?)
}

/// Re-archiving an archived resume only moves its timestamp.
pub async fn archive(store: &dyn DocumentStore, resume_id: Uuid) -> Result<(), AppError> {
    if !store
        .set_archived_at(resume_id, Some(OffsetDateTime::now_utc()))
        .await?
    {
        return Err(not_found(resume_id));
    }
    info!(%resume_id, "resume archived");
    Ok(())
}

/// Drops the archive marker entirely; a restored resume looks never-archived.
pub async fn restore(store: &dyn DocumentStore, resume_id: Uuid) -> Result<(), AppError> {
    if !store.set_archived_at(resume_id, None).await? {
        return Err(not_found(resume_id));
    }
    info!(%resume_id, "resume restored");
    Ok(())
}

pub async fn permanent_delete(store: &dyn DocumentStore, resume_id: Uuid) -> Result<(), AppError> {
    if !store.delete_resume(resume_id).await? {
        return Err(not_found(resume_id));
    }
    info!(%resume_id, "resume permanently deleted");
    Ok(())
}

pub async fn download(store: &dyn DocumentStore, resume_id: Uuid) -> Result<ResumeFile, AppError> {
    store
        .get_resume_file(resume_id)
        .await?
        .ok_or_else(|| not_found(resume_id))
}
