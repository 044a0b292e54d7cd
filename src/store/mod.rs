//! Document store seam: the `users` and `resumes` collections.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo_types::{NewUser, User};
use crate::resumes::repo_types::{NewResume, Resume, ResumeFile, ResumeQuery, ResumeWithOwnerRow};

#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique index rejected the write; carries the offending field.
    #[error("duplicate {0}")]
    Duplicate(String),

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::Duplicate("email".into())
            }
            _ => StoreError::Backend(e.into()),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait DocumentStore: Send + Sync {
    // ---- users ----
    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn admin_exists(&self) -> StoreResult<bool>;
    /// Fails with `StoreError::Duplicate` when the email is taken.
    async fn insert_user(&self, user: NewUser) -> StoreResult<User>;
    /// Newest first.
    async fn list_users(&self) -> StoreResult<Vec<User>>;
    /// Deletes every resume owned by `user_id`, then the user. Returns the resume count.
    async fn delete_user_with_resumes(&self, user_id: Uuid) -> StoreResult<u64>;

    // ---- resumes ----
    async fn insert_resume(&self, resume: NewResume) -> StoreResult<Resume>;
    async fn list_resumes(&self, query: ResumeQuery) -> StoreResult<Vec<Resume>>;
    /// Every active resume left-joined with its owner, newest upload first.
    async fn list_active_with_owners(&self) -> StoreResult<Vec<ResumeWithOwnerRow>>;
    async fn get_resume_file(&self, id: Uuid) -> StoreResult<Option<ResumeFile>>;
    /// `Some(at)` marks the resume archived, `None` removes the marker. Returns whether a resume matched.
    async fn set_archived_at(&self, id: Uuid, at: Option<OffsetDateTime>) -> StoreResult<bool>;
    async fn delete_resume(&self, id: Uuid) -> StoreResult<bool>;
}
