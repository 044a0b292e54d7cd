use std::collections::HashMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{DocumentStore, StoreError, StoreResult};
use crate::auth::repo_types::{NewUser, Role, User};
use crate::resumes::repo_types::{NewResume, Resume, ResumeFile, ResumeQuery, ResumeWithOwnerRow};

#[derive(Debug, Clone)]
struct StoredResume {
    meta: Resume,
    file_data: Vec<u8>,
}

#[derive(Default)]
struct Collections {
    users: HashMap<Uuid, User>,
    resumes: HashMap<Uuid, StoredResume>,
}

/// In-process store with the same contract as `PgStore`: unique emails,
/// store-assigned ids, and a cascade delete that runs under one write lock.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let guard = self.inner.read().await;
        Ok(guard.users.values().find(|u| u.email == email).cloned())
    }

    async fn admin_exists(&self) -> StoreResult<bool> {
        let guard = self.inner.read().await;
        Ok(guard.users.values().any(|u| u.role == Role::Admin))
    }

    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        let mut guard = self.inner.write().await;
        if guard.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Duplicate("email".into()));
        }
        let created = User {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            created_at: OffsetDateTime::now_utc(),
        };
        guard.users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let mut users: Vec<User> = self.inner.read().await.users.values().cloned().collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users)
    }

    async fn delete_user_with_resumes(&self, user_id: Uuid) -> StoreResult<u64> {
        let mut guard = self.inner.write().await;
        let before = guard.resumes.len();
        guard.resumes.retain(|_, r| r.meta.user_id != user_id);
        let removed = (before - guard.resumes.len()) as u64;
        guard.users.remove(&user_id);
        Ok(removed)
    }

    async fn insert_resume(&self, resume: NewResume) -> StoreResult<Resume> {
        let meta = Resume::from_parts(
            Uuid::new_v4(),
            resume.user_id,
            resume.file_name,
            resume.content_type,
            resume.description,
            OffsetDateTime::now_utc(),
            None,
        );
        let mut guard = self.inner.write().await;
        guard.resumes.insert(
            meta.id,
            StoredResume { meta: meta.clone(), file_data: resume.file_data },
        );
        Ok(meta)
    }

    async fn list_resumes(&self, query: ResumeQuery) -> StoreResult<Vec<Resume>> {
        let guard = self.inner.read().await;
        let mut out: Vec<Resume> = guard
            .resumes
            .values()
            .map(|r| &r.meta)
            .filter(|r| query.matches(r))
            .cloned()
            .collect();
        out.sort_by(|a, b| query.sort_key(b).cmp(&query.sort_key(a)));
        Ok(out)
    }

    async fn list_active_with_owners(&self) -> StoreResult<Vec<ResumeWithOwnerRow>> {
        let query = ResumeQuery::all_active();
        let guard = self.inner.read().await;
        let mut rows: Vec<ResumeWithOwnerRow> = guard
            .resumes
            .values()
            .filter(|r| query.matches(&r.meta))
            .map(|r| {
                let owner = guard.users.get(&r.meta.user_id);
                ResumeWithOwnerRow {
                    resume: r.meta.clone(),
                    owner_name: owner.map(|u| u.name.clone()),
                    owner_email: owner.map(|u| u.email.clone()),
                }
            })
            .collect();
        rows.sort_by(|a, b| b.resume.uploaded_at.cmp(&a.resume.uploaded_at));
        Ok(rows)
    }

    async fn get_resume_file(&self, id: Uuid) -> StoreResult<Option<ResumeFile>> {
        let guard = self.inner.read().await;
        Ok(guard.resumes.get(&id).map(|r| ResumeFile {
            file_name: r.meta.file_name.clone(),
            content_type: r.meta.content_type.clone(),
            file_data: r.file_data.clone(),
        }))
    }

    async fn set_archived_at(&self, id: Uuid, at: Option<OffsetDateTime>) -> StoreResult<bool> {
        let mut guard = self.inner.write().await;
        let Some(stored) = guard.resumes.get_mut(&id) else {
            return Ok(false);
        };
        stored.meta.archived = at.is_some();
        stored.meta.archived_at = at;
        Ok(true)
    }

    async fn delete_resume(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.inner.write().await.resumes.remove(&id).is_some())
    }
}
