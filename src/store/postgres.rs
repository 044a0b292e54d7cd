use anyhow::Context;
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool};
use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use super::{DocumentStore, StoreResult};
use crate::auth::repo_types::{NewUser, User};
use crate::resumes::repo_types::{
    ArchiveFilter, NewResume, Resume, ResumeFile, ResumeQuery, ResumeWithOwnerRow,
};

const USER_COLUMNS: &str = "id, name, email, password_hash, role, created_at";
const RESUME_COLUMNS: &str =
    "id, user_id, file_name, content_type, description, uploaded_at, archived_at";

#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    password_hash: String,
    role: String,
    created_at: OffsetDateTime,
}

impl TryFrom<UserRow> for User {
    type Error = anyhow::Error;

    fn try_from(r: UserRow) -> Result<Self, Self::Error> {
        Ok(Self {
            role: r.role.parse()?,
            id: r.id,
            name: r.name,
            email: r.email,
            password_hash: r.password_hash,
            created_at: r.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct ResumeRow {
    id: Uuid,
    user_id: Uuid,
    file_name: String,
    content_type: String,
    description: String,
    uploaded_at: OffsetDateTime,
    archived_at: Option<OffsetDateTime>,
}

impl From<ResumeRow> for Resume {
    fn from(r: ResumeRow) -> Self {
        Resume::from_parts(
            r.id,
            r.user_id,
            r.file_name,
            r.content_type,
            r.description,
            r.uploaded_at,
            r.archived_at,
        )
    }
}

#[derive(Debug, FromRow)]
struct ResumeOwnerRow {
    #[sqlx(flatten)]
    resume: ResumeRow,
    owner_name: Option<String>,
    owner_email: Option<String>,
}

#[derive(Debug, FromRow)]
struct ResumeFileRow {
    file_name: String,
    content_type: String,
    file_data: Vec<u8>,
}

/// Postgres-backed store. One pool, built at startup and shared by every request.
#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<Self> {
        info!("connecting to postgres");
        let db = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("connect to database")?;
        info!("postgres connection pool established");
        Ok(Self { db })
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.db)
            .await
            .context("run migrations")?;
        Ok(())
    }

    /// Closes the pool; in-flight queries finish first.
    pub async fn close(&self) {
        self.db.close().await;
    }
}

fn users_from_rows(rows: Vec<UserRow>) -> StoreResult<Vec<User>> {
    let users = rows
        .into_iter()
        .map(User::try_from)
        .collect::<anyhow::Result<Vec<_>>>()?;
    Ok(users)
}

#[async_trait]
impl DocumentStore for PgStore {
    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(User::try_from).transpose()?)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(User::try_from).transpose()?)
    }

    async fn admin_exists(&self) -> StoreResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE role = 'admin')")
                .fetch_one(&self.db)
                .await?;
        Ok(exists)
    }

    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO users (name, email, password_hash, role)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .fetch_one(&self.db)
        .await?;
        Ok(User::try_from(row)?)
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC"
        ))
        .fetch_all(&self.db)
        .await?;
        users_from_rows(rows)
    }

    async fn delete_user_with_resumes(&self, user_id: Uuid) -> StoreResult<u64> {
        let mut tx = self.db.begin().await.context("begin tx")?;
        let removed = sqlx::query("DELETE FROM resumes WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await.context("commit tx")?;
        Ok(removed)
    }

    async fn insert_resume(&self, resume: NewResume) -> StoreResult<Resume> {
        let row = sqlx::query_as::<_, ResumeRow>(&format!(
            r#"
            INSERT INTO resumes (user_id, file_name, content_type, description, file_data)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {RESUME_COLUMNS}
            "#
        ))
        .bind(resume.user_id)
        .bind(&resume.file_name)
        .bind(&resume.content_type)
        .bind(&resume.description)
        .bind(&resume.file_data)
        .fetch_one(&self.db)
        .await?;
        Ok(row.into())
    }

    async fn list_resumes(&self, query: ResumeQuery) -> StoreResult<Vec<Resume>> {
        let (state_clause, order) = match query.filter {
            ArchiveFilter::Active => ("archived_at IS NULL", "uploaded_at DESC"),
            ArchiveFilter::Archived => ("archived_at IS NOT NULL", "archived_at DESC"),
        };
        let sql = format!(
            r#"
            SELECT {RESUME_COLUMNS}
              FROM resumes
             WHERE {state_clause}
               AND ($1::uuid IS NULL OR user_id = $1)
             ORDER BY {order}
            "#
        );
        let rows = sqlx::query_as::<_, ResumeRow>(&sql)
            .bind(query.owner)
            .fetch_all(&self.db)
            .await?;
        Ok(rows.into_iter().map(Resume::from).collect())
    }

    async fn list_active_with_owners(&self) -> StoreResult<Vec<ResumeWithOwnerRow>> {
        let rows = sqlx::query_as::<_, ResumeOwnerRow>(
            r#"
            SELECT r.id, r.user_id, r.file_name, r.content_type, r.description,
                   r.uploaded_at, r.archived_at,
                   u.name AS owner_name, u.email AS owner_email
              FROM resumes r
              LEFT JOIN users u ON u.id = r.user_id
             WHERE r.archived_at IS NULL
             ORDER BY r.uploaded_at DESC
            "#,
        )
        .fetch_all(&self.db)
        .await?;
        Ok(rows
            .into_iter()
            .map(|r| ResumeWithOwnerRow {
                resume: r.resume.into(),
                owner_name: r.owner_name,
                owner_email: r.owner_email,
            })
            .collect())
    }

    async fn get_resume_file(&self, id: Uuid) -> StoreResult<Option<ResumeFile>> {
        let row = sqlx::query_as::<_, ResumeFileRow>(
            "SELECT file_name, content_type, file_data FROM resumes WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(|r| ResumeFile {
            file_name: r.file_name,
            content_type: r.content_type,
            file_data: r.file_data,
        }))
    }

    async fn set_archived_at(&self, id: Uuid, at: Option<OffsetDateTime>) -> StoreResult<bool> {
        let done = sqlx::query("UPDATE resumes SET archived_at = $2 WHERE id = $1")
            .bind(id)
            .bind(at)
            .execute(&self.db)
            .await?;
        Ok(done.rows_affected() > 0)
    }

    async fn delete_resume(&self, id: Uuid) -> StoreResult<bool> {
        let done = sqlx::query("DELETE FROM resumes WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(done.rows_affected() > 0)
    }
}
