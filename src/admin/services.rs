use tracing::{error, info, warn};
use uuid::Uuid;

use super::dto::{CreateAdminRequest, ResumeWithOwner, UNKNOWN_EMAIL, UNKNOWN_USER};
use crate::auth::repo_types::{Role, User};
use crate::auth::services::create_user;
use crate::config::AdminDefaults;
use crate::error::AppError;
use crate::store::DocumentStore;

pub async fn list_all_active_with_owners(
    store: &dyn DocumentStore,
) -> Result<Vec<ResumeWithOwner>, AppError> {
    let rows = store.list_active_with_owners().await?;
    Ok(rows
        .into_iter()
        .map(|row| ResumeWithOwner {
            resume: row.resume,
            user_name: row.owner_name.unwrap_or_else(|| UNKNOWN_USER.to_string()),
            user_email: row.owner_email.unwrap_or_else(|| UNKNOWN_EMAIL.to_string()),
        })
        .collect())
}

pub async fn list_users(store: &dyn DocumentStore) -> Result<Vec<User>, AppError> {
    Ok(store.list_users().await?)
}

/// Deletes the user's resumes and then the user. Admins are never deleted here.
/// Returns how many resumes went with the user.
pub async fn delete_user_cascade(store: &dyn DocumentStore, user_id: Uuid) -> Result<u64, AppError> {
    let Some(user) = store.find_user_by_id(user_id).await? else {
        warn!(%user_id, "delete of unknown user");
        return Err(AppError::NotFound("User not found".into()));
    };
    if user.role == Role::Admin {
        warn!(%user_id, "refusing to delete admin user");
        return Err(AppError::Forbidden("Cannot delete admin user".into()));
    }

    let deleted_resumes = store.delete_user_with_resumes(user_id).await?;
    info!(%user_id, deleted_resumes, "user deleted with resumes");
    Ok(deleted_resumes)
}

pub async fn admin_status(store: &dyn DocumentStore) -> Result<bool, AppError> {
    Ok(store.admin_exists().await?)
}

/// Creates the default admin when none exists. Returns the created admin, if any.
pub async fn ensure_admin_bootstrap(
    store: &dyn DocumentStore,
    defaults: &AdminDefaults,
) -> Result<Option<User>, AppError> {
    if store.admin_exists().await? {
        info!("admin user present");
        return Ok(None);
    }
    let admin = create_user(
        store,
        &defaults.name,
        &defaults.email,
        &defaults.password,
        Role::Admin,
    )
    .await?;
    info!(user_id = %admin.id, email = %admin.email, "default admin created");
    Ok(Some(admin))
}

/// Startup hook: a failing bootstrap is logged, never fatal.
pub async fn run_startup_bootstrap(store: &dyn DocumentStore, defaults: &AdminDefaults) {
    if let Err(e) = ensure_admin_bootstrap(store, defaults).await {
        error!(error = %e, "admin bootstrap failed");
    }
}

/// Fails with a conflict when any admin already exists.
pub async fn create_admin_manually(
    store: &dyn DocumentStore,
    defaults: &AdminDefaults,
    req: CreateAdminRequest,
) -> Result<User, AppError> {
    if store.admin_exists().await? {
        warn!("admin creation refused; admin already exists");
        return Err(AppError::Conflict("Admin already exists".into()));
    }
    let email = req.email.unwrap_or_else(|| defaults.email.clone());
    let password = req.password.unwrap_or_else(|| defaults.password.clone());
    let name = req.name.unwrap_or_else(|| defaults.name.clone());

    let admin = create_user(store, &name, &email, &password, Role::Admin).await?;
    info!(user_id = %admin.id, email = %admin.email, "admin created manually");
    Ok(admin)
}
