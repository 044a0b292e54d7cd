use tracing::{info, warn};

use crate::auth::password::{hash_password, verify_password};
use crate::auth::repo_types::{NewUser, Role, User};
use crate::error::AppError;
use crate::store::DocumentStore;

/// Hashes the password and inserts a user with the given role.
/// A unique-index rejection on insert is reported as a conflict as well.
pub(crate) async fn create_user(
    store: &dyn DocumentStore,
    name: &str,
    email: &str,
    password: &str,
    role: Role,
) -> Result<User, AppError> {
    let password_hash = hash_password(password)?;
    let user = store
        .insert_user(NewUser {
            name: name.to_string(),
            email: email.to_string(),
            password_hash,
            role,
        })
        .await?;
    Ok(user)
}

pub async fn register_user(
    store: &dyn DocumentStore,
    name: &str,
    email: &str,
    password: &str,
) -> Result<User, AppError> {
    if store.find_user_by_email(email).await?.is_some() {
        warn!(%email, "email already registered");
        return Err(AppError::Conflict("User already exists".into()));
    }

    let user = create_user(store, name, email, password, Role::User).await?;
    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(user)
}

/// Unknown email and wrong password both end in `AppError::Unauthorized`.
pub async fn authenticate(
    store: &dyn DocumentStore,
    email: &str,
    password: &str,
) -> Result<User, AppError> {
    let Some(user) = store.find_user_by_email(email).await? else {
        warn!(%email, "login unknown email");
        return Err(AppError::Unauthorized);
    };

    if !verify_password(password, &user.password_hash)? {
        warn!(%email, user_id = %user.id, "login invalid password");
        return Err(AppError::Unauthorized);
    }

    info!(user_id = %user.id, "user logged in");
    Ok(user)
}
