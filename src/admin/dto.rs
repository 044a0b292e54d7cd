use serde::{Deserialize, Serialize};

use crate::auth::repo_types::User;
use crate::resumes::repo_types::Resume;

pub const UNKNOWN_USER: &str = "Unknown User";
pub const UNKNOWN_EMAIL: &str = "Unknown Email";

/// Active resume annotated with its owner, sentinel values when the owner is gone.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeWithOwner {
    #[serde(flatten)]
    pub resume: Resume,
    pub user_name: String,
    pub user_email: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteUserResponse {
    pub message: &'static str,
    pub deleted_resumes: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStatusResponse {
    pub admin_exists: bool,
}

/// Every field falls back to the configured admin defaults.
#[derive(Debug, Default, Deserialize)]
pub struct CreateAdminRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateAdminResponse {
    pub message: &'static str,
    pub user: User,
}
