use serde::Serialize;

use crate::resumes::repo_types::Resume;

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: &'static str,
    pub resume: Resume,
}
