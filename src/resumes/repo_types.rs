use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

/// Resume metadata as returned by list queries. The file content is projected away.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Resume {
    pub id: Uuid,
    pub user_id: Uuid,
    pub file_name: String,
    pub content_type: String,
    pub description: String,
    #[serde(with = "time::serde::rfc3339")]
    pub uploaded_at: OffsetDateTime,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub archived: bool,
    #[serde(
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub archived_at: Option<OffsetDateTime>,
}

impl Resume {
    /// `archived` is derived from the single `archived_at` marker so the two never disagree.
    pub fn from_parts(
        id: Uuid,
        user_id: Uuid,
        file_name: String,
        content_type: String,
        description: String,
        uploaded_at: OffsetDateTime,
        archived_at: Option<OffsetDateTime>,
    ) -> Self {
        Self {
            id,
            user_id,
            file_name,
            content_type,
            description,
            uploaded_at,
            archived: archived_at.is_some(),
            archived_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewResume {
    pub user_id: Uuid,
    pub file_name: String,
    pub content_type: String,
    pub description: String,
    pub file_data: Vec<u8>,
}

/// Stored blob plus what a client needs to save it.
#[derive(Debug, Clone)]
pub struct ResumeFile {
    pub file_name: String,
    pub content_type: String,
    pub file_data: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFilter {
    Active,
    Archived,
}

/// Filter for resume listings. Ordering follows from the filter:
/// active resumes by `uploaded_at` desc, archived ones by `archived_at` desc.
#[derive(Debug, Clone, Copy)]
pub struct ResumeQuery {
    pub owner: Option<Uuid>,
    pub filter: ArchiveFilter,
}

impl ResumeQuery {
    pub fn active_for(owner: Uuid) -> Self {
        Self { owner: Some(owner), filter: ArchiveFilter::Active }
    }

    pub fn archived_for(owner: Uuid) -> Self {
        Self { owner: Some(owner), filter: ArchiveFilter::Archived }
    }

    pub fn all_active() -> Self {
        Self { owner: None, filter: ArchiveFilter::Active }
    }

    pub fn matches(&self, resume: &Resume) -> bool {
        let owner_ok = self.owner.map_or(true, |o| o == resume.user_id);
        let state_ok = match self.filter {
            ArchiveFilter::Active => !resume.archived,
            ArchiveFilter::Archived => resume.archived,
        };
        owner_ok && state_ok
    }

    /// Sort key; newest first.
    pub fn sort_key(&self, resume: &Resume) -> OffsetDateTime {
        match self.filter {
            ArchiveFilter::Active => resume.uploaded_at,
            ArchiveFilter::Archived => resume.archived_at.unwrap_or(resume.uploaded_at),
        }
    }
}

/// Active resume joined with its owner. Owner fields are `None` when the reference dangles.
#[derive(Debug, Clone)]
pub struct ResumeWithOwnerRow {
    pub resume: Resume,
    pub owner_name: Option<String>,
    pub owner_email: Option<String>,
}
