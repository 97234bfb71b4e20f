use bytes::Bytes;
use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::dto::PublicUser;
use crate::capsules::repo::{Capsule, CapsuleKind, CapsuleStatus, NestedCapsule};
use crate::profiles::dto::ProfileSummary;

/// Text fields and files collected from a multipart capsule request.
/// Validation happens afterwards so a malformed form reports the field
/// that is wrong, not the field that happened to arrive first.
#[derive(Debug, Default)]
pub struct CapsuleForm {
    pub title: Option<String>,
    pub description: Option<String>,
    pub unlock_date: Option<String>,
    pub kind: Option<String>,
    pub friend_ids: Vec<Uuid>,
    pub files: Vec<FormFile>,
}

#[derive(Debug)]
pub struct FormFile {
    pub content_type: String,
    pub body: Bytes,
}

#[derive(Debug, Serialize)]
pub struct CapsuleResponse {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    #[serde(with = "time::serde::rfc3339")]
    pub unlock_date: OffsetDateTime,
    pub kind: CapsuleKind,
    pub status: CapsuleStatus,
    pub media: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl CapsuleResponse {
    /// `status` is the effective status for this read, not the stored
    /// column value.
    pub fn with_status(c: Capsule, status: CapsuleStatus) -> Self {
        Self {
            id: c.id,
            owner_id: c.owner_id,
            title: c.title,
            description: c.description,
            unlock_date: c.unlock_date,
            kind: c.kind,
            status,
            media: c.media,
            created_at: c.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CapsuleFeedItem {
    #[serde(flatten)]
    pub capsule: CapsuleResponse,
    pub is_shared: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<PublicUser>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator_profile: Option<ProfileSummary>,
}

#[derive(Debug, Serialize)]
pub struct NestedCapsuleResponse {
    pub id: Uuid,
    pub parent_id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    #[serde(with = "time::serde::rfc3339")]
    pub unlock_date: OffsetDateTime,
    pub kind: CapsuleKind,
    pub status: CapsuleStatus,
    pub media: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl NestedCapsuleResponse {
    pub fn with_status(n: NestedCapsule, status: CapsuleStatus) -> Self {
        Self {
            id: n.id,
            parent_id: n.parent_id,
            owner_id: n.owner_id,
            title: n.title,
            description: n.description,
            unlock_date: n.unlock_date,
            kind: n.kind,
            status,
            media: n.media,
            created_at: n.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PublicCapsuleItem {
    #[serde(flatten)]
    pub capsule: CapsuleResponse,
    pub likes_count: i64,
    pub comments_count: i64,
    pub is_liked_by_user: bool,
    pub nested_capsules: Vec<NestedCapsuleResponse>,
}
