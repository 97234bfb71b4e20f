use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::dto::PublicUser;
use crate::likes::repo::LikeWithUser;

#[derive(Debug, Serialize)]
pub struct ToggleLikeResponse {
    pub is_liked: bool,
}

#[derive(Debug, Serialize)]
pub struct LikeEntry {
    pub id: Uuid,
    pub user: PublicUser,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<LikeWithUser> for LikeEntry {
    fn from(l: LikeWithUser) -> Self {
        Self {
            id: l.id,
            user: PublicUser {
                id: l.user_id,
                email: l.email,
            },
            created_at: l.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LikesResponse {
    pub likes: Vec<LikeEntry>,
    pub is_liked_by_user: bool,
}
