use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::dto::PublicUser;
use crate::friends::repo::{Friendship, FriendshipStatus};
use crate::profiles::dto::ProfileSummary;

#[derive(Debug, Deserialize)]
pub struct SendRequestBody {
    pub recipient_id: Uuid,
}

/// Accept or reject an incoming request. `requester_id` names the user
/// who originally sent it; the responder is taken from the token.
#[derive(Debug, Deserialize)]
pub struct RespondBody {
    pub requester_id: Uuid,
    pub decision: Decision,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Accepted,
    Rejected,
}

impl Decision {
    pub fn as_status(self) -> FriendshipStatus {
        match self {
            Decision::Accepted => FriendshipStatus::Accepted,
            Decision::Rejected => FriendshipStatus::Rejected,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FriendshipResponse {
    pub id: Uuid,
    pub requester_id: Uuid,
    pub recipient_id: Uuid,
    pub status: FriendshipStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<Friendship> for FriendshipResponse {
    fn from(f: Friendship) -> Self {
        Self {
            id: f.id,
            requester_id: f.requester_id,
            recipient_id: f.recipient_id,
            status: f.status,
            created_at: f.created_at,
            updated_at: f.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FriendItem {
    pub user: PublicUser,
    pub profile: Option<ProfileSummary>,
}

#[derive(Debug, Serialize)]
pub struct PendingRequestItem {
    pub requester: PublicUser,
    pub profile: Option<ProfileSummary>,
    #[serde(with = "time::serde::rfc3339")]
    pub requested_at: OffsetDateTime,
}
