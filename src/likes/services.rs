use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::capsules::repo::Capsule;
use crate::error::ApiError;
use crate::likes::dto::{LikeEntry, LikesResponse};
use crate::likes::repo::{Like, LikeWithUser};

pub(crate) fn viewer_has_liked(likes: &[LikeWithUser], viewer_id: Uuid) -> bool {
    likes.iter().any(|l| l.user_id == viewer_id)
}

/// Toggle: an existing like is removed, a missing one is created.
/// Concurrent toggles can both miss the delete; the unique constraint
/// then rejects the second insert instead of duplicating the pair.
pub async fn toggle(db: &PgPool, user_id: Uuid, capsule_id: Uuid) -> Result<bool, ApiError> {
    Capsule::find_by_id(db, capsule_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Capsule not found"))?;

    if Like::delete(db, user_id, capsule_id).await? {
        info!(user = %user_id, capsule = %capsule_id, "like removed");
        return Ok(false);
    }
    Like::insert(db, user_id, capsule_id).await?;
    info!(user = %user_id, capsule = %capsule_id, "like added");
    Ok(true)
}

pub async fn list_for_capsule(
    db: &PgPool,
    capsule_id: Uuid,
    viewer_id: Uuid,
) -> Result<LikesResponse, ApiError> {
    let likes = Like::list_with_users(db, capsule_id).await?;
    let is_liked_by_user = viewer_has_liked(&likes, viewer_id);
    Ok(LikesResponse {
        likes: likes.into_iter().map(LikeEntry::from).collect(),
        is_liked_by_user,
    })
}

#[cfg(test)]
mod like_tests {
    use super::*;
    use time::OffsetDateTime;

    fn like(user_id: Uuid) -> LikeWithUser {
        LikeWithUser {
            id: Uuid::new_v4(),
            user_id,
            email: "liker@example.com".into(),
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn viewer_membership_is_detected() {
        let viewer = Uuid::new_v4();
        let likes = vec![like(Uuid::new_v4()), like(viewer)];
        assert!(viewer_has_liked(&likes, viewer));
        assert!(!viewer_has_liked(&likes, Uuid::new_v4()));
        assert!(!viewer_has_liked(&[], viewer));
    }
}
