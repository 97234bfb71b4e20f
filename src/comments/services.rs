use std::collections::HashMap;

use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::auth::dto::PublicUser;
use crate::auth::repo::User;
use crate::capsules::repo::Capsule;
use crate::comments::dto::{CommentPage, CommentResponse, PageMeta};
use crate::comments::repo::{Comment, CommentWithAuthor};
use crate::error::ApiError;
use crate::profiles::dto::ProfileSummary;
use crate::profiles::repo::Profile;

pub(crate) const MAX_COMMENT_CHARS: usize = 1000;

/// Content rules shared by create and update: non-blank, at most 1000
/// characters. The stored value is the trimmed one.
pub(crate) fn validate_content(content: &str) -> Result<String, ApiError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation("Comment content is required"));
    }
    if trimmed.chars().count() > MAX_COMMENT_CHARS {
        return Err(ApiError::validation(format!(
            "Comment content exceeds {MAX_COMMENT_CHARS} characters"
        )));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn clamp_page(page: i64) -> i64 {
    page.max(1)
}

pub(crate) fn clamp_limit(limit: i64) -> i64 {
    limit.clamp(1, 100)
}

fn ensure_owner(comment: &Comment, user_id: Uuid) -> Result<(), ApiError> {
    if comment.user_id != user_id {
        return Err(ApiError::forbidden(
            "You can only modify your own comments",
        ));
    }
    Ok(())
}

async fn composed_response(db: &PgPool, comment: Comment) -> Result<CommentResponse, ApiError> {
    let user = User::find_by_id(db, comment.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    let profile = Profile::find_by_user(db, comment.user_id).await?;
    Ok(CommentResponse {
        id: comment.id,
        capsule_id: comment.capsule_id,
        user: PublicUser {
            id: user.id,
            email: user.email,
        },
        profile: profile.as_ref().map(ProfileSummary::from_profile),
        content: comment.content,
        created_at: comment.created_at,
        updated_at: comment.updated_at,
    })
}

pub async fn add(
    db: &PgPool,
    user_id: Uuid,
    capsule_id: Uuid,
    content: &str,
) -> Result<CommentResponse, ApiError> {
    let content = validate_content(content)?;
    Capsule::find_by_id(db, capsule_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Capsule not found"))?;

    let comment = Comment::insert(db, user_id, capsule_id, &content).await?;
    info!(comment = %comment.id, capsule = %capsule_id, user = %user_id, "comment added");
    composed_response(db, comment).await
}

pub async fn list_page(
    db: &PgPool,
    capsule_id: Uuid,
    page: i64,
    limit: i64,
) -> Result<CommentPage, ApiError> {
    let page = clamp_page(page);
    let limit = clamp_limit(limit);
    let offset = (page - 1) * limit;

    let rows = Comment::page_by_capsule(db, capsule_id, limit, offset).await?;
    let total = Comment::count_by_capsule(db, capsule_id).await?;

    let author_ids: Vec<Uuid> = rows.iter().map(|c| c.user_id).collect();
    let profiles: HashMap<Uuid, Profile> = Profile::list_by_user_ids(db, &author_ids)
        .await?
        .into_iter()
        .map(|p| (p.user_id, p))
        .collect();

    Ok(CommentPage {
        comments: attach_profiles(rows, &profiles),
        meta: PageMeta::new(page, limit, total),
    })
}

pub(crate) fn attach_profiles(
    rows: Vec<CommentWithAuthor>,
    profiles: &HashMap<Uuid, Profile>,
) -> Vec<CommentResponse> {
    rows.into_iter()
        .map(|c| CommentResponse {
            id: c.id,
            capsule_id: c.capsule_id,
            user: PublicUser {
                id: c.user_id,
                email: c.email,
            },
            profile: profiles.get(&c.user_id).map(ProfileSummary::from_profile),
            content: c.content,
            created_at: c.created_at,
            updated_at: c.updated_at,
        })
        .collect()
}

pub async fn update(
    db: &PgPool,
    comment_id: Uuid,
    user_id: Uuid,
    content: &str,
) -> Result<CommentResponse, ApiError> {
    let content = validate_content(content)?;
    let comment = Comment::find_by_id(db, comment_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Comment not found"))?;
    ensure_owner(&comment, user_id)?;

    let updated = Comment::update_content(db, comment_id, &content).await?;
    info!(comment = %comment_id, user = %user_id, "comment updated");
    composed_response(db, updated).await
}

pub async fn delete(db: &PgPool, comment_id: Uuid, user_id: Uuid) -> Result<(), ApiError> {
    let comment = Comment::find_by_id(db, comment_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Comment not found"))?;
    ensure_owner(&comment, user_id)?;

    Comment::delete(db, comment_id).await?;
    info!(comment = %comment_id, user = %user_id, "comment deleted");
    Ok(())
}

#[cfg(test)]
mod comment_rules_tests {
    use super::*;
    use time::OffsetDateTime;

    #[test]
    fn blank_content_is_rejected() {
        assert!(validate_content("").is_err());
        assert!(validate_content("   \n\t ").is_err());
    }

    #[test]
    fn content_is_trimmed() {
        assert_eq!(validate_content("  hello  ").unwrap(), "hello");
    }

    #[test]
    fn limit_is_counted_in_characters() {
        let ascii_ok = "a".repeat(MAX_COMMENT_CHARS);
        assert!(validate_content(&ascii_ok).is_ok());

        let too_long = "a".repeat(MAX_COMMENT_CHARS + 1);
        assert!(validate_content(&too_long).is_err());

        // Multibyte characters count once each, not per byte.
        let emoji_ok = "🦀".repeat(MAX_COMMENT_CHARS);
        assert!(validate_content(&emoji_ok).is_ok());
    }

    #[test]
    fn page_and_limit_are_clamped() {
        assert_eq!(clamp_page(-3), 1);
        assert_eq!(clamp_page(0), 1);
        assert_eq!(clamp_page(7), 7);

        assert_eq!(clamp_limit(0), 1);
        assert_eq!(clamp_limit(10), 10);
        assert_eq!(clamp_limit(5000), 100);
    }

    #[test]
    fn only_the_owner_passes_the_guard() {
        let owner = Uuid::new_v4();
        let comment = Comment {
            id: Uuid::new_v4(),
            user_id: owner,
            capsule_id: Uuid::new_v4(),
            content: "mine".into(),
            created_at: OffsetDateTime::now_utc(),
            updated_at: OffsetDateTime::now_utc(),
        };

        assert!(ensure_owner(&comment, owner).is_ok());
        let err = ensure_owner(&comment, Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
    }
}
