use std::collections::{HashMap, HashSet};

use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct Like {
    pub id: Uuid,
    pub user_id: Uuid,
    pub capsule_id: Uuid,
    pub created_at: OffsetDateTime,
}

/// Like row joined with the liker's identity, for listings.
#[derive(Debug, Clone, FromRow)]
pub struct LikeWithUser {
    pub id: Uuid,
    pub user_id: Uuid,
    pub email: String,
    pub created_at: OffsetDateTime,
}

impl Like {
    /// Insert guarded by the (user_id, capsule_id) unique constraint;
    /// a duplicate surfaces as a database unique violation.
    pub async fn insert(db: &PgPool, user_id: Uuid, capsule_id: Uuid) -> sqlx::Result<Like> {
        sqlx::query_as::<_, Like>(
            r#"
            INSERT INTO likes (user_id, capsule_id)
            VALUES ($1, $2)
            RETURNING id, user_id, capsule_id, created_at
            "#,
        )
        .bind(user_id)
        .bind(capsule_id)
        .fetch_one(db)
        .await
    }

    pub async fn delete(db: &PgPool, user_id: Uuid, capsule_id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM likes WHERE user_id = $1 AND capsule_id = $2")
            .bind(user_id)
            .bind(capsule_id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn list_with_users(
        db: &PgPool,
        capsule_id: Uuid,
    ) -> anyhow::Result<Vec<LikeWithUser>> {
        let likes = sqlx::query_as::<_, LikeWithUser>(
            r#"
            SELECT l.id, l.user_id, u.email, l.created_at
            FROM likes l
            JOIN users u ON u.id = l.user_id
            WHERE l.capsule_id = $1
            ORDER BY l.created_at DESC
            "#,
        )
        .bind(capsule_id)
        .fetch_all(db)
        .await?;
        Ok(likes)
    }

    /// Like counts grouped by capsule, one query for the whole set.
    pub async fn count_by_capsules(
        db: &PgPool,
        capsule_ids: &[Uuid],
    ) -> anyhow::Result<HashMap<Uuid, i64>> {
        if capsule_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows = sqlx::query_as::<_, (Uuid, i64)>(
            r#"
            SELECT capsule_id, COUNT(*)
            FROM likes
            WHERE capsule_id = ANY($1)
            GROUP BY capsule_id
            "#,
        )
        .bind(capsule_ids)
        .fetch_all(db)
        .await?;
        Ok(rows.into_iter().collect())
    }

    /// Which of `capsule_ids` the user has liked, one query.
    pub async fn liked_capsule_ids(
        db: &PgPool,
        user_id: Uuid,
        capsule_ids: &[Uuid],
    ) -> anyhow::Result<HashSet<Uuid>> {
        if capsule_ids.is_empty() {
            return Ok(HashSet::new());
        }
        let rows = sqlx::query_as::<_, (Uuid,)>(
            "SELECT capsule_id FROM likes WHERE user_id = $1 AND capsule_id = ANY($2)",
        )
        .bind(user_id)
        .bind(capsule_ids)
        .fetch_all(db)
        .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }
}
