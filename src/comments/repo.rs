use std::collections::HashMap;

use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct Comment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub capsule_id: Uuid,
    pub content: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Comment row joined with the author's identity, for listings.
#[derive(Debug, Clone, FromRow)]
pub struct CommentWithAuthor {
    pub id: Uuid,
    pub user_id: Uuid,
    pub email: String,
    pub capsule_id: Uuid,
    pub content: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl Comment {
    pub async fn insert(
        db: &PgPool,
        user_id: Uuid,
        capsule_id: Uuid,
        content: &str,
    ) -> anyhow::Result<Comment> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (user_id, capsule_id, content)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, capsule_id, content, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(capsule_id)
        .bind(content)
        .fetch_one(db)
        .await?;
        Ok(comment)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Comment>> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, user_id, capsule_id, content, created_at, updated_at
            FROM comments
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(comment)
    }

    pub async fn update_content(db: &PgPool, id: Uuid, content: &str) -> anyhow::Result<Comment> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            UPDATE comments
            SET content = $2, updated_at = now()
            WHERE id = $1
            RETURNING id, user_id, capsule_id, content, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(content)
        .fetch_one(db)
        .await?;
        Ok(comment)
    }

    pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Newest-first page of comments with their authors.
    pub async fn page_by_capsule(
        db: &PgPool,
        capsule_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<CommentWithAuthor>> {
        let comments = sqlx::query_as::<_, CommentWithAuthor>(
            r#"
            SELECT c.id, c.user_id, u.email, c.capsule_id, c.content, c.created_at, c.updated_at
            FROM comments c
            JOIN users u ON u.id = c.user_id
            WHERE c.capsule_id = $1
            ORDER BY c.created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(capsule_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await?;
        Ok(comments)
    }

    pub async fn count_by_capsule(db: &PgPool, capsule_id: Uuid) -> anyhow::Result<i64> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM comments WHERE capsule_id = $1")
                .bind(capsule_id)
                .fetch_one(db)
                .await?;
        Ok(count)
    }

    /// Comment counts grouped by capsule, one query for the whole set.
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
            FROM comments
            WHERE capsule_id = ANY($1)
            GROUP BY capsule_id
            "#,
        )
        .bind(capsule_ids)
        .fetch_all(db)
        .await?;
        Ok(rows.into_iter().collect())
    }
}
