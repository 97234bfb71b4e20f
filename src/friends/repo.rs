use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum FriendshipStatus {
    Pending,
    Accepted,
    Rejected,
}

/// Friendship edge. Directional in storage (requester -> recipient),
/// undirected in meaning once accepted.
#[derive(Debug, Clone, FromRow)]
pub struct Friendship {
    pub id: Uuid,
    pub requester_id: Uuid,
    pub recipient_id: Uuid,
    pub status: FriendshipStatus,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl Friendship {
    /// Any edge between the pair, in either direction.
    pub async fn find_between(db: &PgPool, a: Uuid, b: Uuid) -> anyhow::Result<Option<Friendship>> {
        let edge = sqlx::query_as::<_, Friendship>(
            r#"
            SELECT id, requester_id, recipient_id, status, created_at, updated_at
            FROM friendships
            WHERE (requester_id = $1 AND recipient_id = $2)
               OR (requester_id = $2 AND recipient_id = $1)
            "#,
        )
        .bind(a)
        .bind(b)
        .fetch_optional(db)
        .await?;
        Ok(edge)
    }

    pub async fn create_pending(
        db: &PgPool,
        requester: Uuid,
        recipient: Uuid,
    ) -> anyhow::Result<Friendship> {
        let edge = sqlx::query_as::<_, Friendship>(
            r#"
            INSERT INTO friendships (requester_id, recipient_id)
            VALUES ($1, $2)
            RETURNING id, requester_id, recipient_id, status, created_at, updated_at
            "#,
        )
        .bind(requester)
        .bind(recipient)
        .fetch_one(db)
        .await?;
        Ok(edge)
    }

    /// Directional status update: matches only the original request
    /// direction (requester -> recipient), never the reverse.
    pub async fn set_status_directional(
        db: &PgPool,
        requester: Uuid,
        recipient: Uuid,
        status: FriendshipStatus,
    ) -> anyhow::Result<Option<Friendship>> {
        let edge = sqlx::query_as::<_, Friendship>(
            r#"
            UPDATE friendships
            SET status = $3, updated_at = now()
            WHERE requester_id = $1 AND recipient_id = $2
            RETURNING id, requester_id, recipient_id, status, created_at, updated_at
            "#,
        )
        .bind(requester)
        .bind(recipient)
        .bind(status)
        .fetch_optional(db)
        .await?;
        Ok(edge)
    }

    /// Accepted edges touching the user, in either direction.
    pub async fn list_accepted_for(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<Friendship>> {
        let edges = sqlx::query_as::<_, Friendship>(
            r#"
            SELECT id, requester_id, recipient_id, status, created_at, updated_at
            FROM friendships
            WHERE (requester_id = $1 OR recipient_id = $1) AND status = 'accepted'
            ORDER BY created_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(db)
        .await?;
        Ok(edges)
    }

    /// Still-pending requests sent to the user.
    pub async fn list_pending_to(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<Friendship>> {
        let edges = sqlx::query_as::<_, Friendship>(
            r#"
            SELECT id, requester_id, recipient_id, status, created_at, updated_at
            FROM friendships
            WHERE recipient_id = $1 AND status = 'pending'
            ORDER BY created_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(db)
        .await?;
        Ok(edges)
    }

    /// Delete every edge between the pair, any direction, any status.
    pub async fn delete_between(db: &PgPool, a: Uuid, b: Uuid) -> anyhow::Result<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM friendships
            WHERE (requester_id = $1 AND recipient_id = $2)
               OR (requester_id = $2 AND recipient_id = $1)
            "#,
        )
        .bind(a)
        .bind(b)
        .execute(db)
        .await?;
        Ok(result.rows_affected())
    }
}
