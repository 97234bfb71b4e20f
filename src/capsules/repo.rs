use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum CapsuleKind {
    Personal,
    Shared,
    Public,
    Nested,
}

impl CapsuleKind {
    /// Kinds a client may ask for on a top-level capsule. Nested is
    /// reserved for children and is not accepted here.
    pub fn parse_top_level(s: &str) -> Option<CapsuleKind> {
        match s.trim().to_ascii_lowercase().as_str() {
            "personal" => Some(CapsuleKind::Personal),
            "shared" => Some(CapsuleKind::Shared),
            "public" => Some(CapsuleKind::Public),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum CapsuleStatus {
    Locked,
    Open,
}

/// Top-level capsule row. `status` holds the write-time default and is
/// recomputed from `unlock_date` on every read path.
#[derive(Debug, Clone, FromRow)]
pub struct Capsule {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub unlock_date: OffsetDateTime,
    pub kind: CapsuleKind,
    pub status: CapsuleStatus,
    pub media: Option<String>,
    pub created_at: OffsetDateTime,
}

#[derive(Debug)]
pub struct NewCapsule {
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub unlock_date: OffsetDateTime,
    pub kind: CapsuleKind,
    pub media: Option<String>,
}

const CAPSULE_COLUMNS: &str =
    "id, owner_id, title, description, unlock_date, kind, status, media, created_at";

impl Capsule {
    pub async fn insert(db: &PgPool, new: NewCapsule) -> anyhow::Result<Capsule> {
        let capsule = sqlx::query_as::<_, Capsule>(&format!(
            r#"
            INSERT INTO capsules (owner_id, title, description, unlock_date, kind, media)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {CAPSULE_COLUMNS}
            "#
        ))
        .bind(new.owner_id)
        .bind(&new.title)
        .bind(&new.description)
        .bind(new.unlock_date)
        .bind(new.kind)
        .bind(&new.media)
        .fetch_one(db)
        .await?;
        Ok(capsule)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Capsule>> {
        let capsule = sqlx::query_as::<_, Capsule>(&format!(
            "SELECT {CAPSULE_COLUMNS} FROM capsules WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(capsule)
    }

    pub async fn list_by_owner(db: &PgPool, owner_id: Uuid) -> anyhow::Result<Vec<Capsule>> {
        let capsules = sqlx::query_as::<_, Capsule>(&format!(
            "SELECT {CAPSULE_COLUMNS} FROM capsules WHERE owner_id = $1 ORDER BY created_at ASC"
        ))
        .bind(owner_id)
        .fetch_all(db)
        .await?;
        Ok(capsules)
    }

    pub async fn list_by_ids(db: &PgPool, ids: &[Uuid]) -> anyhow::Result<Vec<Capsule>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let capsules = sqlx::query_as::<_, Capsule>(&format!(
            "SELECT {CAPSULE_COLUMNS} FROM capsules WHERE id = ANY($1)"
        ))
        .bind(ids)
        .fetch_all(db)
        .await?;
        Ok(capsules)
    }

    pub async fn list_public_by_owner(db: &PgPool, owner_id: Uuid) -> anyhow::Result<Vec<Capsule>> {
        let capsules = sqlx::query_as::<_, Capsule>(&format!(
            r#"
            SELECT {CAPSULE_COLUMNS}
            FROM capsules
            WHERE owner_id = $1 AND kind = 'public'
            ORDER BY created_at DESC
            "#
        ))
        .bind(owner_id)
        .fetch_all(db)
        .await?;
        Ok(capsules)
    }

    /// Owner-scoped delete. Children, likes and comments are left in
    /// place, nothing cascades.
    pub async fn delete_owned(db: &PgPool, id: Uuid, owner_id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM capsules WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct NestedCapsule {
    pub id: Uuid,
    pub parent_id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub unlock_date: OffsetDateTime,
    pub kind: CapsuleKind,
    pub status: CapsuleStatus,
    pub media: Option<String>,
    pub created_at: OffsetDateTime,
}

#[derive(Debug)]
pub struct NewNestedCapsule {
    pub parent_id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub unlock_date: OffsetDateTime,
    pub media: Option<String>,
}

const NESTED_COLUMNS: &str =
    "id, parent_id, owner_id, title, description, unlock_date, kind, status, media, created_at";

impl NestedCapsule {
    pub async fn insert(db: &PgPool, new: NewNestedCapsule) -> anyhow::Result<NestedCapsule> {
        let capsule = sqlx::query_as::<_, NestedCapsule>(&format!(
            r#"
            INSERT INTO nested_capsules (parent_id, owner_id, title, description, unlock_date, media)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {NESTED_COLUMNS}
            "#
        ))
        .bind(new.parent_id)
        .bind(new.owner_id)
        .bind(&new.title)
        .bind(&new.description)
        .bind(new.unlock_date)
        .bind(&new.media)
        .fetch_one(db)
        .await?;
        Ok(capsule)
    }

    pub async fn list_by_parent(db: &PgPool, parent_id: Uuid) -> anyhow::Result<Vec<NestedCapsule>> {
        let capsules = sqlx::query_as::<_, NestedCapsule>(&format!(
            "SELECT {NESTED_COLUMNS} FROM nested_capsules WHERE parent_id = $1 ORDER BY created_at ASC"
        ))
        .bind(parent_id)
        .fetch_all(db)
        .await?;
        Ok(capsules)
    }

    pub async fn list_by_owner(db: &PgPool, owner_id: Uuid) -> anyhow::Result<Vec<NestedCapsule>> {
        let capsules = sqlx::query_as::<_, NestedCapsule>(&format!(
            "SELECT {NESTED_COLUMNS} FROM nested_capsules WHERE owner_id = $1 ORDER BY created_at ASC"
        ))
        .bind(owner_id)
        .fetch_all(db)
        .await?;
        Ok(capsules)
    }

    /// Children of any capsule in `parent_ids`, restricted to one
    /// owner. One batched query for the public-listing enrichment.
    pub async fn list_by_parents_for_owner(
        db: &PgPool,
        parent_ids: &[Uuid],
        owner_id: Uuid,
    ) -> anyhow::Result<Vec<NestedCapsule>> {
        if parent_ids.is_empty() {
            return Ok(Vec::new());
        }
        let capsules = sqlx::query_as::<_, NestedCapsule>(&format!(
            r#"
            SELECT {NESTED_COLUMNS}
            FROM nested_capsules
            WHERE parent_id = ANY($1) AND owner_id = $2
            ORDER BY created_at ASC
            "#
        ))
        .bind(parent_ids)
        .bind(owner_id)
        .fetch_all(db)
        .await?;
        Ok(capsules)
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct SharedCapsule {
    pub id: Uuid,
    pub capsule_id: Uuid,
    pub created_by: Uuid,
    pub friend_ids: Vec<Uuid>,
    pub created_at: OffsetDateTime,
}

impl SharedCapsule {
    pub async fn insert(
        db: &PgPool,
        capsule_id: Uuid,
        created_by: Uuid,
        friend_ids: &[Uuid],
    ) -> anyhow::Result<SharedCapsule> {
        let grant = sqlx::query_as::<_, SharedCapsule>(
            r#"
            INSERT INTO shared_capsules (capsule_id, created_by, friend_ids)
            VALUES ($1, $2, $3)
            RETURNING id, capsule_id, created_by, friend_ids, created_at
            "#,
        )
        .bind(capsule_id)
        .bind(created_by)
        .bind(friend_ids)
        .fetch_one(db)
        .await?;
        Ok(grant)
    }

    /// Grants whose friend set contains the user.
    pub async fn list_for_friend(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<SharedCapsule>> {
        let grants = sqlx::query_as::<_, SharedCapsule>(
            r#"
            SELECT id, capsule_id, created_by, friend_ids, created_at
            FROM shared_capsules
            WHERE $1 = ANY(friend_ids)
            ORDER BY created_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(db)
        .await?;
        Ok(grants)
    }
}
