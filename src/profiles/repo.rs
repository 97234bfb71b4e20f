use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

/// Profile record, one per user.
#[derive(Debug, Clone, FromRow)]
pub struct Profile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub bio: Option<String>,
    pub picture: Option<String>, // storage key
    pub national_id: String,
    pub contact_number: Option<String>,
    pub date_of_birth: Option<Date>,
    pub gender: Option<Gender>,
    pub address: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

const PROFILE_COLUMNS: &str = "id, user_id, username, bio, picture, national_id, \
     contact_number, date_of_birth, gender, address, created_at, updated_at";

pub struct NewProfile {
    pub username: String,
    pub bio: Option<String>,
    pub picture: Option<String>,
    pub national_id: String,
    pub contact_number: Option<String>,
    pub date_of_birth: Option<Date>,
    pub gender: Option<Gender>,
    pub address: Option<String>,
}

#[derive(Default)]
pub struct ProfileChanges {
    pub username: Option<String>,
    pub bio: Option<String>,
    pub picture: Option<String>,
    pub national_id: Option<String>,
    pub contact_number: Option<String>,
    pub date_of_birth: Option<Date>,
    pub gender: Option<Gender>,
    pub address: Option<String>,
}

impl Profile {
    pub async fn find_by_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Option<Profile>> {
        let profile = sqlx::query_as::<_, Profile>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM profiles WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(db)
        .await?;
        Ok(profile)
    }

    /// Fetch the profiles of several users in one query.
    pub async fn list_by_user_ids(db: &PgPool, user_ids: &[Uuid]) -> anyhow::Result<Vec<Profile>> {
        let profiles = sqlx::query_as::<_, Profile>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM profiles WHERE user_id = ANY($1)"
        ))
        .bind(user_ids)
        .fetch_all(db)
        .await?;
        Ok(profiles)
    }

    pub async fn create(db: &PgPool, user_id: Uuid, new: NewProfile) -> sqlx::Result<Profile> {
        sqlx::query_as::<_, Profile>(&format!(
            "INSERT INTO profiles \
                 (user_id, username, bio, picture, national_id, contact_number, \
                  date_of_birth, gender, address) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {PROFILE_COLUMNS}"
        ))
        .bind(user_id)
        .bind(new.username)
        .bind(new.bio)
        .bind(new.picture)
        .bind(new.national_id)
        .bind(new.contact_number)
        .bind(new.date_of_birth)
        .bind(new.gender)
        .bind(new.address)
        .fetch_one(db)
        .await
    }

    /// Partial update: absent fields keep their stored value.
    pub async fn update(
        db: &PgPool,
        user_id: Uuid,
        changes: ProfileChanges,
    ) -> sqlx::Result<Option<Profile>> {
        sqlx::query_as::<_, Profile>(&format!(
            "UPDATE profiles SET \
                 username = COALESCE($2, username), \
                 bio = COALESCE($3, bio), \
                 picture = COALESCE($4, picture), \
                 national_id = COALESCE($5, national_id), \
                 contact_number = COALESCE($6, contact_number), \
                 date_of_birth = COALESCE($7, date_of_birth), \
                 gender = COALESCE($8, gender), \
                 address = COALESCE($9, address), \
                 updated_at = now() \
             WHERE user_id = $1 \
             RETURNING {PROFILE_COLUMNS}"
        ))
        .bind(user_id)
        .bind(changes.username)
        .bind(changes.bio)
        .bind(changes.picture)
        .bind(changes.national_id)
        .bind(changes.contact_number)
        .bind(changes.date_of_birth)
        .bind(changes.gender)
        .bind(changes.address)
        .fetch_optional(db)
        .await
    }

    pub async fn delete(db: &PgPool, user_id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM profiles WHERE user_id = $1")
            .bind(user_id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
