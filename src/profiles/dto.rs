use serde::{Deserialize, Serialize};
use time::format_description::FormatItem;
use time::macros::format_description;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::error::ApiError;
use crate::profiles::repo::{Gender, Profile};

pub const DOB_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

pub(crate) fn parse_dob(value: &str) -> Result<Date, ApiError> {
    Date::parse(value, DOB_FORMAT)
        .map_err(|_| ApiError::validation("Invalid date_of_birth, expected YYYY-MM-DD"))
}

#[derive(Debug, Deserialize)]
pub struct CreateProfileRequest {
    pub username: String,
    pub national_id: String,
    pub bio: Option<String>,
    pub picture: Option<String>,
    pub contact_number: Option<String>,
    pub date_of_birth: Option<String>, // YYYY-MM-DD
    pub gender: Option<Gender>,
    pub address: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub username: Option<String>,
    pub bio: Option<String>,
    pub picture: Option<String>,
    pub national_id: Option<String>,
    pub contact_number: Option<String>,
    pub date_of_birth: Option<String>,
    pub gender: Option<Gender>,
    pub address: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub bio: Option<String>,
    pub picture: Option<String>,
    pub national_id: String,
    pub contact_number: Option<String>,
    pub date_of_birth: Option<String>,
    pub gender: Option<Gender>,
    pub address: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<Profile> for ProfileResponse {
    fn from(p: Profile) -> Self {
        Self {
            id: p.id,
            user_id: p.user_id,
            username: p.username,
            bio: p.bio,
            picture: p.picture,
            national_id: p.national_id,
            contact_number: p.contact_number,
            date_of_birth: p
                .date_of_birth
                .and_then(|d| d.format(DOB_FORMAT).ok()),
            gender: p.gender,
            address: p.address,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

/// Compact profile shape attached to friends, comments and shared capsules.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileSummary {
    pub username: String,
    pub picture: Option<String>,
    pub bio: Option<String>,
}

impl ProfileSummary {
    pub fn from_profile(p: &Profile) -> Self {
        Self {
            username: p.username.clone(),
            picture: p.picture.clone(),
            bio: p.bio.clone(),
        }
    }
}

#[cfg(test)]
mod dob_tests {
    use super::*;

    #[test]
    fn parses_iso_dates() {
        let d = parse_dob("1994-07-23").unwrap();
        assert_eq!(d.to_string(), "1994-07-23");
    }

    #[test]
    fn rejects_garbage_dates() {
        assert!(parse_dob("23/07/1994").is_err());
        assert!(parse_dob("1994-13-40").is_err());
        assert!(parse_dob("").is_err());
    }
}
