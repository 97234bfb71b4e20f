use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use tracing::{info, instrument};

use crate::{
    auth::services::AuthUser,
    error::{is_unique_violation, ApiError},
    profiles::{
        dto::{parse_dob, CreateProfileRequest, ProfileResponse, UpdateProfileRequest},
        repo::{NewProfile, Profile, ProfileChanges},
    },
    state::AppState,
};

pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/profile", post(create_profile))
        .route("/profile", get(get_profile))
        .route("/profile", put(update_profile))
        .route("/profile", delete(delete_profile))
}

#[instrument(skip(state, payload))]
pub async fn create_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateProfileRequest>,
) -> Result<(StatusCode, Json<ProfileResponse>), ApiError> {
    if payload.username.trim().is_empty() {
        return Err(ApiError::validation("Username is required"));
    }
    if payload.national_id.trim().is_empty() {
        return Err(ApiError::validation("National ID is required"));
    }

    if Profile::find_by_user(&state.db, user_id)
        .await
        .map_err(ApiError::Internal)?
        .is_some()
    {
        return Err(ApiError::conflict("Profile already exists"));
    }

    let date_of_birth = payload
        .date_of_birth
        .as_deref()
        .map(parse_dob)
        .transpose()?;

    let new = NewProfile {
        username: payload.username,
        bio: payload.bio,
        picture: payload.picture,
        national_id: payload.national_id,
        contact_number: payload.contact_number,
        date_of_birth,
        gender: payload.gender,
        address: payload.address,
    };

    // The unique constraints back up the existence check above.
    let profile = match Profile::create(&state.db, user_id, new).await {
        Ok(p) => p,
        Err(e) if is_unique_violation(&e) => {
            return Err(ApiError::conflict("National ID is already registered"));
        }
        Err(e) => return Err(e.into()),
    };

    info!(user_id = %user_id, profile_id = %profile.id, "profile created");
    Ok((StatusCode::CREATED, Json(profile.into())))
}

#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<ProfileResponse>, ApiError> {
    let profile = Profile::find_by_user(&state.db, user_id)
        .await
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::not_found("Profile not found"))?;
    Ok(Json(profile.into()))
}

#[instrument(skip(state, payload))]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let date_of_birth = payload
        .date_of_birth
        .as_deref()
        .map(parse_dob)
        .transpose()?;

    let changes = ProfileChanges {
        username: payload.username,
        bio: payload.bio,
        picture: payload.picture,
        national_id: payload.national_id,
        contact_number: payload.contact_number,
        date_of_birth,
        gender: payload.gender,
        address: payload.address,
    };

    let profile = match Profile::update(&state.db, user_id, changes).await {
        Ok(Some(p)) => p,
        Ok(None) => return Err(ApiError::not_found("Profile not found")),
        Err(e) if is_unique_violation(&e) => {
            return Err(ApiError::conflict("National ID is already registered"));
        }
        Err(e) => return Err(e.into()),
    };

    Ok(Json(profile.into()))
}

#[instrument(skip(state))]
pub async fn delete_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    let deleted = Profile::delete(&state.db, user_id)
        .await
        .map_err(ApiError::Internal)?;
    if !deleted {
        return Err(ApiError::not_found("Profile not found"));
    }
    info!(user_id = %user_id, "profile deleted");
    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Profile deleted",
    })))
}
