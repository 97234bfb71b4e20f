use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::json;
use tracing::instrument;
use uuid::Uuid;

use crate::auth::services::AuthUser;
use crate::error::ApiError;
use crate::friends::dto::{FriendshipResponse, RespondBody, SendRequestBody};
use crate::friends::services;
use crate::state::AppState;

pub fn friends_routes() -> Router<AppState> {
    Router::new()
        .route("/friends", get(list_friends))
        .route("/friends/pending", get(list_pending))
        .route("/friends/requests", post(send_request))
        .route("/friends/requests/respond", post(respond))
        .route("/friends/:user_id", delete(remove_friend))
}

#[instrument(skip(state))]
async fn send_request(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<SendRequestBody>,
) -> Result<impl IntoResponse, ApiError> {
    let edge = services::send_request(&state.db, user_id, payload.recipient_id).await?;
    Ok((StatusCode::CREATED, Json(FriendshipResponse::from(edge))))
}

/// The responder is the token user; the body names who sent the
/// request. Only the edge in that direction is considered.
#[instrument(skip(state))]
async fn respond(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<RespondBody>,
) -> Result<Json<FriendshipResponse>, ApiError> {
    let edge = services::respond(&state.db, payload.requester_id, user_id, payload.decision).await?;
    Ok(Json(FriendshipResponse::from(edge)))
}

#[instrument(skip(state))]
async fn list_friends(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let friends = services::list_friends(&state.db, user_id).await?;
    Ok(Json(friends))
}

#[instrument(skip(state))]
async fn list_pending(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let pending = services::list_pending(&state.db, user_id).await?;
    Ok(Json(pending))
}

#[instrument(skip(state))]
async fn remove_friend(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(other_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let removed = services::remove(&state.db, user_id, other_id).await?;
    Ok(Json(json!({ "success": true, "removed": removed })))
}
