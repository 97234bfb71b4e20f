use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use tracing::instrument;
use uuid::Uuid;

use crate::auth::services::AuthUser;
use crate::error::ApiError;
use crate::likes::dto::ToggleLikeResponse;
use crate::likes::services;
use crate::state::AppState;

pub fn like_routes() -> Router<AppState> {
    Router::new()
        .route("/capsules/:id/like", post(toggle_like))
        .route("/capsules/:id/likes", get(list_likes))
}

#[instrument(skip(state))]
async fn toggle_like(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let is_liked = services::toggle(&state.db, user_id, id).await?;
    Ok(Json(ToggleLikeResponse { is_liked }))
}

#[instrument(skip(state))]
async fn list_likes(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let likes = services::list_for_capsule(&state.db, id, user_id).await?;
    Ok(Json(likes))
}
