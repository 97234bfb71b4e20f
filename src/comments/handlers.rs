use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, put};
use axum::{Json, Router};
use serde_json::json;
use tracing::instrument;
use uuid::Uuid;

use crate::auth::services::AuthUser;
use crate::comments::dto::{AddCommentRequest, PageQuery, UpdateCommentRequest};
use crate::comments::services;
use crate::error::ApiError;
use crate::state::AppState;

pub fn comment_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/capsules/:id/comments",
            get(list_comments).post(add_comment),
        )
        .route("/comments/:id", put(update_comment).delete(delete_comment))
}

#[instrument(skip(state, payload))]
async fn add_comment(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddCommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let comment = services::add(&state.db, user_id, id, &payload.content).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

#[instrument(skip(state))]
async fn list_comments(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Path(id): Path<Uuid>,
    Query(q): Query<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = services::list_page(&state.db, id, q.page, q.limit).await?;
    Ok(Json(page))
}

#[instrument(skip(state, payload))]
async fn update_comment(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let comment = services::update(&state.db, id, user_id, &payload.content).await?;
    Ok(Json(comment))
}

#[instrument(skip(state))]
async fn delete_comment(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    services::delete(&state.db, id, user_id).await?;
    Ok(Json(json!({ "success": true, "message": "Comment deleted" })))
}
