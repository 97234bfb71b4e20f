use axum::extract::multipart::Field;
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tracing::instrument;
use uuid::Uuid;

use crate::auth::services::AuthUser;
use crate::capsules::dto::{CapsuleForm, FormFile};
use crate::capsules::services;
use crate::error::ApiError;
use crate::state::AppState;

pub fn capsule_routes() -> Router<AppState> {
    Router::new()
        .route("/capsules", get(list_feed).post(create_capsule))
        .route("/capsules/:id", get(get_capsule).delete(delete_capsule))
        .route("/capsules/:id/media", get(get_media))
        .route(
            "/capsules/:id/nested",
            get(list_nested).post(create_nested),
        )
        .route("/nested-capsules", get(list_all_nested))
        .route("/users/:user_id/public-capsules", get(list_public))
        .layer(DefaultBodyLimit::max(20 * 1024 * 1024)) // 20MB
}

async fn text(field: Field<'_>) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|_| ApiError::validation("Malformed multipart body"))
}

/// Drains the multipart stream into a [`CapsuleForm`]. Unknown fields
/// are ignored; `files` / `files[]` parts are buffered whole.
async fn collect_form(mp: &mut Multipart) -> Result<CapsuleForm, ApiError> {
    let mut form = CapsuleForm::default();
    while let Some(field) = mp
        .next_field()
        .await
        .map_err(|_| ApiError::validation("Malformed multipart body"))?
    {
        let Some(name) = field.name().map(|s| s.to_string()) else {
            continue;
        };
        match name.as_str() {
            "files" | "files[]" => {
                let content_type = field
                    .content_type()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "application/octet-stream".into());
                let body = field
                    .bytes()
                    .await
                    .map_err(|_| ApiError::validation("Unreadable file field"))?;
                form.files.push(FormFile { content_type, body });
            }
            "title" => form.title = Some(text(field).await?),
            "description" => form.description = Some(text(field).await?),
            "unlock_date" => form.unlock_date = Some(text(field).await?),
            "kind" => form.kind = Some(text(field).await?),
            "friend_ids" => {
                let raw = text(field).await?;
                for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
                    let id = Uuid::parse_str(part).map_err(|_| {
                        ApiError::validation(format!("Invalid friend id '{part}'"))
                    })?;
                    form.friend_ids.push(id);
                }
            }
            _ => {}
        }
    }
    Ok(form)
}

#[instrument(skip(state, mp))]
async fn create_capsule(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    mut mp: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let form = collect_form(&mut mp).await?;
    let capsule = services::create_capsule(&state, user_id, form).await?;
    Ok((StatusCode::CREATED, Json(capsule)))
}

#[instrument(skip(state))]
async fn list_feed(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let feed = services::feed_for_user(&state.db, user_id).await?;
    Ok(Json(feed))
}

#[instrument(skip(state))]
async fn get_capsule(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let capsule = services::get_capsule(&state.db, id, user_id).await?;
    Ok(Json(capsule))
}

#[instrument(skip(state))]
async fn delete_capsule(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    services::delete_capsule(&state.db, id, user_id).await?;
    Ok(Json(json!({ "success": true, "message": "Capsule deleted" })))
}

/// 302 to a presigned URL for the capsule media.
#[instrument(skip(state))]
async fn get_media(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Redirect, ApiError> {
    let url = services::media_url(&state, id).await?;
    Ok(Redirect::temporary(&url))
}

#[instrument(skip(state, mp))]
async fn create_nested(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    mut mp: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let form = collect_form(&mut mp).await?;
    let nested = services::create_nested(&state, user_id, id, form).await?;
    Ok((StatusCode::CREATED, Json(nested)))
}

#[instrument(skip(state))]
async fn list_nested(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let children = services::nested_for_parent(&state.db, id, user_id).await?;
    Ok(Json(children))
}

#[instrument(skip(state))]
async fn list_all_nested(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let children = services::all_nested_for_user(&state.db, user_id).await?;
    Ok(Json(children))
}

#[instrument(skip(state))]
async fn list_public(
    State(state): State<AppState>,
    AuthUser(viewer_id): AuthUser,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let capsules = services::public_capsules_for_user(&state.db, user_id, viewer_id).await?;
    Ok(Json(capsules))
}
