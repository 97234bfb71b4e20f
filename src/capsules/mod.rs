pub mod dto;
pub mod handlers;
pub mod repo;
pub mod services;
pub mod visibility;

use axum::Router;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    handlers::capsule_routes()
}
