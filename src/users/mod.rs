use crate::state::AppState;
use axum::Router;

mod dto;
mod extractors;
pub mod handlers;
mod password;
pub mod repo;
mod repo_types;
mod services;
mod validation;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::account_routes())
        .merge(handlers::user_routes())
}
