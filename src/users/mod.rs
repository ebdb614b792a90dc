use crate::state::AppState;
use axum::Router;

pub mod domain;
mod dto;
pub mod error;
pub mod handlers;
pub mod memory;
pub mod ports;
pub mod repo;
mod repo_types;
pub mod services;

pub fn router(state: &AppState) -> Router<AppState> {
    handlers::user_routes(state)
}
