//! Route modules.

use axum::Router;

use crate::state::AppState;

pub mod health;
pub mod rooms;
pub mod ws;

/// Returns every route the server exposes, without middleware.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .nest("/rooms", rooms::router())
}
