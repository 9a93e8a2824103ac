//! API v1 routes.

mod channels;
pub mod notifications;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

/// Create API v1 routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/notifications", post(notifications::post_notification))
        .route("/channels", get(channels::list_channels))
}
