//! HTTP Routes

pub mod convert;
pub mod health;
pub mod verify;

use axum::{routing::post, Router};

use crate::state::AppState;

/// `/api/v1` router
pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/convert", post(convert::convert))
        .route("/verify", post(verify::verify))
}
