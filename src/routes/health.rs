//! Health Route

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::convert::ALLOWED_EXTENSIONS;
use crate::state::AppState;

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    let engine_available = state.converter().engine_available().await;
    Json(json!({
        "status": "ok",
        "engine": state.converter().engine_name(),
        "engine_available": engine_available,
        "supported_formats": ALLOWED_EXTENSIONS,
        "max_upload_bytes": state.config().server.max_upload_bytes,
    }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{body::Body, http::Request, http::StatusCode, routing::get, Router};
    use tower::ServiceExt;

    use super::*;
    use crate::config::Config;
    use crate::ocr::provider::MockEngine;

    #[tokio::test]
    async fn reports_engine_and_supported_formats() {
        let engine = Arc::new(MockEngine {
            detections: vec![],
            available: true,
        });
        let state = AppState::with_engine(Config::default(), engine);
        let app = Router::new().route("/health", get(health)).with_state(state);

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let v: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(v["status"], "ok");
        assert_eq!(v["engine"], "mock");
        assert_eq!(v["engine_available"], true);
        assert!(v["supported_formats"]
            .as_array()
            .unwrap()
            .iter()
            .any(|f| f == "pdf"));
    }
}
