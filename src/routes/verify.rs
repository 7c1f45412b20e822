//! Verification Route

use axum::{
    extract::{Multipart, State},
    Json,
};
use tracing::info;

use crate::error::{AppError, Result};
use crate::state::AppState;
use crate::verify::{verify_pdf, VerifyReport};

/// POST /api/v1/verify
///
/// Takes a multipart PDF upload and reports whether it carries a
/// searchable text layer.
pub async fn verify(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<VerifyReport>> {
    let max_bytes = state.config().server.max_upload_bytes;
    let mut data = None;

    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some("file") {
            // Only PDFs carry a verifiable text layer; reject anything else
            // before reading the body
            let is_pdf = field
                .file_name()
                .map(|n| n.to_ascii_lowercase().ends_with(".pdf"))
                .unwrap_or(false);
            if !is_pdf {
                return Err(AppError::BadRequest(
                    "Only PDF files can be verified".into(),
                ));
            }
            let bytes = field.bytes().await?;
            if bytes.len() > max_bytes {
                return Err(AppError::PayloadTooLarge(format!(
                    "File exceeds {} bytes",
                    max_bytes
                )));
            }
            data = Some(bytes.to_vec());
        }
    }

    let data = data.ok_or_else(|| AppError::BadRequest("Missing file field".into()))?;
    if data.is_empty() {
        return Err(AppError::BadRequest("Uploaded file is empty".into()));
    }

    let report = tokio::task::spawn_blocking(move || verify_pdf(data))
        .await
        .map_err(|e| AppError::Internal(format!("Task join error: {}", e)))??;

    info!(
        searchable = report.searchable,
        pages = report.pages,
        chars = report.text_chars,
        "verification finished"
    );
    Ok(Json(report))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{routing::post, Router};
    use axum_test::multipart::{MultipartForm, Part};
    use axum_test::TestServer;

    use crate::config::Config;
    use crate::ocr::provider::MockEngine;
    use crate::overlay::{assemble::assemble, compose_page, OverlayTuning};
    use crate::state::AppState;

    fn test_server() -> TestServer {
        let engine = Arc::new(MockEngine {
            detections: vec![],
            available: true,
        });
        let state = AppState::with_engine(Config::default(), engine);
        let app = Router::new()
            .route("/verify", post(super::verify))
            .with_state(state);
        TestServer::new(app).unwrap()
    }

    fn searchable_pdf() -> Vec<u8> {
        let img = image::RgbImage::from_pixel(300, 200, image::Rgb([255, 255, 255]));
        let ocr = crate::ocr::PageOcr {
            width: 300,
            height: 200,
            detections: vec![crate::ocr::TextDetection {
                text: "Plenty of extractable text here".to_string(),
                x1: 10.0,
                y1: 20.0,
                x2: 290.0,
                y2: 45.0,
                confidence: 1.0,
            }],
        };
        let page = compose_page(&img, &ocr, &OverlayTuning::default(), 85).unwrap();
        assemble(&[page])
    }

    #[tokio::test]
    async fn reports_searchable_for_text_layer_pdf() {
        let server = test_server();
        let form = MultipartForm::new().add_part(
            "file",
            Part::bytes(searchable_pdf())
                .file_name("out.pdf")
                .mime_type("application/pdf"),
        );
        let response = server.post("/verify").multipart(form).await;
        response.assert_status_ok();

        let v: serde_json::Value = response.json();
        assert_eq!(v["searchable"], true);
        assert_eq!(v["pages"], 1);
    }

    #[tokio::test]
    async fn rejects_non_pdf_upload() {
        let server = test_server();
        let form = MultipartForm::new().add_part(
            "file",
            Part::bytes(b"not a pdf".to_vec())
                .file_name("scan.png")
                .mime_type("image/png"),
        );
        let response = server.post("/verify").multipart(form).await;
        response.assert_status_bad_request();
    }

    #[tokio::test]
    async fn rejects_missing_file() {
        let server = test_server();
        let form = MultipartForm::new().add_text("other", "x");
        let response = server.post("/verify").multipart(form).await;
        response.assert_status_bad_request();
    }
}
