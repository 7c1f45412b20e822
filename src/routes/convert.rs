//! Conversion Route
//!
//! POST /api/v1/convert takes a multipart upload (`file`, optional `dpi`
//! and `quality` fields) and streams back the searchable PDF. The upload is
//! staged in a per-request scratch directory that is removed when the
//! request finishes, success or failure.

use std::path::PathBuf;

use axum::{
    body::Body,
    extract::{Multipart, State},
    http::header,
    response::Response,
};
use tracing::info;
use uuid::Uuid;

use crate::convert::{classify, output_filename, ConvertOptions};
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Per-request scratch directory, removed on drop
struct ScratchDir {
    path: PathBuf,
}

impl ScratchDir {
    fn create(base: &std::path::Path) -> std::io::Result<Self> {
        let path = base.join(Uuid::new_v4().to_string());
        std::fs::create_dir_all(&path)?;
        Ok(Self { path })
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}

struct ConvertRequest {
    filename: String,
    data: Vec<u8>,
    dpi: Option<u32>,
    quality: Option<u8>,
}

async fn read_multipart(mut multipart: Multipart, max_bytes: usize) -> Result<ConvertRequest> {
    let mut filename = None;
    let mut data = None;
    let mut dpi = None;
    let mut quality = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("file") => {
                filename = field.file_name().map(String::from);
                let bytes = field.bytes().await?;
                if bytes.len() > max_bytes {
                    return Err(AppError::PayloadTooLarge(format!(
                        "File exceeds {} bytes",
                        max_bytes
                    )));
                }
                data = Some(bytes.to_vec());
            }
            Some("dpi") => {
                let text = field.text().await?;
                dpi = Some(
                    text.parse()
                        .map_err(|_| AppError::BadRequest(format!("Invalid dpi: {}", text)))?,
                );
            }
            Some("quality") => {
                let text = field.text().await?;
                quality = Some(
                    text.parse()
                        .map_err(|_| AppError::BadRequest(format!("Invalid quality: {}", text)))?,
                );
            }
            _ => {}
        }
    }

    let filename = filename.ok_or_else(|| AppError::BadRequest("Missing file field".into()))?;
    let data = data.ok_or_else(|| AppError::BadRequest("Empty file field".into()))?;
    if data.is_empty() {
        return Err(AppError::BadRequest("Uploaded file is empty".into()));
    }

    Ok(ConvertRequest {
        filename,
        data,
        dpi,
        quality,
    })
}

/// POST /api/v1/convert
pub async fn convert(State(state): State<AppState>, multipart: Multipart) -> Result<Response> {
    let max_bytes = state.config().server.max_upload_bytes;
    let request = read_multipart(multipart, max_bytes).await?;

    // Reject unsupported formats before touching the filesystem
    classify(&request.filename).map_err(AppError::Convert)?;

    let options = ConvertOptions::new(
        request.dpi.unwrap_or(state.config().convert.default_dpi),
        request
            .quality
            .unwrap_or(state.config().convert.default_quality),
    );

    info!(
        filename = %request.filename,
        bytes = request.data.len(),
        dpi = options.dpi,
        "conversion requested"
    );

    // Strip any path components a client may have smuggled into the name
    let safe_name = std::path::Path::new(&request.filename)
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| AppError::BadRequest("Invalid filename".into()))?
        .to_string();

    let scratch = ScratchDir::create(&state.config().convert.work_dir)?;
    let input_path = scratch.path.join(&safe_name);
    tokio::fs::write(&input_path, &request.data).await?;

    let output = state
        .converter()
        .convert(&input_path, &safe_name, options)
        .await?;

    let response = build_pdf_response(&request.filename, output)?;

    Ok(response)
}

fn build_pdf_response(
    input_filename: &str,
    output: crate::convert::ConvertOutput,
) -> Result<Response> {
    let response = Response::builder()
        .header(header::CONTENT_TYPE, "application/pdf")
        .header(
            header::CONTENT_DISPOSITION,
            format!(
                "attachment; filename=\"{}\"",
                output_filename(input_filename)
            ),
        )
        .header("x-pages", output.stats.pages_out)
        .header("x-runs-emitted", output.stats.runs_emitted)
        .header("x-runs-skipped", output.stats.runs_skipped)
        .body(Body::from(output.pdf))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {}", e)))?;

    Ok(response)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{routing::post, Router};
    use axum_test::multipart::{MultipartForm, Part};
    use axum_test::TestServer;

    use crate::config::Config;
    use crate::ocr::provider::MockEngine;
    use crate::ocr::RawDetection;
    use crate::state::AppState;

    fn test_server(detections: Vec<RawDetection>, work_dir: &std::path::Path) -> TestServer {
        let mut config = Config::default();
        config.convert.work_dir = work_dir.to_path_buf();
        let engine = Arc::new(MockEngine {
            detections,
            available: true,
        });
        let state = AppState::with_engine(config, engine);
        let app = Router::new()
            .route("/convert", post(super::convert))
            .with_state(state);
        TestServer::new(app).unwrap()
    }

    fn png_upload() -> Vec<u8> {
        let img = image::RgbImage::from_pixel(200, 150, image::Rgb([255, 255, 255]));
        let mut bytes = Vec::new();
        img.write_to(
            &mut std::io::Cursor::new(&mut bytes),
            image::ImageFormat::Png,
        )
        .unwrap();
        bytes
    }

    #[tokio::test]
    async fn converts_png_upload_to_pdf_attachment() {
        let dir = tempfile::tempdir().unwrap();
        let server = test_server(
            vec![RawDetection {
                text: "Uploaded Line".to_string(),
                bbox: Some([10.0, 20.0, 150.0, 45.0]),
                confidence: Some(0.95),
            }],
            dir.path(),
        );

        let form = MultipartForm::new().add_part(
            "file",
            Part::bytes(png_upload())
                .file_name("scan.png")
                .mime_type("image/png"),
        );
        let response = server.post("/convert").multipart(form).await;

        response.assert_status_ok();
        assert_eq!(
            response.header("content-type").to_str().unwrap(),
            "application/pdf"
        );
        assert!(response
            .header("content-disposition")
            .to_str()
            .unwrap()
            .contains("scan_searchable.pdf"));
        assert_eq!(response.header("x-pages").to_str().unwrap(), "1");
        assert!(response.as_bytes().starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn rejects_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let server = test_server(vec![], dir.path());

        let form = MultipartForm::new().add_part(
            "file",
            Part::bytes(b"hello".to_vec())
                .file_name("notes.txt")
                .mime_type("text/plain"),
        );
        let response = server.post("/convert").multipart(form).await;
        response.assert_status_bad_request();
    }

    #[tokio::test]
    async fn rejects_missing_file_field() {
        let dir = tempfile::tempdir().unwrap();
        let server = test_server(vec![], dir.path());

        let form = MultipartForm::new().add_text("dpi", "300");
        let response = server.post("/convert").multipart(form).await;
        response.assert_status_bad_request();
    }

    #[tokio::test]
    async fn scratch_dir_is_removed_after_request() {
        let dir = tempfile::tempdir().unwrap();
        let server = test_server(vec![], dir.path());

        let form = MultipartForm::new().add_part(
            "file",
            Part::bytes(png_upload())
                .file_name("scan.png")
                .mime_type("image/png"),
        );
        server.post("/convert").multipart(form).await.assert_status_ok();

        let leftovers: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert!(leftovers.is_empty());
    }
}
