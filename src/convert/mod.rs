//! Document Driver
//!
//! Orchestrates the per-page pipeline: rasterize, detect text, extract
//! coordinates, compose the overlay, and assemble the output PDF. A single
//! image becomes a one-page document; a PDF is processed page by page with
//! per-page failure tolerance.

use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use image::RgbImage;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::config::ConvertConfig;
use crate::ocr::{extract_detections, OcrEngine, PageOcr};
use crate::overlay::{assemble::assemble, compose_page, SearchablePage};
use crate::raster::{PageRenderer, RasterError, SourceDocument};

/// Extensions accepted for conversion
pub const ALLOWED_EXTENSIONS: &[&str] = &["pdf", "png", "jpg", "jpeg", "tiff", "tif", "bmp"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Image,
    Pdf,
}

/// Classify a filename by extension, rejecting unsupported formats early
pub fn classify(filename: &str) -> Result<InputKind, ConvertError> {
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .ok_or_else(|| ConvertError::UnsupportedFormat(filename.to_string()))?;
    match ext.as_str() {
        "pdf" => Ok(InputKind::Pdf),
        e if ALLOWED_EXTENSIONS.contains(&e) => Ok(InputKind::Image),
        _ => Err(ConvertError::UnsupportedFormat(filename.to_string())),
    }
}

/// Output filename derived from the input stem
pub fn output_filename(input_filename: &str) -> String {
    let stem = Path::new(input_filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("document");
    format!("{}_searchable.pdf", stem)
}

#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("Input file not found: {0}")]
    InputNotFound(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to open document: {0}")]
    DocumentOpen(#[from] RasterError),

    #[error("Failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    #[error("No pages could be produced")]
    NoPagesProduced,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ConvertError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            Self::InputNotFound(_) => StatusCode::NOT_FOUND,
            Self::UnsupportedFormat(_) => StatusCode::BAD_REQUEST,
            Self::DocumentOpen(_) | Self::ImageDecode(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NoPagesProduced => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Per-request knobs, clamped to safe ranges on construction
#[derive(Debug, Clone, Copy)]
pub struct ConvertOptions {
    pub dpi: u32,
    pub jpeg_quality: u8,
}

impl ConvertOptions {
    pub fn new(dpi: u32, jpeg_quality: u8) -> Self {
        Self {
            dpi: dpi.clamp(72, 600),
            jpeg_quality: jpeg_quality.clamp(30, 95),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ConvertStats {
    pub pages_in: usize,
    pub pages_out: usize,
    pub pages_failed: usize,
    pub runs_emitted: usize,
    pub runs_skipped: usize,
}

pub struct ConvertOutput {
    pub pdf: Vec<u8>,
    pub stats: ConvertStats,
}

/// Conversion pipeline.
///
/// Constructed once at startup and shared read-only. OCR engine calls are
/// serialized through a single-permit semaphore; the model backend cannot
/// run concurrent requests.
pub struct Converter {
    engine: Arc<dyn OcrEngine>,
    config: ConvertConfig,
    ocr_gate: Semaphore,
}

impl Converter {
    pub fn new(engine: Arc<dyn OcrEngine>, config: ConvertConfig) -> Self {
        Self {
            engine,
            config,
            ocr_gate: Semaphore::new(1),
        }
    }

    pub fn engine_name(&self) -> &'static str {
        self.engine.name()
    }

    pub async fn engine_available(&self) -> bool {
        self.engine.is_available().await
    }

    /// Convert an uploaded file into a searchable PDF
    pub async fn convert(
        &self,
        path: &Path,
        filename: &str,
        options: ConvertOptions,
    ) -> Result<ConvertOutput, ConvertError> {
        if !path.exists() {
            return Err(ConvertError::InputNotFound(filename.to_string()));
        }

        let kind = classify(filename)?;
        let output = match kind {
            InputKind::Image => self.convert_image(path, options).await?,
            InputKind::Pdf => self.convert_pdf(path, options).await?,
        };

        info!(
            filename,
            pages = output.stats.pages_out,
            runs_emitted = output.stats.runs_emitted,
            runs_skipped = output.stats.runs_skipped,
            "conversion finished"
        );
        Ok(output)
    }

    async fn convert_image(
        &self,
        path: &Path,
        options: ConvertOptions,
    ) -> Result<ConvertOutput, ConvertError> {
        let path_owned = path.to_path_buf();
        let image = tokio::task::spawn_blocking(move || -> Result<RgbImage, ConvertError> {
            // Paletted and alpha inputs are normalized to RGB; geometry is
            // computed in this space.
            Ok(image::open(&path_owned)?.to_rgb8())
        })
        .await
        .map_err(|e| ConvertError::Internal(format!("Task join error: {}", e)))??;

        let mut stats = ConvertStats {
            pages_in: 1,
            ..Default::default()
        };
        let page = self
            .process_page(image, 0, options)
            .await
            .ok_or(ConvertError::NoPagesProduced)?;

        stats.pages_out = 1;
        stats.runs_emitted = page.runs.len();
        stats.runs_skipped = page.skipped;

        Ok(ConvertOutput {
            pdf: assemble(&[page]),
            stats,
        })
    }

    async fn convert_pdf(
        &self,
        path: &Path,
        options: ConvertOptions,
    ) -> Result<ConvertOutput, ConvertError> {
        let doc: Arc<dyn PageRenderer> = Arc::new(SourceDocument::from_path(path)?);
        self.convert_rendered(doc, options).await
    }

    async fn convert_rendered(
        &self,
        doc: Arc<dyn PageRenderer>,
        options: ConvertOptions,
    ) -> Result<ConvertOutput, ConvertError> {
        let page_count = doc.page_count()?;
        let zoom = options.dpi as f32 / 72.0;

        let mut stats = ConvertStats {
            pages_in: page_count,
            ..Default::default()
        };
        let mut pages: Vec<SearchablePage> = Vec::with_capacity(page_count);

        for index in 0..page_count {
            let doc = Arc::clone(&doc);
            let rendered = tokio::task::spawn_blocking(move || doc.render_page(index, zoom))
                .await
                .map_err(|e| ConvertError::Internal(format!("Task join error: {}", e)))?;

            let image = match rendered {
                Ok(image) => image,
                Err(e) => {
                    // Recoverable: drop this page, keep the rest
                    warn!(page = index + 1, error = %e, "page rasterization failed");
                    stats.pages_failed += 1;
                    continue;
                }
            };

            match self.process_page(image, index, options).await {
                Some(page) => {
                    stats.runs_emitted += page.runs.len();
                    stats.runs_skipped += page.skipped;
                    pages.push(page);
                }
                None => stats.pages_failed += 1,
            }
        }

        if pages.is_empty() {
            return Err(ConvertError::NoPagesProduced);
        }
        stats.pages_out = pages.len();

        Ok(ConvertOutput {
            pdf: assemble(&pages),
            stats,
        })
    }

    /// Run detection and composition for one rendered page.
    ///
    /// Detection failure degrades to an image-only page; only composition
    /// failure drops the page.
    async fn process_page(
        &self,
        image: RgbImage,
        index: usize,
        options: ConvertOptions,
    ) -> Option<SearchablePage> {
        let (width, height) = image.dimensions();

        let png = match encode_png(&image) {
            Ok(png) => png,
            Err(e) => {
                warn!(page = index + 1, error = %e, "page encoding failed");
                return None;
            }
        };

        let detections = {
            // Model backends handle one request at a time
            let _permit = self.ocr_gate.acquire().await.ok()?;
            match self.engine.detect(&png).await {
                Ok(raw) => raw,
                Err(e) => {
                    warn!(page = index + 1, error = %e, "text detection failed, emitting image-only page");
                    Vec::new()
                }
            }
        };

        let ocr: PageOcr =
            extract_detections(width, height, detections, self.config.tuning.min_box_px);
        tracing::debug!(
            page = index + 1,
            detections = ocr.element_count(),
            "extracted page detections"
        );

        let tuning = self.config.tuning.clone();
        let quality = options.jpeg_quality;
        let composed = tokio::task::spawn_blocking(move || {
            compose_page(&image, &ocr, &tuning, quality)
        })
        .await;

        match composed {
            Ok(Ok(page)) => Some(page),
            Ok(Err(e)) => {
                warn!(page = index + 1, error = %e, "page composition failed");
                None
            }
            Err(e) => {
                warn!(page = index + 1, error = %e, "composition task failed");
                None
            }
        }
    }
}

fn encode_png(image: &RgbImage) -> Result<Vec<u8>, image::ImageError> {
    let mut png = Vec::new();
    image.write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)?;
    Ok(png)
}
