//! OCR Types
//!
//! Data model for text detection on rasterized pages.

use serde::Deserialize;

/// OCR engine selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineKind {
    /// Tesseract OCR (local subprocess)
    Tesseract,
    /// Remote HTTP OCR endpoint
    Remote,
}

impl Default for EngineKind {
    fn default() -> Self {
        Self::Tesseract
    }
}

/// Raw detection as reported by an engine, before validation.
///
/// Coordinates are top-left-origin pixels: `[x1, y1, x2, y2]`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawDetection {
    pub text: String,
    /// Missing when the engine could not localize the text
    #[serde(default)]
    pub bbox: Option<[f64; 4]>,
    /// Engine confidence in 0-1, when reported
    #[serde(default)]
    pub confidence: Option<f64>,
}

/// Validated text element positioned on a page.
///
/// Invariants: `x1 < x2`, `y1 < y2`, all coordinates within the page
/// bounds, non-empty text.
#[derive(Debug, Clone)]
pub struct TextDetection {
    pub text: String,
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub confidence: f64,
}

impl TextDetection {
    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }
}

/// All validated detections for one page
#[derive(Debug, Clone)]
pub struct PageOcr {
    /// Page raster dimensions in pixels
    pub width: u32,
    pub height: u32,
    pub detections: Vec<TextDetection>,
}

impl PageOcr {
    pub fn element_count(&self) -> usize {
        self.detections.len()
    }
}

/// OCR engine error types
#[derive(Debug, thiserror::Error)]
pub enum OcrError {
    #[error("OCR processing failed: {0}")]
    ProcessingError(String),

    #[error("OCR API error: {0}")]
    ApiError(String),
}
