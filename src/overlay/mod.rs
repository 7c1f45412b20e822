//! Overlay Compositor
//!
//! Joins a rendered page image with its validated detections into one
//! finished output page: a JPEG background plus invisible text runs whose
//! footprint matches the detected boxes. A run that cannot be laid out is
//! skipped and counted; per-run failure never aborts the page.

pub mod assemble;
pub mod geometry;
pub mod metrics;

use std::io::Cursor;

use image::RgbImage;
use tracing::{debug, warn};

/// Placement tuning knobs. Empirical values, not correctness constraints.
#[derive(Debug, Clone)]
pub struct OverlayTuning {
    /// Detections with a box smaller than this (either axis) are noise
    pub min_box_px: f64,
    /// Fraction of box height used as font size
    pub font_k: f64,
    pub font_min_pt: f64,
    pub font_max_pt: f64,
    /// Horizontal scale clamp range, percent
    pub h_scale_min: f64,
    pub h_scale_max: f64,
}

impl Default for OverlayTuning {
    fn default() -> Self {
        Self {
            min_box_px: 2.0,
            font_k: 0.75,
            font_min_pt: 6.0,
            font_max_pt: 72.0,
            h_scale_min: 50.0,
            h_scale_max: 200.0,
        }
    }
}

/// One invisible text run, fully placed in page space
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub x: f64,
    pub y: f64,
    pub font_size: f64,
    /// Tz horizontal scaling, percent
    pub h_scale: f64,
    /// WinAnsi-encoded text bytes
    pub encoded: Vec<u8>,
}

/// A finished page ready for assembly
#[derive(Debug, Clone)]
pub struct SearchablePage {
    /// Page dimensions in page units (source pixels)
    pub width: u32,
    pub height: u32,
    /// JPEG-recompressed background
    pub jpeg: Vec<u8>,
    pub runs: Vec<TextRun>,
    pub skipped: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum OverlayError {
    #[error("Failed to encode background image: {0}")]
    BackgroundEncode(#[from] image::ImageError),
}

/// Compose one page from its raster and detections.
///
/// Geometry is pure given the inputs: rerunning this on the same image and
/// detections yields identical run placement.
pub fn compose_page(
    image: &RgbImage,
    ocr: &crate::ocr::PageOcr,
    tuning: &OverlayTuning,
    jpeg_quality: u8,
) -> Result<SearchablePage, OverlayError> {
    let mut jpeg = Vec::new();
    let encoder =
        image::codecs::jpeg::JpegEncoder::new_with_quality(Cursor::new(&mut jpeg), jpeg_quality);
    image.write_with_encoder(encoder)?;

    let page_height = f64::from(ocr.height);
    let mut runs = Vec::with_capacity(ocr.detections.len());
    let mut skipped = 0usize;

    for det in &ocr.detections {
        match place_run(det, page_height, tuning) {
            Some(run) => runs.push(run),
            None => {
                skipped += 1;
                warn!(
                    text = %det.text,
                    confidence = det.confidence,
                    "skipped unplaceable text run"
                );
            }
        }
    }

    debug!(
        width = ocr.width,
        height = ocr.height,
        emitted = runs.len(),
        skipped,
        "composed page"
    );

    Ok(SearchablePage {
        width: ocr.width,
        height: ocr.height,
        jpeg,
        runs,
        skipped,
    })
}

fn place_run(
    det: &crate::ocr::TextDetection,
    page_height: f64,
    tuning: &OverlayTuning,
) -> Option<TextRun> {
    let bw = det.width();
    let bh = det.height();
    if bw <= 0.0 || bh <= 0.0 {
        return None;
    }

    let (x, y) = geometry::anchor(page_height, det.x1, det.y2);
    let font_size = geometry::font_size(bh, tuning.font_k, tuning.font_min_pt, tuning.font_max_pt);

    let encoded = metrics::encode_win_ansi(&det.text)?;
    let natural_width = metrics::string_width(&encoded, font_size);
    let h_scale =
        geometry::horizontal_scale(bw, natural_width, tuning.h_scale_min, tuning.h_scale_max)?;

    Some(TextRun {
        x,
        y,
        font_size,
        h_scale,
        encoded,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::{PageOcr, TextDetection};

    fn detection(text: &str, bbox: [f64; 4]) -> TextDetection {
        TextDetection {
            text: text.to_string(),
            x1: bbox[0],
            y1: bbox[1],
            x2: bbox[2],
            y2: bbox[3],
            confidence: 1.0,
        }
    }

    fn page(width: u32, height: u32, detections: Vec<TextDetection>) -> PageOcr {
        PageOcr {
            width,
            height,
            detections,
        }
    }

    #[test]
    fn composes_runs_with_flipped_anchor() {
        let img = RgbImage::new(200, 300);
        let ocr = page(200, 300, vec![detection("hello", [10.0, 20.0, 110.0, 40.0])]);
        let result = compose_page(&img, &ocr, &OverlayTuning::default(), 85).unwrap();
        assert_eq!(result.runs.len(), 1);
        assert_eq!(result.skipped, 0);
        let run = &result.runs[0];
        assert_eq!((run.x, run.y), (10.0, 260.0));
        assert_eq!(run.font_size, 15.0);
        assert!((50.0..=200.0).contains(&run.h_scale));
    }

    #[test]
    fn unencodable_text_is_skipped_not_fatal() {
        let img = RgbImage::new(100, 100);
        let ocr = page(
            100,
            100,
            vec![
                detection("日本語", [0.0, 0.0, 50.0, 20.0]),
                detection("kept", [0.0, 30.0, 50.0, 50.0]),
            ],
        );
        let result = compose_page(&img, &ocr, &OverlayTuning::default(), 85).unwrap();
        assert_eq!(result.runs.len(), 1);
        assert_eq!(result.skipped, 1);
    }

    #[test]
    fn image_only_page_still_composes() {
        let img = RgbImage::new(64, 64);
        let ocr = page(64, 64, vec![]);
        let result = compose_page(&img, &ocr, &OverlayTuning::default(), 85).unwrap();
        assert!(result.runs.is_empty());
        assert!(!result.jpeg.is_empty());
    }

    #[test]
    fn placement_is_deterministic() {
        let img = RgbImage::new(200, 300);
        let ocr = page(200, 300, vec![detection("twice", [15.0, 25.0, 90.0, 45.0])]);
        let tuning = OverlayTuning::default();
        let a = compose_page(&img, &ocr, &tuning, 85).unwrap();
        let b = compose_page(&img, &ocr, &tuning, 85).unwrap();
        assert_eq!(a.runs, b.runs);
    }
}
