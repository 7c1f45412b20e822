//! Coordinate Extraction
//!
//! Normalizes raw engine detections into validated page elements. Boxes are
//! clamped to the image bounds and noise detections are dropped; ordering
//! follows the engine's emission order.

use tracing::debug;

use super::types::{PageOcr, RawDetection, TextDetection};

/// Validate raw detections against the page dimensions.
///
/// Detections without a bounding box, with empty text, or with a box below
/// the minimum size are dropped. Confidence defaults to 1.0 when the engine
/// does not report one; low confidence never filters a detection.
pub fn extract_detections(
    width: u32,
    height: u32,
    raw: Vec<RawDetection>,
    min_box_px: f64,
) -> PageOcr {
    let mut detections = Vec::with_capacity(raw.len());
    let mut dropped = 0usize;

    for det in raw {
        match validate_detection(&det, width as f64, height as f64, min_box_px) {
            Some(valid) => detections.push(valid),
            None => dropped += 1,
        }
    }

    if dropped > 0 {
        debug!(dropped, kept = detections.len(), "dropped invalid detections");
    }

    PageOcr {
        width,
        height,
        detections,
    }
}

fn validate_detection(
    det: &RawDetection,
    width: f64,
    height: f64,
    min_box_px: f64,
) -> Option<TextDetection> {
    let text = det.text.trim();
    if text.is_empty() {
        return None;
    }
    let [bx1, by1, bx2, by2] = det.bbox?;
    if !(bx1.is_finite() && by1.is_finite() && bx2.is_finite() && by2.is_finite()) {
        return None;
    }

    let mut x1 = bx1.clamp(0.0, width);
    let mut y1 = by1.clamp(0.0, height);
    let mut x2 = bx2.clamp(0.0, width);
    let mut y2 = by2.clamp(0.0, height);

    // Clamping can collapse a box that straddles an edge; keep it at least
    // one pixel wide inside the page.
    if x2 <= x1 {
        if x1 >= width {
            x1 = (width - 1.0).max(0.0);
        }
        x2 = (x1 + 1.0).min(width);
        if x2 <= x1 {
            return None;
        }
    }
    if y2 <= y1 {
        if y1 >= height {
            y1 = (height - 1.0).max(0.0);
        }
        y2 = (y1 + 1.0).min(height);
        if y2 <= y1 {
            return None;
        }
    }

    if x2 - x1 < min_box_px || y2 - y1 < min_box_px {
        return None;
    }

    Some(TextDetection {
        text: text.to_string(),
        x1,
        y1,
        x2,
        y2,
        confidence: det.confidence.unwrap_or(1.0),
    })
}
