//! Searchability Verification
//!
//! Checks whether a PDF carries an extractable text layer. A document is
//! considered searchable when the extracted text, trimmed, is longer than
//! ten characters; shorter output is indistinguishable from stray marks.

use serde::Serialize;

use crate::raster::{RasterError, SourceDocument};

const MIN_SEARCHABLE_CHARS: usize = 10;

#[derive(Debug, Clone, Serialize)]
pub struct VerifyReport {
    pub searchable: bool,
    pub pages: usize,
    pub text_chars: usize,
    /// Leading extracted text, capped for the response body
    pub preview: String,
}

/// Inspect PDF bytes for a usable text layer.
///
/// Runs MuPDF extraction over every page; call from `spawn_blocking`.
pub fn verify_pdf(data: Vec<u8>) -> Result<VerifyReport, RasterError> {
    let doc = SourceDocument::from_bytes(data)?;
    let pages = doc.page_count()?;
    let text = doc.extract_text()?;
    let trimmed = text.trim();

    Ok(VerifyReport {
        searchable: trimmed.chars().count() > MIN_SEARCHABLE_CHARS,
        pages,
        text_chars: trimmed.chars().count(),
        preview: trimmed.chars().take(200).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::{assemble::assemble, compose_page, OverlayTuning};

    fn pdf_with_text(text: &str) -> Vec<u8> {
        let img = image::RgbImage::from_pixel(300, 200, image::Rgb([255, 255, 255]));
        let ocr = crate::ocr::PageOcr {
            width: 300,
            height: 200,
            detections: vec![crate::ocr::TextDetection {
                text: text.to_string(),
                x1: 20.0,
                y1: 30.0,
                x2: 280.0,
                y2: 55.0,
                confidence: 1.0,
            }],
        };
        let page = compose_page(&img, &ocr, &OverlayTuning::default(), 85).unwrap();
        assemble(&[page])
    }

    #[test]
    fn long_text_layer_is_searchable() {
        let report = verify_pdf(pdf_with_text("The quick brown fox jumps")).unwrap();
        assert!(report.searchable);
        assert_eq!(report.pages, 1);
        assert!(report.preview.contains("quick brown fox"));
    }

    #[test]
    fn short_text_is_not_searchable() {
        let report = verify_pdf(pdf_with_text("hi")).unwrap();
        assert!(!report.searchable);
    }

    #[test]
    fn invalid_bytes_error() {
        assert!(verify_pdf(b"not a pdf".to_vec()).is_err());
    }
}
