//! Rasterization
//!
//! MuPDF-backed page rendering and text extraction. MuPDF documents are not
//! thread-safe, so the wrapper stores only the source data and opens a fresh
//! document per operation under a mutex; callers run operations on
//! `tokio::task::spawn_blocking`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::RgbImage;
use mupdf::{Colorspace, Document, Matrix};
use parking_lot::Mutex;

#[derive(Debug, thiserror::Error)]
pub enum RasterError {
    #[error("MuPDF error: {0}")]
    Mupdf(#[from] mupdf::Error),

    #[error("Page {0} out of range ({1} pages)")]
    PageOutOfRange(usize, usize),

    #[error("Failed to build image buffer for page {0}")]
    BufferConversion(usize),
}

/// Page rendering capability consumed by the conversion driver.
///
/// `SourceDocument` is the production implementation; tests substitute
/// their own to exercise per-page failure paths.
pub trait PageRenderer: Send + Sync {
    fn page_count(&self) -> Result<usize, RasterError>;

    fn render_page(&self, index: usize, zoom: f32) -> Result<RgbImage, RasterError>;
}

/// Source data for a document
#[derive(Clone)]
enum DocumentSource {
    Bytes(Arc<Vec<u8>>),
    Path(PathBuf),
}

/// Serialized-access PDF document.
///
/// Each operation opens a fresh `Document` from the stored source so no
/// MuPDF state outlives the call or crosses threads.
pub struct SourceDocument {
    source: DocumentSource,
    page_count: usize,
    lock: Mutex<()>,
}

impl SourceDocument {
    pub fn from_bytes(data: Vec<u8>) -> Result<Self, RasterError> {
        let doc = Document::from_bytes(&data, "application/pdf")?;
        let page_count = doc.page_count()? as usize;
        Ok(Self {
            source: DocumentSource::Bytes(Arc::new(data)),
            page_count,
            lock: Mutex::new(()),
        })
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, RasterError> {
        let path_buf = path.as_ref().to_path_buf();
        let doc = Document::open(&path_buf.to_string_lossy())?;
        let page_count = doc.page_count()? as usize;
        Ok(Self {
            source: DocumentSource::Path(path_buf),
            page_count,
            lock: Mutex::new(()),
        })
    }

    pub fn page_count(&self) -> Result<usize, RasterError> {
        Ok(self.page_count)
    }

    fn open_document(&self) -> Result<Document, RasterError> {
        match &self.source {
            DocumentSource::Bytes(data) => {
                Document::from_bytes(data, "application/pdf").map_err(Into::into)
            }
            DocumentSource::Path(path) => {
                Document::open(&path.to_string_lossy()).map_err(Into::into)
            }
        }
    }

    fn with_doc<F, R>(&self, f: F) -> Result<R, RasterError>
    where
        F: FnOnce(&Document) -> Result<R, RasterError>,
    {
        let _guard = self.lock.lock();
        let doc = self.open_document()?;
        f(&doc)
    }

    /// Render one page to an RGB raster at the given zoom (1.0 = 72 dpi)
    pub fn render_page(&self, index: usize, zoom: f32) -> Result<RgbImage, RasterError> {
        if index >= self.page_count {
            return Err(RasterError::PageOutOfRange(index, self.page_count));
        }

        self.with_doc(|doc| {
            let page = doc.load_page(index as i32)?;
            let matrix = Matrix::new_scale(zoom, zoom);
            let colorspace = Colorspace::device_rgb();
            let pixmap = page.to_pixmap(&matrix, &colorspace, false, false)?;

            let width = pixmap.width() as u32;
            let height = pixmap.height() as u32;
            let samples = pixmap.samples();
            let n = pixmap.n() as usize;

            // Samples may carry extra components; take the RGB triple per pixel
            let mut rgb = Vec::with_capacity((width * height * 3) as usize);
            for pixel in 0..(width * height) as usize {
                let offset = pixel * n;
                rgb.push(samples.get(offset).copied().unwrap_or(0));
                rgb.push(samples.get(offset + 1).copied().unwrap_or(0));
                rgb.push(samples.get(offset + 2).copied().unwrap_or(0));
            }

            RgbImage::from_raw(width, height, rgb)
                .ok_or(RasterError::BufferConversion(index))
        })
    }

    /// Extract text from every page, concatenated with newlines
    ///
    /// Used by verification and by round-trip tests.
    pub fn extract_text(&self) -> Result<String, RasterError> {
        self.with_doc(|doc| {
            let mut text = String::new();
            for index in 0..self.page_count {
                let page = doc.load_page(index as i32)?;
                let text_page = page.to_text_page(mupdf::TextPageOptions::empty())?;
                text.push_str(&text_page.to_text()?);
                text.push('\n');
            }
            Ok(text)
        })
    }
}

impl PageRenderer for SourceDocument {
    fn page_count(&self) -> Result<usize, RasterError> {
        SourceDocument::page_count(self)
    }

    fn render_page(&self, index: usize, zoom: f32) -> Result<RgbImage, RasterError> {
        SourceDocument::render_page(self, index, zoom)
    }
}
