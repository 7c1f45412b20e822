//! OCR
//!
//! Engine abstraction, detection data model, and coordinate extraction.

pub mod extract;
pub mod provider;
pub mod types;

pub use extract::extract_detections;
pub use provider::{OcrEngine, RemoteHttpEngine, TesseractEngine};
pub use types::{EngineKind, OcrError, PageOcr, RawDetection, TextDetection};
