//! Application state management

use std::sync::Arc;

use crate::config::Config;
use crate::convert::Converter;
use crate::ocr::{EngineKind, OcrEngine, RemoteHttpEngine, TesseractEngine};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    converter: Converter,
}

impl AppState {
    /// Build state from config, constructing the configured OCR engine.
    ///
    /// The converter is created once here and read-only afterwards.
    pub fn new(config: Config) -> Self {
        let engine: Arc<dyn OcrEngine> = match config.ocr.engine {
            EngineKind::Tesseract => Arc::new(TesseractEngine::new(&config.ocr.language)),
            EngineKind::Remote => Arc::new(RemoteHttpEngine::new(&config.ocr.remote_url)),
        };
        Self::with_engine(config, engine)
    }

    pub fn with_engine(config: Config, engine: Arc<dyn OcrEngine>) -> Self {
        let converter = Converter::new(engine, config.convert.clone());
        Self {
            inner: Arc::new(AppStateInner { config, converter }),
        }
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub fn converter(&self) -> &Converter {
        &self.inner.converter
    }
}
