//! Configuration management for the conversion server

use std::env;
use std::path::PathBuf;

use crate::ocr::EngineKind;
use crate::overlay::OverlayTuning;

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub ocr: OcrConfig,
    pub convert: ConvertConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Multipart upload body limit in bytes
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone)]
pub struct OcrConfig {
    pub engine: EngineKind,
    /// Tesseract language code
    pub language: String,
    /// Base URL for the remote engine
    pub remote_url: String,
}

#[derive(Debug, Clone)]
pub struct ConvertConfig {
    /// Scratch directory for per-request uploads and page rasters
    pub work_dir: PathBuf,
    /// Default rasterization resolution for PDF pages
    pub default_dpi: u32,
    /// Default JPEG quality for background recompression
    pub default_quality: u8,
    pub tuning: OverlayTuning,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
                max_upload_bytes: 50 * 1024 * 1024,
            },
            ocr: OcrConfig {
                engine: EngineKind::Tesseract,
                language: "eng".to_string(),
                remote_url: "http://localhost:8501".to_string(),
            },
            convert: ConvertConfig {
                work_dir: std::env::temp_dir().join("searchable-pdf"),
                default_dpi: 300,
                default_quality: 85,
                tuning: OverlayTuning::default(),
            },
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Config::default();
        let tuning = OverlayTuning::default();
        Config {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or(defaults.server.host),
                port: env_parse("SERVER_PORT", defaults.server.port),
                max_upload_bytes: env_parse("MAX_UPLOAD_BYTES", defaults.server.max_upload_bytes),
            },
            ocr: OcrConfig {
                engine: match env::var("OCR_ENGINE").as_deref() {
                    Ok("remote") => EngineKind::Remote,
                    _ => EngineKind::Tesseract,
                },
                language: env::var("OCR_LANGUAGE").unwrap_or(defaults.ocr.language),
                remote_url: env::var("OCR_REMOTE_URL").unwrap_or(defaults.ocr.remote_url),
            },
            convert: ConvertConfig {
                work_dir: env::var("WORK_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.convert.work_dir),
                default_dpi: env_parse("DEFAULT_DPI", defaults.convert.default_dpi),
                default_quality: env_parse("DEFAULT_QUALITY", defaults.convert.default_quality),
                tuning: OverlayTuning {
                    min_box_px: env_parse("MIN_BOX_PX", tuning.min_box_px),
                    font_k: env_parse("FONT_HEIGHT_FRACTION", tuning.font_k),
                    font_min_pt: env_parse("FONT_MIN_PT", tuning.font_min_pt),
                    font_max_pt: env_parse("FONT_MAX_PT", tuning.font_max_pt),
                    h_scale_min: env_parse("H_SCALE_MIN_PCT", tuning.h_scale_min),
                    h_scale_max: env_parse("H_SCALE_MAX_PCT", tuning.h_scale_max),
                },
            },
        }
    }
}
