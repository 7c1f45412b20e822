//! OCR Engines
//!
//! Defines the engine trait and implementations for text detection backends.
//! Tesseract runs as a subprocess and returns word boxes via TSV output;
//! the remote engine posts page images to a configurable HTTP endpoint.

use async_trait::async_trait;

use super::types::{OcrError, RawDetection};

/// Text detection engine
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Engine name for logs and the health endpoint
    fn name(&self) -> &'static str;

    /// Check if the engine is usable
    async fn is_available(&self) -> bool;

    /// Detect text lines with bounding boxes on a PNG-encoded page image
    async fn detect(&self, png_data: &[u8]) -> Result<Vec<RawDetection>, OcrError>;
}

/// Tesseract subprocess engine
pub struct TesseractEngine {
    language: String,
}

impl TesseractEngine {
    pub fn new(language: &str) -> Self {
        Self {
            language: language.to_string(),
        }
    }
}

#[async_trait]
impl OcrEngine for TesseractEngine {
    fn name(&self) -> &'static str {
        "tesseract"
    }

    async fn is_available(&self) -> bool {
        tokio::process::Command::new("tesseract")
            .arg("--version")
            .output()
            .await
            .is_ok()
    }

    async fn detect(&self, png_data: &[u8]) -> Result<Vec<RawDetection>, OcrError> {
        let temp_dir = std::env::temp_dir();
        let input_path = temp_dir.join(format!("ocr_page_{}.png", uuid::Uuid::new_v4()));
        let output_base = temp_dir.join(format!("ocr_out_{}", uuid::Uuid::new_v4()));

        tokio::fs::write(&input_path, png_data)
            .await
            .map_err(|e| OcrError::ProcessingError(format!("Failed to write temp file: {}", e)))?;

        let output = tokio::process::Command::new("tesseract")
            .arg(&input_path)
            .arg(&output_base)
            .arg("-l")
            .arg(&self.language)
            .arg("--oem")
            .arg("3")
            .arg("--psm")
            .arg("3")
            .arg("tsv")
            .output()
            .await;

        // Input temp file is no longer needed whatever happened
        let _ = tokio::fs::remove_file(&input_path).await;

        let output = output
            .map_err(|e| OcrError::ProcessingError(format!("Failed to run tesseract: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::ProcessingError(format!(
                "Tesseract failed: {}",
                stderr
            )));
        }

        let tsv_path = format!("{}.tsv", output_base.display());
        let tsv = tokio::fs::read_to_string(&tsv_path)
            .await
            .map_err(|e| OcrError::ProcessingError(format!("Failed to read output: {}", e)))?;
        let _ = tokio::fs::remove_file(&tsv_path).await;

        Ok(parse_tsv_lines(&tsv))
    }
}

/// One word row from Tesseract TSV output (level 5)
struct TsvWord {
    block: u32,
    par: u32,
    line: u32,
    left: f64,
    top: f64,
    width: f64,
    height: f64,
    conf: f64,
    text: String,
}

fn parse_tsv_word(row: &str) -> Option<TsvWord> {
    let cols: Vec<&str> = row.split('\t').collect();
    if cols.len() < 12 || cols[0] != "5" {
        return None;
    }
    let text = cols[11].trim();
    if text.is_empty() {
        return None;
    }
    Some(TsvWord {
        block: cols[2].parse().ok()?,
        par: cols[3].parse().ok()?,
        line: cols[4].parse().ok()?,
        left: cols[6].parse().ok()?,
        top: cols[7].parse().ok()?,
        width: cols[8].parse().ok()?,
        height: cols[9].parse().ok()?,
        conf: cols[10].parse().ok()?,
        text: text.to_string(),
    })
}

/// Group word rows into line detections.
///
/// Words sharing (block, paragraph, line) are joined with spaces and their
/// boxes unioned. Line confidence is the minimum word confidence, scaled
/// from Tesseract's 0-100 range to 0-1.
fn parse_tsv_lines(tsv: &str) -> Vec<RawDetection> {
    let mut lines: Vec<RawDetection> = Vec::new();
    let mut current_key: Option<(u32, u32, u32)> = None;
    let mut words: Vec<TsvWord> = Vec::new();

    let flush = |words: &mut Vec<TsvWord>, lines: &mut Vec<RawDetection>| {
        if words.is_empty() {
            return;
        }
        let text = words
            .iter()
            .map(|w| w.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let x1 = words.iter().map(|w| w.left).fold(f64::INFINITY, f64::min);
        let y1 = words.iter().map(|w| w.top).fold(f64::INFINITY, f64::min);
        let x2 = words
            .iter()
            .map(|w| w.left + w.width)
            .fold(f64::NEG_INFINITY, f64::max);
        let y2 = words
            .iter()
            .map(|w| w.top + w.height)
            .fold(f64::NEG_INFINITY, f64::max);
        let conf = words.iter().map(|w| w.conf).fold(f64::INFINITY, f64::min);
        lines.push(RawDetection {
            text,
            bbox: Some([x1, y1, x2, y2]),
            confidence: if conf >= 0.0 {
                Some(conf / 100.0)
            } else {
                None
            },
        });
        words.clear();
    };

    for row in tsv.lines().skip(1) {
        let Some(word) = parse_tsv_word(row) else {
            continue;
        };
        let key = (word.block, word.par, word.line);
        if current_key != Some(key) {
            flush(&mut words, &mut lines);
            current_key = Some(key);
        }
        words.push(word);
    }
    flush(&mut words, &mut lines);

    lines
}

/// Remote HTTP OCR engine.
///
/// Posts `{ "image": "<base64 png>" }` and expects
/// `{ "lines": [ { "text", "bbox": [x1,y1,x2,y2], "confidence" } ] }`.
pub struct RemoteHttpEngine {
    base_url: String,
    client: reqwest::Client,
}

impl RemoteHttpEngine {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl OcrEngine for RemoteHttpEngine {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn is_available(&self) -> bool {
        let url = format!("{}/health", self.base_url);
        match self.client.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    async fn detect(&self, png_data: &[u8]) -> Result<Vec<RawDetection>, OcrError> {
        use base64::Engine;

        let url = format!("{}/detect", self.base_url);
        let image_base64 = base64::engine::general_purpose::STANDARD.encode(png_data);

        let request = serde_json::json!({
            "image": image_base64,
        });

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| OcrError::ApiError(format!("Failed to call OCR endpoint: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(OcrError::ApiError(format!(
                "OCR endpoint returned {}: {}",
                status, body
            )));
        }

        #[derive(serde::Deserialize)]
        struct DetectResponse {
            #[serde(default)]
            lines: Vec<RawDetection>,
        }

        let result: DetectResponse = response
            .json()
            .await
            .map_err(|e| OcrError::ApiError(format!("Failed to parse response: {}", e)))?;

        Ok(result.lines)
    }
}

/// Mock engine for testing
#[cfg(test)]
pub struct MockEngine {
    pub detections: Vec<RawDetection>,
    pub available: bool,
}

#[cfg(test)]
#[async_trait]
impl OcrEngine for MockEngine {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn is_available(&self) -> bool {
        self.available
    }

    async fn detect(&self, _png_data: &[u8]) -> Result<Vec<RawDetection>, OcrError> {
        Ok(self.detections.clone())
    }
}
