use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum FolioError {
    #[error("PDF extraction failed: {0}")]
    Extraction(String),

    #[error("pdftotext not found. Install poppler: brew install poppler (macOS) or apt install poppler-utils (Linux)")]
    PdftotextNotFound,

    #[error("pdftotext failed with exit code {code}: {stderr}")]
    PdftotextFailed { code: i32, stderr: String },

    #[error("failed to load template from {path}: {reason}")]
    TemplateLoad { path: PathBuf, reason: String },

    #[error("invalid template: {}", .0.join("; "))]
    TemplateInvalid(Vec<String>),

    #[error("unknown template preset '{name}'. Available: {available}")]
    UnknownPreset { name: String, available: String },

    #[error("headless browser not found. Install Chrome or Chromium, or pass its path explicitly")]
    BrowserNotFound,

    #[error("{0}")]
    Rasterization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FolioError {
    /// Wrap a rasterization failure with the stage that produced it.
    pub fn generation_failed(stage: &str, reason: impl std::fmt::Display) -> Self {
        FolioError::Rasterization(format!("{stage} generation failed: {reason}"))
    }
}
