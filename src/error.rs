use thiserror::Error;

#[derive(Error, Debug)]
pub enum KirimeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("External tool unavailable: {0}")]
    ToolUnavailable(String),

    #[error("Probe failed: {0}")]
    ProbeFailure(String),

    #[error("No audio stream: {0}")]
    NoAudioStream(String),

    #[error("Invalid time range: {0}")]
    InvalidTimeRange(String),

    #[error("Output directory not writable: {0}")]
    PermissionDenied(String),

    #[error("External process timed out: {0}")]
    ProcessTimeout(String),

    #[error("External process failed: {0}")]
    ProcessFailure(String),

    #[error("Missing dependency: {0}")]
    DependencyMissing(String),

    #[error("Transcription failed: {0}")]
    InferenceFailure(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File not found: {0}")]
    FileNotFound(String),
}

pub type Result<T> = std::result::Result<T, KirimeError>;
