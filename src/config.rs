use serde::{Deserialize, Serialize};
use std::path::Path;
use crate::error::{KirimeError, Result};

fn default_language_hint() -> String {
    "zh".to_string()
}

fn default_beam_size() -> u32 {
    5
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub tools: ToolsConfig,
    pub media: MediaConfig,
    pub transcriber: TranscriberConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Explicit ffmpeg path; overrides colocated and PATH lookup when set
    pub ffmpeg_path: Option<String>,
    /// Explicit ffprobe path; overrides colocated and PATH lookup when set
    pub ffprobe_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Additional encoding options appended to re-encode invocations
    /// Common options: ["-preset", "medium", "-crf", "23", "-pix_fmt", "yuv420p"]
    pub encode_options: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriberConfig {
    /// Backend selection: WhisperCpp or OpenAi
    pub backend: TranscriberBackendKind,
    /// Path to whisper-cli binary (whisper.cpp backend)
    pub whisper_cpp_binary: String,
    /// Path to the Python whisper CLI (OpenAI backend)
    pub openai_binary: String,
    /// Default model size (tiny, base, small, medium, large)
    pub default_model: String,
    /// Language hint passed to the model
    #[serde(default = "default_language_hint")]
    pub language: String,
    /// Beam search width
    #[serde(default = "default_beam_size")]
    pub beam_size: u32,
    /// Convert traditional Chinese output to simplified
    pub simplify_script: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TranscriberBackendKind {
    /// whisper.cpp whisper-cli with local ggml model files
    WhisperCpp,
    /// OpenAI Whisper Python CLI
    OpenAi,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: None,
            ffprobe_path: None,
        }
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            encode_options: vec![],
        }
    }
}

impl Default for TranscriberConfig {
    fn default() -> Self {
        Self {
            backend: TranscriberBackendKind::WhisperCpp,
            whisper_cpp_binary: "whisper-cli".to_string(),
            openai_binary: "whisper".to_string(),
            default_model: "base".to_string(),
            language: default_language_hint(),
            beam_size: default_beam_size(),
            simplify_script: true,
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| KirimeError::Config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| KirimeError::Config(format!("Failed to parse config file: {}", e)))
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| KirimeError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| KirimeError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_round_trip() {
        let config = Config::default();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        config.save_to_file(&path).unwrap();
        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.transcriber.default_model, "base");
        assert_eq!(loaded.transcriber.language, "zh");
        assert_eq!(loaded.transcriber.beam_size, 5);
    }
}
