//! OpenAI Whisper backend: drives the Python `whisper` command-line tool and
//! parses its JSON output directory.

use serde::Deserialize;
use std::path::Path;
use std::process::Stdio;
use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use crate::error::{KirimeError, Result};

use super::{LoadedModel, Transcript, TranscriptSegment, TranscribeBackend};

const KNOWN_SIZES: [&str; 5] = ["tiny", "base", "small", "medium", "large"];

pub struct OpenAiWhisperBackend {
    binary: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiOutput {
    #[serde(default)]
    segments: Vec<OpenAiSegment>,
}

#[derive(Debug, Deserialize)]
struct OpenAiSegment {
    start: f64,
    end: f64,
    text: String,
}

impl OpenAiWhisperBackend {
    pub fn new(binary: String) -> Self {
        Self { binary }
    }
}

#[async_trait]
impl TranscribeBackend for OpenAiWhisperBackend {
    /// The Python tool manages its own model downloads; loading here only
    /// validates the size name and the binary.
    async fn load_model(&self, size: &str) -> Result<LoadedModel> {
        if !KNOWN_SIZES.contains(&size) {
            return Err(KirimeError::DependencyMissing(format!(
                "unknown model size '{}' (expected one of {:?})",
                size, KNOWN_SIZES
            )));
        }

        let output = Command::new(&self.binary)
            .arg("--help")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                KirimeError::DependencyMissing(format!(
                    "'{}' command not found (install with: pip install openai-whisper): {}",
                    self.binary, e
                ))
            })?;
        if !output.status.success() {
            return Err(KirimeError::DependencyMissing(format!(
                "'{}' command is not functional",
                self.binary
            )));
        }

        debug!("OpenAI Whisper tool available, model size: {}", size);
        Ok(LoadedModel {
            size: size.to_string(),
            model_ref: size.to_string(),
        })
    }

    async fn transcribe(
        &self,
        model: &LoadedModel,
        audio_path: &Path,
        language: &str,
        beam_size: u32,
    ) -> Result<Transcript> {
        info!("Running OpenAI Whisper transcription of: {}", audio_path.display());

        let temp_dir = tempfile::tempdir()?;

        let output = Command::new(&self.binary)
            .arg(audio_path)
            .arg("--model")
            .arg(&model.model_ref)
            .arg("--language")
            .arg(language)
            .arg("--beam_size")
            .arg(beam_size.to_string())
            .arg("--output_format")
            .arg("json")
            .arg("--output_dir")
            .arg(temp_dir.path())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                KirimeError::DependencyMissing(format!(
                    "cannot execute '{}': {}",
                    self.binary, e
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(KirimeError::InferenceFailure(format!(
                "whisper exited with {}: {}",
                output.status, stderr
            )));
        }

        let stem = audio_path
            .file_stem()
            .ok_or_else(|| KirimeError::InferenceFailure("invalid audio filename".to_string()))?;
        let json_file = temp_dir
            .path()
            .join(format!("{}.json", stem.to_string_lossy()));
        let json_content = std::fs::read_to_string(&json_file).map_err(|e| {
            KirimeError::InferenceFailure(format!("whisper JSON output missing: {}", e))
        })?;
        let parsed: OpenAiOutput = serde_json::from_str(&json_content)
            .map_err(|e| KirimeError::InferenceFailure(format!("malformed whisper JSON: {}", e)))?;

        let segments = parsed
            .segments
            .into_iter()
            .map(|seg| TranscriptSegment {
                start: seg.start,
                end: seg.end,
                text: seg.text,
            })
            .collect();

        Ok(Transcript { segments })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_openai_json() {
        let json = r#"{
            "text": "你好世界",
            "segments": [
                {"id": 0, "start": 0.0, "end": 2.5, "text": "你好"},
                {"id": 1, "start": 2.5, "end": 4.0, "text": "世界"}
            ],
            "language": "zh"
        }"#;
        let parsed: OpenAiOutput = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.segments.len(), 2);
        assert_eq!(parsed.segments[1].start, 2.5);
    }

    #[test]
    fn test_parse_openai_json_without_segments() {
        let parsed: OpenAiOutput = serde_json::from_str(r#"{"text": ""}"#).unwrap();
        assert!(parsed.segments.is_empty());
    }

    #[tokio::test]
    async fn test_load_model_rejects_unknown_size() {
        let backend = OpenAiWhisperBackend::new("whisper".to_string());
        let result = backend.load_model("gigantic").await;
        assert!(matches!(result, Err(KirimeError::DependencyMissing(_))));
    }

    #[tokio::test]
    async fn test_load_model_missing_binary() {
        let backend = OpenAiWhisperBackend::new("/nonexistent/whisper".to_string());
        let result = backend.load_model("base").await;
        assert!(matches!(result, Err(KirimeError::DependencyMissing(_))));
    }
}
