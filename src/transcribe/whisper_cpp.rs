//! whisper.cpp backend: drives the `whisper-cli` binary against local ggml
//! model files downloaded by the setup flow.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use crate::error::{KirimeError, Result};
use crate::setup::models_dir;

use super::{LoadedModel, Transcript, TranscriptSegment, TranscribeBackend};

pub struct WhisperCppBackend {
    binary: String,
}

/// whisper.cpp `-oj` output: offsets are integer milliseconds.
#[derive(Debug, Deserialize)]
struct WhisperCppOutput {
    transcription: Vec<WhisperCppSegment>,
}

#[derive(Debug, Deserialize)]
struct WhisperCppSegment {
    offsets: WhisperCppOffsets,
    text: String,
}

#[derive(Debug, Deserialize)]
struct WhisperCppOffsets {
    from: u64,
    to: u64,
}

impl WhisperCppBackend {
    pub fn new(binary: String) -> Self {
        Self { binary }
    }

    fn model_path(size: &str) -> PathBuf {
        models_dir().join(format!("ggml-{}.bin", size))
    }
}

#[async_trait]
impl TranscribeBackend for WhisperCppBackend {
    async fn load_model(&self, size: &str) -> Result<LoadedModel> {
        let model_path = Self::model_path(size);
        if !model_path.is_file() {
            return Err(KirimeError::DependencyMissing(format!(
                "ggml model '{}' not found at {} (run `kirime models --download {}`)",
                size,
                model_path.display(),
                size
            )));
        }
        debug!("Resolved ggml model: {}", model_path.display());
        Ok(LoadedModel {
            size: size.to_string(),
            model_ref: model_path.display().to_string(),
        })
    }

    async fn transcribe(
        &self,
        model: &LoadedModel,
        audio_path: &Path,
        language: &str,
        beam_size: u32,
    ) -> Result<Transcript> {
        info!("Running whisper.cpp transcription of: {}", audio_path.display());

        let temp_dir = tempfile::tempdir()?;
        let output_prefix = temp_dir.path().join("transcript");

        let output = Command::new(&self.binary)
            .arg("-m")
            .arg(&model.model_ref)
            .arg("-f")
            .arg(audio_path)
            .arg("-l")
            .arg(language)
            .arg("--beam-size")
            .arg(beam_size.to_string())
            .arg("-oj")
            .arg("-of")
            .arg(&output_prefix)
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
                "whisper-cli exited with {}: {}",
                output.status, stderr
            )));
        }

        let json_file = output_prefix.with_extension("json");
        let json_content = std::fs::read_to_string(&json_file).map_err(|e| {
            KirimeError::InferenceFailure(format!("whisper-cli JSON output missing: {}", e))
        })?;
        let parsed: WhisperCppOutput = serde_json::from_str(&json_content)
            .map_err(|e| KirimeError::InferenceFailure(format!("malformed whisper-cli JSON: {}", e)))?;

        let segments = parsed
            .transcription
            .into_iter()
            .map(|seg| TranscriptSegment {
                start: seg.offsets.from as f64 / 1000.0,
                end: seg.offsets.to as f64 / 1000.0,
                text: seg.text,
            })
            .collect();

        Ok(Transcript { segments })
    }
}
