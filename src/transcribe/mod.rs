// Transcription backends behind one capability trait.
//
// Two interchangeable implementations exist: whisper.cpp's whisper-cli with
// local ggml models, and the OpenAI Whisper Python CLI. Both produce the same
// abstract Transcript. The loaded-model state is process-wide and guarded by
// a mutex so concurrent calls with different sizes cannot interleave loads.

pub mod normalize;
pub mod openai;
pub mod whisper_cpp;

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::{TranscriberBackendKind, TranscriberConfig};
use crate::error::{KirimeError, Result};
use crate::media::MediaCommand;
use crate::progress::ProgressReporter;
use crate::subtitle::{force_extension, render, SubtitleFormat};
use crate::tools::ToolLocator;

pub use normalize::ScriptNormalizer;

/// One timestamped piece of recognized speech.
#[derive(Debug, Clone)]
pub struct TranscriptSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

/// Full transcription result. Zero segments is a legitimate outcome for
/// silent input, not an error.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    pub segments: Vec<TranscriptSegment>,
}

impl Transcript {
    pub fn joined_text(&self) -> String {
        self.segments.iter().map(|s| s.text.as_str()).collect()
    }
}

/// Handle for a model resolved by a backend's `load_model`.
#[derive(Debug, Clone)]
pub struct LoadedModel {
    pub size: String,
    pub model_ref: String,
}

/// Capability interface for speech-to-text engines.
#[async_trait]
pub trait TranscribeBackend: Send + Sync {
    /// Resolve and validate the model for `size`. Missing binaries or model
    /// files are reported as `DependencyMissing` before any inference starts.
    async fn load_model(&self, size: &str) -> Result<LoadedModel>;

    /// Run inference on a preprocessed audio file.
    async fn transcribe(
        &self,
        model: &LoadedModel,
        audio_path: &Path,
        language: &str,
        beam_size: u32,
    ) -> Result<Transcript>;
}

pub struct TranscribeBackendFactory;

impl TranscribeBackendFactory {
    pub fn create(config: &TranscriberConfig) -> Box<dyn TranscribeBackend> {
        match config.backend {
            TranscriberBackendKind::WhisperCpp => {
                Box::new(whisper_cpp::WhisperCppBackend::new(config.whisper_cpp_binary.clone()))
            }
            TranscriberBackendKind::OpenAi => {
                Box::new(openai::OpenAiWhisperBackend::new(config.openai_binary.clone()))
            }
        }
    }
}

/// Process-wide model cache: `{Unloaded} --load(size)--> {Loaded(size)}`.
/// A request with the cached size reuses the model; a different size evicts
/// and reloads. The mutex is held across inference so eviction can never race
/// an in-flight call.
pub struct TranscriptionSession {
    backend: Box<dyn TranscribeBackend>,
    loaded: Mutex<Option<LoadedModel>>,
}

impl TranscriptionSession {
    pub fn new(backend: Box<dyn TranscribeBackend>) -> Self {
        Self {
            backend,
            loaded: Mutex::new(None),
        }
    }

    /// Resolve the model up front so a missing model file or backend binary
    /// surfaces before any other work is attempted.
    pub async fn ensure_loaded(&self, model_size: &str) -> Result<()> {
        let mut guard = self.loaded.lock().await;
        Self::load_if_needed(self.backend.as_ref(), &mut guard, model_size).await
    }

    pub async fn transcribe(
        &self,
        model_size: &str,
        audio_path: &Path,
        language: &str,
        beam_size: u32,
    ) -> Result<Transcript> {
        let mut guard = self.loaded.lock().await;
        Self::load_if_needed(self.backend.as_ref(), &mut guard, model_size).await?;

        let model = guard
            .as_ref()
            .ok_or_else(|| KirimeError::DependencyMissing("speech model not loaded".to_string()))?;

        self.backend.transcribe(model, audio_path, language, beam_size).await
    }

    async fn load_if_needed(
        backend: &dyn TranscribeBackend,
        loaded: &mut Option<LoadedModel>,
        model_size: &str,
    ) -> Result<()> {
        let reuse = loaded
            .as_ref()
            .map(|m| m.size == model_size)
            .unwrap_or(false);
        if !reuse {
            info!("Loading speech model: {}", model_size);
            *loaded = Some(backend.load_model(model_size).await?);
        } else {
            debug!("Reusing loaded speech model: {}", model_size);
        }
        Ok(())
    }
}

/// Extensions the backends consume directly; everything else is transcoded
/// to a temp WAV first.
const SUPPORTED_EXTENSIONS: [&str; 5] = ["mp3", "wav", "m4a", "flac", "ogg"];

/// Deletes the preprocessing temp file whether the operation succeeds or not.
struct TempGuard(Option<PathBuf>);

impl Drop for TempGuard {
    fn drop(&mut self) {
        if let Some(path) = self.0.take() {
            if let Err(e) = std::fs::remove_file(&path) {
                warn!("Failed to remove temp file {}: {}", path.display(), e);
            } else {
                debug!("Removed temp file {}", path.display());
            }
        }
    }
}

/// High-level transcriber: preprocessing, inference, script normalization and
/// output rendering.
pub struct Transcriber {
    session: TranscriptionSession,
    tools: ToolLocator,
    config: TranscriberConfig,
    normalizer: Option<ScriptNormalizer>,
}

impl Transcriber {
    pub fn new(config: TranscriberConfig, tools: ToolLocator) -> Self {
        let backend = TranscribeBackendFactory::create(&config);
        let normalizer = if config.simplify_script {
            Some(ScriptNormalizer::new())
        } else {
            None
        };
        Self {
            session: TranscriptionSession::new(backend),
            tools,
            config,
            normalizer,
        }
    }

    /// Transcribe to plain text, written to `output_path`.
    pub async fn transcribe(
        &self,
        audio_path: &Path,
        output_path: &Path,
        model_size: &str,
        progress: &ProgressReporter,
    ) -> Result<String> {
        progress.report(10);
        let transcript = self.run_inference(audio_path, model_size, progress).await?;

        let mut text = transcript.joined_text();
        if let Some(normalizer) = &self.normalizer {
            text = normalizer.convert(&text);
        }

        Self::ensure_parent_dir(output_path)?;
        std::fs::write(output_path, &text)?;
        progress.report(100);
        info!("Transcription written to {}", output_path.display());
        Ok(text)
    }

    /// Transcribe to a subtitle file; the output extension is forced to match
    /// the requested format.
    pub async fn transcribe_to_subtitle(
        &self,
        audio_path: &Path,
        output_path: &Path,
        model_size: &str,
        format: SubtitleFormat,
        progress: &ProgressReporter,
    ) -> Result<(String, PathBuf)> {
        progress.report(10);
        let transcript = self.run_inference(audio_path, model_size, progress).await?;

        let mut subtitle = render(&transcript.segments, format);
        if let Some(normalizer) = &self.normalizer {
            subtitle = normalizer.convert_subtitle(&subtitle);
        }

        let output_path = force_extension(output_path, format);
        Self::ensure_parent_dir(&output_path)?;
        std::fs::write(&output_path, &subtitle)?;
        progress.report(100);
        info!("Subtitle written to {}", output_path.display());
        Ok((subtitle, output_path))
    }

    async fn run_inference(
        &self,
        audio_path: &Path,
        model_size: &str,
        progress: &ProgressReporter,
    ) -> Result<Transcript> {
        if !audio_path.is_file() {
            return Err(KirimeError::FileNotFound(audio_path.display().to_string()));
        }
        progress.report(20);

        // Model availability comes before preprocessing: a missing model must
        // not cost the caller an ffmpeg transcode.
        self.session.ensure_loaded(model_size).await?;
        progress.report(30);

        let (input_path, _temp) = self.preprocess(audio_path).await?;
        progress.report(50);

        let transcript = self
            .session
            .transcribe(model_size, &input_path, &self.config.language, self.config.beam_size)
            .await?;
        progress.report(70);

        Ok(transcript)
    }

    /// Transcode unsupported containers to a sibling temp WAV. The returned
    /// guard removes the temp file on drop, success or failure alike.
    async fn preprocess(&self, audio_path: &Path) -> Result<(PathBuf, TempGuard)> {
        let extension = audio_path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        if SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
            return Ok((audio_path.to_path_buf(), TempGuard(None)));
        }

        self.tools.require().await?;

        let temp_path = audio_path.with_extension("kirime_temp.wav");
        info!("Converting '{}' input to WAV: {}", extension, temp_path.display());

        // 16 kHz mono is what the whisper backends expect.
        MediaCommand::new(self.tools.ffmpeg(), "Audio preprocessing")
            .input(audio_path)
            .no_video()
            .audio_codec("pcm_s16le")
            .audio_sample_rate(16000)
            .audio_channels(1)
            .overwrite()
            .output(&temp_path)
            .execute()
            .await?;

        Ok((temp_path.clone(), TempGuard(Some(temp_path))))
    }

    fn ensure_parent_dir(output_path: &Path) -> Result<()> {
        if let Some(parent) = output_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }
}
