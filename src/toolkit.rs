//! Unified facade over all media operations.
//!
//! `MediaToolkit` composes the splitters, remuxer, extractor, prober and
//! transcriber behind one object. Every public operation returns an
//! `OperationOutcome`; errors never cross this boundary, they are folded into
//! the outcome and logged.

use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::config::Config;
use crate::extract::AudioExtractor;
use crate::outcome::{BatchOutcome, BatchRow, OperationOutcome};
use crate::probe::MediaProber;
use crate::progress::{CancelToken, ProgressReporter};
use crate::remux::Remuxer;
use crate::split::{AudioSplitter, VideoSplitter};
use crate::subtitle::SubtitleFormat;
use crate::tools::ToolLocator;
use crate::transcribe::Transcriber;

/// One job of a batch split: input file plus its split points and target dir.
#[derive(Debug, Clone)]
pub struct SplitJob {
    pub input: PathBuf,
    pub points: Vec<String>,
    pub output_dir: PathBuf,
}

/// One job of a batch extraction.
#[derive(Debug, Clone)]
pub struct ExtractJob {
    pub input: PathBuf,
    pub output: PathBuf,
    pub format: String,
}

pub struct MediaToolkit {
    tools: ToolLocator,
    video_splitter: VideoSplitter,
    audio_splitter: AudioSplitter,
    remuxer: Remuxer,
    extractor: AudioExtractor,
    prober: MediaProber,
    transcriber: Transcriber,
}

impl MediaToolkit {
    pub fn new(config: &Config) -> Self {
        let tools = ToolLocator::discover(&config.tools);
        Self {
            video_splitter: VideoSplitter::new(tools.clone(), &config.media),
            audio_splitter: AudioSplitter::new(tools.clone()),
            remuxer: Remuxer::new(tools.clone()),
            extractor: AudioExtractor::new(tools.clone()),
            prober: MediaProber::new(tools.clone()),
            transcriber: Transcriber::new(config.transcriber.clone(), tools.clone()),
            tools,
        }
    }

    pub fn tools(&self) -> &ToolLocator {
        &self.tools
    }

    fn fold<T>(
        result: crate::error::Result<T>,
        on_ok: impl FnOnce(T) -> OperationOutcome,
    ) -> OperationOutcome {
        match result {
            Ok(value) => on_ok(value),
            Err(e) => {
                error!("Operation failed: {}", e);
                OperationOutcome::failed(&e)
            }
        }
    }

    pub async fn split_video(
        &self,
        video_path: &Path,
        points: &[String],
        output_dir: &Path,
        progress: &ProgressReporter,
        cancel: &CancelToken,
    ) -> OperationOutcome {
        let result = self
            .video_splitter
            .segment(video_path, points, output_dir, progress, cancel)
            .await;
        Self::fold(result, |files| {
            OperationOutcome::ok()
                .with_message(format!("split into {} segments", files.len()))
                .with_output_files(files)
        })
    }

    pub async fn split_audio(
        &self,
        audio_path: &Path,
        points: &[String],
        output_dir: &Path,
        progress: &ProgressReporter,
        cancel: &CancelToken,
    ) -> OperationOutcome {
        let result = self
            .audio_splitter
            .segment(audio_path, points, output_dir, progress, cancel)
            .await;
        Self::fold(result, |files| {
            OperationOutcome::ok()
                .with_message(format!("split into {} segments", files.len()))
                .with_output_files(files)
        })
    }

    pub async fn extract_audio(
        &self,
        video_path: &Path,
        output_path: &Path,
        format: &str,
        progress: &ProgressReporter,
    ) -> OperationOutcome {
        let result = self
            .extractor
            .extract_audio(video_path, output_path, format, progress)
            .await;
        Self::fold(result, |file| OperationOutcome::ok().with_output_file(file))
    }

    pub async fn extract_audio_segment(
        &self,
        video_path: &Path,
        output_path: &Path,
        start: f64,
        end: f64,
        progress: &ProgressReporter,
    ) -> OperationOutcome {
        let result = self
            .extractor
            .extract_segment(video_path, output_path, start, end, progress)
            .await;
        Self::fold(result, |file| OperationOutcome::ok().with_output_file(file))
    }

    pub async fn merge(
        &self,
        video_path: &Path,
        audio_path: &Path,
        output_path: &Path,
        replace_audio: bool,
        progress: &ProgressReporter,
    ) -> OperationOutcome {
        let result = self
            .remuxer
            .merge(video_path, audio_path, output_path, replace_audio, progress)
            .await;
        Self::fold(result, |file| OperationOutcome::ok().with_output_file(file))
    }

    pub async fn replace_audio(
        &self,
        video_path: &Path,
        audio_path: &Path,
        output_path: &Path,
        progress: &ProgressReporter,
    ) -> OperationOutcome {
        let result = self
            .remuxer
            .replace_audio(video_path, audio_path, output_path, progress)
            .await;
        Self::fold(result, |file| OperationOutcome::ok().with_output_file(file))
    }

    pub async fn remove_audio(
        &self,
        video_path: &Path,
        output_path: &Path,
        progress: &ProgressReporter,
    ) -> OperationOutcome {
        let result = self.remuxer.remove_audio(video_path, output_path, progress).await;
        Self::fold(result, |file| OperationOutcome::ok().with_output_file(file))
    }

    pub async fn transcribe(
        &self,
        audio_path: &Path,
        output_path: &Path,
        model_size: &str,
        progress: &ProgressReporter,
    ) -> OperationOutcome {
        let result = self
            .transcriber
            .transcribe(audio_path, output_path, model_size, progress)
            .await;
        Self::fold(result, |text| {
            OperationOutcome::ok()
                .with_output_file(output_path.to_path_buf())
                .with_text(text)
        })
    }

    pub async fn transcribe_to_subtitle(
        &self,
        audio_path: &Path,
        output_path: &Path,
        model_size: &str,
        format: SubtitleFormat,
        progress: &ProgressReporter,
    ) -> OperationOutcome {
        let result = self
            .transcriber
            .transcribe_to_subtitle(audio_path, output_path, model_size, format, progress)
            .await;
        Self::fold(result, |(text, subtitle_path)| {
            OperationOutcome::ok().with_text(text).with_subtitle(subtitle_path)
        })
    }

    pub async fn probe(&self, path: &Path) -> OperationOutcome {
        if !path.is_file() {
            return OperationOutcome::failed(&crate::error::KirimeError::FileNotFound(
                path.display().to_string(),
            ));
        }
        let result = self.prober.probe_streams_optional_audio(path).await;
        Self::fold(result, |descriptor| {
            let text = serde_json::to_string_pretty(&descriptor)
                .unwrap_or_else(|_| format!("{:?}", descriptor));
            OperationOutcome::ok()
                .with_message(format!("duration {:.2}s", descriptor.duration))
                .with_text(text)
        })
    }

    /// Split each listed video in turn. Failures do not abort the batch.
    pub async fn batch_split_videos(
        &self,
        jobs: &[SplitJob],
        progress: &ProgressReporter,
        cancel: &CancelToken,
    ) -> BatchOutcome {
        let total = jobs.len();
        let mut rows = Vec::with_capacity(total);

        for (i, job) in jobs.iter().enumerate() {
            info!("Batch split {}/{}: {}", i + 1, total, job.input.display());
            let outcome = self
                .split_video(&job.input, &job.points, &job.output_dir, &ProgressReporter::none(), cancel)
                .await;
            rows.push(BatchRow {
                input: job.input.clone(),
                success: outcome.success,
                output_files: outcome.output_files,
                output_file: None,
                error: outcome.error,
            });
            progress.report((((i + 1) * 100) / total) as u8);

            if cancel.is_cancelled() {
                break;
            }
        }

        BatchOutcome::from_rows(rows)
    }

    /// Extract the audio track of each listed video in turn.
    pub async fn batch_extract_audio(
        &self,
        jobs: &[ExtractJob],
        progress: &ProgressReporter,
        cancel: &CancelToken,
    ) -> BatchOutcome {
        let total = jobs.len();
        let mut rows = Vec::with_capacity(total);

        for (i, job) in jobs.iter().enumerate() {
            info!("Batch extract {}/{}: {}", i + 1, total, job.input.display());
            let outcome = self
                .extract_audio(&job.input, &job.output, &job.format, &ProgressReporter::none())
                .await;
            rows.push(BatchRow {
                input: job.input.clone(),
                success: outcome.success,
                output_files: None,
                output_file: outcome.output_file,
                error: outcome.error,
            });
            progress.report((((i + 1) * 100) / total) as u8);

            if cancel.is_cancelled() {
                break;
            }
        }

        BatchOutcome::from_rows(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn toolkit_with_missing_tools() -> MediaToolkit {
        let mut config = Config::default();
        config.tools.ffmpeg_path = Some("/nonexistent/ffmpeg-binary".to_string());
        config.tools.ffprobe_path = Some("/nonexistent/ffprobe-binary".to_string());
        MediaToolkit::new(&config)
    }

    #[tokio::test]
    async fn test_split_video_folds_error_into_outcome() {
        let toolkit = toolkit_with_missing_tools();
        let dir = tempfile::tempdir().unwrap();
        let outcome = toolkit
            .split_video(
                Path::new("/nonexistent/input.mp4"),
                &["00:00:30".to_string()],
                dir.path(),
                &ProgressReporter::none(),
                &CancelToken::new(),
            )
            .await;
        assert!(!outcome.success);
        assert!(outcome.error.is_some());
    }

    #[tokio::test]
    async fn test_probe_missing_file() {
        let toolkit = toolkit_with_missing_tools();
        let outcome = toolkit.probe(Path::new("/nonexistent/clip.mp4")).await;
        assert!(!outcome.success);
    }

    #[tokio::test]
    async fn test_batch_split_counts_failures() {
        let toolkit = toolkit_with_missing_tools();
        let dir = tempfile::tempdir().unwrap();
        let jobs = vec![
            SplitJob {
                input: PathBuf::from("/nonexistent/a.mp4"),
                points: vec!["00:00:10".to_string()],
                output_dir: dir.path().to_path_buf(),
            },
            SplitJob {
                input: PathBuf::from("/nonexistent/b.mp4"),
                points: vec!["00:00:10".to_string()],
                output_dir: dir.path().to_path_buf(),
            },
        ];
        let batch = toolkit
            .batch_split_videos(&jobs, &ProgressReporter::none(), &CancelToken::new())
            .await;
        assert!(!batch.success);
        assert_eq!(batch.total, 2);
        assert_eq!(batch.failed, 2);
        assert_eq!(batch.rows.len(), 2);
    }

    #[tokio::test]
    async fn test_batch_progress_reaches_100() {
        let toolkit = toolkit_with_missing_tools();
        let dir = tempfile::tempdir().unwrap();
        let jobs = vec![ExtractJob {
            input: PathBuf::from("/nonexistent/a.mp4"),
            output: dir.path().join("a.mp3"),
            format: "mp3".to_string(),
        }];
        let seen = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        let progress = ProgressReporter::new(move |p| {
            seen_clone.lock().unwrap().push(p);
        });
        toolkit
            .batch_extract_audio(&jobs, &progress, &CancelToken::new())
            .await;
        assert_eq!(*seen.lock().unwrap(), vec![100]);
    }
}
