//! Audio extraction from video containers.

use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{KirimeError, Result};
use crate::media::MediaCommand;
use crate::probe::MediaProber;
use crate::progress::ProgressReporter;
use crate::tools::ToolLocator;

pub struct AudioExtractor {
    tools: ToolLocator,
    prober: MediaProber,
}

impl AudioExtractor {
    pub fn new(tools: ToolLocator) -> Self {
        let prober = MediaProber::new(tools.clone());
        Self { tools, prober }
    }

    fn codec_for_format(format: &str) -> Result<&'static str> {
        match format.to_lowercase().as_str() {
            "mp3" => Ok("libmp3lame"),
            "wav" => Ok("pcm_s16le"),
            "aac" => Ok("aac"),
            "flac" => Ok("flac"),
            other => Err(KirimeError::UnsupportedFormat(format!(
                "audio format '{}' not supported",
                other
            ))),
        }
    }

    fn ensure_parent_dir(output_path: &Path) -> Result<()> {
        if let Some(parent) = output_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }

    /// Extract the full audio track of a video into `output_path`.
    pub async fn extract_audio(
        &self,
        video_path: &Path,
        output_path: &Path,
        format: &str,
        progress: &ProgressReporter,
    ) -> Result<PathBuf> {
        let codec = Self::codec_for_format(format)?;

        self.tools.require().await?;
        progress.report(10);

        if !video_path.is_file() {
            return Err(KirimeError::FileNotFound(video_path.display().to_string()));
        }

        // NoAudioStream propagates distinctly here.
        self.prober.probe_streams(video_path).await?;
        progress.report(30);

        Self::ensure_parent_dir(output_path)?;
        progress.report(50);

        MediaCommand::new(self.tools.ffmpeg(), "Audio extraction")
            .input(video_path)
            .no_video()
            .audio_codec(codec)
            .overwrite()
            .output(output_path)
            .execute()
            .await?;

        progress.report(100);
        info!("Extracted audio: {}", output_path.display());
        Ok(output_path.to_path_buf())
    }

    /// Extract a bounded time range of the audio track.
    pub async fn extract_segment(
        &self,
        video_path: &Path,
        output_path: &Path,
        start_time: f64,
        end_time: f64,
        progress: &ProgressReporter,
    ) -> Result<PathBuf> {
        self.tools.require().await?;
        progress.report(10);

        if !video_path.is_file() {
            return Err(KirimeError::FileNotFound(video_path.display().to_string()));
        }

        let descriptor = self.prober.probe_streams(video_path).await?;
        progress.report(30);

        if start_time < 0.0 || end_time > descriptor.duration || start_time >= end_time {
            return Err(KirimeError::InvalidTimeRange(format!(
                "{:.2}s - {:.2}s outside [0, {:.2}s]",
                start_time, end_time, descriptor.duration
            )));
        }

        Self::ensure_parent_dir(output_path)?;
        progress.report(50);

        MediaCommand::new(self.tools.ffmpeg(), "Audio segment extraction")
            .seek_before_input(start_time)
            .input(video_path)
            .duration(end_time - start_time)
            .no_video()
            .overwrite()
            .output(output_path)
            .execute()
            .await?;

        progress.report(100);
        info!(
            "Extracted audio segment {:.2}s-{:.2}s: {}",
            start_time,
            end_time,
            output_path.display()
        );
        Ok(output_path.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codec_for_format() {
        assert_eq!(AudioExtractor::codec_for_format("mp3").unwrap(), "libmp3lame");
        assert_eq!(AudioExtractor::codec_for_format("WAV").unwrap(), "pcm_s16le");
        assert!(matches!(
            AudioExtractor::codec_for_format("wma"),
            Err(KirimeError::UnsupportedFormat(_))
        ));
    }
}
