//! Stream remuxing: merging, replacing and stripping audio tracks.
//!
//! Merge runs a primary path that probes both inputs and clamps the new audio
//! to the video's duration, re-encoding with fixed codecs. When the primary
//! invocation fails, a fallback path copies the video stream untouched and
//! lets `-shortest` settle the duration. Timeout expiry is reported
//! separately from a non-zero exit.

use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::{KirimeError, Result};
use crate::media::MediaCommand;
use crate::probe::MediaProber;
use crate::progress::ProgressReporter;
use crate::tools::ToolLocator;

const AMIX_GRAPH: &str = "[0:a][1:a]amix=inputs=2[a]";

pub struct Remuxer {
    tools: ToolLocator,
    prober: MediaProber,
}

impl Remuxer {
    pub fn new(tools: ToolLocator) -> Self {
        let prober = MediaProber::new(tools.clone());
        Self { tools, prober }
    }

    fn require_inputs(video_path: &Path, audio_path: &Path) -> Result<()> {
        for path in [video_path, audio_path] {
            if !path.is_file() {
                return Err(KirimeError::FileNotFound(path.display().to_string()));
            }
        }
        Ok(())
    }

    fn ensure_parent_dir(output_path: &Path) -> Result<()> {
        if let Some(parent) = output_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }

    /// Combine one video and one audio stream into `output_path`.
    ///
    /// `replace_audio` swaps the track entirely; otherwise the new audio is
    /// mixed additively over the original with no gain normalization.
    pub async fn merge(
        &self,
        video_path: &Path,
        audio_path: &Path,
        output_path: &Path,
        replace_audio: bool,
        progress: &ProgressReporter,
    ) -> Result<PathBuf> {
        self.tools.require().await?;
        progress.report(10);

        Self::require_inputs(video_path, audio_path)?;
        progress.report(20);
        Self::ensure_parent_dir(output_path)?;

        let video = self.prober.probe_streams_optional_audio(video_path).await?;
        let audio_duration = self.prober.probe_duration(audio_path).await?;
        progress.report(40);

        // Audio longer than video gets truncated; shorter audio plays out
        // and the tail stays silent rather than being padded.
        let clamp = if audio_duration > video.duration {
            Some(video.duration)
        } else {
            if audio_duration < video.duration {
                warn!(
                    "Audio ({:.2}s) shorter than video ({:.2}s); no padding applied",
                    audio_duration, video.duration
                );
            }
            None
        };

        // Mixing needs an original audio track; without one the merge
        // degenerates to a plain replace.
        let mix = !replace_audio && video.has_audio;

        let mut primary = MediaCommand::new(self.tools.ffmpeg(), "Merge (primary)")
            .input(video_path)
            .input(audio_path);
        if let Some(limit) = clamp {
            primary = primary.duration(limit);
        }
        if mix {
            primary = primary.filter_complex(AMIX_GRAPH).map("0:v:0").map("[a]");
        } else {
            primary = primary.map("0:v:0").map("1:a:0");
        }
        let primary = primary
            .video_codec("libx264")
            .audio_codec("aac")
            .overwrite()
            .output(output_path);

        progress.report(60);

        match primary.execute().await {
            Ok(()) => {}
            Err(e @ KirimeError::ProcessTimeout(_)) => return Err(e),
            Err(primary_err) => {
                warn!("Primary merge path failed, using fallback: {}", primary_err);
                self.merge_fallback(video_path, audio_path, output_path, mix)
                    .await?;
            }
        }

        progress.report(100);
        info!("Merged {} + {} -> {}", video_path.display(), audio_path.display(), output_path.display());
        Ok(output_path.to_path_buf())
    }

    /// Fallback: leave the video stream untouched and let `-shortest`
    /// truncate to the shorter input.
    async fn merge_fallback(
        &self,
        video_path: &Path,
        audio_path: &Path,
        output_path: &Path,
        mix: bool,
    ) -> Result<()> {
        let mut cmd = MediaCommand::new(self.tools.ffmpeg(), "Merge (fallback)")
            .input(video_path)
            .input(audio_path)
            .copy_video();
        if mix {
            cmd = cmd.filter_complex(AMIX_GRAPH).map("0:v:0").map("[a]");
        } else {
            cmd = cmd.map("0:v:0").map("1:a:0");
        }
        cmd.audio_codec("aac")
            .shortest()
            .overwrite()
            .output(output_path)
            .execute()
            .await
    }

    /// Replace the audio track of a video file outright.
    pub async fn replace_audio(
        &self,
        video_path: &Path,
        audio_path: &Path,
        output_path: &Path,
        progress: &ProgressReporter,
    ) -> Result<PathBuf> {
        self.tools.require().await?;
        progress.report(10);

        Self::require_inputs(video_path, audio_path)?;
        progress.report(30);
        Self::ensure_parent_dir(output_path)?;

        let cmd = MediaCommand::new(self.tools.ffmpeg(), "Audio replacement")
            .input(video_path)
            .input(audio_path)
            .copy_video()
            .audio_codec("aac")
            .map("0:v")
            .map("1:a")
            .shortest()
            .overwrite()
            .output(output_path);

        progress.report(50);
        cmd.execute().await?;

        progress.report(100);
        info!("Replaced audio track: {}", output_path.display());
        Ok(output_path.to_path_buf())
    }

    /// Strip the audio track, re-encoding video. Single path, no fallback.
    pub async fn remove_audio(
        &self,
        video_path: &Path,
        output_path: &Path,
        progress: &ProgressReporter,
    ) -> Result<PathBuf> {
        self.tools.require().await?;
        progress.report(10);

        if !video_path.is_file() {
            return Err(KirimeError::FileNotFound(video_path.display().to_string()));
        }
        progress.report(30);
        Self::ensure_parent_dir(output_path)?;

        let cmd = MediaCommand::new(self.tools.ffmpeg(), "Audio removal")
            .input(video_path)
            .no_audio()
            .video_codec("libx264")
            .overwrite()
            .output(output_path);

        progress.report(50);
        cmd.execute().await?;

        progress.report(100);
        info!("Removed audio track: {}", output_path.display());
        Ok(output_path.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ToolsConfig;
    use crate::progress::ProgressReporter;

    fn remuxer_with_missing_tools() -> Remuxer {
        Remuxer::new(ToolLocator::discover(&ToolsConfig {
            ffmpeg_path: Some("/nonexistent/ffmpeg-binary".to_string()),
            ffprobe_path: Some("/nonexistent/ffprobe-binary".to_string()),
        }))
    }

    #[tokio::test]
    async fn test_merge_fails_fast_without_tools() {
        let remuxer = remuxer_with_missing_tools();
        let result = remuxer
            .merge(
                Path::new("video.mp4"),
                Path::new("audio.mp3"),
                Path::new("out.mp4"),
                true,
                &ProgressReporter::none(),
            )
            .await;
        assert!(matches!(result, Err(KirimeError::ToolUnavailable(_))));
    }

    #[tokio::test]
    async fn test_remove_audio_fails_fast_without_tools() {
        // Tool verification runs before the input check.
        let remuxer = remuxer_with_missing_tools();
        let result = remuxer
            .remove_audio(
                Path::new("/nonexistent/video.mp4"),
                Path::new("out.mp4"),
                &ProgressReporter::none(),
            )
            .await;
        assert!(matches!(result, Err(KirimeError::ToolUnavailable(_))));
    }
}
