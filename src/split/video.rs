use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::MediaConfig;
use crate::error::{KirimeError, Result};
use crate::media::MediaCommand;
use crate::plan::SplitPlan;
use crate::probe::MediaProber;
use crate::progress::{CancelToken, ProgressReporter};
use crate::tools::ToolLocator;

use super::{
    ensure_writable_dir, file_base_name, input_must_exist, segment_filename, segment_progress,
    PROGRESS_PLANNED, PROGRESS_PROBED, PROGRESS_VERIFIED,
};

/// Splits a video file at planned intervals, re-encoding every segment.
///
/// Stream copy is deliberately not offered here: cuts at arbitrary timestamps
/// land between keyframes, and copying would shift them to the nearest
/// keyframe. Output segments are always normalized to MP4.
pub struct VideoSplitter {
    tools: ToolLocator,
    prober: MediaProber,
    encode_options: Vec<String>,
}

impl VideoSplitter {
    pub fn new(tools: ToolLocator, config: &MediaConfig) -> Self {
        let prober = MediaProber::new(tools.clone());
        Self {
            tools,
            prober,
            encode_options: config.encode_options.clone(),
        }
    }

    pub async fn segment(
        &self,
        video_path: &Path,
        raw_points: &[String],
        output_dir: &Path,
        progress: &ProgressReporter,
        cancel: &CancelToken,
    ) -> Result<Vec<PathBuf>> {
        input_must_exist(video_path)?;
        self.tools.require().await?;
        progress.report(PROGRESS_VERIFIED);

        let total_duration = self.prober.probe_duration(video_path).await?;
        progress.report(PROGRESS_PROBED);

        let plan = SplitPlan::build(total_duration, raw_points)?;
        if plan.interior_count() == 0 {
            return Err(KirimeError::InvalidTimeRange(format!(
                "no valid split points within (0, {:.2}s)",
                total_duration
            )));
        }

        ensure_writable_dir(output_dir)?;
        progress.report(PROGRESS_PLANNED);

        let base_name = file_base_name(video_path)?;
        let intervals = plan.intervals();
        let total_intervals = intervals.len();
        let mut output_files = Vec::new();

        for (i, (start, end)) in intervals.into_iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(KirimeError::Cancelled);
            }
            if start >= end {
                continue;
            }

            let output_path = output_dir.join(segment_filename(&base_name, i + 1, ".mp4"));
            info!(
                "Encoding segment {}/{}: {} ({:.2}s -> {:.2}s)",
                i + 1,
                total_intervals,
                output_path.display(),
                start,
                end
            );

            MediaCommand::new(self.tools.ffmpeg(), format!("Video segment {}", i + 1))
                .seek_before_input(start)
                .input(video_path)
                .duration(end - start)
                .video_codec("libx264")
                .audio_codec("aac")
                .args(self.encode_options.clone())
                .overwrite()
                .output(&output_path)
                .execute()
                .await?;

            output_files.push(output_path);
            progress.report(segment_progress(i + 1, total_intervals));
        }

        progress.report(100);
        info!("Video split into {} segments", output_files.len());
        Ok(output_files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MediaConfig, ToolsConfig};

    fn splitter_with_missing_tools() -> VideoSplitter {
        let tools = ToolLocator::discover(&ToolsConfig {
            ffmpeg_path: Some("/nonexistent/ffmpeg-binary".to_string()),
            ffprobe_path: Some("/nonexistent/ffprobe-binary".to_string()),
        });
        VideoSplitter::new(tools, &MediaConfig::default())
    }

    #[tokio::test]
    async fn test_missing_input_is_file_not_found() {
        let splitter = splitter_with_missing_tools();
        let dir = tempfile::tempdir().unwrap();
        let result = splitter
            .segment(
                Path::new("/nonexistent/input.mp4"),
                &["00:00:30".to_string()],
                dir.path(),
                &ProgressReporter::none(),
                &CancelToken::new(),
            )
            .await;
        assert!(matches!(result, Err(KirimeError::FileNotFound(_))));
    }

    #[tokio::test]
    async fn test_missing_tools_fail_fast() {
        let splitter = splitter_with_missing_tools();
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.mp4");
        std::fs::write(&input, b"stub").unwrap();
        let result = splitter
            .segment(
                &input,
                &["00:00:30".to_string()],
                dir.path(),
                &ProgressReporter::none(),
                &CancelToken::new(),
            )
            .await;
        assert!(matches!(result, Err(KirimeError::ToolUnavailable(_))));
    }
}
