use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::{KirimeError, Result};
use crate::media::MediaCommand;
use crate::plan::SplitPlan;
use crate::probe::MediaProber;
use crate::progress::{CancelToken, ProgressReporter};
use crate::tools::ToolLocator;

use super::{
    ensure_writable_dir, file_base_name, file_extension, input_must_exist, segment_filename,
    segment_progress, PROGRESS_PLANNED, PROGRESS_PROBED, PROGRESS_VERIFIED,
};

/// Splits an audio file at planned intervals.
///
/// The fast path stream-copies each interval with ffmpeg. If any invocation
/// fails the whole operation switches to the in-memory path, which loads the
/// entire WAV, slices by millisecond offsets and writes each slice. The
/// switch is per operation, never per segment.
pub struct AudioSplitter {
    tools: ToolLocator,
    prober: MediaProber,
}

impl AudioSplitter {
    pub fn new(tools: ToolLocator) -> Self {
        let prober = MediaProber::new(tools.clone());
        Self { tools, prober }
    }

    pub async fn segment(
        &self,
        audio_path: &Path,
        raw_points: &[String],
        output_dir: &Path,
        progress: &ProgressReporter,
        cancel: &CancelToken,
    ) -> Result<Vec<PathBuf>> {
        input_must_exist(audio_path)?;
        self.tools.require().await?;
        progress.report(PROGRESS_VERIFIED);

        match self
            .segment_stream_copy(audio_path, raw_points, output_dir, progress, cancel)
            .await
        {
            Ok(files) => Ok(files),
            Err(e @ (KirimeError::ProcessFailure(_) | KirimeError::ProcessTimeout(_))) => {
                warn!("Stream-copy split failed, switching to in-memory slicing: {}", e);
                self.segment_in_memory(audio_path, raw_points, output_dir, progress, cancel)
            }
            Err(e) => Err(e),
        }
    }

    async fn segment_stream_copy(
        &self,
        audio_path: &Path,
        raw_points: &[String],
        output_dir: &Path,
        progress: &ProgressReporter,
        cancel: &CancelToken,
    ) -> Result<Vec<PathBuf>> {
        let total_duration = self.prober.probe_duration(audio_path).await?;
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

        let base_name = file_base_name(audio_path)?;
        let extension = file_extension(audio_path);
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

            let output_path = output_dir.join(segment_filename(&base_name, i + 1, &extension));
            info!(
                "Copying segment {}/{}: {} ({:.2}s -> {:.2}s)",
                i + 1,
                total_intervals,
                output_path.display(),
                start,
                end
            );

            MediaCommand::new(self.tools.ffmpeg(), format!("Audio segment {}", i + 1))
                .seek_before_input(start)
                .input(audio_path)
                .duration(end - start)
                .copy_all_streams()
                .zero_negative_timestamps()
                .overwrite()
                .output(&output_path)
                .execute()
                .await?;

            output_files.push(output_path);
            progress.report(segment_progress(i + 1, total_intervals));
        }

        progress.report(100);
        info!("Audio split into {} segments", output_files.len());
        Ok(output_files)
    }

    /// Availability fallback: decode the whole file and slice by millisecond
    /// offsets. WAV input only; other containers surface the limitation.
    fn segment_in_memory(
        &self,
        audio_path: &Path,
        raw_points: &[String],
        output_dir: &Path,
        progress: &ProgressReporter,
        cancel: &CancelToken,
    ) -> Result<Vec<PathBuf>> {
        let extension = file_extension(audio_path).to_lowercase();
        if extension != ".wav" {
            return Err(KirimeError::UnsupportedFormat(format!(
                "in-memory split supports WAV only, got '{}'",
                extension
            )));
        }

        let reader = WavReader::open(audio_path)
            .map_err(|e| KirimeError::ProbeFailure(format!("cannot read WAV: {}", e)))?;
        let spec = reader.spec();
        let total_frames = reader.duration() as u64;
        let total_duration = total_frames as f64 / spec.sample_rate as f64;
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

        let base_name = file_base_name(audio_path)?;
        let output_files = match spec.sample_format {
            SampleFormat::Int => {
                let samples: std::result::Result<Vec<i32>, _> =
                    reader.into_samples::<i32>().collect();
                let samples = samples
                    .map_err(|e| KirimeError::ProbeFailure(format!("WAV decode failed: {}", e)))?;
                slice_samples(&samples, spec, &plan, output_dir, &base_name, progress, cancel)?
            }
            SampleFormat::Float => {
                let samples: std::result::Result<Vec<f32>, _> =
                    reader.into_samples::<f32>().collect();
                let samples = samples
                    .map_err(|e| KirimeError::ProbeFailure(format!("WAV decode failed: {}", e)))?;
                slice_samples(&samples, spec, &plan, output_dir, &base_name, progress, cancel)?
            }
        };

        progress.report(100);
        info!("Audio split into {} segments (in-memory path)", output_files.len());
        Ok(output_files)
    }
}

fn slice_samples<S: hound::Sample + Copy>(
    samples: &[S],
    spec: WavSpec,
    plan: &SplitPlan,
    output_dir: &Path,
    base_name: &str,
    progress: &ProgressReporter,
    cancel: &CancelToken,
) -> Result<Vec<PathBuf>> {
    let channels = spec.channels as u64;
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

        let start_ms = (start * 1000.0) as u64;
        let end_ms = (end * 1000.0) as u64;
        let start_idx = (start_ms * spec.sample_rate as u64 / 1000 * channels) as usize;
        let end_idx = ((end_ms * spec.sample_rate as u64 / 1000 * channels) as usize).min(samples.len());
        if start_idx >= end_idx {
            continue;
        }

        let output_path = output_dir.join(segment_filename(base_name, i + 1, ".wav"));
        let mut writer = WavWriter::create(&output_path, spec)
            .map_err(|e| KirimeError::Io(std::io::Error::other(e.to_string())))?;
        for sample in &samples[start_idx..end_idx] {
            writer
                .write_sample(*sample)
                .map_err(|e| KirimeError::Io(std::io::Error::other(e.to_string())))?;
        }
        writer
            .finalize()
            .map_err(|e| KirimeError::Io(std::io::Error::other(e.to_string())))?;

        output_files.push(output_path);
        progress.report(segment_progress(i + 1, total_intervals));
    }

    Ok(output_files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ToolsConfig;

    fn splitter_with_missing_tools() -> AudioSplitter {
        AudioSplitter::new(ToolLocator::discover(&ToolsConfig {
            ffmpeg_path: Some("/nonexistent/ffmpeg-binary".to_string()),
            ffprobe_path: Some("/nonexistent/ffprobe-binary".to_string()),
        }))
    }

    fn write_test_wav(path: &Path, seconds: u32, sample_rate: u32) {
        let spec = WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(path, spec).unwrap();
        for i in 0..(seconds * sample_rate) {
            writer.write_sample((i % 128) as i32).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_in_memory_split_partitions_samples() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("tone.wav");
        write_test_wav(&input, 2, 8000);

        let splitter = splitter_with_missing_tools();
        let out_dir = dir.path().join("out");
        let files = splitter
            .segment_in_memory(
                &input,
                &["00:00:01".to_string()],
                &out_dir,
                &ProgressReporter::none(),
                &CancelToken::new(),
            )
            .unwrap();

        assert_eq!(files.len(), 2);
        assert_eq!(files[0].file_name().unwrap(), "tone_part_01.wav");
        assert_eq!(files[1].file_name().unwrap(), "tone_part_02.wav");

        let first = WavReader::open(&files[0]).unwrap();
        let second = WavReader::open(&files[1]).unwrap();
        assert_eq!(first.duration(), 8000);
        assert_eq!(second.duration(), 8000);
    }

    #[test]
    fn test_in_memory_split_rejects_non_wav() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("song.mp3");
        std::fs::write(&input, b"stub").unwrap();

        let splitter = splitter_with_missing_tools();
        let result = splitter.segment_in_memory(
            &input,
            &["00:00:01".to_string()],
            dir.path(),
            &ProgressReporter::none(),
            &CancelToken::new(),
        );
        assert!(matches!(result, Err(KirimeError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_in_memory_split_requires_interior_points() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("tone.wav");
        write_test_wav(&input, 1, 8000);

        let splitter = splitter_with_missing_tools();
        let result = splitter.segment_in_memory(
            &input,
            &[],
            dir.path(),
            &ProgressReporter::none(),
            &CancelToken::new(),
        );
        assert!(matches!(result, Err(KirimeError::InvalidTimeRange(_))));
    }

    #[test]
    fn test_in_memory_split_honors_cancel() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("tone.wav");
        write_test_wav(&input, 2, 8000);

        let cancel = CancelToken::new();
        cancel.cancel();
        let splitter = splitter_with_missing_tools();
        let result = splitter.segment_in_memory(
            &input,
            &["00:00:01".to_string()],
            dir.path(),
            &ProgressReporter::none(),
            &cancel,
        );
        assert!(matches!(result, Err(KirimeError::Cancelled)));
    }

    #[cfg(unix)]
    fn write_stub_tool(path: &Path, script: &str) {
        use std::os::unix::fs::PermissionsExt;
        std::fs::write(path, script).unwrap();
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_stream_copy_failure_switches_to_in_memory() {
        let dir = tempfile::tempdir().unwrap();

        // ffmpeg passes verification but fails every real invocation; ffprobe
        // reports a two second duration.
        let ffmpeg = dir.path().join("ffmpeg");
        let ffprobe = dir.path().join("ffprobe");
        write_stub_tool(
            &ffmpeg,
            "#!/bin/sh\nif [ \"$1\" = \"-version\" ]; then exit 0; fi\nexit 1\n",
        );
        write_stub_tool(&ffprobe, "#!/bin/sh\necho 2.0\n");

        let input = dir.path().join("tone.wav");
        write_test_wav(&input, 2, 8000);

        let splitter = AudioSplitter::new(ToolLocator::discover(&ToolsConfig {
            ffmpeg_path: Some(ffmpeg.display().to_string()),
            ffprobe_path: Some(ffprobe.display().to_string()),
        }));
        let out_dir = dir.path().join("out");
        let files = splitter
            .segment(
                &input,
                &["00:00:01".to_string()],
                &out_dir,
                &ProgressReporter::none(),
                &CancelToken::new(),
            )
            .await
            .unwrap();

        // The whole operation ended up on the in-memory path.
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].file_name().unwrap(), "tone_part_01.wav");
        assert_eq!(WavReader::open(&files[0]).unwrap().duration(), 8000);
        assert_eq!(WavReader::open(&files[1]).unwrap().duration(), 8000);
    }

    #[tokio::test]
    async fn test_missing_tools_fail_fast() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("tone.wav");
        write_test_wav(&input, 1, 8000);

        let splitter = splitter_with_missing_tools();
        let result = splitter
            .segment(
                &input,
                &["00:00:00.5".to_string()],
                dir.path(),
                &ProgressReporter::none(),
                &CancelToken::new(),
            )
            .await;
        assert!(matches!(result, Err(KirimeError::ToolUnavailable(_))));
    }
}
