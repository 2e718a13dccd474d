//! Media probing via ffprobe.
//!
//! Descriptors are computed on demand and never cached; callers re-probe on
//! every operation so the result always reflects the file on disk.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

use crate::error::{KirimeError, Result};
use crate::tools::ToolLocator;

const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Stream and format metadata for one media file.
#[derive(Debug, Clone, Serialize)]
pub struct MediaDescriptor {
    pub duration: f64,
    pub channels: u32,
    pub sample_rate: u32,
    pub codec: String,
    pub has_audio: bool,
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
    format: Option<FfprobeFormat>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    codec_name: Option<String>,
    channels: Option<u32>,
    sample_rate: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

pub struct MediaProber {
    tools: ToolLocator,
}

impl MediaProber {
    pub fn new(tools: ToolLocator) -> Self {
        Self { tools }
    }

    async fn run_ffprobe(&self, args: &[&str], path: &Path) -> Result<String> {
        let output = Command::new(self.tools.ffprobe())
            .args(args)
            .arg(path)
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(PROBE_TIMEOUT, output)
            .await
            .map_err(|_| {
                KirimeError::ProbeFailure(format!("ffprobe timed out for {}", path.display()))
            })?
            .map_err(|e| KirimeError::ProbeFailure(format!("ffprobe not runnable: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(KirimeError::ProbeFailure(format!(
                "ffprobe failed for {}: {}",
                path.display(),
                stderr
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    /// Container-level duration in seconds.
    pub async fn probe_duration(&self, path: &Path) -> Result<f64> {
        let stdout = self
            .run_ffprobe(
                &[
                    "-v",
                    "error",
                    "-show_entries",
                    "format=duration",
                    "-of",
                    "default=noprint_wrappers=1:nokey=1",
                ],
                path,
            )
            .await?;

        let duration = stdout.trim().parse::<f64>().map_err(|_| {
            KirimeError::ProbeFailure(format!(
                "non-numeric duration '{}' for {}",
                stdout.trim(),
                path.display()
            ))
        })?;

        debug!("Probed duration of {}: {:.2}s", path.display(), duration);
        Ok(duration)
    }

    /// Full stream+format metadata. Distinguishes "file has no audio stream"
    /// from "probe failed".
    pub async fn probe_streams(&self, path: &Path) -> Result<MediaDescriptor> {
        let stdout = self
            .run_ffprobe(
                &["-v", "quiet", "-print_format", "json", "-show_format", "-show_streams"],
                path,
            )
            .await?;

        parse_descriptor(&stdout, path)
    }

    /// Stream metadata for files that may legitimately lack audio (video
    /// inputs). `has_audio` carries the distinction instead of an error.
    pub async fn probe_streams_optional_audio(&self, path: &Path) -> Result<MediaDescriptor> {
        match self.probe_streams(path).await {
            Ok(descriptor) => Ok(descriptor),
            Err(KirimeError::NoAudioStream(_)) => {
                let duration = self.probe_duration(path).await?;
                Ok(MediaDescriptor {
                    duration,
                    channels: 0,
                    sample_rate: 0,
                    codec: "none".to_string(),
                    has_audio: false,
                })
            }
            Err(e) => Err(e),
        }
    }
}

/// Map raw ffprobe JSON to a descriptor. A missing or unparseable container
/// duration is a probe failure, not a zero length file.
fn parse_descriptor(stdout: &str, path: &Path) -> Result<MediaDescriptor> {
    let parsed: FfprobeOutput = serde_json::from_str(stdout).map_err(|e| {
        KirimeError::ProbeFailure(format!(
            "unparseable ffprobe output for {}: {}",
            path.display(),
            e
        ))
    })?;

    let duration = parsed
        .format
        .as_ref()
        .and_then(|f| f.duration.as_ref())
        .and_then(|d| d.parse::<f64>().ok())
        .ok_or_else(|| {
            KirimeError::ProbeFailure(format!(
                "no container duration in ffprobe output for {}",
                path.display()
            ))
        })?;

    let audio_stream = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("audio"));

    match audio_stream {
        Some(stream) => Ok(MediaDescriptor {
            duration,
            channels: stream.channels.unwrap_or(0),
            sample_rate: stream
                .sample_rate
                .as_ref()
                .and_then(|r| r.parse::<u32>().ok())
                .unwrap_or(0),
            codec: stream.codec_name.clone().unwrap_or_else(|| "unknown".to_string()),
            has_audio: true,
        }),
        None => Err(KirimeError::NoAudioStream(path.display().to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ToolsConfig;

    fn prober_with_missing_binary() -> MediaProber {
        let config = ToolsConfig {
            ffmpeg_path: Some("/nonexistent/ffmpeg-binary".to_string()),
            ffprobe_path: Some("/nonexistent/ffprobe-binary".to_string()),
        };
        MediaProber::new(ToolLocator::discover(&config))
    }

    #[tokio::test]
    async fn test_probe_duration_missing_binary_is_probe_failure() {
        let prober = prober_with_missing_binary();
        match prober.probe_duration(Path::new("input.mp4")).await {
            Err(KirimeError::ProbeFailure(_)) => {}
            other => panic!("expected ProbeFailure, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_stream_selection_picks_first_audio() {
        let json = r#"{
            "streams": [
                {"codec_type": "video", "codec_name": "h264"},
                {"codec_type": "audio", "codec_name": "aac", "channels": 2, "sample_rate": "44100"},
                {"codec_type": "audio", "codec_name": "mp3", "channels": 1, "sample_rate": "22050"}
            ],
            "format": {"duration": "12.5"}
        }"#;
        let descriptor = parse_descriptor(json, Path::new("input.mp4")).unwrap();
        assert_eq!(descriptor.codec, "aac");
        assert_eq!(descriptor.channels, 2);
        assert_eq!(descriptor.sample_rate, 44100);
        assert_eq!(descriptor.duration, 12.5);
        assert!(descriptor.has_audio);
    }

    #[test]
    fn test_no_audio_stream_detected() {
        let json = r#"{
            "streams": [{"codec_type": "video", "codec_name": "h264"}],
            "format": {"duration": "12.5"}
        }"#;
        let result = parse_descriptor(json, Path::new("input.mp4"));
        assert!(matches!(result, Err(KirimeError::NoAudioStream(_))));
    }

    #[test]
    fn test_missing_duration_is_probe_failure() {
        // Parseable JSON without a container duration must not pass as a
        // zero length file.
        let json = r#"{
            "streams": [{"codec_type": "audio", "codec_name": "aac", "channels": 2, "sample_rate": "44100"}],
            "format": {}
        }"#;
        let result = parse_descriptor(json, Path::new("input.mp4"));
        assert!(matches!(result, Err(KirimeError::ProbeFailure(_))));

        let no_format = r#"{"streams": [{"codec_type": "audio", "codec_name": "aac"}]}"#;
        let result = parse_descriptor(no_format, Path::new("input.mp4"));
        assert!(matches!(result, Err(KirimeError::ProbeFailure(_))));
    }
}
