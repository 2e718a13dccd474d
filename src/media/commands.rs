use std::path::Path;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

use crate::error::{KirimeError, Result};

/// Default bound for segmentation/remux invocations.
pub const MEDIA_TIMEOUT: Duration = Duration::from_secs(300);

/// Abstract ffmpeg command representation.
#[derive(Debug, Clone)]
pub struct MediaCommand {
    pub binary_path: String,
    pub args: Vec<String>,
    pub description: String,
    pub timeout: Option<Duration>,
}

impl MediaCommand {
    pub fn new<P: AsRef<Path>, S: Into<String>>(binary_path: P, description: S) -> Self {
        Self {
            binary_path: binary_path.as_ref().to_string_lossy().to_string(),
            args: Vec::new(),
            description: description.into(),
            timeout: Some(MEDIA_TIMEOUT),
        }
    }

    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(|s| s.into()));
        self
    }

    /// Add input file.
    pub fn input<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg("-i").arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Add output file (terminal positional argument).
    pub fn output<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Force overwrite output.
    pub fn overwrite(self) -> Self {
        self.arg("-y")
    }

    /// Fast approximate seek; must come before the input flag.
    pub fn seek_before_input(self, seconds: f64) -> Self {
        self.arg("-ss").arg(seconds.to_string())
    }

    /// Output duration (not an absolute end time).
    pub fn duration(self, seconds: f64) -> Self {
        self.arg("-t").arg(seconds.to_string())
    }

    pub fn video_codec<S: Into<String>>(self, codec: S) -> Self {
        self.arg("-c:v").arg(codec)
    }

    pub fn audio_codec<S: Into<String>>(self, codec: S) -> Self {
        self.arg("-c:a").arg(codec)
    }

    pub fn copy_video(self) -> Self {
        self.video_codec("copy")
    }

    /// Copy all streams without re-encoding.
    pub fn copy_all_streams(self) -> Self {
        self.arg("-c").arg("copy")
    }

    /// Disable video.
    pub fn no_video(self) -> Self {
        self.arg("-vn")
    }

    /// Disable audio.
    pub fn no_audio(self) -> Self {
        self.arg("-an")
    }

    /// Keep the first output frame at time zero after a stream-copy cut.
    pub fn zero_negative_timestamps(self) -> Self {
        self.arg("-avoid_negative_ts").arg("make_zero")
    }

    /// Select a stream from a specific input.
    pub fn map<S: Into<String>>(self, selector: S) -> Self {
        self.arg("-map").arg(selector)
    }

    /// Truncate output to the shortest input stream.
    pub fn shortest(self) -> Self {
        self.arg("-shortest")
    }

    pub fn filter_complex<S: Into<String>>(self, graph: S) -> Self {
        self.arg("-filter_complex").arg(graph)
    }

    pub fn audio_sample_rate(self, rate: u32) -> Self {
        self.arg("-ar").arg(rate.to_string())
    }

    pub fn audio_channels(self, channels: u32) -> Self {
        self.arg("-ac").arg(channels.to_string())
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Execute the command. Non-zero exit surfaces stderr verbatim as
    /// `ProcessFailure`; an elapsed timeout is the distinct `ProcessTimeout`.
    pub async fn execute(&self) -> Result<()> {
        debug!("Executing {}: {} {:?}", self.description, self.binary_path, self.args);

        let mut cmd = Command::new(&self.binary_path);
        cmd.args(&self.args).kill_on_drop(true);

        let output = cmd.output();
        let output = match self.timeout {
            Some(bound) => tokio::time::timeout(bound, output).await.map_err(|_| {
                KirimeError::ProcessTimeout(format!(
                    "{} exceeded {}s",
                    self.description,
                    bound.as_secs()
                ))
            })?,
            None => output.await,
        };

        let output = output
            .map_err(|e| KirimeError::ProcessFailure(format!("{}: {}", self.description, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(KirimeError::ProcessFailure(format!(
                "{} failed: {}",
                self.description, stderr
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_arg_ordering() {
        let cmd = MediaCommand::new("ffmpeg", "Video segment")
            .seek_before_input(30.0)
            .input("in.mp4")
            .duration(15.0)
            .video_codec("libx264")
            .audio_codec("aac")
            .overwrite()
            .output("out.mp4");

        assert_eq!(
            cmd.args,
            vec![
                "-ss", "30", "-i", "in.mp4", "-t", "15", "-c:v", "libx264", "-c:a", "aac", "-y",
                "out.mp4"
            ]
        );
    }

    #[test]
    fn test_stream_copy_flags() {
        let cmd = MediaCommand::new("ffmpeg", "Audio segment")
            .copy_all_streams()
            .zero_negative_timestamps();
        assert_eq!(cmd.args, vec!["-c", "copy", "-avoid_negative_ts", "make_zero"]);
    }

    #[tokio::test]
    async fn test_execute_missing_binary_is_process_failure() {
        let cmd = MediaCommand::new("/nonexistent/ffmpeg-binary", "Probe");
        match cmd.execute().await {
            Err(crate::error::KirimeError::ProcessFailure(_)) => {}
            other => panic!("expected ProcessFailure, got {:?}", other.err()),
        }
    }
}
