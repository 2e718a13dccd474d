//! External tool location and verification.
//!
//! One `ToolLocator` owns the resolved ffmpeg/ffprobe paths and is injected
//! into every media component, so path resolution happens exactly once.
//! Resolution order: explicit config override, then a copy colocated with the
//! kirime executable, then the bare name for PATH lookup.

use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::config::ToolsConfig;
use crate::error::{KirimeError, Result};

pub const VERIFY_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct ToolLocator {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
}

impl ToolLocator {
    /// Resolve tool paths from config overrides, the executable's directory,
    /// or PATH, in that order.
    pub fn discover(config: &ToolsConfig) -> Self {
        let ffmpeg = Self::resolve(config.ffmpeg_path.as_deref(), "ffmpeg");
        let ffprobe = Self::resolve(config.ffprobe_path.as_deref(), "ffprobe");

        info!("Resolved ffmpeg: {}", ffmpeg.display());
        info!("Resolved ffprobe: {}", ffprobe.display());

        Self { ffmpeg, ffprobe }
    }

    fn resolve(override_path: Option<&str>, name: &str) -> PathBuf {
        if let Some(path) = override_path {
            return PathBuf::from(path);
        }

        if let Some(colocated) = Self::colocated(name) {
            return colocated;
        }

        PathBuf::from(name)
    }

    /// A binary sitting next to the kirime executable wins over PATH.
    fn colocated(name: &str) -> Option<PathBuf> {
        let exe_dir = std::env::current_exe().ok()?.parent()?.to_path_buf();
        let candidate = if cfg!(windows) {
            exe_dir.join(format!("{}.exe", name))
        } else {
            exe_dir.join(name)
        };
        if candidate.is_file() {
            debug!("Using colocated {}: {}", name, candidate.display());
            Some(candidate)
        } else {
            None
        }
    }

    pub fn ffmpeg(&self) -> &Path {
        &self.ffmpeg
    }

    pub fn ffprobe(&self) -> &Path {
        &self.ffprobe
    }

    /// Run `ffmpeg -version` under a bounded timeout. False on timeout,
    /// missing binary or non-zero exit.
    pub async fn verify(&self) -> bool {
        let output = Command::new(&self.ffmpeg)
            .arg("-version")
            .kill_on_drop(true)
            .output();

        match tokio::time::timeout(VERIFY_TIMEOUT, output).await {
            Ok(Ok(out)) if out.status.success() => true,
            Ok(Ok(out)) => {
                warn!(
                    "ffmpeg version check exited non-zero: {}",
                    String::from_utf8_lossy(&out.stderr)
                );
                false
            }
            Ok(Err(e)) => {
                warn!("ffmpeg not runnable: {}", e);
                false
            }
            Err(_) => {
                warn!("ffmpeg version check timed out");
                false
            }
        }
    }

    /// Fail-fast guard used at the top of every media operation.
    pub async fn require(&self) -> Result<()> {
        if self.verify().await {
            Ok(())
        } else {
            Err(KirimeError::ToolUnavailable(format!(
                "ffmpeg not runnable at {}",
                self.ffmpeg.display()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ToolsConfig;

    #[test]
    fn test_config_override_wins() {
        let config = ToolsConfig {
            ffmpeg_path: Some("/opt/tools/ffmpeg".to_string()),
            ffprobe_path: Some("/opt/tools/ffprobe".to_string()),
        };
        let locator = ToolLocator::discover(&config);
        assert_eq!(locator.ffmpeg(), Path::new("/opt/tools/ffmpeg"));
        assert_eq!(locator.ffprobe(), Path::new("/opt/tools/ffprobe"));
    }

    #[tokio::test]
    async fn test_verify_missing_binary_is_false() {
        let config = ToolsConfig {
            ffmpeg_path: Some("/nonexistent/ffmpeg-binary".to_string()),
            ffprobe_path: None,
        };
        let locator = ToolLocator::discover(&config);
        assert!(!locator.verify().await);
        assert!(locator.require().await.is_err());
    }
}
