// Segmentation of media files at planned intervals.
//
// Both variants share the same shape: verify tools, probe duration, build the
// plan, check the output directory, then drive one ffmpeg invocation per
// interval. The video variant always re-encodes for frame-accurate cuts; the
// audio variant stream-copies and falls back to in-memory WAV slicing when
// ffmpeg refuses.

pub mod audio;
pub mod video;

use std::path::{Path, PathBuf};
use tracing::debug;

pub use audio::AudioSplitter;
pub use video::VideoSplitter;

use crate::error::{KirimeError, Result};

// Milestones: setup takes the first 30% of the reported range, the segment
// loop the next 60%, and success pins 100.
pub(crate) const PROGRESS_VERIFIED: u8 = 10;
pub(crate) const PROGRESS_PROBED: u8 = 20;
pub(crate) const PROGRESS_PLANNED: u8 = 30;
pub(crate) const PROGRESS_SEGMENT_SPAN: u32 = 60;

/// Deterministic per-segment output name: `{base}_part_{NN}{ext}`, 1-based,
/// zero-padded to width 2.
pub(crate) fn segment_filename(base_name: &str, index: usize, extension: &str) -> String {
    format!("{}_part_{:02}{}", base_name, index, extension)
}

pub(crate) fn file_base_name(path: &Path) -> Result<String> {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .ok_or_else(|| KirimeError::Config(format!("invalid input filename: {}", path.display())))
}

pub(crate) fn file_extension(path: &Path) -> String {
    path.extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default()
}

/// Create the output directory if needed and prove it is writable with a real
/// write-then-delete probe. Existence alone does not imply write permission.
pub(crate) fn ensure_writable_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .map_err(|e| KirimeError::PermissionDenied(format!("{}: {}", dir.display(), e)))?;

    let probe = dir.join(".write_test");
    std::fs::write(&probe, b"test")
        .map_err(|e| KirimeError::PermissionDenied(format!("{}: {}", dir.display(), e)))?;
    std::fs::remove_file(&probe)
        .map_err(|e| KirimeError::PermissionDenied(format!("{}: {}", dir.display(), e)))?;

    debug!("Output directory writable: {}", dir.display());
    Ok(())
}

pub(crate) fn segment_progress(completed: usize, total: usize) -> u8 {
    PROGRESS_PLANNED + (completed as u32 * PROGRESS_SEGMENT_SPAN / total.max(1) as u32) as u8
}

pub(crate) fn input_must_exist(path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(KirimeError::FileNotFound(path.display().to_string()))
    }
}
