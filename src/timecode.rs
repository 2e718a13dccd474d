//! Timecode parsing and formatting.
//!
//! Human-entered split points arrive as `HH:MM:SS`, `MM:SS` or `SS` strings,
//! each component a float so fractional seconds work. Components of 60 or
//! more are folded in arithmetically rather than rejected ("90:00" is ninety
//! minutes). Parse failures are reported as errors instead of the silent
//! zero the original behavior would have produced.

use crate::error::{KirimeError, Result};

/// Parse a timecode string into seconds.
pub fn parse_timecode(text: &str) -> Result<f64> {
    let parts: Vec<&str> = text.trim().split(':').collect();

    let component = |s: &str| -> Result<f64> {
        s.trim().parse::<f64>().map_err(|_| {
            KirimeError::InvalidTimeRange(format!("invalid timecode component '{}' in '{}'", s, text))
        })
    };

    let seconds = match parts.as_slice() {
        [ss] => component(ss)?,
        [mm, ss] => component(mm)? * 60.0 + component(ss)?,
        [hh, mm, ss] => component(hh)? * 3600.0 + component(mm)? * 60.0 + component(ss)?,
        _ => {
            return Err(KirimeError::InvalidTimeRange(format!(
                "invalid timecode format: '{}'",
                text
            )))
        }
    };

    if seconds < 0.0 || !seconds.is_finite() {
        return Err(KirimeError::InvalidTimeRange(format!(
            "timecode '{}' is not a non-negative time",
            text
        )));
    }

    Ok(seconds)
}

/// Format seconds as `HH:MM:SS`, truncating fractional seconds.
pub fn format_timecode(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, secs)
}

/// Format time in seconds to SRT time format (HH:MM:SS,mmm).
pub fn format_srt_time(seconds: f64) -> String {
    let total_milliseconds = (seconds.max(0.0) * 1000.0).round() as u64;
    let hours = total_milliseconds / 3_600_000;
    let minutes = (total_milliseconds % 3_600_000) / 60_000;
    let secs = (total_milliseconds % 60_000) / 1_000;
    let millis = total_milliseconds % 1_000;
    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, secs, millis)
}

/// Format time in seconds to VTT time format (HH:MM:SS.mmm).
pub fn format_vtt_time(seconds: f64) -> String {
    let total_milliseconds = (seconds.max(0.0) * 1000.0).round() as u64;
    let hours = total_milliseconds / 3_600_000;
    let minutes = (total_milliseconds % 3_600_000) / 60_000;
    let secs = (total_milliseconds % 60_000) / 1_000;
    let millis = total_milliseconds % 1_000;
    format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, secs, millis)
}

/// Format time in seconds to ASS time format (H:MM:SS.cc), single-digit hour.
pub fn format_ass_time(seconds: f64) -> String {
    let total_centiseconds = (seconds.max(0.0) * 100.0).round() as u64;
    let hours = total_centiseconds / 360_000;
    let minutes = (total_centiseconds % 360_000) / 6_000;
    let secs = (total_centiseconds % 6_000) / 100;
    let centis = total_centiseconds % 100;
    format!("{}:{:02}:{:02}.{:02}", hours, minutes, secs, centis)
}
