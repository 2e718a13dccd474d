//! Subtitle rendering for transcription output.
//!
//! Three encodings are supported: SRT (index/time-range/text triples), VTT
//! (`WEBVTT` header plus cue pairs) and ASS (fixed style block plus one
//! `Dialogue:` line per segment). The output file extension is always forced
//! to match the chosen format.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::KirimeError;
use crate::timecode::{format_ass_time, format_srt_time, format_vtt_time};
use crate::transcribe::TranscriptSegment;

const ASS_HEADER: &str = "[Script Info]\n\
Title: Generated by kirime\n\
ScriptType: v4.00+\n\
\n\
[V4+ Styles]\n\
Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding\n\
Style: Default,Arial,20,&H00FFFFFF,&H000000FF,&H00000000,&H80000000,0,0,0,0,100,100,0,0,1,2,0,2,10,10,10,1\n\
\n\
[Events]\n\
Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubtitleFormat {
    Srt,
    Vtt,
    Ass,
}

impl SubtitleFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            SubtitleFormat::Srt => "srt",
            SubtitleFormat::Vtt => "vtt",
            SubtitleFormat::Ass => "ass",
        }
    }
}

impl FromStr for SubtitleFormat {
    type Err = KirimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "srt" => Ok(SubtitleFormat::Srt),
            "vtt" => Ok(SubtitleFormat::Vtt),
            "ass" => Ok(SubtitleFormat::Ass),
            other => Err(KirimeError::UnsupportedFormat(format!(
                "subtitle format '{}' (expected srt, vtt or ass)",
                other
            ))),
        }
    }
}

/// Replace whatever extension the caller supplied with the format's own.
pub fn force_extension(path: &Path, format: SubtitleFormat) -> PathBuf {
    path.with_extension(format.extension())
}

pub fn render(segments: &[TranscriptSegment], format: SubtitleFormat) -> String {
    match format {
        SubtitleFormat::Srt => render_srt(segments),
        SubtitleFormat::Vtt => render_vtt(segments),
        SubtitleFormat::Ass => render_ass(segments),
    }
}

fn render_srt(segments: &[TranscriptSegment]) -> String {
    let mut lines = Vec::new();
    for (index, segment) in segments.iter().enumerate() {
        lines.push((index + 1).to_string());
        lines.push(format!(
            "{} --> {}",
            format_srt_time(segment.start),
            format_srt_time(segment.end)
        ));
        lines.push(segment.text.trim().to_string());
        lines.push(String::new());
    }
    lines.join("\n")
}

fn render_vtt(segments: &[TranscriptSegment]) -> String {
    let mut lines = vec!["WEBVTT".to_string(), String::new()];
    for segment in segments {
        lines.push(format!(
            "{} --> {}",
            format_vtt_time(segment.start),
            format_vtt_time(segment.end)
        ));
        lines.push(segment.text.trim().to_string());
        lines.push(String::new());
    }
    lines.join("\n")
}

fn render_ass(segments: &[TranscriptSegment]) -> String {
    // The header ends in a newline of its own; trim it so the join does not
    // leave a blank line before the first Dialogue entry.
    let mut lines = vec![ASS_HEADER.trim_end().to_string()];
    for segment in segments {
        lines.push(format!(
            "Dialogue: 0,{},{},Default,,0,0,0,,{}",
            format_ass_time(segment.start),
            format_ass_time(segment.end),
            segment.text.trim()
        ));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segments() -> Vec<TranscriptSegment> {
        vec![
            TranscriptSegment {
                start: 0.0,
                end: 2.5,
                text: " hello ".to_string(),
            },
            TranscriptSegment {
                start: 2.5,
                end: 5.0,
                text: "world".to_string(),
            },
        ]
    }

    #[test]
    fn test_render_srt() {
        let srt = render(&segments(), SubtitleFormat::Srt);
        let expected = "1\n00:00:00,000 --> 00:00:02,500\nhello\n\n2\n00:00:02,500 --> 00:00:05,000\nworld\n";
        assert_eq!(srt, expected);
    }

    #[test]
    fn test_render_vtt_header() {
        let vtt = render(&segments(), SubtitleFormat::Vtt);
        assert!(vtt.starts_with("WEBVTT\n\n"));
        assert!(vtt.contains("00:00:00.000 --> 00:00:02.500"));
    }

    #[test]
    fn test_render_ass_dialogue_lines() {
        let ass = render(&segments(), SubtitleFormat::Ass);
        assert!(ass.starts_with("[Script Info]"));
        assert!(ass.contains("Dialogue: 0,0:00:00.00,0:00:02.50,Default,,0,0,0,,hello"));
        assert_eq!(ass.matches("Dialogue:").count(), 2);
        // The first Dialogue line follows the Events format line directly.
        assert!(ass.contains("Effect, Text\nDialogue: 0,"));
        assert!(!ass.contains("\n\nDialogue:"));
    }

    #[test]
    fn test_render_empty_segments() {
        assert_eq!(render(&[], SubtitleFormat::Srt), "");
        assert_eq!(render(&[], SubtitleFormat::Vtt), "WEBVTT\n");
    }

    #[test]
    fn test_force_extension() {
        assert_eq!(
            force_extension(Path::new("/out/result.txt"), SubtitleFormat::Vtt),
            PathBuf::from("/out/result.vtt")
        );
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("SRT".parse::<SubtitleFormat>().unwrap(), SubtitleFormat::Srt);
        assert!("sub".parse::<SubtitleFormat>().is_err());
    }
}
