use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BatchMode {
    /// Split every discovered video at the given points
    Split,
    /// Extract the audio track of every discovered video
    Extract,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Split a video file at the given timestamps (re-encoded segments)
    SplitVideo {
        /// Input video file
        #[arg(short, long)]
        input: PathBuf,

        /// Split points as HH:MM:SS, MM:SS or SS (comma-separated)
        #[arg(short, long)]
        points: String,

        /// Output directory for segments
        #[arg(short, long)]
        output_dir: PathBuf,
    },

    /// Split an audio file at the given timestamps (stream copy)
    SplitAudio {
        /// Input audio file
        #[arg(short, long)]
        input: PathBuf,

        /// Split points as HH:MM:SS, MM:SS or SS (comma-separated)
        #[arg(short, long)]
        points: String,

        /// Output directory for segments
        #[arg(short, long)]
        output_dir: PathBuf,
    },

    /// Extract the audio track from a video file
    Extract {
        /// Input video file
        #[arg(short, long)]
        input: PathBuf,

        /// Output audio file
        #[arg(short, long)]
        output: PathBuf,

        /// Target audio format
        #[arg(short, long, default_value = "mp3")]
        format: String,
    },

    /// Extract a time range of the audio track from a video file
    ExtractSegment {
        /// Input video file
        #[arg(short, long)]
        input: PathBuf,

        /// Output audio file
        #[arg(short, long)]
        output: PathBuf,

        /// Range start in seconds
        #[arg(long)]
        start: f64,

        /// Range end in seconds
        #[arg(long)]
        end: f64,
    },

    /// Merge an audio file into a video file
    Merge {
        /// Input video file
        #[arg(long)]
        video: PathBuf,

        /// Input audio file
        #[arg(long)]
        audio: PathBuf,

        /// Output video file
        #[arg(short, long)]
        output: PathBuf,

        /// Replace the original audio instead of mixing over it
        #[arg(long)]
        replace: bool,
    },

    /// Replace the audio track of a video file
    ReplaceAudio {
        /// Input video file
        #[arg(long)]
        video: PathBuf,

        /// Input audio file
        #[arg(long)]
        audio: PathBuf,

        /// Output video file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Strip the audio track from a video file
    RemoveAudio {
        /// Input video file
        #[arg(short, long)]
        input: PathBuf,

        /// Output video file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Transcribe speech to text or subtitles
    Transcribe {
        /// Input audio file
        #[arg(short, long)]
        input: PathBuf,

        /// Output file (extension is forced for subtitle formats)
        #[arg(short, long)]
        output: PathBuf,

        /// Model size (tiny, base, small, medium, large)
        #[arg(short, long)]
        model: Option<String>,

        /// Subtitle format (srt, vtt, ass); omit for plain text
        #[arg(short, long)]
        format: Option<String>,
    },

    /// Show stream and duration metadata for a media file
    Probe {
        /// Input media file
        #[arg(short, long)]
        input: PathBuf,
    },

    /// List available whisper models and their status
    Models {
        /// Download a model by name (or "all" for every missing one)
        #[arg(long)]
        download: Option<String>,
    },

    /// Run one operation over every video file in a directory
    Batch {
        /// Input directory
        #[arg(short, long)]
        input_dir: PathBuf,

        /// Operation applied per file
        #[arg(short, long, value_enum)]
        mode: BatchMode,

        /// Split points, required for split mode (comma-separated)
        #[arg(short, long)]
        points: Option<String>,

        /// Output directory
        #[arg(short, long)]
        output_dir: PathBuf,

        /// Audio format for extract mode
        #[arg(short, long, default_value = "mp3")]
        format: String,
    },
}

/// Split a comma-separated points argument into raw timecode strings.
pub fn parse_points_arg(points: &str) -> Vec<String> {
    points
        .split(',')
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_points_arg() {
        assert_eq!(
            parse_points_arg("00:01:00, 00:02:30 ,45"),
            vec!["00:01:00", "00:02:30", "45"]
        );
        assert!(parse_points_arg(" , ").is_empty());
    }

    #[test]
    fn test_split_video_parses() {
        let args = Args::try_parse_from([
            "kirime",
            "split-video",
            "-i",
            "movie.mp4",
            "-p",
            "00:10:00,00:20:00",
            "-o",
            "out",
        ])
        .unwrap();
        match args.command {
            Commands::SplitVideo { input, points, output_dir } => {
                assert_eq!(input, PathBuf::from("movie.mp4"));
                assert_eq!(points, "00:10:00,00:20:00");
                assert_eq!(output_dir, PathBuf::from("out"));
            }
            _ => panic!("wrong subcommand"),
        }
    }
}
