//! Kirime - timestamp media toolkit
//!
//! Command-line entry point for splitting video/audio at timestamps,
//! extracting and remuxing streams, and transcribing speech with whisper
//! tooling through ffmpeg.

use anyhow::Result;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use walkdir::WalkDir;

use kirime::cli::{parse_points_arg, Args, BatchMode, Commands};
use kirime::config::Config;
use kirime::outcome::{BatchOutcome, OperationOutcome};
use kirime::progress::{CancelToken, ProgressReporter};
use kirime::setup::{models_dir, SetupManager};
use kirime::subtitle::SubtitleFormat;
use kirime::toolkit::{ExtractJob, MediaToolkit, SplitJob};

const VIDEO_EXTENSIONS: [&str; 6] = ["mp4", "mkv", "avi", "mov", "webm", "flv"];

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(args.verbose)?;

    let config = match &args.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            if std::path::Path::new("config.toml").exists() {
                info!("Found config.toml in current directory, loading...");
                Config::from_file("config.toml")?
            } else {
                Config::default()
            }
        }
    };

    let toolkit = MediaToolkit::new(&config);
    let cancel = CancelToken::new();

    match args.command {
        Commands::SplitVideo { input, points, output_dir } => {
            info!("Splitting video: {}", input.display());
            let (progress, bar) = progress_bar();
            let outcome = toolkit
                .split_video(&input, &parse_points_arg(&points), &output_dir, &progress, &cancel)
                .await;
            bar.finish_and_clear();
            finish(outcome)?;
        }
        Commands::SplitAudio { input, points, output_dir } => {
            info!("Splitting audio: {}", input.display());
            let (progress, bar) = progress_bar();
            let outcome = toolkit
                .split_audio(&input, &parse_points_arg(&points), &output_dir, &progress, &cancel)
                .await;
            bar.finish_and_clear();
            finish(outcome)?;
        }
        Commands::Extract { input, output, format } => {
            info!("Extracting audio from: {}", input.display());
            let (progress, bar) = progress_bar();
            let outcome = toolkit.extract_audio(&input, &output, &format, &progress).await;
            bar.finish_and_clear();
            finish(outcome)?;
        }
        Commands::ExtractSegment { input, output, start, end } => {
            info!("Extracting audio segment {:.2}s-{:.2}s from: {}", start, end, input.display());
            let (progress, bar) = progress_bar();
            let outcome = toolkit
                .extract_audio_segment(&input, &output, start, end, &progress)
                .await;
            bar.finish_and_clear();
            finish(outcome)?;
        }
        Commands::Merge { video, audio, output, replace } => {
            info!("Merging {} + {}", video.display(), audio.display());
            let (progress, bar) = progress_bar();
            let outcome = toolkit.merge(&video, &audio, &output, replace, &progress).await;
            bar.finish_and_clear();
            finish(outcome)?;
        }
        Commands::ReplaceAudio { video, audio, output } => {
            info!("Replacing audio track of: {}", video.display());
            let (progress, bar) = progress_bar();
            let outcome = toolkit.replace_audio(&video, &audio, &output, &progress).await;
            bar.finish_and_clear();
            finish(outcome)?;
        }
        Commands::RemoveAudio { input, output } => {
            info!("Removing audio track of: {}", input.display());
            let (progress, bar) = progress_bar();
            let outcome = toolkit.remove_audio(&input, &output, &progress).await;
            bar.finish_and_clear();
            finish(outcome)?;
        }
        Commands::Transcribe { input, output, model, format } => {
            info!("Transcribing: {}", input.display());
            let model = model.unwrap_or_else(|| config.transcriber.default_model.clone());
            let (progress, bar) = progress_bar();
            let outcome = match format {
                Some(format_name) => {
                    let format: SubtitleFormat = format_name.parse().map_err(anyhow::Error::from)?;
                    toolkit
                        .transcribe_to_subtitle(&input, &output, &model, format, &progress)
                        .await
                }
                None => toolkit.transcribe(&input, &output, &model, &progress).await,
            };
            bar.finish_and_clear();
            finish(outcome)?;
        }
        Commands::Probe { input } => {
            let outcome = toolkit.probe(&input).await;
            if let Some(text) = &outcome.text {
                println!("{}", text);
            }
            finish(outcome)?;
        }
        Commands::Models { download } => {
            list_and_download_models(download).await?;
        }
        Commands::Batch { input_dir, mode, points, output_dir, format } => {
            let inputs = discover_videos(&input_dir);
            if inputs.is_empty() {
                anyhow::bail!("no video files found in {}", input_dir.display());
            }
            info!("Batch {:?} over {} files", mode, inputs.len());
            let (progress, bar) = progress_bar();

            let batch = match mode {
                BatchMode::Split => {
                    let points = parse_points_arg(&points.unwrap_or_default());
                    if points.is_empty() {
                        anyhow::bail!("batch split requires --points");
                    }
                    let jobs: Vec<SplitJob> = inputs
                        .into_iter()
                        .map(|input| SplitJob {
                            input,
                            points: points.clone(),
                            output_dir: output_dir.clone(),
                        })
                        .collect();
                    toolkit.batch_split_videos(&jobs, &progress, &cancel).await
                }
                BatchMode::Extract => {
                    let jobs: Vec<ExtractJob> = inputs
                        .into_iter()
                        .map(|input| {
                            let stem = input
                                .file_stem()
                                .map(|s| s.to_string_lossy().to_string())
                                .unwrap_or_else(|| "audio".to_string());
                            ExtractJob {
                                input,
                                output: output_dir.join(format!("{}.{}", stem, format)),
                                format: format.clone(),
                            }
                        })
                        .collect();
                    toolkit.batch_extract_audio(&jobs, &progress, &cancel).await
                }
            };
            bar.finish_and_clear();
            finish_batch(batch)?;
        }
    }

    Ok(())
}

/// Console progress bar driven by the core's 0-100 callback.
fn progress_bar() -> (ProgressReporter, ProgressBar) {
    let bar = ProgressBar::new(100);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}%")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    let bar_handle = bar.clone();
    let progress = ProgressReporter::new(move |p| bar_handle.set_position(p as u64));
    (progress, bar)
}

fn finish(outcome: OperationOutcome) -> Result<()> {
    if outcome.success {
        if let Some(message) = &outcome.message {
            println!("{}", message);
        }
        if let Some(file) = &outcome.output_file {
            println!("{}", file.display());
        }
        if let Some(files) = &outcome.output_files {
            for file in files {
                println!("{}", file.display());
            }
        }
        if let Some(subtitle) = &outcome.subtitle {
            println!("{}", subtitle.display());
        }
        Ok(())
    } else {
        anyhow::bail!(outcome.error.unwrap_or_else(|| "operation failed".to_string()))
    }
}

fn finish_batch(batch: BatchOutcome) -> Result<()> {
    println!("{} succeeded, {} failed of {} files", batch.succeeded, batch.failed, batch.total);
    for row in &batch.rows {
        match &row.error {
            Some(error) => println!("  FAIL {}: {}", row.input.display(), error),
            None => println!("  OK   {}", row.input.display()),
        }
    }
    if batch.success {
        Ok(())
    } else {
        anyhow::bail!("{} of {} batch jobs failed", batch.failed, batch.total)
    }
}

fn discover_videos(input_dir: &std::path::Path) -> Vec<PathBuf> {
    let mut inputs: Vec<PathBuf> = WalkDir::new(input_dir)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .map(|ext| {
                    let ext = ext.to_string_lossy().to_lowercase();
                    VIDEO_EXTENSIONS.contains(&ext.as_str())
                })
                .unwrap_or(false)
        })
        .collect();
    inputs.sort();
    inputs
}

async fn list_and_download_models(download: Option<String>) -> Result<()> {
    let manager = SetupManager::new();
    let models = SetupManager::available_models();

    println!("\nAvailable Whisper Models:");
    println!("{:<12} {:<22} {:<10} {:<10}", "Name", "Filename", "Size (MB)", "Status");
    println!("{}", "-".repeat(56));
    for model in &models {
        let status = if SetupManager::model_exists(model) {
            "Downloaded"
        } else {
            "Missing"
        };
        println!(
            "{:<12} {:<22} {:<10.1} {:<10}",
            model.name, model.filename, model.size_mb, status
        );
    }

    match download.as_deref() {
        Some("all") => {
            for model in &models {
                if !SetupManager::model_exists(model) {
                    manager.download_model(model).await?;
                }
            }
            info!("All models downloaded to {}", models_dir().display());
        }
        Some(name) => {
            let model = SetupManager::find_model(name)?;
            manager.download_model(&model).await?;
        }
        None => {}
    }
    Ok(())
}

/// Setup logging to both console and file
fn setup_logging(verbose: bool) -> Result<()> {
    let log_dir = std::env::current_dir()?.join(".kirime").join("log");
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = rolling::daily(&log_dir, "kirime.log");
    let (non_blocking_file, guard) = non_blocking(file_appender);
    // Keep the guard alive for the duration of the program
    std::mem::forget(guard);

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    let console_layer = fmt::layer().with_target(false);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}
