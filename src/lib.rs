//! Kirime - timestamp media toolkit
//!
//! A library and CLI for splitting video/audio files at user-entered
//! timestamps, extracting and remuxing audio/video streams, and running
//! speech-to-text transcription with whisper tooling over ffmpeg.

pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod media;
pub mod outcome;
pub mod plan;
pub mod probe;
pub mod progress;
pub mod remux;
pub mod setup;
pub mod split;
pub mod subtitle;
pub mod timecode;
pub mod toolkit;
pub mod tools;
pub mod transcribe;
