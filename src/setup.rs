//! Workspace bootstrap: the `.kirime` directory and ggml model downloads.

use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use tokio::fs as async_fs;
use tokio::io::AsyncWriteExt;
use tracing::info;

use crate::error::{KirimeError, Result};

/// Directory whisper.cpp model files are downloaded into, relative to the
/// current working directory.
pub fn kirime_dir() -> PathBuf {
    std::env::current_dir().unwrap_or_default().join(".kirime")
}

pub fn models_dir() -> PathBuf {
    kirime_dir().join("models")
}

#[derive(Debug, Clone)]
pub struct ModelInfo {
    pub name: String,
    pub filename: String,
    pub url: String,
    pub size_mb: f64,
}

pub struct SetupManager {
    client: reqwest::Client,
}

impl Default for SetupManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SetupManager {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    pub fn available_models() -> Vec<ModelInfo> {
        const HF_BASE: &str = "https://huggingface.co/ggerganov/whisper.cpp/resolve/main";
        [
            ("tiny", 75.0),
            ("base", 142.0),
            ("small", 466.0),
            ("medium", 1500.0),
            ("large-v3", 2900.0),
        ]
        .into_iter()
        .map(|(name, size_mb)| ModelInfo {
            name: name.to_string(),
            filename: format!("ggml-{}.bin", name),
            url: format!("{}/ggml-{}.bin", HF_BASE, name),
            size_mb,
        })
        .collect()
    }

    pub fn find_model(name: &str) -> Result<ModelInfo> {
        Self::available_models()
            .into_iter()
            .find(|m| m.name == name)
            .ok_or_else(|| {
                KirimeError::Config(format!(
                    "unknown model '{}' (available: {})",
                    name,
                    Self::available_models()
                        .iter()
                        .map(|m| m.name.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                ))
            })
    }

    pub fn model_exists(model: &ModelInfo) -> bool {
        models_dir().join(&model.filename).exists()
    }

    /// Download a ggml model into `.kirime/models`, writing through a temp
    /// file so an interrupted download never leaves a truncated model behind.
    pub async fn download_model(&self, model: &ModelInfo) -> Result<PathBuf> {
        let local_path = models_dir().join(&model.filename);
        if local_path.exists() {
            info!("Model {} already exists at {}", model.name, local_path.display());
            return Ok(local_path);
        }

        async_fs::create_dir_all(models_dir()).await?;
        info!("Downloading {} model ({:.1} MB)...", model.name, model.size_mb);

        let pb = ProgressBar::new((model.size_mb * 1_000_000.0) as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );

        let response = self.client.get(&model.url).send().await?;
        if !response.status().is_success() {
            return Err(KirimeError::Config(format!(
                "failed to download model {}: HTTP {}",
                model.name,
                response.status()
            )));
        }
        if let Some(length) = response.content_length() {
            pb.set_length(length);
        }

        let temp_path = local_path.with_extension("tmp");
        let mut file = async_fs::File::create(&temp_path).await?;

        let bytes = response.bytes().await?;
        file.write_all(&bytes).await?;
        pb.set_position(bytes.len() as u64);
        file.flush().await?;
        drop(file);

        async_fs::rename(&temp_path, &local_path).await?;
        pb.finish_with_message(format!("Downloaded {}", model.name));
        info!("Successfully downloaded {} to {}", model.name, local_path.display());

        Ok(local_path)
    }
}
