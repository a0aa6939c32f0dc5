//! Model download utility
//!
//! Fetches quantized model archives from a known catalog into `models/`,
//! verifies their digest and points `llm.model_path` at the result. Not
//! part of the scanning core.

use crate::config::AgentConfig;
use crate::error::{Result, VigilError};
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::info;

/// A downloadable model archive
#[derive(Debug, Clone)]
pub struct ModelSpec {
    pub name: &'static str,
    pub file: &'static str,
    pub url: &'static str,
    pub quantization: &'static str,
    pub size_mb: u64,
    /// Expected SHA-256 digest; entries without a published digest skip
    /// verification
    pub sha256: Option<&'static str>,
}

/// Known model catalog
pub fn catalog() -> &'static [ModelSpec] {
    &[
        ModelSpec {
            name: "llama3-8b",
            file: "Meta-Llama-3-8B.Q4_K_M.gguf",
            url: "https://huggingface.co/QuantFactory/Meta-Llama-3-8B-GGUF/resolve/main/Meta-Llama-3-8B.Q4_K_M.gguf",
            quantization: "Q4_K_M",
            size_mb: 4920,
            sha256: None,
        },
        ModelSpec {
            name: "llama3-8b-instruct",
            file: "Meta-Llama-3-8B-Instruct.Q4_K_M.gguf",
            url: "https://huggingface.co/QuantFactory/Meta-Llama-3-8B-Instruct-GGUF/resolve/main/Meta-Llama-3-8B-Instruct.Q4_K_M.gguf",
            quantization: "Q4_K_M",
            size_mb: 4920,
            sha256: None,
        },
        ModelSpec {
            name: "phi3-mini",
            file: "Phi-3-mini-4k-instruct-q4.gguf",
            url: "https://huggingface.co/microsoft/Phi-3-mini-4k-instruct-gguf/resolve/main/Phi-3-mini-4k-instruct-q4.gguf",
            quantization: "Q4",
            size_mb: 2390,
            sha256: None,
        },
    ]
}

/// Looks up a catalog entry by name
pub fn find_model(name: &str) -> Result<&'static ModelSpec> {
    catalog()
        .iter()
        .find(|spec| spec.name == name)
        .ok_or_else(|| VigilError::UnknownModel(name.to_string()))
}

/// Downloads a named model into `models_dir`, verifies it, and updates
/// `llm.model_path` in the config file at `config_path`. An existing
/// verified file is not re-downloaded.
pub async fn download_model(
    name: &str,
    models_dir: &Path,
    config_path: &Path,
) -> Result<PathBuf> {
    let spec = find_model(name)?;
    std::fs::create_dir_all(models_dir)?;
    let dest = models_dir.join(spec.file);

    if dest.exists() {
        match verify_checksum(&dest, spec.sha256) {
            Ok(()) => {
                info!("Model already present at {}", dest.display());
                update_model_path(config_path, &dest)?;
                return Ok(dest);
            }
            Err(e) => {
                info!("Existing file failed verification ({e}), re-downloading");
                std::fs::remove_file(&dest)?;
            }
        }
    }

    fetch(spec, &dest).await?;
    verify_checksum(&dest, spec.sha256)?;
    update_model_path(config_path, &dest)?;

    info!("Model {} saved to {}", spec.name, dest.display());
    Ok(dest)
}

async fn fetch(spec: &ModelSpec, dest: &Path) -> Result<()> {
    info!("Downloading {} from {}", spec.name, spec.url);
    let response = reqwest::get(spec.url).await?.error_for_status()?;

    let total = response
        .content_length()
        .unwrap_or(spec.size_mb * 1024 * 1024);
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("  {spinner:.cyan} [{bar:40.cyan/blue}] {bytes}/{total_bytes} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-"),
    );

    let mut file = tokio::fs::File::create(dest).await?;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        pb.inc(chunk.len() as u64);
    }
    file.flush().await?;
    pb.finish_with_message("Download complete");
    Ok(())
}

/// Compares a file's SHA-256 digest against the expected value, hashing
/// in a streaming fashion since model archives run to gigabytes. Entries
/// without a published digest pass.
pub fn verify_checksum(path: &Path, expected: Option<&str>) -> Result<()> {
    let Some(expected) = expected else {
        return Ok(());
    };

    let mut file = std::fs::File::open(path)?;
    let mut hasher = Sha256::new();
    std::io::copy(&mut file, &mut hasher)?;
    let actual: String = hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect();

    if actual.eq_ignore_ascii_case(expected) {
        Ok(())
    } else {
        Err(VigilError::ChecksumMismatch {
            file: path.display().to_string(),
            expected: expected.to_string(),
            actual,
        })
    }
}

/// Rewrites `llm.model_path` in the configuration file, creating the file
/// from defaults when it does not exist
fn update_model_path(config_path: &Path, model_path: &Path) -> Result<()> {
    let mut config = AgentConfig::load_or_default(config_path)?;
    config.llm.model_path = model_path.display().to_string();
    config.save(config_path)?;
    info!(
        "Updated {} with model path {}",
        config_path.display(),
        model_path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_model_is_an_error() {
        assert!(matches!(
            find_model("no-such-model"),
            Err(VigilError::UnknownModel(_))
        ));
    }

    #[test]
    fn catalog_names_are_unique() {
        let mut names: Vec<&str> = catalog().iter().map(|s| s.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), catalog().len());
    }

    #[test]
    fn checksum_verification() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.bin");
        std::fs::write(&path, b"hello").unwrap();

        // sha256 of "hello"
        let good = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";
        assert!(verify_checksum(&path, Some(good)).is_ok());
        assert!(matches!(
            verify_checksum(&path, Some("deadbeef")),
            Err(VigilError::ChecksumMismatch { .. })
        ));
        assert!(verify_checksum(&path, None).is_ok());
    }

    #[test]
    fn checksum_handles_large_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.bin");
        let content = vec![0xab_u8; 300 * 1024];
        std::fs::write(&path, &content).unwrap();

        let expected: String = Sha256::digest(&content)
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect();
        assert!(verify_checksum(&path, Some(&expected)).is_ok());
    }
}
