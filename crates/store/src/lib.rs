//! On-disk artifacts of a status query.
//!
//! Files are written in one go with no temp-file/rename dance; a crash
//! mid-write can leave a partial file behind.

pub mod audit;

use anyhow::{Context, Result};
use nfe_status_core::{AccessKey, StatusRecord};
use std::fs;
use std::path::{Path, PathBuf};

/// Create the output directory (and parents) if missing.
pub fn ensure_output_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))
}

pub fn response_path(dir: &Path, key: &AccessKey) -> PathBuf {
    dir.join(format!("resposta_{key}.xml"))
}

pub fn status_path(dir: &Path, key: &AccessKey) -> PathBuf {
    dir.join(format!("parsed_status_{key}.json"))
}

/// Write the query document to `path`, creating its parent directory.
pub fn save_query_xml(path: &Path, xml: &str) -> Result<PathBuf> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        ensure_output_dir(parent)?;
    }
    fs::write(path, xml)
        .with_context(|| format!("Failed to write query XML to {}", path.display()))?;
    tracing::info!(path = %path.display(), "Query XML saved");
    Ok(path.to_path_buf())
}

/// Write the raw SEFAZ reply to `<dir>/resposta_<key>.xml`.
pub fn save_response(dir: &Path, key: &AccessKey, raw: &str) -> Result<PathBuf> {
    let path = response_path(dir, key);
    fs::write(&path, raw)
        .with_context(|| format!("Failed to write response to {}", path.display()))?;
    tracing::info!(path = %path.display(), "Response saved");
    Ok(path)
}

/// Write the status record as pretty JSON to `<dir>/parsed_status_<key>.json`.
pub fn save_status(dir: &Path, key: &AccessKey, record: &StatusRecord) -> Result<PathBuf> {
    let path = status_path(dir, key);
    let json = serde_json::to_string_pretty(record).context("Failed to serialize status")?;
    fs::write(&path, json)
        .with_context(|| format!("Failed to write status to {}", path.display()))?;
    tracing::info!(path = %path.display(), "Parsed status saved");
    Ok(path)
}
