use std::{
    hash::{DefaultHasher, Hash, Hasher},
    path::{Path, PathBuf},
};

use tokio::fs;

use crate::{error::Result, provider::ProviderConfig, types::SentimentReport};

/// Content address for uploaded bytes
pub fn content_hash(bytes: &[u8]) -> u64 {
    let mut hasher = DefaultHasher::new();
    bytes.hash(&mut hasher);
    hasher.finish()
}

pub fn get_root_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("sentiscope")
}

/// Get the cache directory for a given video content hash
pub fn get_cache_dir(root: &Path, hash: u64) -> PathBuf {
    root.join(format!("{hash:016x}"))
}

/// Get the path for a cached report file (model aware)
pub fn get_report_path(cache_dir: &Path, provider: &ProviderConfig) -> PathBuf {
    let model = provider.model.replace(['/', ':'], "_");
    cache_dir.join(format!("report_{model}.json"))
}

/// Load a report from a cached file
pub async fn load_report(path: &Path) -> Result<SentimentReport> {
    let json_content = fs::read_to_string(path).await?;
    let report: SentimentReport = serde_json::from_str(&json_content)?;
    Ok(report)
}

/// Save a report to a file
pub async fn save_report(report: &SentimentReport, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    let pretty_json = serde_json::to_string_pretty(report)?;
    fs::write(path, &pretty_json).await?;
    Ok(())
}
