use crate::model::{MatchReport, ARCHIVE_FILE_NAME};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Where archives go when no output directory is given: the user's download
/// directory, or the current directory when there is none.
pub fn default_output_dir() -> PathBuf {
    dirs::download_dir().unwrap_or_else(|| PathBuf::from("."))
}

/// Write the downloaded archive as `top_candidates.zip` inside `dir`.
pub fn save_archive(dir: &Path, archive: &[u8]) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    let path = dir.join(ARCHIVE_FILE_NAME);
    std::fs::write(&path, archive).with_context(|| format!("write {}", path.display()))?;
    Ok(path)
}

pub fn export_json(path: &Path, report: &MatchReport) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create {}", parent.display()))?;
        }
    }
    let data = serde_json::to_vec_pretty(report)?;
    std::fs::write(path, data).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}
