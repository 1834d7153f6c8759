use crate::model::CandidateFile;
use anyhow::{Context, Result};
use bytes::Bytes;
use std::path::{Path, PathBuf};

/// Read every path into a `CandidateFile`, named after its final path component.
pub async fn load_candidate_files(paths: &[PathBuf]) -> Result<Vec<CandidateFile>> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        files.push(load_one(path).await?);
    }
    Ok(files)
}

async fn load_one(path: &Path) -> Result<CandidateFile> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .map(|s| s.to_string())
        .with_context(|| format!("{} has no usable file name", path.display()))?;
    let content = tokio::fs::read(path)
        .await
        .with_context(|| format!("read {}", path.display()))?;
    Ok(CandidateFile {
        name,
        content: Bytes::from(content),
    })
}
