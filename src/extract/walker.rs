use walkdir::WalkDir;
use std::path::{Path, PathBuf};
use crate::error::{OwnergraphError, Result};

/// A discovered owner page
#[derive(Debug, Clone)]
pub struct PageFile {
    pub relative_path: String,
    pub absolute_path: PathBuf,
    pub file_size: u64,
}

/// Discover all `.html` / `.htm` files under `root`, sorted by path so that
/// ingestion order (and therefore relationship row order) is reproducible.
pub fn discover_html_files(root: &Path) -> Result<Vec<PageFile>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();

        if !path.is_file() {
            continue;
        }

        let extension = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_lowercase();

        if !matches!(extension.as_str(), "html" | "htm") {
            continue;
        }

        let metadata = std::fs::metadata(path).map_err(OwnergraphError::Io)?;

        let relative_path = path
            .strip_prefix(root)
            .map_err(|_| OwnergraphError::Config(
                format!("Failed to compute relative path for: {}", path.display())
            ))?
            .to_string_lossy()
            .to_string();

        files.push(PageFile {
            relative_path,
            absolute_path: path.to_path_buf(),
            file_size: metadata.len(),
        });
    }

    log::info!("Discovered {} owner pages in {}", files.len(), root.display());
    Ok(files)
}
