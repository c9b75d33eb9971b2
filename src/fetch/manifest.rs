use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;

use crate::error::{OwnergraphError, Result};

pub const MANIFEST_FILE: &str = "fetch_manifest.json";

/// One downloaded page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub url: String,
    /// File name relative to the output directory.
    pub file: String,
    pub sha256: String,
    pub fetched_at: DateTime<Utc>,
}

/// Record of every page written to an output directory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest {
    pub pages: Vec<ManifestEntry>,
}

impl Manifest {
    /// Load `fetch_manifest.json` from `dir`; a missing file is an empty manifest.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(MANIFEST_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(&path)?;
        serde_json::from_str(&text)
            .map_err(|e| OwnergraphError::Parse(format!("{}: {}", path.display(), e)))
    }

    pub fn save(&self, dir: &Path) -> Result<()> {
        let text = serde_json::to_string_pretty(self)
            .map_err(|e| OwnergraphError::Export(format!("Failed to serialize manifest: {}", e)))?;
        std::fs::write(dir.join(MANIFEST_FILE), text)?;
        Ok(())
    }

    pub fn get(&self, url: &str) -> Option<&ManifestEntry> {
        self.pages.iter().find(|e| e.url == url)
    }

    /// Replace the entry for the same url, or append.
    pub fn upsert(&mut self, entry: ManifestEntry) {
        match self.pages.iter_mut().find(|e| e.url == entry.url) {
            Some(existing) => *existing = entry,
            None => self.pages.push(entry),
        }
    }
}

/// Hex SHA-256 of page content.
pub fn content_hash(content: &[u8]) -> String {
    format!("{:x}", Sha256::digest(content))
}
