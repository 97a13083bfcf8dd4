// Manifest: the JSON record written next to the binary after a successful
// upload. It is write-only from this program's point of view.

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Prefix of the viewer link the manifest points at.
pub const DEFAULT_VIEWER_URL: &str = "https://disk.yandex.ru/client/disk";

/// One upload, as recorded on disk. Field names are the on-disk keys.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Manifest {
    pub timestamp: String,
    pub group_name: String,
    pub text: String,
    pub file_name: String,
    pub file_size: u64,
    pub file_path: String,
    pub yandex_disk_url: String,
    pub source_url: String,
}

impl Manifest {
    /// Name of the manifest file for a run finishing at `at`.
    pub fn file_name_for(at: &DateTime<Local>) -> String {
        format!("backup_info_{}.json", at.format("%Y%m%d_%H%M%S"))
    }

    /// ISO-8601 local time without offset, microsecond precision.
    pub fn timestamp_for(at: &DateTime<Local>) -> String {
        at.naive_local().format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
    }

    /// Write the manifest as pretty-printed UTF-8 JSON into `dir` and
    /// return the full path of the new file.
    pub fn write_to(&self, dir: &Path, at: &DateTime<Local>) -> Result<PathBuf> {
        let path = dir.join(Self::file_name_for(at));
        let body = serde_json::to_string_pretty(self).context("Serializing manifest")?;
        fs::write(&path, body)
            .with_context(|| format!("Failed to write manifest {}", path.display()))?;
        Ok(path)
    }
}

/// Viewer link for a folder on the drive's web client.
pub fn viewer_url(prefix: &str, group: &str) -> String {
    format!("{}/{}", prefix.trim_end_matches('/'), group)
}
