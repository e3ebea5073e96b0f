use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::archive::{MatchArchive, SavedMatch};

const EXPORT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct ArchiveFile {
    version: u32,
    matches: Vec<SavedMatch>,
}

/// Writes every saved match as pretty JSON. The write goes to a sibling temp
/// file first so a crash never leaves a half-written export behind.
pub fn export_archive(archive: &MatchArchive, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent()
        && !dir.as_os_str().is_empty()
    {
        fs::create_dir_all(dir)
            .with_context(|| format!("create export dir {}", dir.display()))?;
    }
    let file = ArchiveFile {
        version: EXPORT_VERSION,
        matches: archive.matches().to_vec(),
    };
    let json = serde_json::to_string_pretty(&file).context("serialize archive")?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).with_context(|| format!("write {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("rename into {}", path.display()))?;
    Ok(())
}

pub fn read_archive_export(path: &Path) -> Result<MatchArchive> {
    let raw =
        fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let file: ArchiveFile = serde_json::from_str(&raw)
        .with_context(|| format!("parse archive export {}", path.display()))?;
    if file.version != EXPORT_VERSION {
        bail!(
            "unsupported archive export version {} (expected {EXPORT_VERSION})",
            file.version
        );
    }
    Ok(MatchArchive::from(file.matches))
}
