//! Moving superseded manifests into the archive directory

use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};

use super::StoreError;

/// UTC, second precision, e.g. `20261019T083000Z`
pub const TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// Archive file name for a manifest: `<stem>.<timestamp>[-n].<ext>`.
///
/// `attempt` 0 gives the plain name; later attempts add a `-n` suffix.
pub fn archive_name(manifest_file: &str, now: DateTime<Utc>, attempt: u32) -> String {
    let ts = now.format(TIMESTAMP_FORMAT);
    let suffix = if attempt == 0 {
        String::new()
    } else {
        format!("-{}", attempt)
    };
    match manifest_file.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{stem}.{ts}{suffix}.{ext}"),
        _ => format!("{manifest_file}.{ts}{suffix}"),
    }
}

/// Move `manifest` into `archive_dir`, returning the new path.
///
/// Creates the directory if needed. Names already present in the directory
/// are never overwritten; the first free `-n` suffix is used instead.
pub fn archive_manifest(
    manifest: &Path,
    archive_dir: &Path,
    now: DateTime<Utc>,
) -> Result<PathBuf, StoreError> {
    fs::create_dir_all(archive_dir).map_err(|source| StoreError::CreateArchiveDir {
        path: archive_dir.to_path_buf(),
        source,
    })?;

    let file_name = manifest
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut attempt = 0;
    let target = loop {
        let candidate = archive_dir.join(archive_name(&file_name, now, attempt));
        if !candidate.exists() {
            break candidate;
        }
        attempt += 1;
    };

    fs::rename(manifest, &target).map_err(|source| StoreError::Archive {
        manifest: manifest.to_path_buf(),
        to: target.clone(),
        source,
    })?;

    tracing::info!(archived = %target.display(), "archived previous manifest");
    Ok(target)
}
