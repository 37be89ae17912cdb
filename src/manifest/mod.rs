//! Sample manifest (strudel.json)
//!
//! Groups matching files by their top-level directory. The reserved `_base`
//! key holding the base URL is always written first, followed by one key per
//! directory in ascending order.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

use caseless::default_case_fold_str;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::scan::{is_hidden_name, RelativePath};

/// Reserved key holding the base URL
pub const BASE_KEY: &str = "_base";

/// Error for reading a manifest back
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Manifest is missing the '_base' key")]
    MissingBase,

    #[error("Group '{0}' is not an array of strings")]
    InvalidGroup(String),
}

/// Ordered manifest: base URL plus directory groups
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    base_url: String,
    groups: BTreeMap<String, Vec<String>>,
}

impl Manifest {
    /// Build a manifest from scanned paths.
    ///
    /// Keeps files whose name ends with `extension` (any case) and that sit
    /// inside a non-hidden top-level directory. Files at the root are never
    /// listed. Each group is ordered by Unicode case fold, ties byte-wise.
    pub fn build<I>(paths: I, base_url: &str, extension: &str) -> Self
    where
        I: IntoIterator<Item = RelativePath>,
    {
        let extension = extension.to_lowercase();
        let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();

        for path in paths {
            let name = path.file_name().to_lowercase();
            if name.len() <= extension.len() || !name.ends_with(&extension) {
                continue;
            }
            if path.segment_count() < 2 {
                continue;
            }
            let top = path.top_level();
            if is_hidden_name(top) {
                continue;
            }
            if top == BASE_KEY {
                tracing::warn!(path = %path, "directory name collides with reserved key; skipping");
                continue;
            }
            groups
                .entry(top.to_string())
                .or_default()
                .push(path.as_str().to_string());
        }

        for files in groups.values_mut() {
            files.sort_by_cached_key(|f| (default_case_fold_str(f), f.clone()));
        }

        Self {
            base_url: base_url.to_string(),
            groups,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Groups in key order
    pub fn groups(&self) -> &BTreeMap<String, Vec<String>> {
        &self.groups
    }

    /// Files in one group
    pub fn group(&self, name: &str) -> Option<&[String]> {
        self.groups.get(name).map(Vec::as_slice)
    }

    /// Total number of listed files
    pub fn file_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    /// Serialize as two-space indented JSON with a trailing newline
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        Ok(json)
    }

    /// Parse a manifest previously written by [`Manifest::to_json`]
    pub fn from_json(json: &str) -> Result<Self, ManifestError> {
        let object: serde_json::Map<String, serde_json::Value> = serde_json::from_str(json)?;

        let mut base_url = None;
        let mut groups = BTreeMap::new();
        for (key, value) in object {
            if key == BASE_KEY {
                base_url = value.as_str().map(str::to_string);
                continue;
            }
            let files = value
                .as_array()
                .and_then(|items| {
                    items
                        .iter()
                        .map(|v| v.as_str().map(str::to_string))
                        .collect::<Option<Vec<_>>>()
                })
                .ok_or_else(|| ManifestError::InvalidGroup(key.clone()))?;
            groups.insert(key, files);
        }

        Ok(Self {
            base_url: base_url.ok_or(ManifestError::MissingBase)?,
            groups,
        })
    }

    /// Write to file
    pub fn write_to_file(&self, path: &Path) -> io::Result<()> {
        let json = self.to_json().map_err(|e| {
            io::Error::new(io::ErrorKind::InvalidData, format!("JSON error: {}", e))
        })?;
        fs::write(path, json)
    }

    /// Load from file
    pub fn from_file(path: &Path) -> Result<Self, ManifestError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

impl Serialize for Manifest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.groups.len() + 1))?;
        map.serialize_entry(BASE_KEY, &self.base_url)?;
        for (dir, files) in &self.groups {
            map.serialize_entry(dir, files)?;
        }
        map.end()
    }
}
