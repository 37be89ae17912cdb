//! Tree fingerprint for change detection
//!
//! The fingerprint covers file names only. Edits that keep every name the
//! same are not detected.

use std::fmt;

use sha2::{Digest, Sha256};

use crate::scan::RelativePath;

/// Length of a hex-encoded SHA-256 digest
const HEX_LEN: usize = 64;

/// Hex SHA-256 over the sorted set of scanned paths
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TreeFingerprint(String);

impl TreeFingerprint {
    /// Fingerprint a sequence of relative paths.
    ///
    /// Paths are sorted byte-wise before hashing, each followed by `\n`, so
    /// the result does not depend on input order.
    pub fn compute<I>(paths: I) -> Self
    where
        I: IntoIterator<Item = RelativePath>,
    {
        let mut names: Vec<String> = paths.into_iter().map(|p| p.as_str().to_owned()).collect();
        names.sort_unstable();

        let mut hasher = Sha256::new();
        for name in &names {
            hasher.update(name.as_bytes());
            hasher.update(b"\n");
        }
        Self(hex::encode(hasher.finalize()))
    }

    /// Parse a stored value. Returns `None` unless it is a full hex digest.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.len() != HEX_LEN || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        Some(Self(s.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TreeFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
