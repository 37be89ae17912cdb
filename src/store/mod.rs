//! Manifest regeneration
//!
//! Every run rescans the tree and compares its fingerprint to the stored
//! one. The manifest is **stable** when both agree and the manifest file
//! exists; anything else is **stale**. A stale run:
//!
//! 1. moves the existing manifest into the archive directory,
//! 2. writes the new manifest,
//! 3. writes the new fingerprint.
//!
//! The steps are not atomic. If the process dies after step 1 the manifest
//! is missing, which the next run treats as stale and repairs.
//!
//! No locking is done; concurrent runs against one root must be prevented
//! by the caller.

mod archive;

pub use archive::{archive_manifest, archive_name, TIMESTAMP_FORMAT};

use chrono::{DateTime, Utc};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::fingerprint::TreeFingerprint;
use crate::ignore::{IgnoreError, IgnoreRules};
use crate::manifest::Manifest;
use crate::scan::{self, RelativePath, ScanError};

/// Errors for manifest regeneration
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Ignore(#[from] IgnoreError),

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error("Cannot create archive directory {}: {source}", .path.display())]
    CreateArchiveDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Cannot archive {} to {}: {source}", .manifest.display(), .to.display())]
    Archive {
        manifest: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Cannot write manifest {}: {source}", .path.display())]
    WriteManifest {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Cannot write fingerprint {}: {source}", .path.display())]
    WriteFingerprint {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Why a manifest needs regenerating
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StaleReason {
    /// No manifest at the canonical location
    ManifestMissing,
    /// No fingerprint file, or its content is unusable
    FingerprintMissing,
    /// The tree changed since the last generation
    FingerprintMismatch { stored: TreeFingerprint },
}

impl StaleReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            StaleReason::ManifestMissing => "manifest_missing",
            StaleReason::FingerprintMissing => "fingerprint_missing",
            StaleReason::FingerprintMismatch { .. } => "fingerprint_mismatch",
        }
    }
}

/// Result of comparing the tree against stored state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestState {
    Stable,
    Stale(StaleReason),
}

impl ManifestState {
    pub fn is_stable(&self) -> bool {
        matches!(self, ManifestState::Stable)
    }
}

/// Status of a scan root, without side effects
#[derive(Debug, Clone)]
pub struct Status {
    pub state: ManifestState,
    pub current: TreeFingerprint,
    pub stored: Option<TreeFingerprint>,
}

/// What a sync run did
#[derive(Debug, Clone)]
pub enum SyncOutcome {
    /// Nothing written
    UpToDate { fingerprint: TreeFingerprint },
    /// Manifest and fingerprint written
    Written {
        fingerprint: TreeFingerprint,
        reason: StaleReason,
        /// Where the previous manifest went, if there was one
        archived: Option<PathBuf>,
        groups: usize,
        files: usize,
    },
}

/// Manifest state for one scan root
#[derive(Debug)]
pub struct ManifestStore {
    root: PathBuf,
    config: Config,
    rules: IgnoreRules,
}

impl ManifestStore {
    /// Open a store, loading ignore rules from the configured ignore file
    pub fn open(root: &Path, config: Config) -> Result<Self, StoreError> {
        let rules = IgnoreRules::from_file(&root.join(&config.ignore_file))?
            .with_patterns(&config.extra_ignore)?;
        Self::with_rules(root, config, rules)
    }

    /// Create a store with explicit ignore rules.
    ///
    /// The store's own outputs are appended as exclusions so they never
    /// affect the fingerprint, whatever the user rules say.
    pub fn with_rules(root: &Path, config: Config, rules: IgnoreRules) -> Result<Self, StoreError> {
        let own_outputs = [
            format!("/{}", globset::escape(&config.manifest_file)),
            format!("/{}", globset::escape(&config.fingerprint_file)),
            format!("/{}/", config.archive_dir),
        ];
        let rules = rules.with_patterns(own_outputs)?;
        Ok(Self {
            root: root.to_path_buf(),
            config,
            rules,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn rules(&self) -> &IgnoreRules {
        &self.rules
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(&self.config.manifest_file)
    }

    pub fn fingerprint_path(&self) -> PathBuf {
        self.root.join(&self.config.fingerprint_file)
    }

    pub fn archive_dir(&self) -> PathBuf {
        self.root.join(&self.config.archive_dir)
    }

    /// Scan the tree; the first walk error aborts
    pub fn scan(&self) -> Result<Vec<RelativePath>, StoreError> {
        let paths = scan::scan(&self.root, &self.rules).collect::<Result<Vec<_>, _>>()?;
        tracing::debug!(count = paths.len(), "scanned tree");
        Ok(paths)
    }

    pub fn current_fingerprint(&self) -> Result<TreeFingerprint, StoreError> {
        Ok(TreeFingerprint::compute(self.scan()?))
    }

    /// Read the stored fingerprint. Unreadable or malformed files count as
    /// absent.
    pub fn stored_fingerprint(&self) -> Option<TreeFingerprint> {
        let path = self.fingerprint_path();
        let contents = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "unreadable fingerprint file; regenerating");
                return None;
            }
        };
        let parsed = TreeFingerprint::parse(&contents);
        if parsed.is_none() {
            tracing::warn!(path = %path.display(), "malformed fingerprint file; regenerating");
        }
        parsed
    }

    fn state_for(&self, current: &TreeFingerprint, stored: Option<&TreeFingerprint>) -> ManifestState {
        if !self.manifest_path().is_file() {
            return ManifestState::Stale(StaleReason::ManifestMissing);
        }
        match stored {
            None => ManifestState::Stale(StaleReason::FingerprintMissing),
            Some(stored) if stored != current => {
                ManifestState::Stale(StaleReason::FingerprintMismatch {
                    stored: stored.clone(),
                })
            }
            Some(_) => ManifestState::Stable,
        }
    }

    /// Compare the tree against stored state without writing anything
    pub fn status(&self) -> Result<Status, StoreError> {
        let current = self.current_fingerprint()?;
        let stored = self.stored_fingerprint();
        let state = self.state_for(&current, stored.as_ref());
        Ok(Status {
            state,
            current,
            stored,
        })
    }

    /// Regenerate the manifest if stale
    pub fn sync(&self) -> Result<SyncOutcome, StoreError> {
        self.sync_at(Utc::now())
    }

    /// [`ManifestStore::sync`] with an explicit archive timestamp
    pub fn sync_at(&self, now: DateTime<Utc>) -> Result<SyncOutcome, StoreError> {
        let paths = self.scan()?;
        let current = TreeFingerprint::compute(paths.iter().cloned());
        let stored = self.stored_fingerprint();

        let reason = match self.state_for(&current, stored.as_ref()) {
            ManifestState::Stable => {
                tracing::info!(fingerprint = %current, "manifest up to date");
                return Ok(SyncOutcome::UpToDate {
                    fingerprint: current,
                });
            }
            ManifestState::Stale(reason) => reason,
        };
        tracing::info!(reason = reason.as_str(), fingerprint = %current, "manifest stale");

        let manifest = Manifest::build(paths, &self.config.base_url, &self.config.extension);

        let manifest_path = self.manifest_path();
        let archived = if manifest_path.exists() {
            Some(archive_manifest(&manifest_path, &self.archive_dir(), now)?)
        } else {
            None
        };

        manifest
            .write_to_file(&manifest_path)
            .map_err(|source| StoreError::WriteManifest {
                path: manifest_path.clone(),
                source,
            })?;
        tracing::info!(
            path = %manifest_path.display(),
            groups = manifest.groups().len(),
            files = manifest.file_count(),
            "wrote manifest"
        );

        let fingerprint_path = self.fingerprint_path();
        fs::write(&fingerprint_path, format!("{}\n", current)).map_err(|source| {
            StoreError::WriteFingerprint {
                path: fingerprint_path,
                source,
            }
        })?;

        Ok(SyncOutcome::Written {
            fingerprint: current,
            reason,
            archived,
            groups: manifest.groups().len(),
            files: manifest.file_count(),
        })
    }
}
