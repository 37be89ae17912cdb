//! strudel-manifest - sample manifest generator
//!
//! Scans a sample library, lists audio files grouped by top-level directory
//! in a JSON manifest, and rewrites that manifest only when the set of file
//! names changes. Superseded manifests are moved to an archive directory.

pub mod config;
pub mod fingerprint;
pub mod ignore;
pub mod manifest;
pub mod scan;
pub mod store;

pub use config::{Config, ConfigError};
pub use fingerprint::TreeFingerprint;
pub use ignore::{ExclusionPattern, IgnoreError, IgnoreRules};
pub use manifest::{Manifest, ManifestError, BASE_KEY};
pub use scan::{scan, Admission, RelativePath, ScanError};
pub use store::{ManifestState, ManifestStore, StaleReason, Status, StoreError, SyncOutcome};
