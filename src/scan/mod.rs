//! Directory tree scanning
//!
//! Walks the scan root and yields the root-relative path of every file that
//! is neither hidden nor excluded. Directories failing the same check are
//! pruned before descent, so their contents are never visited.
//!
//! Walk order follows the filesystem and is not stable; callers needing a
//! deterministic order must sort.

mod path;

pub use path::{is_hidden_name, RelativePath, HIDDEN_PREFIX};

use std::path::{Path, PathBuf};

use walkdir::{DirEntry, FilterEntry, WalkDir};

use crate::ignore::{ExclusionPattern, IgnoreRules};

/// Errors for scanning
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("Walk error: {0}")]
    WalkError(#[from] walkdir::Error),

    #[error("Path is not within scan root: {0}")]
    PathNotInRoot(PathBuf),
}

/// Why a path is or is not part of the scan
#[derive(Debug, Clone, Copy)]
pub enum Admission<'r> {
    /// Included; `by` is the negated rule that re-included it, if any
    Included { by: Option<&'r ExclusionPattern> },
    /// A segment starts with the hidden marker
    Hidden,
    /// Excluded by this rule
    Excluded(&'r ExclusionPattern),
}

impl Admission<'_> {
    pub fn is_included(&self) -> bool {
        matches!(self, Admission::Included { .. })
    }
}

/// Decide whether `path` takes part in the scan.
///
/// This is the only hidden/exclusion check: the walker uses it to prune
/// directories and to filter files. Ancestors are checked first, shortest
/// first, so a path under an excluded directory reports that directory's
/// rule even if a later negation would match the path itself.
pub fn admission<'r>(path: &RelativePath, rules: &'r IgnoreRules) -> Admission<'r> {
    if path.is_hidden() {
        return Admission::Hidden;
    }
    let full = path.as_str();
    let ancestors = full.match_indices('/').map(|(i, _)| &full[..i]);
    for prefix in ancestors {
        if let Some(rule) = rules.decide(prefix).filter(|r| !r.is_negated()) {
            return Admission::Excluded(rule);
        }
    }
    match rules.decide(full) {
        Some(rule) if !rule.is_negated() => Admission::Excluded(rule),
        by => Admission::Included { by },
    }
}

/// Shorthand for [`admission`]`(..).is_included()`
pub fn is_admitted(path: &RelativePath, rules: &IgnoreRules) -> bool {
    admission(path, rules).is_included()
}

type Prune<'r> = Box<dyn FnMut(&DirEntry) -> bool + 'r>;

/// Lazy traversal of one scan root.
///
/// Each call to [`scan`] starts a fresh walk.
pub struct Scan<'r> {
    root: PathBuf,
    walker: FilterEntry<walkdir::IntoIter, Prune<'r>>,
}

/// Start scanning `root` with the given rules
pub fn scan<'r>(root: &Path, rules: &'r IgnoreRules) -> Scan<'r> {
    let prune_root = root.to_path_buf();
    let prune: Prune<'r> = Box::new(move |entry: &DirEntry| {
        if entry.depth() == 0 {
            return true;
        }
        let Some(rel) = entry
            .path()
            .strip_prefix(&prune_root)
            .ok()
            .and_then(RelativePath::from_path)
        else {
            // Surfaced as PathNotInRoot by the iterator
            return true;
        };
        let admitted = is_admitted(&rel, rules);
        if !admitted && entry.file_type().is_dir() {
            tracing::debug!(path = %rel, "pruning directory");
        }
        admitted
    });

    let walker = WalkDir::new(root)
        .follow_links(false)
        .min_depth(1)
        .into_iter()
        .filter_entry(prune);

    Scan {
        root: root.to_path_buf(),
        walker,
    }
}

impl Iterator for Scan<'_> {
    type Item = Result<RelativePath, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.walker.next()? {
                Ok(entry) => entry,
                Err(e) => return Some(Err(e.into())),
            };

            let file_type = entry.file_type();
            if file_type.is_dir() {
                continue;
            }
            // Symlinked directories are neither followed nor listed
            if file_type.is_symlink() && entry.path().is_dir() {
                continue;
            }

            let rel = entry
                .path()
                .strip_prefix(&self.root)
                .ok()
                .and_then(RelativePath::from_path);
            return Some(rel.ok_or_else(|| ScanError::PathNotInRoot(entry.path().to_path_buf())));
        }
    }
}
