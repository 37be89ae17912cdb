//! Root-relative paths in forward-slash form

use std::fmt;
use std::path::{Component, Path};

/// Marker that starts a hidden file or directory name
pub const HIDDEN_PREFIX: char = '.';

/// A path relative to the scan root, normalized to `a/b/c` form.
///
/// Never empty and never the root itself. Two values are equal when their
/// normalized strings are equal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RelativePath(String);

impl RelativePath {
    /// Build from a path already relative to the root.
    ///
    /// Only normal components are kept; `.`/`..`/prefix components are
    /// dropped. Returns `None` when nothing is left. Non-UTF-8 names are
    /// converted lossily.
    pub fn from_path(path: &Path) -> Option<Self> {
        let segments: Vec<String> = path
            .components()
            .filter_map(|c| match c {
                Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();
        if segments.is_empty() {
            return None;
        }
        Some(Self(segments.join("/")))
    }

    /// Parse a forward-slash string such as `kicks/Kick1.wav`.
    ///
    /// Backslashes are treated as separators; empty segments are dropped.
    pub fn parse(s: &str) -> Option<Self> {
        let segments: Vec<&str> = s
            .split(['/', '\\'])
            .filter(|seg| !seg.is_empty() && *seg != ".")
            .collect();
        if segments.is_empty() {
            return None;
        }
        Some(Self(segments.join("/")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }

    pub fn segment_count(&self) -> usize {
        self.segments().count()
    }

    /// First segment: the top-level directory, or the file itself at root
    pub fn top_level(&self) -> &str {
        self.0.split('/').next().unwrap_or(&self.0)
    }

    /// Last segment
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Whether any segment starts with the hidden marker
    pub fn is_hidden(&self) -> bool {
        self.segments().any(is_hidden_name)
    }
}

/// Whether a single name is hidden
pub fn is_hidden_name(name: &str) -> bool {
    name.starts_with(HIDDEN_PREFIX)
}

impl fmt::Display for RelativePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RelativePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_from_path_normalizes() {
        let p: PathBuf = ["kicks", "sub", "a.wav"].iter().collect();
        let rel = RelativePath::from_path(&p).unwrap();
        assert_eq!(rel.as_str(), "kicks/sub/a.wav");
        assert_eq!(rel.segment_count(), 3);
        assert_eq!(rel.top_level(), "kicks");
        assert_eq!(rel.file_name(), "a.wav");
    }

    #[test]
    fn test_root_is_not_a_relative_path() {
        assert!(RelativePath::from_path(Path::new("")).is_none());
        assert!(RelativePath::from_path(Path::new(".")).is_none());
        assert!(RelativePath::parse("/").is_none());
    }

    #[test]
    fn test_parse_equals_from_path() {
        let a = RelativePath::parse("kicks\\Kick1.wav").unwrap();
        let b = RelativePath::from_path(Path::new("kicks/Kick1.wav")).unwrap();
        assert_eq!(a, b);
        assert_eq!(RelativePath::parse("./kicks//a.wav").unwrap().as_str(), "kicks/a.wav");
    }

    #[test]
    fn test_hidden_segments() {
        assert!(RelativePath::parse(".git/config").unwrap().is_hidden());
        assert!(RelativePath::parse("kicks/.DS_Store").unwrap().is_hidden());
        assert!(!RelativePath::parse("kicks/a.wav").unwrap().is_hidden());
    }

    #[test]
    fn test_single_segment() {
        let rel = RelativePath::parse("readme.wav").unwrap();
        assert_eq!(rel.segment_count(), 1);
        assert_eq!(rel.top_level(), "readme.wav");
        assert_eq!(rel.file_name(), "readme.wav");
    }
}
