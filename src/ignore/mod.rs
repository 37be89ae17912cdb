//! Path exclusion rules
//!
//! A small gitignore-style evaluator: rules are checked in order and the
//! last rule that applies decides, so a later `!pattern` re-includes a path
//! an earlier rule excluded.

mod pattern;

pub use pattern::ExclusionPattern;

use std::fs;
use std::io;
use std::path::Path;

/// Errors for exclusion rules
#[derive(Debug, thiserror::Error)]
pub enum IgnoreError {
    #[error("Failed to read ignore file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidGlob {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("Pattern '{0}' has nothing to match")]
    EmptyPattern(String),
}

/// Ordered exclusion rules
#[derive(Debug, Clone, Default)]
pub struct IgnoreRules {
    patterns: Vec<ExclusionPattern>,
}

impl IgnoreRules {
    /// Rules that exclude nothing
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build rules from pattern lines, in order.
    ///
    /// Blank lines and `#` comments are skipped. A line that reduces to
    /// nothing (`/`, `!`) is skipped with a warning.
    pub fn from_lines<I, S>(lines: I) -> Result<Self, IgnoreError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut patterns = Vec::new();
        for line in lines {
            let line = line.as_ref().trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match ExclusionPattern::parse(line) {
                Ok(p) => patterns.push(p),
                Err(IgnoreError::EmptyPattern(p)) => {
                    tracing::warn!(pattern = %p, "skipping ignore rule with nothing to match");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(Self { patterns })
    }

    /// Load rules from an ignore file. A missing file yields no rules.
    pub fn from_file(path: &Path) -> Result<Self, IgnoreError> {
        let contents = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no ignore file");
                return Ok(Self::empty());
            }
            Err(source) => {
                return Err(IgnoreError::Io {
                    path: path.display().to_string(),
                    source,
                })
            }
        };
        Self::from_lines(contents.lines())
    }

    /// Append rules after the existing ones, so they take precedence
    pub fn with_patterns<I, S>(mut self, lines: I) -> Result<Self, IgnoreError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let extra = Self::from_lines(lines)?;
        self.patterns.extend(extra.patterns);
        Ok(self)
    }

    pub fn patterns(&self) -> &[ExclusionPattern] {
        &self.patterns
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// The last rule that applies to `path`, if any
    pub fn decide(&self, path: &str) -> Option<&ExclusionPattern> {
        self.patterns.iter().rev().find(|p| p.applies_to(path))
    }

    /// Check if a root-relative, forward-slash path is excluded
    pub fn is_excluded(&self, path: &str) -> bool {
        self.decide(path).is_some_and(|p| !p.is_negated())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_rules_exclude_nothing() {
        let rules = IgnoreRules::empty();
        assert!(!rules.is_excluded("anything"));
        assert!(!rules.is_excluded("a/b/c.wav"));
    }

    #[test]
    fn test_negation_after_exclusion() {
        let rules = IgnoreRules::from_lines(["*.wav", "!keep.wav"]).unwrap();
        assert!(!rules.is_excluded("keep.wav"));
        assert!(rules.is_excluded("skip.wav"));
    }

    #[test]
    fn test_negation_before_exclusion_has_no_effect() {
        let rules = IgnoreRules::from_lines(["!keep.wav", "*.wav"]).unwrap();
        assert!(rules.is_excluded("keep.wav"));
    }

    #[test]
    fn test_last_match_wins() {
        let rules = IgnoreRules::from_lines(["tmp/", "!tmp/", "tmp/"]).unwrap();
        assert!(rules.is_excluded("tmp/x.wav"));

        let rules = IgnoreRules::from_lines(["tmp/", "!tmp/"]).unwrap();
        assert!(!rules.is_excluded("tmp/x.wav"));
    }

    #[test]
    fn test_decide_reports_rule() {
        let rules = IgnoreRules::from_lines(["*.wav", "!keep.wav"]).unwrap();
        assert_eq!(rules.decide("keep.wav").unwrap().as_str(), "!keep.wav");
        assert_eq!(rules.decide("skip.wav").unwrap().as_str(), "*.wav");
        assert!(rules.decide("readme.md").is_none());
    }

    #[test]
    fn test_comments_and_blanks_skipped() {
        let rules = IgnoreRules::from_lines(["# comment", "", "   ", "  build/  ", "/"]).unwrap();
        assert_eq!(rules.patterns().len(), 1);
        assert!(rules.is_excluded("build/x"));
    }

    #[test]
    fn test_with_patterns_appends() {
        let rules = IgnoreRules::from_lines(["!strudel.json"])
            .unwrap()
            .with_patterns(["/strudel.json"])
            .unwrap();
        assert!(rules.is_excluded("strudel.json"));
    }

    #[test]
    fn test_ignore_file_parsing() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "# Comment").unwrap();
        writeln!(file, "*.tmp").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "  build/  ").unwrap();

        let rules = IgnoreRules::from_file(file.path()).unwrap();

        assert!(rules.is_excluded("test.tmp"));
        assert!(rules.is_excluded("build"));
        assert!(rules.is_excluded("build/out.wav"));
        assert!(!rules.is_excluded("src/main.wav"));
    }

    #[test]
    fn test_missing_ignore_file_is_empty() {
        let dir = tempfile::TempDir::new().unwrap();
        let rules = IgnoreRules::from_file(&dir.path().join(".gitignore")).unwrap();
        assert!(rules.is_empty());
    }
}
