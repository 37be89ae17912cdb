//! Single exclusion rule parsed from one ignore-file line

use globset::{GlobBuilder, GlobMatcher};

use super::IgnoreError;

/// One gitignore-style rule.
///
/// Supports a subset of gitignore syntax: `!` negation, a leading `/` to
/// anchor at the scan root, and a trailing `/` for directory rules.
/// `**` and nested negation precedence are not given gitignore meaning.
/// Braces and backslashes match themselves.
#[derive(Debug, Clone)]
pub struct ExclusionPattern {
    /// The line as written, for reporting
    source: String,
    /// Leading `!`
    negated: bool,
    /// Leading `/`
    anchored: bool,
    /// Trailing `/`
    directory: bool,
    /// Pattern body with the markers removed
    body: String,
    /// Compiled glob; `None` for directory rules, which compare literally
    matcher: Option<GlobMatcher>,
}

impl ExclusionPattern {
    /// Parse a single rule line.
    ///
    /// The caller is expected to have trimmed the line and dropped blank
    /// lines and comments already.
    pub fn parse(line: &str) -> Result<Self, IgnoreError> {
        let (negated, rest) = match line.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, line),
        };

        let directory = rest.ends_with('/');
        let rest = rest.trim_end_matches('/');

        let (anchored, body) = match rest.strip_prefix('/') {
            Some(body) => (true, body),
            None => (false, rest),
        };

        if body.is_empty() {
            return Err(IgnoreError::EmptyPattern(line.to_string()));
        }

        let matcher = if directory {
            None
        } else {
            // `*` crosses separators, like fnmatch
            let glob = GlobBuilder::new(&literal_braces(body))
                .literal_separator(false)
                .backslash_escape(false)
                .build()
                .map_err(|source| IgnoreError::InvalidGlob {
                    pattern: line.to_string(),
                    source,
                })?;
            Some(glob.compile_matcher())
        };

        Ok(Self {
            source: line.to_string(),
            negated,
            anchored,
            directory,
            body: body.to_string(),
            matcher,
        })
    }

    /// The rule as it appeared in the ignore source
    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_negated(&self) -> bool {
        self.negated
    }

    pub fn is_anchored(&self) -> bool {
        self.anchored
    }

    pub fn is_directory(&self) -> bool {
        self.directory
    }

    /// Whether this rule applies to `path` (forward-slash, root-relative),
    /// ignoring the negation flag.
    pub fn applies_to(&self, path: &str) -> bool {
        if self.directory {
            return path == self.body
                || path
                    .strip_prefix(self.body.as_str())
                    .is_some_and(|rest| rest.starts_with('/'));
        }

        let Some(matcher) = &self.matcher else {
            return false;
        };

        if matcher.is_match(path) {
            return true;
        }

        !self.anchored && path.split('/').any(|segment| matcher.is_match(segment))
    }
}

/// Wrap `{` and `}` outside character classes in `[...]` so they match
/// literally instead of starting an alternation.
fn literal_braces(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '{' | '}' => {
                out.push('[');
                out.push(c);
                out.push(']');
            }
            '[' => {
                // Copy the class through its closing `]`; a `]` right after
                // `[` or `[!` is part of the class.
                out.push('[');
                if let Some(&neg) = chars.peek() {
                    if neg == '!' || neg == '^' {
                        out.push(neg);
                        chars.next();
                    }
                }
                if chars.peek() == Some(&']') {
                    out.push(']');
                    chars.next();
                }
                for c in chars.by_ref() {
                    out.push(c);
                    if c == ']' {
                        break;
                    }
                }
            }
            _ => out.push(c),
        }
    }
    out
}
