//! Manifest configuration (.strudel-manifest.toml)
//!
//! Every key is optional; a missing file means all defaults. CLI flags are
//! applied on top with [`Config::with_overrides`].

use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Component, Path};

/// Config file looked up at the scan root
pub const CONFIG_FILENAME: &str = ".strudel-manifest.toml";

pub const DEFAULT_BASE_URL: &str = "https://raw.githubusercontent.com/rorads/strudel_wax/main/";
pub const DEFAULT_EXTENSION: &str = ".wav";
pub const DEFAULT_MANIFEST_FILE: &str = "strudel.json";
pub const DEFAULT_FINGERPRINT_FILE: &str = ".manifest_hash";
pub const DEFAULT_ARCHIVE_DIR: &str = ".archive-manifests";
pub const DEFAULT_IGNORE_FILE: &str = ".gitignore";

/// Error types for config operations
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// Manifest generation settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Value of the reserved `_base` key
    pub base_url: String,

    /// File extension to list, e.g. ".wav"
    pub extension: String,

    /// Manifest file name at the scan root
    pub manifest_file: String,

    /// Stored fingerprint file name at the scan root
    pub fingerprint_file: String,

    /// Directory receiving superseded manifests
    pub archive_dir: String,

    /// Ignore-rule file at the scan root
    pub ignore_file: String,

    /// Rules appended after the ignore file
    pub extra_ignore: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            extension: DEFAULT_EXTENSION.to_string(),
            manifest_file: DEFAULT_MANIFEST_FILE.to_string(),
            fingerprint_file: DEFAULT_FINGERPRINT_FILE.to_string(),
            archive_dir: DEFAULT_ARCHIVE_DIR.to_string(),
            ignore_file: DEFAULT_IGNORE_FILE.to_string(),
            extra_ignore: Vec::new(),
        }
    }
}

impl Config {
    /// Load and parse config from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_str(&contents)
    }

    /// Load `.strudel-manifest.toml` from `root`, or defaults if absent
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        let path = root.join(CONFIG_FILENAME);
        if path.exists() {
            tracing::debug!(path = %path.display(), "loading config");
            Self::from_file(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse config from a TOML string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(s)?;
        config.normalized()
    }

    /// Apply command-line overrides
    pub fn with_overrides(
        mut self,
        base_url: Option<String>,
        extension: Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(base_url) = base_url {
            self.base_url = base_url;
        }
        if let Some(extension) = extension {
            self.extension = extension;
        }
        self.normalized()
    }

    /// Validate, and add the leading dot to a bare extension
    fn normalized(mut self) -> Result<Self, ConfigError> {
        if !self.extension.is_empty() && !self.extension.starts_with('.') {
            self.extension.insert(0, '.');
        }
        self.validate()?;
        Ok(self)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "'base_url' must not be empty".to_string(),
            ));
        }

        if self.extension.len() < 2 || self.extension[1..].contains(['.', '/', '\\']) {
            return Err(ConfigError::ValidationError(format!(
                "Invalid extension '{}': expected something like '.wav'",
                self.extension
            )));
        }

        for (key, value) in [
            ("manifest_file", &self.manifest_file),
            ("fingerprint_file", &self.fingerprint_file),
            ("archive_dir", &self.archive_dir),
            ("ignore_file", &self.ignore_file),
        ] {
            Self::validate_file_name(key, value)?;
        }

        if self.manifest_file == self.fingerprint_file {
            return Err(ConfigError::ValidationError(
                "'manifest_file' and 'fingerprint_file' must differ".to_string(),
            ));
        }

        Ok(())
    }

    /// Names must be one plain segment directly under the scan root
    fn validate_file_name(key: &str, value: &str) -> Result<(), ConfigError> {
        let mut components = Path::new(value).components();
        let single = matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        );
        if !single || value.contains(['/', '\\']) {
            return Err(ConfigError::ValidationError(format!(
                "'{}' must be a plain file name, got '{}'",
                key, value
            )));
        }
        Ok(())
    }
}
