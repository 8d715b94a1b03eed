//! Analyzer configuration
//!
//! Loaded from a TOML file; every key is optional.
//!
//! ```toml
//! string_type_name = "System.String"
//! preview_length = 64
//! exclude_assemblies = ["mscorlib", "UnityEngine"]
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Name of the string type in Mono/.NET captures
pub const DEFAULT_STRING_TYPE: &str = "System.String";

/// Characters kept when decoding string values
pub const DEFAULT_PREVIEW_LENGTH: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Full name of the type decoded as a UTF-16 string
    pub string_type_name: String,
    /// Maximum characters kept in a string preview
    pub preview_length: usize,
    /// Assemblies left out of snapshot diffs
    pub exclude_assemblies: Vec<String>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            string_type_name: DEFAULT_STRING_TYPE.to_string(),
            preview_length: DEFAULT_PREVIEW_LENGTH,
            exclude_assemblies: Vec::new(),
        }
    }
}

impl AnalyzerConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)?;
        let config: AnalyzerConfig = toml::from_str(&content)?;
        config.validate()?;
        debug!("Loaded config from {}", path.as_ref().display());
        Ok(config)
    }

    /// Load from `path`, falling back to defaults when the file is missing
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        match Self::load(&path) {
            Ok(config) => Ok(config),
            Err(e) if e.is_not_found() => {
                debug!(
                    "No config at {}, using defaults",
                    path.as_ref().display()
                );
                Ok(Self::default())
            }
            Err(e) => {
                warn!("Failed to load config {}: {}", path.as_ref().display(), e);
                Err(e)
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.string_type_name.trim().is_empty() {
            return Err(Error::InvalidConfig(
                "string_type_name must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn with_string_type(mut self, name: impl Into<String>) -> Self {
        self.string_type_name = name.into();
        self
    }

    pub fn with_preview_length(mut self, length: usize) -> Self {
        self.preview_length = length;
        self
    }

    pub fn with_excluded_assemblies<I, S>(mut self, assemblies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_assemblies = assemblies.into_iter().map(Into::into).collect();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = AnalyzerConfig::default();
        assert_eq!(config.string_type_name, "System.String");
        assert_eq!(config.preview_length, 64);
        assert!(config.exclude_assemblies.is_empty());
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "preview_length = 8").unwrap();
        writeln!(file, "exclude_assemblies = [\"mscorlib\"]").unwrap();

        let config = AnalyzerConfig::load(file.path()).unwrap();
        assert_eq!(config.preview_length, 8);
        assert_eq!(config.exclude_assemblies, vec!["mscorlib".to_string()]);
        assert_eq!(config.string_type_name, DEFAULT_STRING_TYPE);
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = AnalyzerConfig::load_or_default("no-such-heapsnap.toml").unwrap();
        assert_eq!(config, AnalyzerConfig::default());
    }

    #[test]
    fn test_rejects_empty_string_type() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "string_type_name = \"  \"").unwrap();

        assert!(matches!(
            AnalyzerConfig::load(file.path()),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_rejects_malformed_toml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "preview_length = \"many\"").unwrap();

        assert!(matches!(
            AnalyzerConfig::load_or_default(file.path()),
            Err(Error::Toml(_))
        ));
    }

    #[test]
    fn test_builder_methods() {
        let config = AnalyzerConfig::default()
            .with_string_type("Str")
            .with_preview_length(4)
            .with_excluded_assemblies(["A", "B"]);
        assert_eq!(config.string_type_name, "Str");
        assert_eq!(config.preview_length, 4);
        assert_eq!(config.exclude_assemblies.len(), 2);
    }
}
