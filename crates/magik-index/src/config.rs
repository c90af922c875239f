use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;

/// Default cap on the size of an indexed file: 10 MiB.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Which files the indexer reads, from a `magik-index.toml`:
///
/// ```toml
/// extensions = ["magik"]
/// max_file_size = 10485760
/// ignore = ["**/test/**", "**/*.generated.magik"]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IndexerConfig {
    /// File extensions to index, without the dot.
    pub extensions: Vec<String>,
    /// Larger files are skipped.
    pub max_file_size: u64,
    /// Glob patterns of paths never to index.
    pub ignore: Vec<String>,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["magik".to_string()],
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            ignore: Vec::new(),
        }
    }
}

impl IndexerConfig {
    /// Read and parse a config file.
    pub fn from_file(path: &Path) -> Result<IndexerConfig, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_str(&content)
    }

    /// Parse a config from TOML text. Missing keys take their defaults.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<IndexerConfig, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Compile the ignore globs.
    pub fn ignore_patterns(&self) -> Result<Vec<glob::Pattern>, ConfigError> {
        self.ignore
            .iter()
            .map(|pattern| {
                glob::Pattern::new(pattern).map_err(|source| ConfigError::Pattern {
                    pattern: pattern.clone(),
                    source,
                })
            })
            .collect()
    }

    /// Whether `path` has one of the indexed extensions.
    pub fn has_indexed_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        assert_eq!(IndexerConfig::from_str("").unwrap(), IndexerConfig::default());
    }

    #[test]
    fn parse_full_config() {
        let config = IndexerConfig::from_str(
            r#"
extensions = ["magik", "mgk"]
max_file_size = 1024
ignore = ["**/test/**"]
"#,
        )
        .unwrap();
        assert_eq!(config.extensions, vec!["magik", "mgk"]);
        assert_eq!(config.max_file_size, 1024);
        assert_eq!(config.ignore_patterns().unwrap().len(), 1);
        assert!(config.has_indexed_extension(Path::new("/src/a.MGK")));
        assert!(!config.has_indexed_extension(Path::new("/src/a.txt")));
        assert!(!config.has_indexed_extension(Path::new("/src/magik")));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = IndexerConfig::from_str("extension = [\"magik\"]").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn bad_patterns_are_reported() {
        let config = IndexerConfig {
            ignore: vec!["a[".to_string()],
            ..IndexerConfig::default()
        };
        let err = config.ignore_patterns().unwrap_err();
        assert!(err.to_string().starts_with("invalid ignore pattern `a[`"));
    }
}
