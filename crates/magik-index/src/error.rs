use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Why a file could not be indexed.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{} is {size} bytes, above the {limit} byte limit", path.display())]
    TooLarge { path: PathBuf, size: u64, limit: u64 },

    #[error("failed to walk {}: {source}", path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

/// Why an indexer configuration was rejected.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse indexer config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid ignore pattern `{pattern}`: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
}
