//! Keeps a [`DefinitionKeeper`] in sync with Magik files on disk.
//!
//! The indexer reacts to file-system events. A created or changed file is
//! read and parsed, its definitions are computed, and only then does the
//! keeper swap the file's old definitions for the new set in one publish.
//! Readers holding a snapshot never see half a file. A deleted path drops
//! everything it contributed.
//!
//! Failures (unreadable files, files over the size limit) are logged and
//! leave the keeper untouched; the `on_*` entry points never fail.

pub mod config;
pub mod error;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use magik_typeck::reader::read_definitions;
use magik_typeck::DefinitionKeeper;
use parking_lot::Mutex;
use rustc_hash::FxHashSet;
use tracing::{debug, warn};
use walkdir::WalkDir;

pub use crate::config::IndexerConfig;
pub use crate::error::{ConfigError, IndexError};

pub struct Indexer {
    keeper: Arc<DefinitionKeeper>,
    config: IndexerConfig,
    ignore: Vec<glob::Pattern>,
    /// Paths whose definitions are currently in the keeper.
    indexed: Mutex<FxHashSet<PathBuf>>,
}

impl Indexer {
    /// Fails only when an ignore pattern does not compile.
    pub fn new(keeper: Arc<DefinitionKeeper>, config: IndexerConfig) -> Result<Indexer, ConfigError> {
        let ignore = config.ignore_patterns()?;
        Ok(Indexer {
            keeper,
            config,
            ignore,
            indexed: Mutex::new(FxHashSet::default()),
        })
    }

    pub fn keeper(&self) -> &Arc<DefinitionKeeper> {
        &self.keeper
    }

    pub fn config(&self) -> &IndexerConfig {
        &self.config
    }

    // ── Events ─────────────────────────────────────────────────────────

    /// Index every file under `paths`, e.g. at startup.
    pub fn index_paths<I>(&self, paths: I)
    where
        I: IntoIterator,
        I::Item: AsRef<Path>,
    {
        for path in paths {
            self.on_created(path.as_ref());
        }
    }

    /// A file or directory appeared.
    pub fn on_created(&self, path: &Path) {
        debug!(path = %path.display(), "scanning created path");
        self.reindex(path);
    }

    /// A file or directory changed. Reindexing unchanged text publishes
    /// nothing.
    pub fn on_changed(&self, path: &Path) {
        debug!(path = %path.display(), "scanning changed path");
        self.reindex(path);
    }

    /// A file or directory disappeared. Everything indexed at or under
    /// `path` is dropped.
    pub fn on_deleted(&self, path: &Path) {
        debug!(path = %path.display(), "scanning deleted path");
        let gone: Vec<PathBuf> = self
            .indexed
            .lock()
            .iter()
            .filter(|p| p.starts_with(path))
            .cloned()
            .collect();
        for file in gone {
            let removed = self.keeper.remove_all_for_path(&file);
            debug!(path = %file.display(), removed = removed.len(), "dropped definitions");
            self.indexed.lock().remove(&file);
        }
    }

    /// Index `text` as the contents of `path`, e.g. an unsaved editor buffer.
    pub fn index_text(&self, path: &Path, text: &str) {
        let parse = magik_parser::parse(text);
        if !parse.ok() {
            debug!(path = %path.display(), errors = parse.errors().len(), "indexing file with syntax errors");
        }
        let definitions = read_definitions(&parse, path);
        self.keeper.replace_path(path, definitions);
        self.indexed.lock().insert(path.to_path_buf());
    }

    // ── Queries ────────────────────────────────────────────────────────

    pub fn is_indexed(&self, path: &Path) -> bool {
        self.indexed.lock().contains(path)
    }

    /// All indexed paths, sorted.
    pub fn indexed_paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self.indexed.lock().iter().cloned().collect();
        paths.sort();
        paths
    }

    /// Whether `path` passes the extension and ignore filters.
    pub fn accepts(&self, path: &Path) -> bool {
        self.config.has_indexed_extension(path)
            && !self.ignore.iter().any(|pattern| pattern.matches_path(path))
    }

    // ── Internals ──────────────────────────────────────────────────────

    fn reindex(&self, path: &Path) {
        for file in self.files_under(path) {
            if let Err(err) = self.index_file(&file) {
                warn!(%err, "skipping file");
            }
        }
    }

    /// The accepted files at or under `path`.
    fn files_under(&self, path: &Path) -> Vec<PathBuf> {
        if !path.is_dir() {
            return if self.accepts(path) {
                vec![path.to_path_buf()]
            } else {
                Vec::new()
            };
        }
        let mut files = Vec::new();
        for entry in WalkDir::new(path).follow_links(true).sort_by_file_name() {
            match entry {
                Ok(entry) if entry.file_type().is_file() && self.accepts(entry.path()) => {
                    files.push(entry.into_path());
                }
                Ok(_) => {}
                Err(source) => {
                    let err = IndexError::Walk {
                        path: path.to_path_buf(),
                        source,
                    };
                    warn!(%err, "skipping directory entry");
                }
            }
        }
        files
    }

    fn index_file(&self, path: &Path) -> Result<(), IndexError> {
        let read_error = |source| IndexError::Read {
            path: path.to_path_buf(),
            source,
        };
        let size = std::fs::metadata(path).map_err(read_error)?.len();
        if size > self.config.max_file_size {
            return Err(IndexError::TooLarge {
                path: path.to_path_buf(),
                size,
                limit: self.config.max_file_size,
            });
        }
        let text = std::fs::read_to_string(path).map_err(read_error)?;
        self.index_text(path, &text);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn indexer(config: IndexerConfig) -> Indexer {
        Indexer::new(Arc::new(DefinitionKeeper::new()), config).unwrap()
    }

    #[test]
    fn filters_by_extension_and_ignore_globs() {
        let indexer = indexer(IndexerConfig {
            ignore: vec!["*/generated/*".to_string()],
            ..IndexerConfig::default()
        });
        assert!(indexer.accepts(Path::new("/src/rope.magik")));
        assert!(!indexer.accepts(Path::new("/src/rope.txt")));
        assert!(!indexer.accepts(Path::new("/src/generated/rope.magik")));
    }

    #[test]
    fn index_text_tracks_the_path() {
        let indexer = indexer(IndexerConfig::default());
        let path = Path::new("/src/buffer.magik");
        assert!(!indexer.is_indexed(path));
        indexer.index_text(path, "_method a.b _endmethod");
        assert!(indexer.is_indexed(path));
        assert_eq!(indexer.keeper().definitions_for_path(path).len(), 1);

        indexer.on_deleted(path);
        assert!(!indexer.is_indexed(path));
        assert!(indexer.keeper().definitions_for_path(path).is_empty());
    }
}
