//! File-system driven indexing against a temporary directory.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use magik_index::{Indexer, IndexerConfig};
use magik_typeck::{DefinitionKeeper, TypeString};

const ROPE: &str = "\
_package sw
$
def_slotted_exemplar(:rope, {{:parts, _unset}})
$
_method rope.size
  ## @return {sw:integer}
_endmethod
$
";

fn names(keeper: &DefinitionKeeper, path: &Path) -> Vec<String> {
    let mut names: Vec<String> = keeper
        .definitions_for_path(path)
        .iter()
        .map(|d| d.name())
        .collect();
    names.sort();
    names
}

fn setup(config: IndexerConfig) -> (tempfile::TempDir, Arc<DefinitionKeeper>, Indexer) {
    let dir = tempfile::tempdir().unwrap();
    let keeper = Arc::new(DefinitionKeeper::with_builtins());
    let indexer = Indexer::new(keeper.clone(), config).unwrap();
    (dir, keeper, indexer)
}

#[test]
fn created_file_is_indexed() {
    let (dir, keeper, indexer) = setup(IndexerConfig::default());
    let path = dir.path().join("rope.magik");
    fs::write(&path, ROPE).unwrap();

    indexer.on_created(&path);
    assert!(indexer.is_indexed(&path));
    assert_eq!(names(&keeper, &path), vec!["sw:rope", "sw:rope.size"]);
    assert!(keeper.get_exemplar(&TypeString::sw("rope")).is_some());
}

#[test]
fn changing_to_identical_text_is_a_no_op() {
    let (dir, keeper, indexer) = setup(IndexerConfig::default());
    let path = dir.path().join("rope.magik");
    fs::write(&path, ROPE).unwrap();

    indexer.on_created(&path);
    let after_create = keeper.snapshot();
    indexer.on_changed(&path);
    let after_change = keeper.snapshot();

    assert_eq!(after_create.generation(), after_change.generation());
    assert_eq!(
        after_create.definitions_for_path(&path),
        after_change.definitions_for_path(&path)
    );
}

#[test]
fn changed_file_replaces_its_definitions() {
    let (dir, keeper, indexer) = setup(IndexerConfig::default());
    let path = dir.path().join("rope.magik");
    fs::write(&path, ROPE).unwrap();
    indexer.on_created(&path);

    fs::write(&path, "_package sw\n$\n_method rope.empty?\n_endmethod\n$\n").unwrap();
    indexer.on_changed(&path);
    assert_eq!(names(&keeper, &path), vec!["sw:rope.empty?"]);
    assert!(keeper.get_exemplar(&TypeString::sw("rope")).is_none());
}

#[test]
fn deleting_restores_the_previous_state() {
    let (dir, keeper, indexer) = setup(IndexerConfig::default());
    let path = dir.path().join("rope.magik");
    let before = keeper.snapshot();
    fs::write(&path, ROPE).unwrap();
    indexer.on_created(&path);

    fs::remove_file(&path).unwrap();
    indexer.on_deleted(&path);
    let after = keeper.snapshot();

    assert!(!indexer.is_indexed(&path));
    assert!(after.get_exemplar(&TypeString::sw("rope")).is_none());
    assert!(after.get_methods(&TypeString::sw("rope")).is_empty());
    assert!(after.get_methods_by_name("size").len() == before.get_methods_by_name("size").len());
    assert_eq!(after.exemplar_count(), before.exemplar_count());
    assert_eq!(after.method_count(), before.method_count());
}

#[test]
fn directories_are_walked_and_filtered() {
    let (dir, keeper, indexer) = setup(IndexerConfig {
        ignore: vec!["*/skipped/*".to_string()],
        ..IndexerConfig::default()
    });
    let nested = dir.path().join("src/nested");
    let skipped = dir.path().join("src/skipped");
    fs::create_dir_all(&nested).unwrap();
    fs::create_dir_all(&skipped).unwrap();
    fs::write(nested.join("rope.magik"), ROPE).unwrap();
    fs::write(nested.join("notes.txt"), ROPE).unwrap();
    fs::write(skipped.join("other.magik"), "_method other.x _endmethod").unwrap();

    indexer.on_created(dir.path());
    assert_eq!(indexer.indexed_paths(), vec![nested.join("rope.magik")]);
    assert!(keeper.get_exemplar(&TypeString::sw("rope")).is_some());

    indexer.on_deleted(&dir.path().join("src"));
    assert!(indexer.indexed_paths().is_empty());
    assert!(keeper.get_exemplar(&TypeString::sw("rope")).is_none());
}

#[test]
fn oversized_and_missing_files_are_skipped() {
    let (dir, keeper, indexer) = setup(IndexerConfig {
        max_file_size: 16,
        ..IndexerConfig::default()
    });
    let path = dir.path().join("rope.magik");
    fs::write(&path, ROPE).unwrap();
    let generation = keeper.generation();

    indexer.on_created(&path);
    indexer.on_created(&dir.path().join("missing.magik"));
    assert!(indexer.indexed_paths().is_empty());
    assert_eq!(keeper.generation(), generation);
}

#[test]
fn config_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("magik-index.toml");
    fs::write(&path, "max_file_size = 2048\nignore = [\"*/build/*\"]\n").unwrap();
    let config = IndexerConfig::from_file(&path).unwrap();
    assert_eq!(config.extensions, vec!["magik"]);
    assert_eq!(config.max_file_size, 2048);
    assert!(IndexerConfig::from_file(&dir.path().join("absent.toml")).is_err());
}
