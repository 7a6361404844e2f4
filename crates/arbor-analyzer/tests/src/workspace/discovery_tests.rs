use std::fs;

use super::*;
use crate::test_support::no_tree_parser;

fn temp_root(test_name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("arbor-discovery-{test_name}-{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).expect("create temp dir");
    normalize_path(&dir)
}

fn write(
    root: &Path,
    relative: &str,
    text: &str,
) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    fs::write(path, text).expect("write file");
}

fn mini() -> LanguageSupport {
    LanguageSupport::new("mini", no_tree_parser()).with_extensions([".mini"])
}

fn names(
    files: &[PathBuf],
    root: &Path,
) -> Vec<String> {
    let mut names: Vec<String> = files
        .iter()
        .filter_map(|path| path.strip_prefix(root).ok())
        .map(|path| path.to_string_lossy().replace('\\', "/"))
        .collect();
    names.sort();
    names
}

#[test]
fn finds_files_with_declared_extensions() {
    let root = temp_root("extensions");
    write(&root, "a.mini", "def a");
    write(&root, "nested/b.MINI", "def b");
    write(&root, "notes.txt", "not source");

    let files = discover_files(&mini(), std::slice::from_ref(&root), &DiscoveryOptions::default());
    assert_eq!(names(&files, &root), vec!["a.mini", "nested/b.MINI"]);

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn without_declared_extensions_every_file_is_a_candidate() {
    let root = temp_root("any-extension");
    write(&root, "a.mini", "def a");
    write(&root, "notes.txt", "text");

    let support = LanguageSupport::new("any", no_tree_parser());
    let files = discover_files(&support, std::slice::from_ref(&root), &DiscoveryOptions::default());
    assert_eq!(names(&files, &root), vec!["a.mini", "notes.txt"]);

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn skips_build_and_hidden_dirs_when_asked() {
    let root = temp_root("build-dirs");
    write(&root, "src/a.mini", "def a");
    write(&root, "target/gen.mini", "def gen");
    write(&root, ".cache/c.mini", "def c");

    let all = discover_files(&mini(), std::slice::from_ref(&root), &DiscoveryOptions::default());
    assert_eq!(all.len(), 3);

    let options = DiscoveryOptions {
        skip_build_dirs: true,
        ..DiscoveryOptions::default()
    };
    let files = discover_files(&mini(), std::slice::from_ref(&root), &options);
    assert_eq!(names(&files, &root), vec!["src/a.mini"]);

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn honors_relative_and_absolute_excludes() {
    let root = temp_root("excludes");
    write(&root, "keep/a.mini", "def a");
    write(&root, "vendor/b.mini", "def b");
    write(&root, "generated/c.mini", "def c");

    let options = DiscoveryOptions {
        exclude_paths: vec!["vendor".to_owned(), root.join("generated").to_string_lossy().into_owned()],
        ..DiscoveryOptions::default()
    };
    let files = discover_files(&mini(), std::slice::from_ref(&root), &options);
    assert_eq!(names(&files, &root), vec!["keep/a.mini"]);

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn skips_files_over_the_size_limit() {
    let root = temp_root("size-limit");
    write(&root, "small.mini", "def a");
    write(&root, "large.mini", &"def x\n".repeat(100));

    let options = DiscoveryOptions {
        max_file_size_bytes: Some(64),
        ..DiscoveryOptions::default()
    };
    let files = discover_files(&mini(), std::slice::from_ref(&root), &options);
    assert_eq!(names(&files, &root), vec!["small.mini"]);

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn overlapping_roots_are_deduplicated() {
    let root = temp_root("overlap");
    write(&root, "sub/a.mini", "def a");

    let files = discover_files(&mini(), &[root.clone(), root.join("sub")], &DiscoveryOptions::default());
    assert_eq!(files.len(), 1);

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn missing_root_yields_nothing() {
    let root = std::env::temp_dir().join(format!("arbor-discovery-missing-{}", std::process::id()));
    let files = discover_files(&mini(), &[root], &DiscoveryOptions::default());
    assert!(files.is_empty());
}
