use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

use tracing::debug;
use walkdir::{DirEntry, WalkDir};

use crate::language::LanguageSupport;

/// Filters applied while walking workspace folders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveryOptions {
    /// Files larger than this are skipped.
    pub max_file_size_bytes: Option<u64>,
    /// Absolute paths, or paths relative to each folder, never descended into.
    pub exclude_paths: Vec<String>,
    /// Skip hidden directories and common build output directories.
    pub skip_build_dirs: bool,
}

/// Every regular file under `roots` the adapter handles, deduplicated.
pub(crate) fn discover_files(
    support: &LanguageSupport,
    roots: &[PathBuf],
    options: &DiscoveryOptions,
) -> Vec<PathBuf> {
    let excluded_prefixes = build_exclude_prefixes(roots, &options.exclude_paths);
    let mut files = Vec::new();
    let mut seen = HashSet::new();

    for root in roots {
        for entry in WalkDir::new(root)
            .follow_links(true)
            .into_iter()
            .filter_entry(|entry| should_descend(entry, &excluded_prefixes, options.skip_build_dirs))
            .filter_map(|entry| entry.ok())
        {
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            if !support.handles_path(path) {
                continue;
            }

            if let Some(limit) = options.max_file_size_bytes
                && let Ok(metadata) = entry.metadata()
                && metadata.len() > limit
            {
                debug!("Skipping large workspace file ({} bytes): {}", metadata.len(), path.display());
                continue;
            }

            let normalized = normalize_path(path);
            if seen.insert(normalized.clone()) {
                files.push(normalized);
            }
        }
    }

    files
}

fn should_descend(
    entry: &DirEntry,
    excluded_prefixes: &[PathBuf],
    skip_build_dirs: bool,
) -> bool {
    let normalized = normalize_path(entry.path());
    if is_path_excluded(&normalized, excluded_prefixes) {
        return false;
    }

    if !skip_build_dirs || entry.depth() == 0 || !entry.file_type().is_dir() {
        return true;
    }

    let Some(name) = entry.file_name().to_str() else {
        return false;
    };

    if name.starts_with('.') {
        return false;
    }

    !matches!(name, "target" | "build" | "node_modules" | "out" | "bin" | "obj")
}

fn build_exclude_prefixes(
    roots: &[PathBuf],
    exclude_paths: &[String],
) -> Vec<PathBuf> {
    let mut prefixes = Vec::new();
    let mut seen = HashSet::new();

    for raw_path in exclude_paths {
        let exclude_path = PathBuf::from(raw_path);
        if exclude_path.is_absolute() {
            let normalized = normalize_path(&exclude_path);
            if seen.insert(normalized.clone()) {
                prefixes.push(normalized);
            }
            continue;
        }

        for root in roots {
            let normalized = normalize_path(&root.join(&exclude_path));
            if seen.insert(normalized.clone()) {
                prefixes.push(normalized);
            }
        }
    }

    prefixes
}

fn is_path_excluded(
    path: &Path,
    excluded_prefixes: &[PathBuf],
) -> bool {
    excluded_prefixes.iter().any(|prefix| path.starts_with(prefix))
}

pub(crate) fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
#[path = "../../tests/src/workspace/discovery_tests.rs"]
mod tests;
