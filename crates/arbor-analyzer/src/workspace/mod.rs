//! Workspace state and the per-file synchronization pipeline.

mod discovery;

use std::{
    collections::HashSet,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, PoisonError, RwLock},
};

use dashmap::DashMap;
use tokio_util::sync::CancellationToken;
use tower_lsp::lsp_types::Url;
use tracing::{debug, info, warn};

use crate::document::{FileState, FileStore};
use crate::error::{Result, WorkspaceError};
use crate::language::LanguageSupport;
use crate::symbols::{BatchSummary, SymbolRepository, extract_symbols};

pub use discovery::DiscoveryOptions;

/// Outcome of one [`WorkspaceState::synchronize`] call.
#[derive(Debug, Clone)]
pub struct SyncReport {
    pub state: Arc<FileState>,
    /// `None` when the parse produced no tree and the repository was left
    /// untouched for the uri.
    pub committed: Option<BatchSummary>,
}

/// Counters of a bulk load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub discovered: usize,
    pub indexed: usize,
    pub skipped_unreadable: usize,
    pub skipped_open: usize,
    pub cancelled: bool,
}

/// Everything the server knows about the workspace.
///
/// Owned by one server instance; nothing here is global, so several
/// instances can coexist in one process.
pub struct WorkspaceState {
    support: LanguageSupport,
    folders: RwLock<Vec<Url>>,
    files: FileStore,
    repository: Arc<SymbolRepository>,
    sync_locks: DashMap<Url, Arc<Mutex<()>>>,
}

impl WorkspaceState {
    pub fn new(support: LanguageSupport) -> Self {
        Self {
            support,
            folders: RwLock::new(Vec::new()),
            files: FileStore::new(),
            repository: Arc::new(SymbolRepository::new()),
            sync_locks: DashMap::new(),
        }
    }

    pub fn support(&self) -> &LanguageSupport {
        &self.support
    }

    pub fn repository(&self) -> &Arc<SymbolRepository> {
        &self.repository
    }

    pub fn files(&self) -> &FileStore {
        &self.files
    }

    pub fn file(
        &self,
        uri: &Url,
    ) -> Option<Arc<FileState>> {
        self.files.get(uri)
    }

    // ── folders ─────────────────────────────────────────────────────────

    pub fn folders(&self) -> Vec<Url> {
        self.folders.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn folder_paths(&self) -> Vec<PathBuf> {
        self.folders().iter().filter_map(|uri| uri.to_file_path().ok()).collect()
    }

    /// Append folders not yet tracked. Does not index anything.
    pub fn add_folders(
        &self,
        added: impl IntoIterator<Item = Url>,
    ) {
        let mut folders = self.folders.write().unwrap_or_else(PoisonError::into_inner);
        for folder in added {
            if !folders.contains(&folder) {
                folders.push(folder);
            }
        }
    }

    /// Forget folders. Symbols already indexed from them stay.
    pub fn remove_folders(
        &self,
        removed: &[Url],
    ) {
        self.folders.write().unwrap_or_else(PoisonError::into_inner).retain(|folder| !removed.contains(folder));
    }

    // ── synchronization ─────────────────────────────────────────────────

    fn sync_lock(
        &self,
        uri: &Url,
    ) -> Arc<Mutex<()>> {
        self.sync_locks.entry(uri.clone()).or_default().clone()
    }

    /// Re-parse `text` and make it the uri's current generation.
    ///
    /// With a tree, the uri's previous symbols are swapped for the new
    /// extraction in one repository commit. Without one, the repository
    /// keeps the previous generation. The file state is replaced either way
    /// so the latest issues are reported.
    pub fn synchronize(
        &self,
        uri: &Url,
        text: impl Into<Arc<str>>,
        version: Option<i32>,
    ) -> SyncReport {
        let lock = self.sync_lock(uri);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.commit_text(uri, text.into(), version)
    }

    /// Like [`synchronize`](Self::synchronize) for disk text, but gives way to
    /// the editor. The open check runs under the uri's sync lock so a
    /// concurrent `open` cannot be overwritten by stale disk text.
    fn synchronize_unless_open(
        &self,
        uri: &Url,
        text: Arc<str>,
    ) -> Option<SyncReport> {
        let lock = self.sync_lock(uri);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        if self.files.is_open(uri) {
            debug!("[sync] {uri} is open in the editor; skipping disk text");
            return None;
        }
        Some(self.commit_text(uri, text, None))
    }

    /// Parse and commit. Callers hold the uri's sync lock.
    fn commit_text(
        &self,
        uri: &Url,
        text: Arc<str>,
        version: Option<i32>,
    ) -> SyncReport {
        let parse = self.support.parser.parse(uri, &text);

        let committed = parse.root.as_deref().map(|root| {
            let symbols =
                extract_symbols(uri, root, self.support.ids.as_ref(), self.support.resolve_references_by_name);
            let mut batch = self.repository.begin_batch(uri.clone());
            for symbol in symbols {
                batch.add(symbol);
            }
            batch.commit()
        });

        if committed.is_none() {
            debug!("[sync] {uri} produced no tree ({} issues); keeping indexed symbols", parse.issues.len());
        }

        let state = Arc::new(FileState::new(uri.clone(), text, version, parse));
        self.files.replace(state.clone());

        SyncReport {
            state,
            committed,
        }
    }

    pub fn open(
        &self,
        uri: &Url,
        text: impl Into<Arc<str>>,
        version: i32,
    ) -> SyncReport {
        self.files.mark_open(uri);
        self.synchronize(uri, text, Some(version))
    }

    pub fn change(
        &self,
        uri: &Url,
        text: impl Into<Arc<str>>,
        version: i32,
    ) -> SyncReport {
        self.synchronize(uri, text, Some(version))
    }

    /// Re-synchronize on save. Without text, the tracked text is reused and
    /// untracked files are read from disk.
    pub fn save(
        &self,
        uri: &Url,
        text: Option<String>,
    ) -> Result<SyncReport> {
        let current = self.files.get(uri);
        let version = current.as_ref().and_then(|state| state.version);
        let text: Arc<str> = match (text, current) {
            (Some(text), _) => text.into(),
            (None, Some(state)) => state.text.clone(),
            (None, None) => self.read_uri(uri)?.into(),
        };
        Ok(self.synchronize(uri, text, version))
    }

    /// Re-index from disk so unsaved edits do not linger, then forget the
    /// file state. An unreadable file loses its symbols instead.
    pub fn close(
        &self,
        uri: &Url,
    ) -> Option<SyncReport> {
        self.files.mark_closed(uri);
        let report = match self.read_uri(uri) {
            Ok(text) => Some(self.synchronize(uri, text, None)),
            Err(error) => {
                debug!("[sync] close of {uri} could not re-read from disk: {error}");
                self.repository.delete_file(uri);
                None
            },
        };
        self.files.remove(uri);
        report
    }

    /// Remove the uri's symbols and file state.
    pub fn delete(
        &self,
        uri: &Url,
    ) -> usize {
        let lock = self.sync_lock(uri);
        let removed = {
            let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
            self.files.remove(uri);
            self.repository.delete_file(uri)
        };
        self.sync_locks.remove(uri);
        removed
    }

    /// Move a file: drop everything under `old` and index the text under
    /// `new`. The text comes from the tracked state if there is one, from
    /// disk at `new` otherwise.
    pub fn rename(
        &self,
        old: &Url,
        new: &Url,
    ) -> Option<SyncReport> {
        let previous = self.files.get(old);
        let was_open = self.files.is_open(old);
        self.delete(old);

        if !self.handles_uri(new) {
            debug!("[sync] renamed {old} to unhandled {new}; symbols dropped");
            return None;
        }

        let text: Arc<str> = match previous {
            Some(state) => state.text.clone(),
            None => match self.read_uri(new) {
                Ok(text) => text.into(),
                Err(error) => {
                    warn!("[sync] rename {old} -> {new}: {error}");
                    return None;
                },
            },
        };

        if was_open {
            self.files.mark_open(new);
        }
        Some(self.synchronize(new, text, None))
    }

    /// Drop every file that is neither in `keep` nor open in the editor.
    ///
    /// Runs before a reindex. Returns how many files were dropped.
    pub fn retain_files(
        &self,
        keep: &HashSet<Url>,
    ) -> usize {
        let mut tracked: HashSet<Url> = self.repository.file_uris().into_iter().collect();
        tracked.extend(self.files.uris());

        let mut dropped = 0;
        for uri in tracked.iter().filter(|uri| !keep.contains(*uri)) {
            let lock = self.sync_lock(uri);
            let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
            if self.files.is_open(uri) {
                continue;
            }
            self.files.remove(uri);
            self.repository.delete_file(uri);
            dropped += 1;
        }
        if dropped > 0 {
            info!("[sync] dropped {dropped} file(s) no longer in the workspace");
        }
        dropped
    }

    /// Drop every file state and symbol, and replace the folder list.
    pub fn reset(
        &self,
        folders: Vec<Url>,
    ) {
        self.files.clear();
        self.repository.clear();
        self.sync_locks.clear();
        *self.folders.write().unwrap_or_else(PoisonError::into_inner) = folders;
    }

    // ── disk ────────────────────────────────────────────────────────────

    pub fn handles_uri(
        &self,
        uri: &Url,
    ) -> bool {
        match uri.to_file_path() {
            Ok(path) => self.support.handles_path(&path),
            Err(()) => true,
        }
    }

    pub fn discover_files(
        &self,
        options: &DiscoveryOptions,
    ) -> Vec<PathBuf> {
        discovery::discover_files(&self.support, &self.folder_paths(), options)
    }

    pub fn read_uri(
        &self,
        uri: &Url,
    ) -> Result<String> {
        let path = uri.to_file_path().map_err(|()| WorkspaceError::NotAFile(uri.clone()))?;
        read_source(&path, None)
    }

    /// Index text read from disk, unless the editor owns the file.
    pub fn index_file(
        &self,
        uri: &Url,
        text: String,
    ) -> Option<SyncReport> {
        self.synchronize_unless_open(uri, text.into())
    }

    /// Re-read a watched file after an external change.
    pub fn refresh_from_disk(
        &self,
        uri: &Url,
    ) -> Result<Option<SyncReport>> {
        if self.files.is_open(uri) || !self.handles_uri(uri) {
            return Ok(None);
        }
        let text = self.read_uri(uri)?;
        Ok(self.index_file(uri, text))
    }

    /// Reset to `folders` and index every file beneath them.
    pub fn load(
        &self,
        folders: Vec<Url>,
    ) -> LoadSummary {
        self.load_with(folders, &DiscoveryOptions::default(), &CancellationToken::new())
    }

    /// [`load`](Self::load) with discovery filters, stopping between files
    /// once `cancel` fires.
    pub fn load_with(
        &self,
        folders: Vec<Url>,
        options: &DiscoveryOptions,
        cancel: &CancellationToken,
    ) -> LoadSummary {
        self.reset(folders);
        let files = self.discover_files(options);
        let mut summary = LoadSummary {
            discovered: files.len(),
            ..LoadSummary::default()
        };

        for path in files {
            if cancel.is_cancelled() {
                summary.cancelled = true;
                break;
            }
            let Ok(uri) = Url::from_file_path(&path) else {
                summary.skipped_unreadable += 1;
                continue;
            };
            let text = match read_source(&path, options.max_file_size_bytes) {
                Ok(text) => text,
                Err(error) => {
                    debug!("[load] skipping {error}");
                    summary.skipped_unreadable += 1;
                    continue;
                },
            };
            match self.index_file(&uri, text) {
                Some(_) => summary.indexed += 1,
                None => summary.skipped_open += 1,
            }
        }

        info!(
            "[load] indexed {} of {} files ({} unreadable, {} open){}",
            summary.indexed,
            summary.discovered,
            summary.skipped_unreadable,
            summary.skipped_open,
            if summary.cancelled {
                ", cancelled"
            } else {
                ""
            }
        );
        summary
    }
}

/// Read a source file, refusing files over `limit` bytes.
pub fn read_source(
    path: &Path,
    limit: Option<u64>,
) -> Result<String> {
    if let Some(limit) = limit {
        let size = std::fs::metadata(path).map_err(|source| WorkspaceError::io(path, source))?.len();
        if size > limit {
            return Err(WorkspaceError::TooLarge {
                path: path.to_path_buf(),
                size,
                limit,
            });
        }
    }
    std::fs::read_to_string(path).map_err(|source| WorkspaceError::io(path, source))
}
