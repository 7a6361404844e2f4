use std::{collections::HashSet, sync::Arc};

use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tower_lsp::{Client, lsp_types::Url};
use tracing::{debug, info};

use crate::progress::{ProgressToken, percent_of};
use crate::server::diagnostics::{DiagnosticFilter, collect_diagnostics, publish};
use crate::server::settings::ServerSettings;
use crate::workspace::{LoadSummary, WorkspaceState, read_source};

/// Minimal handle for the background workspace load, detached from the
/// server so it can be moved into `tokio::spawn`.
pub(crate) struct BackgroundHandle {
    pub(crate) client: Client,
    pub(crate) workspace: Arc<WorkspaceState>,
    pub(crate) settings: Arc<RwLock<ServerSettings>>,
    pub(crate) filter: Arc<RwLock<DiagnosticFilter>>,
    pub(crate) cancel: CancellationToken,
    pub(crate) report_progress: bool,
}

impl BackgroundHandle {
    /// Index every workspace file, publishing diagnostics as files commit.
    ///
    /// Files that are no longer discovered and not open are dropped first.
    /// Stops between files once cancelled; every file already indexed stays
    /// committed.
    pub(crate) async fn index_workspace(&self) -> LoadSummary {
        let settings = self.settings.read().await.clone();
        if !settings.indexing.enabled {
            info!("Skipping workspace indexing because indexing.enabled=false");
            self.workspace.retain_files(&HashSet::new());
            return LoadSummary::default();
        }

        let workspace = self.workspace.clone();
        let options = settings.indexing.discovery_options();
        let files =
            tokio::task::spawn_blocking(move || workspace.discover_files(&options)).await.unwrap_or_default();
        let discovered: HashSet<Url> = files.iter().filter_map(|path| Url::from_file_path(path).ok()).collect();
        self.workspace.retain_files(&discovered);

        let total = files.len();
        let mut summary = LoadSummary {
            discovered: total,
            ..LoadSummary::default()
        };
        if total == 0 {
            info!("No workspace files to index");
            return summary;
        }

        info!("Indexing {total} workspace file(s)…");
        let progress = if self.report_progress {
            ProgressToken::begin(&self.client, "Indexing", Some(format!("0 / {total} files"))).await
        } else {
            ProgressToken::disabled()
        };
        let limit = Some(settings.indexing.max_file_size_bytes());
        let source_name = self.workspace.support().language_id.clone();

        for (done, path) in files.into_iter().enumerate() {
            if self.cancel.is_cancelled() {
                summary.cancelled = true;
                break;
            }

            let Ok(uri) = Url::from_file_path(&path) else {
                summary.skipped_unreadable += 1;
                continue;
            };
            let read_path = path.clone();
            let text = match tokio::task::spawn_blocking(move || read_source(&read_path, limit)).await {
                Ok(Ok(text)) => text,
                Ok(Err(error)) => {
                    debug!("Skipping {error}");
                    summary.skipped_unreadable += 1;
                    continue;
                },
                Err(error) => {
                    debug!("Read task for {} failed: {error}", path.display());
                    summary.skipped_unreadable += 1;
                    continue;
                },
            };

            match self.workspace.index_file(&uri, text) {
                Some(report) => {
                    summary.indexed += 1;
                    let diagnostics = {
                        let filter = self.filter.read().await;
                        collect_diagnostics(&report.state, &settings.diagnostics, &filter, &source_name)
                    };
                    publish(&self.client, uri, diagnostics, None).await;
                },
                None => summary.skipped_open += 1,
            }

            let done = done + 1;
            if done % 5 == 0 || done == total {
                progress.report(Some(format!("{done} / {total} files")), Some(percent_of(done, total))).await;
            }
            tokio::task::yield_now().await;
        }

        let end_message = if summary.cancelled {
            format!("Cancelled after {} file(s)", summary.indexed)
        } else {
            format!("{} file(s) indexed", summary.indexed)
        };
        info!(
            "Workspace indexing finished: {} indexed, {} unreadable, {} open, {} symbols",
            summary.indexed,
            summary.skipped_unreadable,
            summary.skipped_open,
            self.workspace.repository().len()
        );
        progress.end(Some(end_message)).await;
        summary
    }
}
