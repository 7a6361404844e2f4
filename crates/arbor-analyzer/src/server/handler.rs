use std::{
    panic::{AssertUnwindSafe, catch_unwind},
    sync::Arc,
};

use futures::FutureExt;
use tower_lsp::{LanguageServer, jsonrpc::Result, lsp_types::*};
use tracing::{debug, info, warn};

use crate::{
    document::FileState,
    server::{
        capabilities::ClientCapabilityManager,
        settings::ServerSettings,
        state::{ArborLanguageServer, prefixed_client_message},
    },
    symbols::WORKSPACE_SYMBOL_LIMIT,
    text_pos::to_internal_point,
    workspace::SyncReport,
};

#[tower_lsp::async_trait]
impl LanguageServer for ArborLanguageServer {
    async fn initialize(
        &self,
        params: InitializeParams,
    ) -> Result<InitializeResult> {
        info!("Initializing arbor-analyzer for '{}'...", self.language_id());

        let initial_settings =
            ServerSettings::from_lsp_payload(params.initialization_options.as_ref(), self.language_id());
        self.apply_settings(initial_settings).await;

        let manager = ClientCapabilityManager::from_client(&params.capabilities);
        let capabilities = manager.server_capabilities(self.workspace.support());
        *self.capabilities.write().await = manager;

        #[allow(deprecated)]
        let folders = match (params.workspace_folders, params.root_uri) {
            (Some(folders), _) => folders.into_iter().map(|folder| folder.uri).collect(),
            (None, Some(root)) => vec![root],
            (None, None) => Vec::new(),
        };
        self.workspace.add_folders(folders);

        Ok(InitializeResult {
            capabilities,
            server_info: Some(ServerInfo {
                name: "arbor-analyzer".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(
        &self,
        _: InitializedParams,
    ) {
        info!("arbor-analyzer initialized");

        let registrations = self.capabilities.read().await.registrations(self.workspace.support());
        if !registrations.is_empty() {
            // Detached: the client answers on its own schedule.
            let client = self.client.clone();
            tokio::spawn(async move {
                match AssertUnwindSafe(client.register_capability(registrations)).catch_unwind().await {
                    Ok(Ok(())) => debug!("Dynamic registrations accepted"),
                    Ok(Err(error)) => warn!("Dynamic registration failed: {error}"),
                    Err(_) => warn!("client/registerCapability panicked (client gone?)"),
                }
            });
        }

        let settings = self.settings_snapshot().await;
        if !settings.indexing.enabled {
            info!("Skipping workspace load because indexing.enabled=false");
            return;
        }

        self.workspace.reset(self.workspace.folders());
        self.spawn_workspace_load().await;
    }

    async fn did_change_configuration(
        &self,
        params: DidChangeConfigurationParams,
    ) {
        let current = self.settings_snapshot().await;
        let merged = current.merged_with_payload(&params.settings, self.language_id());
        if merged == current {
            return;
        }

        let reindex = merged.indexing.enabled && merged.indexing != current.indexing;
        let diagnostics_changed = merged.diagnostics != current.diagnostics;
        self.apply_settings(merged).await;
        info!("Applied updated arbor-analyzer settings");

        if diagnostics_changed {
            for uri in self.workspace.files().uris() {
                if let Some(state) = self.workspace.file(&uri) {
                    self.publish_state(&state).await;
                }
            }
        }
        if reindex {
            self.spawn_workspace_load().await;
        }
    }

    async fn shutdown(&self) -> Result<()> {
        info!("Shutting down arbor-analyzer");
        self.cancel_load();
        Ok(())
    }

    async fn did_open(
        &self,
        params: DidOpenTextDocumentParams,
    ) {
        let uri = params.text_document.uri;
        let version = params.text_document.version;
        let text = params.text_document.text;
        let filename = short_name(&uri);

        info!("Opened {filename} (v{version}, {} bytes)", text.len());
        if self.settings_snapshot().await.logging.level.allows_info() {
            let _ = AssertUnwindSafe(
                self.client.log_message(MessageType::INFO, prefixed_client_message(format!("Opened {filename}"))),
            )
            .catch_unwind()
            .await;
        }

        if let Some(report) = self.guarded("textDocument/didOpen", || self.workspace.open(&uri, text, version)).await {
            self.publish_report(&report).await;
        }
    }

    async fn did_change(
        &self,
        params: DidChangeTextDocumentParams,
    ) {
        let uri = params.text_document.uri;
        let version = params.text_document.version;
        let Some(change) = params.content_changes.into_iter().find(|change| change.range.is_none()) else {
            warn!("Ignoring ranged change for {uri}; only full-document sync is supported");
            return;
        };

        if let Some(report) =
            self.guarded("textDocument/didChange", || self.workspace.change(&uri, change.text, version)).await
        {
            self.publish_report(&report).await;
        }
    }

    async fn did_save(
        &self,
        params: DidSaveTextDocumentParams,
    ) {
        let uri = params.text_document.uri;
        debug!("Saved {}", short_name(&uri));

        match self.guarded("textDocument/didSave", || self.workspace.save(&uri, params.text)).await {
            Some(Ok(report)) => self.publish_report(&report).await,
            Some(Err(error)) => debug!("Could not re-index saved file: {error}"),
            None => {},
        }
    }

    async fn did_close(
        &self,
        params: DidCloseTextDocumentParams,
    ) {
        let uri = params.text_document.uri;
        debug!("Closed {}", short_name(&uri));

        match self.guarded("textDocument/didClose", || self.workspace.close(&uri)).await.flatten() {
            Some(report) => self.publish_report(&report).await,
            None => self.clear_diagnostics(&uri).await,
        }
    }

    async fn hover(
        &self,
        params: HoverParams,
    ) -> Result<Option<Hover>> {
        let uri = params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;
        Ok(self.guarded("textDocument/hover", || self.hover_provider.provide(&uri, position)).await.flatten())
    }

    async fn goto_definition(
        &self,
        params: GotoDefinitionParams,
    ) -> Result<Option<GotoDefinitionResponse>> {
        let uri = params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;

        let location = self
            .guarded("textDocument/definition", || self.definition_provider.definition(&uri, position))
            .await
            .flatten();
        match &location {
            Some(target) => debug!(
                "goto-def {}:{}:{} → {}:{}",
                short_name(&uri),
                position.line + 1,
                position.character + 1,
                short_name(&target.uri),
                target.range.start.line + 1
            ),
            None => debug!("goto-def {}:{}:{} → none", short_name(&uri), position.line + 1, position.character + 1),
        }
        Ok(location.map(GotoDefinitionResponse::Scalar))
    }

    async fn references(
        &self,
        params: ReferenceParams,
    ) -> Result<Option<Vec<Location>>> {
        let uri = params.text_document_position.text_document.uri;
        let position = params.text_document_position.position;
        let include_declaration = params.context.include_declaration;

        let locations = self
            .guarded("textDocument/references", || {
                self.definition_provider.references(&uri, position, include_declaration)
            })
            .await
            .unwrap_or_default();
        Ok(Some(locations))
    }

    async fn completion(
        &self,
        params: CompletionParams,
    ) -> Result<Option<CompletionResponse>> {
        let Some(provider) = &self.completion_provider else {
            return Ok(None);
        };
        let uri = params.text_document_position.text_document.uri;
        let Some(file) = self.workspace.file(&uri) else {
            return Ok(Some(CompletionResponse::Array(Vec::new())));
        };
        let point = to_internal_point(params.text_document_position.position);
        let options = self.settings_snapshot().await.completion.options();

        let items =
            self.guarded("textDocument/completion", || provider.provide(&file, point, options)).await.unwrap_or_default();
        Ok(Some(CompletionResponse::Array(items)))
    }

    async fn document_symbol(
        &self,
        params: DocumentSymbolParams,
    ) -> Result<Option<DocumentSymbolResponse>> {
        let Some(file) = self.workspace.file(&params.text_document.uri) else {
            return Ok(None);
        };
        let Some(root) = file.root() else {
            return Ok(None);
        };
        let symbols = self
            .guarded("textDocument/documentSymbol", || self.symbol_provider.document_symbols(root))
            .await
            .unwrap_or_default();
        Ok(Some(DocumentSymbolResponse::Nested(symbols)))
    }

    async fn symbol(
        &self,
        params: WorkspaceSymbolParams,
    ) -> Result<Option<Vec<SymbolInformation>>> {
        Ok(Some(self.symbol_provider.workspace_symbols(&params.query, WORKSPACE_SYMBOL_LIMIT)))
    }

    async fn did_change_workspace_folders(
        &self,
        params: DidChangeWorkspaceFoldersParams,
    ) {
        let added: Vec<Url> = params.event.added.into_iter().map(|folder| folder.uri).collect();
        let removed: Vec<Url> = params.event.removed.into_iter().map(|folder| folder.uri).collect();
        info!("Workspace folders changed: +{} -{}", added.len(), removed.len());
        self.workspace.remove_folders(&removed);
        self.workspace.add_folders(added);
    }

    async fn did_change_watched_files(
        &self,
        params: DidChangeWatchedFilesParams,
    ) {
        for event in params.changes {
            let uri = event.uri;
            if event.typ == FileChangeType::DELETED {
                let removed = self.workspace.delete(&uri);
                debug!("Watched file deleted: {} ({removed} symbols)", short_name(&uri));
                self.clear_diagnostics(&uri).await;
                continue;
            }

            match self.guarded("workspace/didChangeWatchedFiles", || self.workspace.refresh_from_disk(&uri)).await {
                Some(Ok(Some(report))) => self.publish_report(&report).await,
                Some(Ok(None)) => {},
                Some(Err(error)) => debug!("Could not refresh watched file: {error}"),
                None => {},
            }
        }
    }

    async fn did_rename_files(
        &self,
        params: RenameFilesParams,
    ) {
        for rename in params.files {
            let (Ok(old_uri), Ok(new_uri)) = (Url::parse(&rename.old_uri), Url::parse(&rename.new_uri)) else {
                warn!("Ignoring rename with invalid uri: {} -> {}", rename.old_uri, rename.new_uri);
                continue;
            };
            info!("Renamed {} -> {}", short_name(&old_uri), short_name(&new_uri));

            self.clear_diagnostics(&old_uri).await;
            if let Some(report) =
                self.guarded("workspace/didRenameFiles", || self.workspace.rename(&old_uri, &new_uri)).await.flatten()
            {
                self.publish_report(&report).await;
            }
        }
    }
}

impl ArborLanguageServer {
    /// Run adapter-facing work, turning a panic into a logged error and a
    /// client notification. `None` means the work panicked.
    async fn guarded<T>(
        &self,
        context: &str,
        work: impl FnOnce() -> T,
    ) -> Option<T> {
        match catch_unwind(AssertUnwindSafe(work)) {
            Ok(value) => Some(value),
            Err(_) => {
                self.report_internal_error(context).await;
                None
            },
        }
    }

    async fn publish_state(
        &self,
        state: &Arc<FileState>,
    ) {
        let report = SyncReport {
            state: state.clone(),
            committed: None,
        };
        self.publish_report(&report).await;
    }
}

fn short_name(uri: &Url) -> String {
    uri.path().rsplit('/').next().unwrap_or(uri.path()).to_owned()
}
