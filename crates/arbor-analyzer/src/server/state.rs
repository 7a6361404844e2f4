use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tower_lsp::{
    Client,
    lsp_types::{MessageType, Url},
};
use tracing::{debug, error};

use crate::{
    completion::CompletionProvider,
    definition::DefinitionProvider,
    hover::HoverProvider,
    language::LanguageSupport,
    server::{
        capabilities::ClientCapabilityManager,
        diagnostics::{DiagnosticFilter, collect_diagnostics, publish},
        indexing::BackgroundHandle,
        settings::ServerSettings,
    },
    symbols::SymbolProvider,
    workspace::{SyncReport, WorkspaceState},
};

const CLIENT_NOTIFICATION_PREFIX: &str = "arbor-analyzer:";

/// Language server backend shared by every adapter.
pub struct ArborLanguageServer {
    pub(crate) client: Client,

    /// Files, folders and the symbol repository.
    pub(crate) workspace: Arc<WorkspaceState>,

    pub(crate) definition_provider: DefinitionProvider,
    pub(crate) hover_provider: HoverProvider,
    pub(crate) symbol_provider: SymbolProvider,
    /// `None` when the adapter supplies no completion support.
    pub(crate) completion_provider: Option<CompletionProvider>,

    /// Client capabilities seen in `initialize`.
    pub(crate) capabilities: RwLock<ClientCapabilityManager>,

    pub(crate) settings: Arc<RwLock<ServerSettings>>,

    /// Compiled from `settings.diagnostics` whenever settings change.
    pub(crate) diagnostic_filter: Arc<RwLock<DiagnosticFilter>>,

    /// Cancels the running background load, if any.
    pub(crate) load_cancel: Mutex<CancellationToken>,
}

impl ArborLanguageServer {
    pub fn new(
        client: Client,
        support: LanguageSupport,
    ) -> Self {
        let completion_provider = support.completion.clone().map(CompletionProvider::new);
        let workspace = Arc::new(WorkspaceState::new(support));
        let repository = workspace.repository().clone();

        Self {
            client,
            definition_provider: DefinitionProvider::new(repository.clone()),
            hover_provider: HoverProvider::new(repository.clone()),
            symbol_provider: SymbolProvider::new(repository),
            completion_provider,
            workspace,
            capabilities: RwLock::new(ClientCapabilityManager::default()),
            settings: Arc::new(RwLock::new(ServerSettings::default())),
            diagnostic_filter: Arc::new(RwLock::new(DiagnosticFilter::default())),
            load_cancel: Mutex::new(CancellationToken::new()),
        }
    }

    pub fn workspace(&self) -> &Arc<WorkspaceState> {
        &self.workspace
    }

    pub(crate) fn language_id(&self) -> &str {
        &self.workspace.support().language_id
    }

    pub(crate) async fn settings_snapshot(&self) -> ServerSettings {
        self.settings.read().await.clone()
    }

    pub(crate) async fn apply_settings(
        &self,
        settings: ServerSettings,
    ) {
        *self.diagnostic_filter.write().await = DiagnosticFilter::from_settings(&settings.diagnostics);
        *self.settings.write().await = settings;
    }

    /// Publish the diagnostics of a freshly synchronized file.
    pub(crate) async fn publish_report(
        &self,
        report: &SyncReport,
    ) {
        let settings = self.settings_snapshot().await;
        let diagnostics = {
            let filter = self.diagnostic_filter.read().await;
            collect_diagnostics(&report.state, &settings.diagnostics, &filter, self.language_id())
        };
        publish(&self.client, report.state.uri.clone(), diagnostics, report.state.version).await;
    }

    pub(crate) async fn clear_diagnostics(
        &self,
        uri: &Url,
    ) {
        publish(&self.client, uri.clone(), Vec::new(), None).await;
    }

    /// Cancel any running load and hand out the token for a new one.
    pub(crate) fn restart_load_token(&self) -> CancellationToken {
        let mut current = self.load_cancel.lock().unwrap_or_else(PoisonError::into_inner);
        current.cancel();
        *current = CancellationToken::new();
        current.clone()
    }

    pub(crate) fn cancel_load(&self) {
        self.load_cancel.lock().unwrap_or_else(PoisonError::into_inner).cancel();
    }

    pub(crate) async fn clone_for_background(
        &self,
        cancel: CancellationToken,
    ) -> BackgroundHandle {
        let report_progress = self.capabilities.read().await.supports_work_done_progress();
        BackgroundHandle {
            client: self.client.clone(),
            workspace: self.workspace.clone(),
            settings: self.settings.clone(),
            filter: self.diagnostic_filter.clone(),
            cancel,
            report_progress,
        }
    }

    /// Start a fresh background load of every workspace folder.
    pub(crate) async fn spawn_workspace_load(&self) {
        let handle = self.clone_for_background(self.restart_load_token()).await;
        tokio::spawn(async move {
            let summary = handle.index_workspace().await;
            debug!("Background load finished: {summary:?}");
        });
    }

    /// Log an unexpected failure and surface it to the user.
    pub(crate) async fn report_internal_error(
        &self,
        context: &str,
    ) {
        error!("Internal error while handling {context}");
        self.client
            .show_message(MessageType::ERROR, prefixed_client_message(format!("Internal error while handling {context}")))
            .await;
    }
}

pub(crate) fn prefixed_client_message(message: impl AsRef<str>) -> String {
    format!("{CLIENT_NOTIFICATION_PREFIX} {}", message.as_ref())
}
