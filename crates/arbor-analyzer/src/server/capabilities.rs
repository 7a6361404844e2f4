use tower_lsp::lsp_types::*;
use tracing::debug;

use crate::language::LanguageSupport;

pub(crate) const DEFINITION_REGISTRATION_ID: &str = "arbor-definition";
pub(crate) const REFERENCES_REGISTRATION_ID: &str = "arbor-references";
pub(crate) const COMPLETION_REGISTRATION_ID: &str = "arbor-completion";
pub(crate) const WATCHER_REGISTRATION_ID: &str = "arbor-watched-files";

/// What the connected client said it can do, and what that makes the
/// server advertise or register.
#[derive(Debug, Clone, Default)]
pub(crate) struct ClientCapabilityManager {
    dynamic_definition: bool,
    dynamic_references: bool,
    dynamic_completion: bool,
    dynamic_watched_files: bool,
    work_done_progress: bool,
}

impl ClientCapabilityManager {
    pub(crate) fn from_client(capabilities: &ClientCapabilities) -> Self {
        let text_document = capabilities.text_document.as_ref();
        let dynamic_definition = text_document
            .and_then(|caps| caps.definition.as_ref())
            .and_then(|caps| caps.dynamic_registration)
            .unwrap_or(false);
        let dynamic_references = text_document
            .and_then(|caps| caps.references.as_ref())
            .and_then(|caps| caps.dynamic_registration)
            .unwrap_or(false);
        let dynamic_completion = text_document
            .and_then(|caps| caps.completion.as_ref())
            .and_then(|caps| caps.dynamic_registration)
            .unwrap_or(false);
        let dynamic_watched_files = capabilities
            .workspace
            .as_ref()
            .and_then(|caps| caps.did_change_watched_files.as_ref())
            .and_then(|caps| caps.dynamic_registration)
            .unwrap_or(false);
        let work_done_progress =
            capabilities.window.as_ref().and_then(|caps| caps.work_done_progress).unwrap_or(false);

        Self {
            dynamic_definition,
            dynamic_references,
            dynamic_completion,
            dynamic_watched_files,
            work_done_progress,
        }
    }

    pub(crate) fn supports_work_done_progress(&self) -> bool {
        self.work_done_progress
    }

    /// Static capabilities. Features the client registers dynamically are
    /// left out here and sent from [`registrations`](Self::registrations).
    pub(crate) fn server_capabilities(
        &self,
        support: &LanguageSupport,
    ) -> ServerCapabilities {
        let definition_provider = (!self.dynamic_definition).then_some(OneOf::Left(true));
        let references_provider = (!self.dynamic_references).then_some(OneOf::Left(true));
        let completion_provider =
            (support.completion.is_some() && !self.dynamic_completion).then(CompletionOptions::default);

        let rename_filters = support
            .file_globs()
            .into_iter()
            .map(|glob| FileOperationFilter {
                scheme: Some("file".to_string()),
                pattern: FileOperationPattern {
                    glob,
                    matches: Some(FileOperationPatternKind::File),
                    options: None,
                },
            })
            .collect();

        ServerCapabilities {
            text_document_sync: Some(TextDocumentSyncCapability::Options(TextDocumentSyncOptions {
                open_close: Some(true),
                change: Some(TextDocumentSyncKind::FULL),
                will_save: None,
                will_save_wait_until: None,
                save: Some(TextDocumentSyncSaveOptions::SaveOptions(SaveOptions {
                    include_text: Some(true),
                })),
            })),
            hover_provider: Some(HoverProviderCapability::Simple(true)),
            definition_provider,
            references_provider,
            completion_provider,
            document_symbol_provider: Some(OneOf::Left(true)),
            workspace_symbol_provider: Some(OneOf::Left(true)),
            workspace: Some(WorkspaceServerCapabilities {
                workspace_folders: Some(WorkspaceFoldersServerCapabilities {
                    supported: Some(true),
                    change_notifications: Some(OneOf::Left(true)),
                }),
                file_operations: Some(WorkspaceFileOperationsServerCapabilities {
                    did_rename: Some(FileOperationRegistrationOptions {
                        filters: rename_filters,
                    }),
                    ..Default::default()
                }),
            }),
            ..Default::default()
        }
    }

    /// Dynamic registrations to send once the client is initialized.
    pub(crate) fn registrations(
        &self,
        support: &LanguageSupport,
    ) -> Vec<Registration> {
        let selector = document_selector(support);
        let text_document_options = TextDocumentRegistrationOptions {
            document_selector: Some(selector.clone()),
        };
        let mut registrations = Vec::new();

        if self.dynamic_definition {
            registrations.push(Registration {
                id: DEFINITION_REGISTRATION_ID.to_string(),
                method: "textDocument/definition".to_string(),
                register_options: serde_json::to_value(&text_document_options).ok(),
            });
        }
        if self.dynamic_references {
            registrations.push(Registration {
                id: REFERENCES_REGISTRATION_ID.to_string(),
                method: "textDocument/references".to_string(),
                register_options: serde_json::to_value(&text_document_options).ok(),
            });
        }
        if self.dynamic_completion && support.completion.is_some() {
            let options = CompletionRegistrationOptions {
                text_document_registration_options: text_document_options.clone(),
                completion_options: CompletionOptions::default(),
            };
            registrations.push(Registration {
                id: COMPLETION_REGISTRATION_ID.to_string(),
                method: "textDocument/completion".to_string(),
                register_options: serde_json::to_value(&options).ok(),
            });
        }
        if self.dynamic_watched_files {
            let watchers = support
                .file_globs()
                .into_iter()
                .map(|glob| FileSystemWatcher {
                    glob_pattern: GlobPattern::String(glob),
                    kind: Some(WatchKind::all()),
                })
                .collect();
            registrations.push(Registration {
                id: WATCHER_REGISTRATION_ID.to_string(),
                method: "workspace/didChangeWatchedFiles".to_string(),
                register_options: serde_json::to_value(DidChangeWatchedFilesRegistrationOptions {
                    watchers,
                })
                .ok(),
            });
        }

        debug!("Prepared {} dynamic registrations", registrations.len());
        registrations
    }
}

fn document_selector(support: &LanguageSupport) -> DocumentSelector {
    support
        .file_globs()
        .into_iter()
        .map(|glob| DocumentFilter {
            language: Some(support.language_id.clone()),
            scheme: Some("file".to_string()),
            pattern: Some(glob),
        })
        .collect()
}

#[cfg(test)]
#[path = "../../tests/src/server/capabilities_tests.rs"]
mod tests;
