use std::sync::Arc;

use serde_json::json;

use super::*;
use crate::completion::{CandidateCollector, Candidates, CompletionSupport, ScopelessScope, Token, Tokenizer};
use crate::test_support::no_tree_parser;

struct NoTokens;

impl Tokenizer for NoTokens {
    fn tokenize(
        &self,
        _text: &str,
    ) -> Vec<Token> {
        Vec::new()
    }
}

impl CandidateCollector for NoTokens {
    fn collect(
        &self,
        _tokens: &[Token],
        _caret: usize,
    ) -> Option<Candidates> {
        None
    }
}

fn mini(with_completion: bool) -> LanguageSupport {
    let support = LanguageSupport::new("mini", no_tree_parser()).with_extensions(["mini", "mn"]);
    if with_completion {
        support.with_completion(CompletionSupport::new(Arc::new(NoTokens), Arc::new(NoTokens), Arc::new(ScopelessScope)))
    } else {
        support
    }
}

fn client(value: serde_json::Value) -> ClientCapabilities {
    serde_json::from_value(value).expect("valid client capabilities")
}

fn dynamic_client() -> ClientCapabilities {
    client(json!({
        "textDocument": {
            "definition": { "dynamicRegistration": true },
            "references": { "dynamicRegistration": true },
            "completion": { "dynamicRegistration": true }
        },
        "workspace": {
            "didChangeWatchedFiles": { "dynamicRegistration": true }
        },
        "window": { "workDoneProgress": true }
    }))
}

#[test]
fn static_capabilities_for_plain_clients() {
    let manager = ClientCapabilityManager::from_client(&ClientCapabilities::default());
    let caps = manager.server_capabilities(&mini(true));

    assert_eq!(caps.definition_provider, Some(OneOf::Left(true)));
    assert_eq!(caps.references_provider, Some(OneOf::Left(true)));
    assert!(caps.completion_provider.is_some());
    assert!(matches!(caps.hover_provider, Some(HoverProviderCapability::Simple(true))));
    assert_eq!(caps.document_symbol_provider, Some(OneOf::Left(true)));
    assert!(!manager.supports_work_done_progress());
    assert!(manager.registrations(&mini(true)).is_empty());

    let Some(TextDocumentSyncCapability::Options(sync)) = caps.text_document_sync else {
        panic!("expected sync options");
    };
    assert_eq!(sync.change, Some(TextDocumentSyncKind::FULL));
    assert_eq!(sync.open_close, Some(true));
}

#[test]
fn completion_is_not_advertised_without_support() {
    let manager = ClientCapabilityManager::from_client(&ClientCapabilities::default());
    assert!(manager.server_capabilities(&mini(false)).completion_provider.is_none());

    let dynamic = ClientCapabilityManager::from_client(&dynamic_client());
    let methods: Vec<String> = dynamic.registrations(&mini(false)).into_iter().map(|r| r.method).collect();
    assert!(!methods.contains(&"textDocument/completion".to_string()));
}

#[test]
fn dynamic_clients_get_registrations_instead() {
    let manager = ClientCapabilityManager::from_client(&dynamic_client());
    let caps = manager.server_capabilities(&mini(true));
    assert!(caps.definition_provider.is_none());
    assert!(caps.references_provider.is_none());
    assert!(caps.completion_provider.is_none());
    assert!(manager.supports_work_done_progress());

    let registrations = manager.registrations(&mini(true));
    let ids: Vec<&str> = registrations.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(
        ids,
        vec![DEFINITION_REGISTRATION_ID, REFERENCES_REGISTRATION_ID, COMPLETION_REGISTRATION_ID, WATCHER_REGISTRATION_ID]
    );

    let selector = registrations[0].register_options.as_ref().expect("selector options");
    assert_eq!(selector["documentSelector"][0]["language"], "mini");
    assert_eq!(selector["documentSelector"][1]["pattern"], "**/*.mn");
}

#[test]
fn watcher_globs_follow_extensions() {
    let manager = ClientCapabilityManager::from_client(&dynamic_client());
    let registrations = manager.registrations(&mini(false));
    let watcher = registrations.iter().find(|r| r.id == WATCHER_REGISTRATION_ID).expect("watcher registration");
    let options: DidChangeWatchedFilesRegistrationOptions =
        serde_json::from_value(watcher.register_options.clone().expect("watcher options")).expect("valid options");

    let globs: Vec<String> = options
        .watchers
        .into_iter()
        .map(|watcher| match watcher.glob_pattern {
            GlobPattern::String(glob) => glob,
            GlobPattern::Relative(_) => panic!("expected plain glob"),
        })
        .collect();
    assert_eq!(globs, vec!["**/*.mini", "**/*.mn"]);
}

#[test]
fn workspace_folders_and_renames_are_advertised() {
    let manager = ClientCapabilityManager::from_client(&ClientCapabilities::default());
    let caps = manager.server_capabilities(&mini(false));
    let workspace = caps.workspace.expect("workspace capabilities");

    let folders = workspace.workspace_folders.expect("folder support");
    assert_eq!(folders.supported, Some(true));
    assert_eq!(folders.change_notifications, Some(OneOf::Left(true)));

    let renames = workspace.file_operations.and_then(|ops| ops.did_rename).expect("rename filters");
    let globs: Vec<&str> = renames.filters.iter().map(|f| f.pattern.glob.as_str()).collect();
    assert_eq!(globs, vec!["**/*.mini", "**/*.mn"]);
}
