use serde_json::json;

use super::*;

#[test]
fn defaults() {
    let settings = ServerSettings::default();
    assert!(settings.diagnostics.show_parsing_errors);
    assert!(!settings.diagnostics.show_ast_warnings);
    assert!(!settings.diagnostics.show_leaf_positions);
    assert!(settings.indexing.enabled);
    assert_eq!(settings.indexing.max_file_size_kb, 512);
    assert!(!settings.completion.previous_token_fallback);
    assert!(!settings.completion.token_literals);
    assert_eq!(settings.logging.level, LoggingLevel::Info);
}

#[test]
fn parses_namespaced_payload() {
    let payload = json!({
        "mini": {
            "diagnostics": {
                "showParsingErrors": false,
                "showAstWarnings": true,
                "showLeafPositions": true,
                "suppressCategories": ["semantic", "semantic", "lexical"],
                "suppressPatterns": [" ^unused ", ""]
            },
            "indexing": {
                "enabled": false,
                "maxFileSizeKb": 256,
                "excludePaths": ["vendor", " vendor ", " /tmp/generated "]
            },
            "completion": {
                "previousTokenFallback": true,
                "tokenLiterals": true
            },
            "logging": {
                "level": "debug"
            }
        }
    });

    let settings = ServerSettings::from_lsp_payload(Some(&payload), "mini");
    assert!(!settings.diagnostics.show_parsing_errors);
    assert!(settings.diagnostics.show_ast_warnings);
    assert!(settings.diagnostics.show_leaf_positions);
    assert_eq!(settings.diagnostics.suppress_categories, vec![IssueCategory::Semantic, IssueCategory::Lexical]);
    assert_eq!(settings.diagnostics.suppress_patterns, vec!["^unused".to_string()]);
    assert!(!settings.indexing.enabled);
    assert_eq!(settings.indexing.max_file_size_kb, 256);
    assert_eq!(settings.indexing.exclude_paths, vec!["vendor".to_string(), "/tmp/generated".to_string()]);
    assert_eq!(
        settings.completion.options(),
        CompletionOptions {
            previous_token_fallback: true,
            token_literals: true,
        }
    );
    assert_eq!(settings.logging.level, LoggingLevel::Debug);
}

#[test]
fn parses_direct_payload() {
    let payload = json!({
        "diagnostics": { "showASTWarnings": true },
        "indexing": { "maxFileSizeKb": 1024 }
    });

    let settings = ServerSettings::from_lsp_payload(Some(&payload), "mini");
    assert!(settings.diagnostics.show_ast_warnings);
    assert!(settings.diagnostics.show_parsing_errors);
    assert_eq!(settings.indexing.max_file_size_kb, 1024);
}

#[test]
fn other_sections_are_ignored() {
    let payload = json!({
        "other-language": { "indexing": { "enabled": false } }
    });
    let settings = ServerSettings::from_lsp_payload(Some(&payload), "mini");
    assert!(settings.indexing.enabled);
}

#[test]
fn merge_keeps_unspecified_values() {
    let initial = ServerSettings::from_lsp_payload(
        Some(&json!({ "mini": { "completion": { "tokenLiterals": true }, "logging": { "level": "warn" } } })),
        "mini",
    );
    let merged = initial.merged_with_payload(&json!({ "mini": { "logging": { "level": "trace" } } }), "mini");

    assert!(merged.completion.token_literals);
    assert_eq!(merged.logging.level, LoggingLevel::Trace);
}

#[test]
fn clamps_file_size_limit() {
    let low = ServerSettings::from_lsp_payload(Some(&json!({ "indexing": { "maxFileSizeKb": 1 } })), "mini");
    assert_eq!(low.indexing.max_file_size_kb, 16);

    let high = ServerSettings::from_lsp_payload(Some(&json!({ "indexing": { "maxFileSizeKb": 10_000_000 } })), "mini");
    assert_eq!(high.indexing.max_file_size_kb, 65_536);
    assert_eq!(high.indexing.max_file_size_bytes(), 65_536 * 1024);
}

#[test]
fn malformed_sections_are_skipped() {
    let payload = json!({ "indexing": { "enabled": "sometimes" }, "mini": { "logging": { "level": "error" } } });
    let settings = ServerSettings::from_lsp_payload(Some(&payload), "mini");
    assert!(settings.indexing.enabled);
    assert_eq!(settings.logging.level, LoggingLevel::Error);
}

#[test]
fn discovery_options_follow_indexing_settings() {
    let settings = ServerSettings::from_lsp_payload(
        Some(&json!({ "indexing": { "maxFileSizeKb": 32, "excludePaths": ["out"] } })),
        "mini",
    );
    let options = settings.indexing.discovery_options();
    assert_eq!(options.max_file_size_bytes, Some(32 * 1024));
    assert_eq!(options.exclude_paths, vec!["out".to_string()]);
    assert!(options.skip_build_dirs);
}

#[test]
fn logging_level_gate() {
    assert!(LoggingLevel::Info.allows_info());
    assert!(LoggingLevel::Trace.allows_info());
    assert!(!LoggingLevel::Warn.allows_info());
}
