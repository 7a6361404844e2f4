use std::collections::HashSet;

use regex::Regex;
use tower_lsp::{
    Client,
    lsp_types::{Diagnostic, DiagnosticSeverity, NumberOrString, Url},
};
use tracing::{debug, warn};

use crate::document::FileState;
use crate::server::settings::DiagnosticsSettings;
use crate::syntax::{Issue, IssueCategory, IssueSeverity, SyntaxNode, find_by_span, same_node, walk};
use crate::text_pos::{slice_span, to_editor_range};

/// Category and message filters applied to parser issues before publishing.
#[derive(Debug, Clone, Default)]
pub(crate) struct DiagnosticFilter {
    categories: HashSet<IssueCategory>,
    patterns: Vec<Regex>,
}

impl DiagnosticFilter {
    pub(crate) fn from_settings(settings: &DiagnosticsSettings) -> Self {
        let patterns = settings
            .suppress_patterns
            .iter()
            .filter_map(|pattern| match Regex::new(pattern) {
                Ok(regex) => Some(regex),
                Err(error) => {
                    warn!("Ignoring invalid diagnostics.suppressPatterns entry '{pattern}': {error}");
                    None
                },
            })
            .collect();

        Self {
            categories: settings.suppress_categories.iter().copied().collect(),
            patterns,
        }
    }

    pub(crate) fn allows(
        &self,
        issue: &Issue,
    ) -> bool {
        if self.categories.contains(&issue.category) {
            return false;
        }
        !self.patterns.iter().any(|pattern| pattern.is_match(&issue.message))
    }
}

/// Everything to publish for one file under the current settings.
pub(crate) fn collect_diagnostics(
    state: &FileState,
    settings: &DiagnosticsSettings,
    filter: &DiagnosticFilter,
    source_name: &str,
) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    if settings.show_parsing_errors {
        diagnostics.extend(
            state
                .issues
                .iter()
                .filter(|issue| filter.allows(issue))
                .filter_map(|issue| issue_to_diagnostic(issue, source_name)),
        );
    }

    if let Some(root) = state.root()
        && (settings.show_ast_warnings || settings.show_leaf_positions)
    {
        for leaf in positioned_leaves(root) {
            if settings.show_ast_warnings
                && let Some(warning) = leaf_consistency_warning(root, leaf, source_name)
            {
                diagnostics.push(warning);
            }
            if settings.show_leaf_positions
                && let Some(info) = leaf_position_info(leaf, &state.text, source_name)
            {
                diagnostics.push(info);
            }
        }
    }

    diagnostics
}

/// Issues without a range have nowhere to be shown and are dropped.
pub(crate) fn issue_to_diagnostic(
    issue: &Issue,
    source_name: &str,
) -> Option<Diagnostic> {
    let Some(span) = issue.span else {
        debug!("Dropping issue without a range: {}", issue.message);
        return None;
    };

    let severity = match issue.severity {
        IssueSeverity::Error => DiagnosticSeverity::ERROR,
        IssueSeverity::Warning => DiagnosticSeverity::WARNING,
        IssueSeverity::Information => DiagnosticSeverity::INFORMATION,
    };

    Some(Diagnostic {
        range: to_editor_range(span),
        severity: Some(severity),
        code: Some(NumberOrString::String(issue.category.to_string())),
        source: Some(source_name.to_owned()),
        message: issue.message.clone(),
        ..Default::default()
    })
}

fn positioned_leaves(root: &dyn SyntaxNode) -> impl Iterator<Item = &dyn SyntaxNode> {
    walk(root).into_iter().filter(|node| node.span().is_some() && node.children().is_empty())
}

/// A leaf that position lookup resolves to some other node.
fn leaf_consistency_warning(
    root: &dyn SyntaxNode,
    leaf: &dyn SyntaxNode,
    source_name: &str,
) -> Option<Diagnostic> {
    let span = leaf.span()?;
    let found = find_by_span(root, span);
    if found.is_some_and(|found| same_node(found, leaf)) {
        return None;
    }

    let found_type = found.map(|found| found.node_type()).unwrap_or("null");
    Some(Diagnostic {
        range: to_editor_range(span),
        severity: Some(DiagnosticSeverity::WARNING),
        source: Some(source_name.to_owned()),
        message: format!("Leaf type: {} but findByPositionType: {found_type}", leaf.node_type()),
        ..Default::default()
    })
}

fn leaf_position_info(
    leaf: &dyn SyntaxNode,
    text: &str,
    source_name: &str,
) -> Option<Diagnostic> {
    let span = leaf.span()?;
    let source_text = slice_span(text, span).unwrap_or_default();
    Some(Diagnostic {
        range: to_editor_range(span),
        severity: Some(DiagnosticSeverity::INFORMATION),
        source: Some(source_name.to_owned()),
        message: format!("Leaf position: {span}, Source text: {source_text}"),
        ..Default::default()
    })
}

pub(crate) async fn publish(
    client: &Client,
    uri: Url,
    diagnostics: Vec<Diagnostic>,
    version: Option<i32>,
) {
    let count = diagnostics.len();
    client.publish_diagnostics(uri.clone(), diagnostics, version).await;
    debug!("Published {count} diagnostics for {uri}");
}

#[cfg(test)]
#[path = "../../tests/src/server/diagnostics_tests.rs"]
mod tests;
