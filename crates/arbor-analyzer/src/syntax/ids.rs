use tower_lsp::lsp_types::Url;

use super::SyntaxNode;

/// Assigns repository identifiers to nodes during extraction.
///
/// `ordinal` is the node's pre-order index within its file. Identifiers must
/// be deterministic for a given uri and text, so that re-synchronizing
/// unchanged text reproduces the same set.
pub trait IdProvider: Send + Sync {
    fn id(
        &self,
        uri: &Url,
        node: &dyn SyntaxNode,
        ordinal: usize,
    ) -> String;
}

/// `uri:startLine:startColumn:endLine:endColumn` in internal coordinates.
///
/// Unpositioned nodes get `uri#ordinal`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PositionIdProvider;

impl IdProvider for PositionIdProvider {
    fn id(
        &self,
        uri: &Url,
        node: &dyn SyntaxNode,
        ordinal: usize,
    ) -> String {
        match node.span() {
            Some(span) => format!(
                "{uri}:{}:{}:{}:{}",
                span.start.line, span.start.column, span.end.line, span.end.column
            ),
            None => format!("{uri}#{ordinal}"),
        }
    }
}
