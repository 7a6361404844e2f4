use std::sync::Arc;

use tower_lsp::lsp_types::{DocumentSymbol, Location, SymbolInformation, SymbolKind};
use tracing::debug;

use crate::syntax::SyntaxNode;
use crate::text_pos::to_editor_range;

use super::repository::SymbolRepository;
use super::scanner::build_outline;

pub const WORKSPACE_SYMBOL_LIMIT: usize = 100;

/// Outline and workspace-symbol queries.
#[derive(Clone)]
pub struct SymbolProvider {
    repository: Arc<SymbolRepository>,
}

impl SymbolProvider {
    pub fn new(repository: Arc<SymbolRepository>) -> Self {
        Self {
            repository,
        }
    }

    pub fn repository(&self) -> &SymbolRepository {
        &self.repository
    }

    /// Outline of a parsed file, built from its live tree.
    pub fn document_symbols(
        &self,
        root: &dyn SyntaxNode,
    ) -> Vec<DocumentSymbol> {
        build_outline(root)
    }

    /// Named symbols whose name contains `query`, case-insensitively.
    pub fn workspace_symbols(
        &self,
        query: &str,
        limit: usize,
    ) -> Vec<SymbolInformation> {
        let query_lower = query.to_lowercase();
        let mut results = Vec::new();

        self.repository.scan(|symbol| {
            if results.len() >= limit {
                return;
            }
            let (Some(name), Some(range)) = (symbol.name(), symbol.range) else {
                return;
            };
            // Unnamed nodes carry their identifier as name.
            if name == symbol.identifier || !name.to_lowercase().contains(&query_lower) {
                return;
            }
            #[allow(deprecated)]
            results.push(SymbolInformation {
                name: name.to_owned(),
                kind: SymbolKind::VARIABLE, // Kind is not stored on indexed symbols
                tags: None,
                deprecated: None,
                location: Location {
                    uri: symbol.uri.clone(),
                    range: to_editor_range(range),
                },
                container_name: symbol.node_type().map(str::to_owned),
            });
        });

        debug!("[workspace-symbol] '{query}' matched {} symbols", results.len());
        results
    }
}
