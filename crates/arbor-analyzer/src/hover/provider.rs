use std::sync::Arc;

use tower_lsp::lsp_types::{Hover, HoverContents, MarkupContent, MarkupKind, Position, Url};

use crate::symbols::{SymbolDescription, SymbolRepository};
use crate::text_pos::{to_editor_range, to_internal_point};

#[derive(Clone)]
pub struct HoverProvider {
    repository: Arc<SymbolRepository>,
}

impl HoverProvider {
    pub fn new(repository: Arc<SymbolRepository>) -> Self {
        Self {
            repository,
        }
    }

    /// Name and node type of the narrowest symbol under `position`.
    pub fn provide(
        &self,
        uri: &Url,
        position: Position,
    ) -> Option<Hover> {
        let symbol = self.repository.find_by_position(uri, to_internal_point(position))?;
        Some(Hover {
            contents: HoverContents::Markup(MarkupContent {
                kind: MarkupKind::Markdown,
                value: render_markdown(&symbol),
            }),
            range: symbol.range.map(to_editor_range),
        })
    }
}

pub(crate) fn render_markdown(symbol: &SymbolDescription) -> String {
    let name = symbol.name().unwrap_or(&symbol.identifier);
    match symbol.node_type() {
        Some(node_type) => format!("**{name}**\n\n`{node_type}`"),
        None => format!("**{name}**"),
    }
}
