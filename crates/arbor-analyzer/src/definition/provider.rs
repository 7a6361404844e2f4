use std::sync::Arc;

use tower_lsp::lsp_types::{Location, Position, Url};
use tracing::debug;

use crate::symbols::{SymbolDescription, SymbolRepository};
use crate::text_pos::{to_editor_range, to_internal_point};

/// Go-to-definition and find-references over the symbol repository.
#[derive(Clone)]
pub struct DefinitionProvider {
    repository: Arc<SymbolRepository>,
}

impl DefinitionProvider {
    pub fn new(repository: Arc<SymbolRepository>) -> Self {
        Self {
            repository,
        }
    }

    /// Follow the reference under `position` to its target's location.
    ///
    /// Empty when no symbol covers the position, no reference occurrence
    /// covers it, the reference is unresolved, or the target is gone.
    pub fn definition(
        &self,
        uri: &Url,
        position: Position,
    ) -> Option<Location> {
        let point = to_internal_point(position);
        let symbol = self.repository.find_by_position(uri, point)?;
        let reference = symbol.reference_at(point)?;
        let Some(target_id) = reference.target_identifier.as_deref() else {
            debug!("[definition] unresolved reference {:?} in {}", reference.name, symbol.identifier);
            return None;
        };
        let Some(target) = self.repository.load(target_id) else {
            debug!("[definition] stale target {target_id}");
            return None;
        };
        location_of(&target)
    }

    /// Every reference occurrence whose target is the symbol under
    /// `position`, in repository scan order, optionally followed by the
    /// symbol's own location.
    pub fn references(
        &self,
        uri: &Url,
        position: Position,
        include_declaration: bool,
    ) -> Vec<Location> {
        let point = to_internal_point(position);
        let Some(target) = self.repository.find_by_position(uri, point) else {
            return Vec::new();
        };

        let mut locations = Vec::new();
        self.repository.scan(|symbol| {
            for reference in symbol.references_to(&target.identifier) {
                if let Some(range) = reference.occurrence_range {
                    locations.push(Location {
                        uri: symbol.uri.clone(),
                        range: to_editor_range(range),
                    });
                }
            }
        });

        if include_declaration && let Some(location) = location_of(&target) {
            locations.push(location);
        }

        debug!("[references] {} locations for {}", locations.len(), target.identifier);
        locations
    }
}

pub(crate) fn location_of(symbol: &SymbolDescription) -> Option<Location> {
    let range = symbol.range?;
    Some(Location {
        uri: symbol.uri.clone(),
        range: to_editor_range(range),
    })
}
