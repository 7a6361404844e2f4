use std::collections::{HashMap, HashSet};

use tower_lsp::lsp_types::{DocumentSymbol, Url};
use tracing::debug;

use crate::syntax::{IdProvider, NamedReference, ReferenceTarget, SyntaxNode, node_address, walk};
use crate::text_pos::{Span, to_editor_range};

use super::types::{FieldValue, NAME_FIELD, ReferenceValue, SymbolDescription, TYPE_FIELD};

/// Identifiers assigned to the positioned nodes of one tree.
///
/// Nodes are keyed by address and type: a node and its first field can
/// share an address.
struct IdTable<'t> {
    by_node: HashMap<usize, Vec<(&'t str, String)>>,
    by_name: HashMap<&'t str, String>,
}

impl<'t> IdTable<'t> {
    fn build(
        uri: &Url,
        nodes: &[&'t dyn SyntaxNode],
        ids: &dyn IdProvider,
    ) -> Self {
        let mut by_node = HashMap::new();
        let mut by_name = HashMap::new();
        let mut taken = HashSet::new();

        for (ordinal, node) in nodes.iter().enumerate() {
            if node.span().is_none() {
                continue;
            }
            let mut id = ids.id(uri, *node, ordinal);
            if !taken.insert(id.clone()) {
                id = format!("{id}#{ordinal}");
                taken.insert(id.clone());
            }
            if let Some(name) = node.name() {
                // Later declarations shadow earlier ones.
                by_name.insert(name, id.clone());
            }
            by_node.entry(node_address(*node)).or_insert_with(Vec::new).push((node.node_type(), id));
        }

        Self {
            by_node,
            by_name,
        }
    }

    fn of(
        &self,
        node: &dyn SyntaxNode,
    ) -> Option<&String> {
        let node_type = node.node_type();
        self.by_node
            .get(&node_address(node))?
            .iter()
            .find(|(candidate, _)| *candidate == node_type)
            .map(|(_, id)| id)
    }

    fn resolve(
        &self,
        reference: &NamedReference<'_>,
        resolve_by_name: bool,
    ) -> Option<String> {
        match &reference.target {
            Some(ReferenceTarget::Node(target)) => self.of(*target).cloned(),
            Some(ReferenceTarget::Identifier(id)) => Some(id.clone()),
            None if resolve_by_name => reference.name.and_then(|name| self.by_name.get(name).cloned()),
            None => None,
        }
    }
}

/// Extract one symbol per positioned node of `root`, in pre-order.
///
/// Reference targets resolve through node identity, adapter-supplied
/// identifiers, or, with `resolve_by_name`, the last node in the tree
/// declaring the referenced name.
pub fn extract_symbols(
    uri: &Url,
    root: &dyn SyntaxNode,
    ids: &dyn IdProvider,
    resolve_by_name: bool,
) -> Vec<SymbolDescription> {
    let nodes = walk(root);
    let table = IdTable::build(uri, &nodes, ids);
    let mut symbols = Vec::with_capacity(nodes.len());

    for node in nodes {
        let Some(span) = node.span() else {
            continue;
        };
        let Some(identifier) = table.of(node) else {
            continue;
        };

        let mut symbol = SymbolDescription::new(identifier.clone(), uri.clone(), Some(span));
        let name = node.name().map(str::to_owned).unwrap_or_else(|| identifier.clone());
        symbol.fields.insert(NAME_FIELD.to_owned(), FieldValue::Text(name));
        symbol.fields.insert(TYPE_FIELD.to_owned(), FieldValue::Text(node.node_type().to_owned()));

        for reference in node.references() {
            let value = ReferenceValue {
                name: reference.name.map(str::to_owned),
                target_identifier: table.resolve(&reference, resolve_by_name),
                occurrence_range: occurrence_within(span, &reference, identifier),
            };
            let key = free_field_key(&symbol, reference.field);
            symbol.fields.insert(key, FieldValue::Reference(value));
        }

        symbols.push(symbol);
    }

    symbols
}

fn occurrence_within(
    owner: Span,
    reference: &NamedReference<'_>,
    identifier: &str,
) -> Option<Span> {
    let occurrence = reference.span?;
    if owner.contains_span(&occurrence) {
        return Some(occurrence);
    }
    debug!(
        "[scanner] dropping occurrence {occurrence} of '{}' outside owner {identifier} ({owner})",
        reference.field
    );
    None
}

fn free_field_key(
    symbol: &SymbolDescription,
    field: &str,
) -> String {
    if !symbol.fields.contains_key(field) {
        return field.to_owned();
    }
    (1..)
        .map(|n| format!("{field}.{n}"))
        .find(|key| !symbol.fields.contains_key(key))
        .unwrap_or_else(|| field.to_owned())
}

/// Nested outline of the named, positioned nodes under `root`.
///
/// Unnamed nodes are transparent: their named descendants attach to the
/// nearest named ancestor.
pub(crate) fn build_outline(root: &dyn SyntaxNode) -> Vec<DocumentSymbol> {
    let mut out = Vec::new();
    collect_outline(root, &mut out);
    out
}

fn collect_outline(
    node: &dyn SyntaxNode,
    out: &mut Vec<DocumentSymbol>,
) {
    let named = node.name().zip(node.span());
    let Some((name, span)) = named else {
        for child in node.children() {
            collect_outline(child, out);
        }
        return;
    };

    let mut children = Vec::new();
    for child in node.children() {
        collect_outline(child, &mut children);
    }

    let range = to_editor_range(span);
    out.push(DocumentSymbol {
        name: name.to_owned(),
        detail: Some(node.node_type().to_owned()),
        kind: node.symbol_kind(),
        tags: None,
        #[allow(deprecated)]
        deprecated: None,
        range,
        selection_range: range,
        children: if children.is_empty() {
            None
        } else {
            Some(children)
        },
    });
}

#[cfg(test)]
#[path = "../../tests/src/symbols/scanner_tests.rs"]
mod tests;
