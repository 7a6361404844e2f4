use std::fmt;

use indexmap::IndexMap;
use tower_lsp::lsp_types::Url;

use crate::text_pos::{Point, Span};

pub const NAME_FIELD: &str = "name";
pub const URI_FIELD: &str = "uri";
pub const TYPE_FIELD: &str = "type";

/// A named-reference occurrence stored on a symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceValue {
    /// Name as written at the use site.
    pub name: Option<String>,
    /// Identifier of the referenced symbol; `None` when unresolved.
    pub target_identifier: Option<String>,
    /// Range of the reference token, always inside the owning symbol's range.
    pub occurrence_range: Option<Span>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Bool(bool),
    Number(f64),
    Reference(ReferenceValue),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<&ReferenceValue> {
        match self {
            Self::Reference(reference) => Some(reference),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Number(value) => write!(f, "{value}"),
            Self::Reference(reference) => match (&reference.name, &reference.target_identifier) {
                (Some(name), Some(target)) => write!(f, "{name} -> {target}"),
                (Some(name), None) => write!(f, "{name} -> ?"),
                (None, Some(target)) => write!(f, "-> {target}"),
                (None, None) => f.write_str("-> ?"),
            },
        }
    }
}

/// One indexed node.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolDescription {
    pub identifier: String,
    pub uri: Url,
    pub range: Option<Span>,
    pub fields: IndexMap<String, FieldValue>,
}

impl SymbolDescription {
    pub fn new(
        identifier: impl Into<String>,
        uri: Url,
        range: Option<Span>,
    ) -> Self {
        let mut fields = IndexMap::new();
        fields.insert(URI_FIELD.to_owned(), FieldValue::Text(uri.to_string()));
        Self {
            identifier: identifier.into(),
            uri,
            range,
            fields,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.fields.get(NAME_FIELD).and_then(FieldValue::as_text)
    }

    pub fn node_type(&self) -> Option<&str> {
        self.fields.get(TYPE_FIELD).and_then(FieldValue::as_text)
    }

    pub fn contains_point(
        &self,
        point: Point,
    ) -> bool {
        self.range.is_some_and(|range| range.contains_point(point))
    }

    /// Reference fields in declaration order.
    pub fn references(&self) -> impl Iterator<Item = (&str, &ReferenceValue)> {
        self.fields
            .iter()
            .filter_map(|(field, value)| value.as_reference().map(|reference| (field.as_str(), reference)))
    }

    /// The outgoing reference whose occurrence covers `point`.
    ///
    /// Overlapping occurrences resolve to the narrowest one; equal sizes keep
    /// field order.
    pub fn reference_at(
        &self,
        point: Point,
    ) -> Option<&ReferenceValue> {
        self.references()
            .filter_map(|(_, reference)| {
                let range = reference.occurrence_range?;
                range.contains_point(point).then_some((range.size(), reference))
            })
            .min_by_key(|(size, _)| *size)
            .map(|(_, reference)| reference)
    }

    /// References from this symbol that resolve to `identifier`.
    pub fn references_to<'a>(
        &'a self,
        identifier: &'a str,
    ) -> impl Iterator<Item = &'a ReferenceValue> + 'a {
        self.references()
            .map(|(_, reference)| reference)
            .filter(move |reference| reference.target_identifier.as_deref() == Some(identifier))
    }
}
