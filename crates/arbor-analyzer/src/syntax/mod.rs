//! Interfaces the index consumes from a language adapter's parser.

mod ids;
mod node;
mod parser;

pub use ids::{IdProvider, PositionIdProvider};
pub use node::{NamedReference, ReferenceTarget, SyntaxNode, find_by_position, find_by_span, same_node, walk};
pub(crate) use node::node_address;
pub use parser::{Issue, IssueCategory, IssueSeverity, ParseResult, SourceParser};
