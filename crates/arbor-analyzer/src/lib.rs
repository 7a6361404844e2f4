//! Language-agnostic code intelligence for tree-based language servers.
//!
//! An adapter supplies a [`SourceParser`] (and optionally completion
//! support) through [`LanguageSupport`]; the engine keeps parsed files and a
//! flat symbol repository in sync with the editor and answers definition,
//! reference, hover, symbol and completion queries from them.

pub mod completion;
pub mod definition;
pub mod document;
pub mod error;
pub mod hover;
pub mod language;
pub mod logging;
pub mod progress;
pub mod server;
pub mod symbols;
pub mod syntax;
pub mod text_pos;
pub mod workspace;

pub use completion::{CompletionOptions, CompletionProvider, CompletionSupport};
pub use definition::DefinitionProvider;
pub use document::{FileState, FileStore};
pub use error::{Result, WorkspaceError};
pub use hover::HoverProvider;
pub use language::LanguageSupport;
pub use logging::{ServerArgs, init_logging, serve_stdio};
pub use server::{ArborLanguageServer, ServerSettings};
pub use symbols::{SymbolDescription, SymbolProvider, SymbolRepository};
pub use syntax::{IdProvider, Issue, ParseResult, SourceParser, SyntaxNode};
pub use text_pos::{Point, Span};
pub use workspace::{LoadSummary, SyncReport, WorkspaceState};

#[cfg(test)]
#[path = "../tests/src/support.rs"]
pub(crate) mod test_support;
