mod provider;
mod repository;
mod scanner;
mod types;

pub use provider::{SymbolProvider, WORKSPACE_SYMBOL_LIMIT};
pub use repository::{BatchSummary, SymbolBatch, SymbolRepository};
pub use scanner::extract_symbols;
pub use types::{FieldValue, NAME_FIELD, ReferenceValue, SymbolDescription, TYPE_FIELD, URI_FIELD};
