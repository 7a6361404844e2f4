use std::{fmt, sync::Arc};

use once_cell::sync::OnceCell;
use tower_lsp::lsp_types::Url;

use crate::completion::{Token, Tokenizer};
use crate::syntax::{Issue, ParseResult, SyntaxNode};

/// The latest synchronized view of one file.
///
/// Replaced wholesale on every synchronization, never mutated in place, so
/// a handler holding an `Arc<FileState>` keeps a consistent snapshot.
pub struct FileState {
    pub uri: Url,
    pub text: Arc<str>,
    /// Editor version; `None` for files read from disk.
    pub version: Option<i32>,
    pub root: Option<Arc<dyn SyntaxNode>>,
    pub issues: Vec<Issue>,
    tokens: OnceCell<Arc<[Token]>>,
}

impl FileState {
    pub fn new(
        uri: Url,
        text: Arc<str>,
        version: Option<i32>,
        parse: ParseResult,
    ) -> Self {
        Self {
            uri,
            text,
            version,
            root: parse.root,
            issues: parse.issues,
            tokens: OnceCell::new(),
        }
    }

    pub fn root(&self) -> Option<&dyn SyntaxNode> {
        self.root.as_deref()
    }

    /// Token sequence for completion, computed on first use.
    pub fn tokens(
        &self,
        tokenizer: &dyn Tokenizer,
    ) -> Arc<[Token]> {
        self.tokens.get_or_init(|| tokenizer.tokenize(&self.text).into()).clone()
    }

    pub fn tokens_materialized(&self) -> bool {
        self.tokens.get().is_some()
    }
}

impl fmt::Debug for FileState {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("FileState")
            .field("uri", &self.uri.as_str())
            .field("version", &self.version)
            .field("has_tree", &self.root.is_some())
            .field("issues", &self.issues.len())
            .finish_non_exhaustive()
    }
}
