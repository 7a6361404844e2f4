//! Grammar-side collaborators of the completion engine.

use std::collections::BTreeSet;

use indexmap::IndexSet;

use crate::syntax::{SyntaxNode, walk};
use crate::text_pos::Span;

/// Grammar rule identifier as understood by the adapter's collector.
pub type RuleId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TokenKind(pub u32);

/// A lexical token of the file being completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Position in the token stream.
    pub index: usize,
    pub kind: TokenKind,
    pub text: String,
    pub span: Span,
}

pub trait Tokenizer: Send + Sync {
    fn tokenize(
        &self,
        text: &str,
    ) -> Vec<Token>;
}

/// What the grammar could accept at a caret token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Candidates {
    pub rules: BTreeSet<RuleId>,
    pub tokens: BTreeSet<TokenKind>,
}

/// Error-tolerant next-symbol prediction over a token stream.
pub trait CandidateCollector: Send + Sync {
    /// Candidates reachable when the parser sits at `tokens[caret]`.
    fn collect(
        &self,
        tokens: &[Token],
        caret: usize,
    ) -> Option<Candidates>;

    /// Display text for a literal token kind, e.g. `"def"`.
    fn literal_name(
        &self,
        _kind: TokenKind,
    ) -> Option<String> {
        None
    }
}

/// Names visible from a position in the tree.
pub trait ScopeProvider: Send + Sync {
    fn names_visible_from(
        &self,
        root: &dyn SyntaxNode,
        node: &dyn SyntaxNode,
    ) -> Option<Vec<String>>;
}

/// Every name declared anywhere in the tree, in declaration order.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScopelessScope;

impl ScopeProvider for ScopelessScope {
    fn names_visible_from(
        &self,
        root: &dyn SyntaxNode,
        _node: &dyn SyntaxNode,
    ) -> Option<Vec<String>> {
        let names: IndexSet<&str> = walk(root).into_iter().filter_map(|node| node.name()).collect();
        Some(names.into_iter().map(str::to_owned).collect())
    }
}
