use std::{fmt, sync::Arc};

use serde::{Deserialize, Serialize};
use tower_lsp::lsp_types::Url;

use crate::text_pos::Span;

use super::SyntaxNode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IssueCategory {
    Lexical,
    Syntactic,
    Semantic,
}

impl fmt::Display for IssueCategory {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let label = match self {
            Self::Lexical => "lexical",
            Self::Syntactic => "syntactic",
            Self::Semantic => "semantic",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IssueSeverity {
    Error,
    Warning,
    Information,
}

/// A problem reported by the parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub message: String,
    pub span: Option<Span>,
    pub severity: IssueSeverity,
    pub category: IssueCategory,
}

impl Issue {
    pub fn new(
        category: IssueCategory,
        message: impl Into<String>,
        span: Option<Span>,
    ) -> Self {
        Self {
            message: message.into(),
            span,
            severity: IssueSeverity::Error,
            category,
        }
    }

    pub fn lexical(
        message: impl Into<String>,
        span: Option<Span>,
    ) -> Self {
        Self::new(IssueCategory::Lexical, message, span)
    }

    pub fn syntactic(
        message: impl Into<String>,
        span: Option<Span>,
    ) -> Self {
        Self::new(IssueCategory::Syntactic, message, span)
    }

    pub fn semantic(
        message: impl Into<String>,
        span: Option<Span>,
    ) -> Self {
        Self::new(IssueCategory::Semantic, message, span)
    }

    pub fn with_severity(
        mut self,
        severity: IssueSeverity,
    ) -> Self {
        self.severity = severity;
        self
    }
}

/// Output of one parse: the tree (if any structure was recovered) and issues.
#[derive(Clone, Default)]
pub struct ParseResult {
    pub root: Option<Arc<dyn SyntaxNode>>,
    pub issues: Vec<Issue>,
}

impl ParseResult {
    pub fn new(
        root: Option<Arc<dyn SyntaxNode>>,
        issues: Vec<Issue>,
    ) -> Self {
        Self {
            root,
            issues,
        }
    }

    /// A parse that produced no tree at all.
    pub fn failed(issues: Vec<Issue>) -> Self {
        Self {
            root: None,
            issues,
        }
    }
}

impl fmt::Debug for ParseResult {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("ParseResult")
            .field("root", &self.root.as_ref().map(|root| root.node_type().to_owned()))
            .field("issues", &self.issues)
            .finish()
    }
}

/// Language parser supplied by the adapter.
pub trait SourceParser: Send + Sync {
    fn parse(
        &self,
        uri: &Url,
        text: &str,
    ) -> ParseResult;
}
