use std::{collections::BTreeSet, sync::Arc};

use tower_lsp::lsp_types::{CompletionItem, CompletionItemKind, CompletionTextEdit, TextEdit};
use tracing::debug;

use crate::completion::{
    candidates::{CandidateCollector, RuleId, ScopeProvider, Token, TokenKind, Tokenizer},
    context::{find_current_token, find_previous_token},
};
use crate::document::FileState;
use crate::syntax::find_by_span;
use crate::text_pos::{Point, to_editor_range};

/// The grammar-specific pieces an adapter supplies for completion.
pub struct CompletionSupport {
    pub tokenizer: Arc<dyn Tokenizer>,
    pub collector: Arc<dyn CandidateCollector>,
    pub scope: Arc<dyn ScopeProvider>,
    /// Rules that denote a named-reference slot.
    pub reference_rules: BTreeSet<RuleId>,
    /// Token kinds never offered as literal candidates.
    pub ignored_tokens: BTreeSet<TokenKind>,
}

impl CompletionSupport {
    pub fn new(
        tokenizer: Arc<dyn Tokenizer>,
        collector: Arc<dyn CandidateCollector>,
        scope: Arc<dyn ScopeProvider>,
    ) -> Self {
        Self {
            tokenizer,
            collector,
            scope,
            reference_rules: BTreeSet::new(),
            ignored_tokens: BTreeSet::new(),
        }
    }

    pub fn with_reference_rules(
        mut self,
        rules: impl IntoIterator<Item = RuleId>,
    ) -> Self {
        self.reference_rules.extend(rules);
        self
    }

    pub fn with_ignored_tokens(
        mut self,
        kinds: impl IntoIterator<Item = TokenKind>,
    ) -> Self {
        self.ignored_tokens.extend(kinds);
        self
    }
}

/// Toggles for the secondary completion sources.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompletionOptions {
    /// Seed at the last token before the caret when no token contains it.
    pub previous_token_fallback: bool,
    /// Offer literal token candidates as keyword items.
    pub token_literals: bool,
}

/// Scope-aware completion driven by grammar candidates.
#[derive(Clone)]
pub struct CompletionProvider {
    support: Arc<CompletionSupport>,
}

impl CompletionProvider {
    pub fn new(support: Arc<CompletionSupport>) -> Self {
        Self {
            support,
        }
    }

    /// Completion items at `point`, unordered.
    ///
    /// Each source that lacks an input (no token, no candidates, no node, no
    /// scope answer) contributes nothing instead of failing the request.
    pub fn provide(
        &self,
        file: &FileState,
        point: Point,
        options: CompletionOptions,
    ) -> Vec<CompletionItem> {
        let tokens = file.tokens(self.support.tokenizer.as_ref());

        let token = match find_current_token(&tokens, point) {
            Some(token) => Some(token),
            None if options.previous_token_fallback => find_previous_token(&tokens, point),
            None => None,
        };
        let Some(token) = token else {
            debug!("[completion] no token at {point} in {}", file.uri);
            return Vec::new();
        };

        let Some(candidates) = self.support.collector.collect(&tokens, token.index) else {
            debug!("[completion] collector produced no candidates at token {}", token.index);
            return Vec::new();
        };

        let mut items = Vec::new();

        if candidates.rules.iter().any(|rule| self.support.reference_rules.contains(rule)) {
            items.extend(self.visible_names(file, token).into_iter().map(|name| {
                edit_item(token, name, CompletionItemKind::VARIABLE)
            }));
        }

        if options.token_literals {
            items.extend(
                candidates
                    .tokens
                    .iter()
                    .filter(|kind| !self.support.ignored_tokens.contains(*kind))
                    .filter_map(|kind| self.support.collector.literal_name(*kind))
                    .map(|literal| edit_item(token, literal, CompletionItemKind::KEYWORD)),
            );
        }

        debug!("[completion] {} items at {point} (token {:?})", items.len(), token.text);
        items
    }

    fn visible_names(
        &self,
        file: &FileState,
        token: &Token,
    ) -> Vec<String> {
        let Some(root) = file.root() else {
            return Vec::new();
        };
        let Some(node) = find_by_span(root, token.span) else {
            return Vec::new();
        };
        self.support.scope.names_visible_from(root, node).unwrap_or_default()
    }
}

fn edit_item(
    token: &Token,
    text: String,
    kind: CompletionItemKind,
) -> CompletionItem {
    CompletionItem {
        label: text.clone(),
        kind: Some(kind),
        text_edit: Some(CompletionTextEdit::Edit(TextEdit {
            range: to_editor_range(token.span),
            new_text: text,
        })),
        ..Default::default()
    }
}
