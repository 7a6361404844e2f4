mod candidates;
mod context;
mod provider;

pub use candidates::{
    CandidateCollector, Candidates, RuleId, ScopeProvider, ScopelessScope, Token, TokenKind, Tokenizer,
};
pub use provider::{CompletionOptions, CompletionProvider, CompletionSupport};
