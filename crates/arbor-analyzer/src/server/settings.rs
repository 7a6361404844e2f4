use std::collections::{HashMap, HashSet};

use serde::Deserialize;
use serde_json::Value;

use crate::completion::CompletionOptions;
use crate::syntax::IssueCategory;
use crate::workspace::DiscoveryOptions;

const MIN_MAX_FILE_SIZE_KB: u64 = 16;
const MAX_MAX_FILE_SIZE_KB: u64 = 1024 * 64;

/// Runtime settings, read from `initializationOptions` and
/// `workspace/didChangeConfiguration`.
///
/// Payloads are accepted flat or nested under the adapter's language id.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ServerSettings {
    pub diagnostics: DiagnosticsSettings,
    pub indexing: IndexingSettings,
    pub completion: CompletionSettings,
    pub logging: LoggingSettings,
}

impl ServerSettings {
    pub fn from_lsp_payload(
        payload: Option<&Value>,
        section: &str,
    ) -> Self {
        match payload {
            Some(payload) => Self::default().merged_with_payload(payload, section),
            None => Self::default(),
        }
    }

    pub fn merged_with_payload(
        &self,
        payload: &Value,
        section: &str,
    ) -> Self {
        let mut merged = self.clone();

        for candidate in payload_candidates(payload, section) {
            if let Ok(patch) = serde_json::from_value::<ServerSettingsPatch>(candidate) {
                merged.apply_patch(patch);
            }
        }

        merged.normalize();
        merged
    }

    fn apply_patch(
        &mut self,
        patch: ServerSettingsPatch,
    ) {
        if let Some(diagnostics) = patch.diagnostics {
            self.diagnostics.apply_patch(diagnostics);
        }
        if let Some(indexing) = patch.indexing {
            self.indexing.apply_patch(indexing);
        }
        if let Some(completion) = patch.completion {
            self.completion.apply_patch(completion);
        }
        if let Some(logging) = patch.logging {
            self.logging.apply_patch(logging);
        }
    }

    fn normalize(&mut self) {
        self.diagnostics.normalize();
        self.indexing.normalize();
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DiagnosticsSettings {
    pub show_parsing_errors: bool,
    /// Warn on leaves that position lookup does not find again.
    pub show_ast_warnings: bool,
    /// Report every leaf's position as an information diagnostic.
    pub show_leaf_positions: bool,
    pub suppress_categories: Vec<IssueCategory>,
    /// Regular expressions matched against issue messages.
    pub suppress_patterns: Vec<String>,
}

impl Default for DiagnosticsSettings {
    fn default() -> Self {
        Self {
            show_parsing_errors: true,
            show_ast_warnings: false,
            show_leaf_positions: false,
            suppress_categories: Vec::new(),
            suppress_patterns: Vec::new(),
        }
    }
}

impl DiagnosticsSettings {
    fn apply_patch(
        &mut self,
        patch: DiagnosticsSettingsPatch,
    ) {
        if let Some(show) = patch.show_parsing_errors {
            self.show_parsing_errors = show;
        }
        if let Some(show) = patch.show_ast_warnings {
            self.show_ast_warnings = show;
        }
        if let Some(show) = patch.show_leaf_positions {
            self.show_leaf_positions = show;
        }
        if let Some(categories) = patch.suppress_categories {
            self.suppress_categories = categories;
        }
        if let Some(patterns) = patch.suppress_patterns {
            self.suppress_patterns = patterns;
        }
    }

    fn normalize(&mut self) {
        let mut seen = HashSet::new();
        self.suppress_categories.retain(|category| seen.insert(*category));
        self.suppress_patterns = self
            .suppress_patterns
            .iter()
            .map(|pattern| pattern.trim().to_string())
            .filter(|pattern| !pattern.is_empty())
            .collect();
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexingSettings {
    pub enabled: bool,
    pub max_file_size_kb: u64,
    pub exclude_paths: Vec<String>,
}

impl Default for IndexingSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            max_file_size_kb: 512,
            exclude_paths: Vec::new(),
        }
    }
}

impl IndexingSettings {
    fn apply_patch(
        &mut self,
        patch: IndexingSettingsPatch,
    ) {
        if let Some(enabled) = patch.enabled {
            self.enabled = enabled;
        }
        if let Some(max_file_size_kb) = patch.max_file_size_kb {
            self.max_file_size_kb = max_file_size_kb;
        }
        if let Some(exclude_paths) = patch.exclude_paths {
            self.exclude_paths = exclude_paths;
        }
    }

    fn normalize(&mut self) {
        self.max_file_size_kb = self.max_file_size_kb.clamp(MIN_MAX_FILE_SIZE_KB, MAX_MAX_FILE_SIZE_KB);
        let mut seen = HashSet::new();
        self.exclude_paths = self
            .exclude_paths
            .iter()
            .map(|path| path.trim().to_string())
            .filter(|path| !path.is_empty())
            .filter(|path| seen.insert(path.clone()))
            .collect();
    }

    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_kb.saturating_mul(1024)
    }

    pub fn discovery_options(&self) -> DiscoveryOptions {
        DiscoveryOptions {
            max_file_size_bytes: Some(self.max_file_size_bytes()),
            exclude_paths: self.exclude_paths.clone(),
            skip_build_dirs: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompletionSettings {
    pub previous_token_fallback: bool,
    pub token_literals: bool,
}

impl CompletionSettings {
    fn apply_patch(
        &mut self,
        patch: CompletionSettingsPatch,
    ) {
        if let Some(fallback) = patch.previous_token_fallback {
            self.previous_token_fallback = fallback;
        }
        if let Some(literals) = patch.token_literals {
            self.token_literals = literals;
        }
    }

    pub fn options(&self) -> CompletionOptions {
        CompletionOptions {
            previous_token_fallback: self.previous_token_fallback,
            token_literals: self.token_literals,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LoggingSettings {
    pub level: LoggingLevel,
}

impl LoggingSettings {
    fn apply_patch(
        &mut self,
        patch: LoggingSettingsPatch,
    ) {
        if let Some(level) = patch.level {
            self.level = level;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LoggingLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LoggingLevel {
    pub fn allows_info(self) -> bool {
        self >= LoggingLevel::Info
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct ServerSettingsPatch {
    diagnostics: Option<DiagnosticsSettingsPatch>,
    indexing: Option<IndexingSettingsPatch>,
    completion: Option<CompletionSettingsPatch>,
    logging: Option<LoggingSettingsPatch>,
    #[serde(flatten)]
    _extra: HashMap<String, Value>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct DiagnosticsSettingsPatch {
    show_parsing_errors: Option<bool>,
    #[serde(alias = "showASTWarnings")]
    show_ast_warnings: Option<bool>,
    show_leaf_positions: Option<bool>,
    suppress_categories: Option<Vec<IssueCategory>>,
    suppress_patterns: Option<Vec<String>>,
    #[serde(flatten)]
    _extra: HashMap<String, Value>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct IndexingSettingsPatch {
    enabled: Option<bool>,
    max_file_size_kb: Option<u64>,
    exclude_paths: Option<Vec<String>>,
    #[serde(flatten)]
    _extra: HashMap<String, Value>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct CompletionSettingsPatch {
    previous_token_fallback: Option<bool>,
    token_literals: Option<bool>,
    #[serde(flatten)]
    _extra: HashMap<String, Value>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct LoggingSettingsPatch {
    level: Option<LoggingLevel>,
    #[serde(flatten)]
    _extra: HashMap<String, Value>,
}

fn payload_candidates(
    payload: &Value,
    section: &str,
) -> Vec<Value> {
    let mut candidates = vec![payload.clone()];

    if let Some(scoped) = payload.get(section) {
        candidates.push(scoped.clone());
    }

    candidates
}

#[cfg(test)]
#[path = "../../tests/src/server/settings_tests.rs"]
mod tests;
