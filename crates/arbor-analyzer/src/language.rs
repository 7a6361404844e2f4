use std::{fmt, path::Path, sync::Arc};

use crate::completion::CompletionSupport;
use crate::syntax::{IdProvider, PositionIdProvider, SourceParser};

/// Everything a language adapter plugs into the server.
#[derive(Clone)]
pub struct LanguageSupport {
    /// LSP language id; also the settings section name.
    pub language_id: String,
    /// Extensions without the leading dot. Empty means every file.
    pub file_extensions: Vec<String>,
    pub parser: Arc<dyn SourceParser>,
    pub ids: Arc<dyn IdProvider>,
    /// Resolve references without an explicit target by name, file-wide.
    pub resolve_references_by_name: bool,
    pub completion: Option<Arc<CompletionSupport>>,
}

impl LanguageSupport {
    pub fn new(
        language_id: impl Into<String>,
        parser: Arc<dyn SourceParser>,
    ) -> Self {
        Self {
            language_id: language_id.into(),
            file_extensions: Vec::new(),
            parser,
            ids: Arc::new(PositionIdProvider),
            resolve_references_by_name: false,
            completion: None,
        }
    }

    pub fn with_extensions<I, S>(
        mut self,
        extensions: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.file_extensions =
            extensions.into_iter().map(|ext| ext.into().trim_start_matches('.').to_owned()).collect();
        self
    }

    pub fn with_id_provider(
        mut self,
        ids: Arc<dyn IdProvider>,
    ) -> Self {
        self.ids = ids;
        self
    }

    pub fn with_name_resolution(
        mut self,
        enabled: bool,
    ) -> Self {
        self.resolve_references_by_name = enabled;
        self
    }

    pub fn with_completion(
        mut self,
        completion: CompletionSupport,
    ) -> Self {
        self.completion = Some(Arc::new(completion));
        self
    }

    pub fn handles_path(
        &self,
        path: &Path,
    ) -> bool {
        if self.file_extensions.is_empty() {
            return true;
        }
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.file_extensions.iter().any(|known| known.eq_ignore_ascii_case(ext)))
    }

    /// Glob patterns matching the adapter's files, one per extension.
    pub fn file_globs(&self) -> Vec<String> {
        if self.file_extensions.is_empty() {
            return vec!["**/*".to_owned()];
        }
        self.file_extensions.iter().map(|ext| format!("**/*.{ext}")).collect()
    }
}

impl fmt::Debug for LanguageSupport {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("LanguageSupport")
            .field("language_id", &self.language_id)
            .field("file_extensions", &self.file_extensions)
            .field("resolve_references_by_name", &self.resolve_references_by_name)
            .field("completion", &self.completion.is_some())
            .finish_non_exhaustive()
    }
}
