use std::{
    cmp::Reverse,
    collections::{BTreeMap, HashMap, HashSet},
    sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use tower_lsp::lsp_types::Url;
use tracing::{debug, warn};

use crate::text_pos::Point;

use super::types::SymbolDescription;

/// Store of every indexed symbol in the workspace.
///
/// All state sits behind one `RwLock`: queries share the read side, and a
/// file's generation swap ([`SymbolBatch::commit`]) holds the write side for
/// its whole delete and insert, so a reader sees either the old generation
/// or the new one.
#[derive(Debug, Default)]
pub struct SymbolRepository {
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    next_sequence: u64,
    sequence_of: HashMap<String, u64>,
    /// Keyed by store sequence, so iteration is oldest first.
    symbols: BTreeMap<u64, SymbolDescription>,
    by_uri: HashMap<Url, HashSet<String>>,
}

impl Inner {
    fn insert(
        &mut self,
        symbol: SymbolDescription,
    ) {
        self.remove(&symbol.identifier);
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.sequence_of.insert(symbol.identifier.clone(), sequence);
        self.by_uri.entry(symbol.uri.clone()).or_default().insert(symbol.identifier.clone());
        self.symbols.insert(sequence, symbol);
    }

    fn remove(
        &mut self,
        identifier: &str,
    ) -> Option<SymbolDescription> {
        let sequence = self.sequence_of.remove(identifier)?;
        let symbol = self.symbols.remove(&sequence)?;
        if let Some(ids) = self.by_uri.get_mut(&symbol.uri) {
            ids.remove(identifier);
            if ids.is_empty() {
                self.by_uri.remove(&symbol.uri);
            }
        }
        Some(symbol)
    }

    fn remove_file(
        &mut self,
        uri: &Url,
    ) -> usize {
        let Some(ids) = self.by_uri.remove(uri) else {
            return 0;
        };
        let mut removed = 0;
        for id in ids {
            if let Some(sequence) = self.sequence_of.remove(&id) {
                self.symbols.remove(&sequence);
                removed += 1;
            }
        }
        removed
    }
}

/// Counts reported by a committed batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchSummary {
    pub removed: usize,
    pub inserted: usize,
}

impl SymbolRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert or overwrite by identifier. An overwrite counts as the most
    /// recent store for tie-breaking.
    pub fn store(
        &self,
        symbol: SymbolDescription,
    ) {
        self.write().insert(symbol);
    }

    /// Remove one symbol. Unknown identifiers are ignored.
    pub fn delete(
        &self,
        identifier: &str,
    ) {
        self.write().remove(identifier);
    }

    /// Remove every symbol owned by `uri`, returning how many were removed.
    pub fn delete_file(
        &self,
        uri: &Url,
    ) -> usize {
        let removed = self.write().remove_file(uri);
        if removed > 0 {
            debug!("[repository] removed {removed} symbols for {uri}");
        }
        removed
    }

    pub fn clear(&self) {
        *self.write() = Inner::default();
    }

    pub fn load(
        &self,
        identifier: &str,
    ) -> Option<SymbolDescription> {
        let inner = self.read();
        let sequence = inner.sequence_of.get(identifier)?;
        inner.symbols.get(sequence).cloned()
    }

    /// Every symbol matching `predicate`, in store order.
    pub fn load_all<F>(
        &self,
        mut predicate: F,
    ) -> Vec<SymbolDescription>
    where
        F: FnMut(&SymbolDescription) -> bool,
    {
        self.read().symbols.values().filter(|symbol| predicate(symbol)).cloned().collect()
    }

    /// Visit every symbol in store order without cloning.
    ///
    /// The read lock is held for the whole visit; `visit` must not call back
    /// into the repository's mutating methods.
    pub fn scan<F>(
        &self,
        mut visit: F,
    ) where
        F: FnMut(&SymbolDescription),
    {
        for symbol in self.read().symbols.values() {
            visit(symbol);
        }
    }

    pub fn symbols_in(
        &self,
        uri: &Url,
    ) -> Vec<SymbolDescription> {
        let inner = self.read();
        let Some(ids) = inner.by_uri.get(uri) else {
            return Vec::new();
        };
        let mut sequences: Vec<u64> = ids.iter().filter_map(|id| inner.sequence_of.get(id).copied()).collect();
        sequences.sort_unstable();
        sequences.into_iter().filter_map(|sequence| inner.symbols.get(&sequence).cloned()).collect()
    }

    /// The narrowest symbol in `uri` containing `point`.
    pub fn find_by_position(
        &self,
        uri: &Url,
        point: Point,
    ) -> Option<SymbolDescription> {
        self.search_by_position(uri, point).into_iter().next()
    }

    /// Every symbol in `uri` containing `point`, narrowest first.
    ///
    /// Width is [`Span::size`](crate::text_pos::Span::size); equal widths
    /// put the most recently stored symbol first.
    pub fn search_by_position(
        &self,
        uri: &Url,
        point: Point,
    ) -> Vec<SymbolDescription> {
        let inner = self.read();
        let Some(ids) = inner.by_uri.get(uri) else {
            return Vec::new();
        };

        let mut hits: Vec<(i64, Reverse<u64>, &SymbolDescription)> = ids
            .iter()
            .filter_map(|id| {
                let sequence = *inner.sequence_of.get(id)?;
                let symbol = inner.symbols.get(&sequence)?;
                let range = symbol.range?;
                range.contains_point(point).then_some((range.size(), Reverse(sequence), symbol))
            })
            .collect();
        hits.sort_unstable_by_key(|(size, sequence, _)| (*size, *sequence));
        hits.into_iter().map(|(_, _, symbol)| symbol.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.read().symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().symbols.is_empty()
    }

    /// Files with at least one symbol.
    pub fn file_uris(&self) -> Vec<Url> {
        self.read().by_uri.keys().cloned().collect()
    }

    /// Number of files with at least one symbol.
    pub fn file_count(&self) -> usize {
        self.read().by_uri.len()
    }

    /// Start replacing `uri`'s symbols. Nothing changes until
    /// [`SymbolBatch::commit`]; dropping the batch discards it.
    pub fn begin_batch(
        &self,
        uri: Url,
    ) -> SymbolBatch<'_> {
        SymbolBatch {
            repository: self,
            uri,
            symbols: Vec::new(),
        }
    }
}

/// A pending replacement of one file's symbols.
#[must_use = "a batch does nothing until committed"]
pub struct SymbolBatch<'r> {
    repository: &'r SymbolRepository,
    uri: Url,
    symbols: Vec<SymbolDescription>,
}

impl SymbolBatch<'_> {
    pub fn uri(&self) -> &Url {
        &self.uri
    }

    /// Queue a symbol. Symbols owned by another uri are rejected.
    pub fn add(
        &mut self,
        symbol: SymbolDescription,
    ) -> bool {
        if symbol.uri != self.uri {
            warn!(
                "[repository] batch for {} rejected symbol {} owned by {}",
                self.uri, symbol.identifier, symbol.uri
            );
            return false;
        }
        self.symbols.push(symbol);
        true
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Delete the file's previous generation and insert this one under a
    /// single write lock.
    pub fn commit(self) -> BatchSummary {
        let Self {
            repository,
            uri,
            symbols,
        } = self;
        let inserted = symbols.len();

        let mut inner = repository.write();
        let removed = inner.remove_file(&uri);
        for symbol in symbols {
            inner.insert(symbol);
        }
        drop(inner);

        debug!("[repository] committed {uri}: -{removed} +{inserted}");
        BatchSummary {
            removed,
            inserted,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/src/symbols/repository_tests.rs"]
mod tests;
