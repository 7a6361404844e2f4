use super::*;
use crate::completion::{Token, TokenKind, Tokenizer};
use crate::syntax::ParseResult;
use crate::test_support::{span, uri};

fn state(
    file: &Url,
    text: &str,
    version: Option<i32>,
) -> Arc<FileState> {
    Arc::new(FileState::new(file.clone(), text.into(), version, ParseResult::default()))
}

#[test]
fn replace_and_get() {
    let store = FileStore::new();
    let file = uri("a.mini");
    store.replace(state(&file, "def a", Some(1)));
    store.replace(state(&file, "def b", Some(2)));

    let current = store.get(&file).expect("tracked file");
    assert_eq!(&*current.text, "def b");
    assert_eq!(current.version, Some(2));
    assert_eq!(store.len(), 1);
    assert!(store.contains(&file));
}

#[test]
fn snapshot_survives_replacement() {
    let store = FileStore::new();
    let file = uri("a.mini");
    store.replace(state(&file, "old", Some(1)));
    let snapshot = store.get(&file).expect("tracked file");
    store.replace(state(&file, "new", Some(2)));
    assert_eq!(&*snapshot.text, "old");
}

#[test]
fn open_tracking() {
    let store = FileStore::new();
    let file = uri("a.mini");
    assert!(!store.is_open(&file));
    store.mark_open(&file);
    assert!(store.is_open(&file));
    store.mark_closed(&file);
    assert!(!store.is_open(&file));

    store.mark_open(&file);
    store.replace(state(&file, "x", None));
    assert!(store.remove(&file).is_some());
    assert!(!store.is_open(&file));
    assert!(store.is_empty());
}

#[test]
fn clear_drops_everything() {
    let store = FileStore::new();
    store.replace(state(&uri("a.mini"), "a", None));
    store.replace(state(&uri("b.mini"), "b", None));
    store.mark_open(&uri("a.mini"));

    let mut uris = store.uris();
    uris.sort();
    assert_eq!(uris, vec![uri("a.mini"), uri("b.mini")]);

    store.clear();
    assert!(store.is_empty());
    assert!(!store.is_open(&uri("a.mini")));
}

struct CountingTokenizer(std::sync::atomic::AtomicUsize);

impl Tokenizer for CountingTokenizer {
    fn tokenize(
        &self,
        _text: &str,
    ) -> Vec<Token> {
        self.0.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        vec![Token {
            index: 0,
            kind: TokenKind(1),
            text: "x".to_owned(),
            span: span(1, 0, 1, 1),
        }]
    }
}

#[test]
fn tokens_materialize_once() {
    let tokenizer = CountingTokenizer(Default::default());
    let file = state(&uri("a.mini"), "x", None);
    assert!(!file.tokens_materialized());

    assert_eq!(file.tokens(&tokenizer).len(), 1);
    assert_eq!(file.tokens(&tokenizer).len(), 1);
    assert!(file.tokens_materialized());
    assert_eq!(tokenizer.0.load(std::sync::atomic::Ordering::SeqCst), 1);
}
