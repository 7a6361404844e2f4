use tower_lsp::lsp_types::SymbolKind;

use super::*;
use crate::symbols::types::URI_FIELD;
use crate::syntax::PositionIdProvider;
use crate::test_support::{TestNode, span, uri};
use crate::text_pos::Point;

fn sample_tree() -> TestNode {
    TestNode::new("Program", Some(span(1, 0, 3, 9)))
        .child(TestNode::new("Def", Some(span(1, 0, 1, 9))).named("alpha"))
        .child(TestNode::new("Def", Some(span(2, 0, 2, 9))).named("alpha"))
        .child(TestNode::new("Use", Some(span(3, 0, 3, 9))).refers("target", "alpha", Some(span(3, 4, 3, 9))))
}

#[test]
fn one_symbol_per_positioned_node_in_pre_order() {
    let file = uri("a.mini");
    let symbols = extract_symbols(&file, &sample_tree(), &PositionIdProvider, false);

    let types: Vec<&str> = symbols.iter().filter_map(|symbol| symbol.node_type()).collect();
    assert_eq!(types, vec!["Program", "Def", "Def", "Use"]);
    assert_eq!(symbols[1].identifier, format!("{file}:1:0:1:9"));
    assert!(symbols.iter().all(|symbol| symbol.uri == file));
}

#[test]
fn unpositioned_nodes_are_skipped_but_their_children_are_not() {
    let tree = TestNode::new("Program", None)
        .child(TestNode::new("Synthetic", None).child(TestNode::new("Def", Some(span(1, 0, 1, 5))).named("x")));
    let symbols = extract_symbols(&uri("a.mini"), &tree, &PositionIdProvider, false);
    assert_eq!(symbols.len(), 1);
    assert_eq!(symbols[0].name(), Some("x"));
}

#[test]
fn fields_hold_uri_name_type_then_references() {
    let file = uri("a.mini");
    let symbols = extract_symbols(&file, &sample_tree(), &PositionIdProvider, true);
    let user = &symbols[3];

    let keys: Vec<&str> = user.fields.keys().map(String::as_str).collect();
    assert_eq!(keys, vec![URI_FIELD, NAME_FIELD, TYPE_FIELD, "target"]);
    assert_eq!(user.fields[URI_FIELD].as_text(), Some(file.as_str()));
    // Unnamed nodes carry their identifier as name.
    assert_eq!(user.name(), Some(user.identifier.as_str()));
}

#[test]
fn name_resolution_picks_the_last_declaration() {
    let file = uri("a.mini");
    let symbols = extract_symbols(&file, &sample_tree(), &PositionIdProvider, true);
    let (_, reference) = symbols[3].references().next().expect("one reference");

    assert_eq!(reference.target_identifier.as_deref(), Some(symbols[2].identifier.as_str()));
    assert_eq!(reference.name.as_deref(), Some("alpha"));
    assert_eq!(reference.occurrence_range, Some(span(3, 4, 3, 9)));
}

#[test]
fn without_name_resolution_references_stay_unresolved() {
    let symbols = extract_symbols(&uri("a.mini"), &sample_tree(), &PositionIdProvider, false);
    let (_, reference) = symbols[3].references().next().expect("one reference");
    assert_eq!(reference.target_identifier, None);
}

#[test]
fn explicit_identifiers_pass_through() {
    let tree = TestNode::new("Use", Some(span(1, 0, 1, 20))).refers_to_id(
        "target",
        "beta",
        Some(span(1, 4, 1, 8)),
        "file:///workspace/b.mini:1:0:1:8",
    );
    let symbols = extract_symbols(&uri("a.mini"), &tree, &PositionIdProvider, true);
    let (_, reference) = symbols[0].references().next().expect("one reference");
    assert_eq!(reference.target_identifier.as_deref(), Some("file:///workspace/b.mini:1:0:1:8"));
}

struct Pair {
    decl: TestNode,
    usage: TestNode,
}

impl SyntaxNode for Pair {
    fn node_type(&self) -> &str {
        "Pair"
    }

    fn span(&self) -> Option<Span> {
        Some(span(1, 0, 2, 10))
    }

    fn children(&self) -> Vec<&dyn SyntaxNode> {
        vec![&self.decl, &self.usage]
    }

    fn references(&self) -> Vec<NamedReference<'_>> {
        vec![NamedReference::new("first", Some("decl"), Some(span(2, 0, 2, 4))).resolved_to(ReferenceTarget::Node(&self.decl))]
    }
}

#[test]
fn node_targets_resolve_through_identity() {
    let pair = Pair {
        decl: TestNode::new("Def", Some(span(1, 0, 1, 4))).named("decl"),
        usage: TestNode::new("Use", Some(span(2, 0, 2, 4))),
    };
    let symbols = extract_symbols(&uri("a.mini"), &pair, &PositionIdProvider, false);
    let (_, reference) = symbols[0].references().next().expect("one reference");
    assert_eq!(reference.target_identifier.as_deref(), Some(symbols[1].identifier.as_str()));
}

#[test]
fn occurrences_outside_the_owner_are_dropped() {
    let tree = TestNode::new("Use", Some(span(2, 0, 2, 9))).refers("target", "alpha", Some(span(5, 0, 5, 5)));
    let symbols = extract_symbols(&uri("a.mini"), &tree, &PositionIdProvider, false);
    let (_, reference) = symbols[0].references().next().expect("reference kept");
    assert_eq!(reference.occurrence_range, None);
    assert!(symbols[0].reference_at(Point::new(5, 2)).is_none());
}

#[test]
fn repeated_reference_fields_get_numbered_keys() {
    let tree = TestNode::new("Call", Some(span(1, 0, 1, 20)))
        .refers("arg", "a", Some(span(1, 5, 1, 6)))
        .refers("arg", "b", Some(span(1, 8, 1, 9)));
    let symbols = extract_symbols(&uri("a.mini"), &tree, &PositionIdProvider, false);
    let fields: Vec<&str> = symbols[0].references().map(|(field, _)| field).collect();
    assert_eq!(fields, vec!["arg", "arg.1"]);
    assert_eq!(symbols[0].reference_at(Point::new(1, 8)).and_then(|r| r.name.as_deref()), Some("b"));
}

#[test]
fn colliding_identifiers_get_ordinal_suffix() {
    let tree = TestNode::new("Wrapper", Some(span(1, 0, 1, 5))).child(TestNode::new("Def", Some(span(1, 0, 1, 5))));
    let file = uri("a.mini");
    let symbols = extract_symbols(&file, &tree, &PositionIdProvider, false);
    assert_eq!(symbols[0].identifier, format!("{file}:1:0:1:5"));
    assert_eq!(symbols[1].identifier, format!("{file}:1:0:1:5#1"));
}

#[test]
fn extraction_is_deterministic() {
    let file = uri("a.mini");
    let tree = sample_tree();
    let first = extract_symbols(&file, &tree, &PositionIdProvider, true);
    let second = extract_symbols(&file, &sample_tree(), &PositionIdProvider, true);
    assert_eq!(first, second);
}

#[test]
fn outline_nests_named_nodes_through_unnamed_ones() {
    let tree = TestNode::new("Program", Some(span(1, 0, 6, 1))).child(
        TestNode::new("Group", Some(span(1, 0, 6, 1)))
            .named("shapes")
            .kind(SymbolKind::NAMESPACE)
            .child(
                TestNode::new("Block", Some(span(2, 2, 5, 3)))
                    .child(TestNode::new("Def", Some(span(3, 4, 3, 14))).named("circle").kind(SymbolKind::FUNCTION))
                    .child(TestNode::new("Use", Some(span(4, 4, 4, 14)))),
            ),
    );

    let outline = build_outline(&tree);
    assert_eq!(outline.len(), 1);
    let group = &outline[0];
    assert_eq!(group.name, "shapes");
    assert_eq!(group.kind, SymbolKind::NAMESPACE);
    assert_eq!(group.detail.as_deref(), Some("Group"));
    assert_eq!(group.range.start.line, 0);

    let children = group.children.as_ref().expect("nested def");
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].name, "circle");
    assert_eq!(children[0].kind, SymbolKind::FUNCTION);
    assert!(children[0].children.is_none());
}
