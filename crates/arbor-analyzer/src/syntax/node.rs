use tower_lsp::lsp_types::SymbolKind;

use crate::text_pos::{Point, Span};

/// A parsed tree node as seen by the index.
///
/// Adapters implement this for their own AST types. Every capability the
/// index needs is a method here: there is no runtime inspection of node
/// fields, so reference slots must be declared through [`references`].
///
/// [`references`]: SyntaxNode::references
pub trait SyntaxNode: Send + Sync {
    /// Grammar-level type name, e.g. `"FunctionDecl"`.
    fn node_type(&self) -> &str;

    /// Source range, or `None` for synthetic nodes.
    fn span(&self) -> Option<Span>;

    fn children(&self) -> Vec<&dyn SyntaxNode>;

    /// Declared name, for nodes that introduce one.
    fn name(&self) -> Option<&str> {
        None
    }

    /// Outgoing named references held by this node.
    fn references(&self) -> Vec<NamedReference<'_>> {
        Vec::new()
    }

    /// Kind reported in the document outline.
    fn symbol_kind(&self) -> SymbolKind {
        SymbolKind::VARIABLE
    }
}

/// One named-reference slot on a node.
#[derive(Clone)]
pub struct NamedReference<'a> {
    /// Slot name; becomes the field key on the indexed symbol.
    pub field: &'a str,
    /// Name as written at the use site.
    pub name: Option<&'a str>,
    /// Range of the reference token itself.
    pub span: Option<Span>,
    pub target: Option<ReferenceTarget<'a>>,
}

impl<'a> NamedReference<'a> {
    pub fn new(
        field: &'a str,
        name: Option<&'a str>,
        span: Option<Span>,
    ) -> Self {
        Self {
            field,
            name,
            span,
            target: None,
        }
    }

    pub fn resolved_to(
        mut self,
        target: ReferenceTarget<'a>,
    ) -> Self {
        self.target = Some(target);
        self
    }
}

/// Where a resolved reference points.
#[derive(Clone)]
pub enum ReferenceTarget<'a> {
    /// A node in the same tree.
    Node(&'a dyn SyntaxNode),
    /// An identifier the adapter computed itself, possibly in another file.
    Identifier(String),
}

/// Identity comparison: both arguments are the same node object.
pub fn same_node(
    a: &dyn SyntaxNode,
    b: &dyn SyntaxNode,
) -> bool {
    std::ptr::addr_eq(std::ptr::from_ref(a), std::ptr::from_ref(b))
}

pub(crate) fn node_address(node: &dyn SyntaxNode) -> usize {
    std::ptr::from_ref(node).cast::<()>() as usize
}

/// Pre-order traversal of `root` and all of its descendants.
pub fn walk(root: &dyn SyntaxNode) -> Vec<&dyn SyntaxNode> {
    let mut out = Vec::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        out.push(node);
        let mut children = node.children();
        children.reverse();
        stack.extend(children);
    }
    out
}

/// Deepest node whose span contains `point`.
///
/// Nodes without a span are transparent: their children are still searched.
pub fn find_by_position(
    root: &dyn SyntaxNode,
    point: Point,
) -> Option<&dyn SyntaxNode> {
    match root.span() {
        Some(span) if !span.contains_point(point) => None,
        Some(_) => descend(root, point).or(Some(root)),
        None => descend(root, point),
    }
}

fn descend(
    node: &dyn SyntaxNode,
    point: Point,
) -> Option<&dyn SyntaxNode> {
    node.children().into_iter().find_map(|child| find_by_position(child, point))
}

/// Deepest node whose span contains all of `span`.
pub fn find_by_span(
    root: &dyn SyntaxNode,
    span: Span,
) -> Option<&dyn SyntaxNode> {
    match root.span() {
        Some(own) if !own.contains_span(&span) => None,
        Some(_) => root.children().into_iter().find_map(|child| find_by_span(child, span)).or(Some(root)),
        None => root.children().into_iter().find_map(|child| find_by_span(child, span)),
    }
}
