//! Table-driven tree-sitter walker shared by every front end.

use std::collections::BTreeMap;
use std::path::Path;

use tree_sitter::{Node, Parser};

use super::{
    BodyFingerprint, CodeUnit, DocPlacement, Language, LanguageFrontend, Span, UnitId, UnitKind,
    UnitTree,
};
use crate::comments::CommentSyntax;
use crate::error::{EngineError, EngineResult};
use crate::text;

/// Return annotations that mean "returns nothing".
const VOID_RETURNS: &[&str] = &["None", "void", "()", "Unit", "never"];

/// Separator between body tokens before hashing.
const TOKEN_SEPARATOR: &str = "\u{1f}";

/// Node kinds and field names that drive extraction for one grammar.
#[derive(Debug)]
pub struct GrammarSpec {
    /// Declarations that are methods when nested in a method container.
    pub function_kinds: &'static [&'static str],
    /// Declarations that are always methods.
    pub method_kinds: &'static [&'static str],
    /// Function expressions, units only when bound by a declarator.
    pub anonymous_function_kinds: &'static [&'static str],
    /// Nodes binding a name to an anonymous function (`name`/`value` fields).
    pub declarator_kinds: &'static [&'static str],
    /// Declaration statements or groups, adopted as the unit's span when
    /// they hold just one member of the unit's kind.
    pub declaration_kinds: &'static [&'static str],
    pub class_kinds: &'static [&'static str],
    pub method_containers: &'static [&'static str],
    /// Statements materialized as complex block candidates.
    pub block_kinds: &'static [&'static str],
    pub branch_kinds: &'static [&'static str],
    /// Short-circuit operator tokens counted as branch points.
    pub logical_operators: &'static [&'static str],
    pub logical_parents: &'static [&'static str],
    pub comment_kinds: &'static [&'static str],
    /// Parents that belong to the declaration they wrap (decorators, export).
    pub wrapper_kinds: &'static [&'static str],
    /// Preceding siblings that belong to the next declaration.
    pub attribute_kinds: &'static [&'static str],
    /// Literals hashed as a single token.
    pub string_kinds: &'static [&'static str],
    pub identifier_kinds: &'static [&'static str],
    pub parameter_fields: &'static [&'static str],
    pub return_fields: &'static [&'static str],
    pub void_kinds: &'static [&'static str],
    pub body_fields: &'static [&'static str],
    /// Body nodes whose named children are statements or members.
    pub body_container_kinds: &'static [&'static str],
    pub receivers: &'static [&'static str],
    /// A string literal opening a body is documentation, not code.
    pub docstring_in_body: bool,
}

impl GrammarSpec {
    fn is(&self, list: &[&str], node: Node) -> bool {
        node.is_named() && list.contains(&node.kind())
    }

    fn is_function_like(&self, node: Node) -> bool {
        self.is(self.function_kinds, node)
            || self.is(self.method_kinds, node)
            || self.is(self.anonymous_function_kinds, node)
    }
}

/// A [`LanguageFrontend`] backed by a tree-sitter grammar and a
/// [`GrammarSpec`].
pub struct TreeSitterFrontend {
    language: Language,
    extensions: &'static [&'static str],
    grammar: tree_sitter::Language,
    /// Alternate grammars selected by file extension (e.g. TSX).
    dialects: Vec<(&'static str, tree_sitter::Language)>,
    spec: &'static GrammarSpec,
    syntax: &'static CommentSyntax,
    placement: DocPlacement,
}

impl TreeSitterFrontend {
    pub fn new(
        language: Language,
        extensions: &'static [&'static str],
        grammar: tree_sitter::Language,
        spec: &'static GrammarSpec,
        syntax: &'static CommentSyntax,
        placement: DocPlacement,
    ) -> Self {
        Self {
            language,
            extensions,
            grammar,
            dialects: Vec::new(),
            spec,
            syntax,
            placement,
        }
    }

    pub fn with_dialect(mut self, extension: &'static str, grammar: tree_sitter::Language) -> Self {
        self.dialects.push((extension, grammar));
        self
    }

    fn grammar_for(&self, path: &str) -> &tree_sitter::Language {
        let ext = Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");
        self.dialects
            .iter()
            .find(|(e, _)| *e == ext)
            .map(|(_, g)| g)
            .unwrap_or(&self.grammar)
    }
}

impl LanguageFrontend for TreeSitterFrontend {
    fn language(&self) -> Language {
        self.language
    }

    fn extensions(&self) -> &'static [&'static str] {
        self.extensions
    }

    fn comment_syntax(&self) -> &'static CommentSyntax {
        self.syntax
    }

    fn doc_placement(&self) -> DocPlacement {
        self.placement
    }

    fn extract(&self, path: &str, source: &str) -> EngineResult<UnitTree> {
        let mut parser = Parser::new();
        parser
            .set_language(self.grammar_for(path))
            .map_err(|e| EngineError::parse(path, format!("failed to load grammar: {}", e)))?;
        let tree = parser
            .parse(source, None)
            .ok_or_else(|| EngineError::parse(path, "parser produced no tree"))?;

        let root = tree.root_node();
        if root.has_error() {
            return Err(first_error(path, root));
        }

        let mut walker = Walker {
            spec: self.spec,
            source: source.as_bytes(),
            tree: UnitTree::new(),
        };
        walker.visit(root, None);
        Ok(walker.tree)
    }
}

/// Parse error positioned at the first ERROR or MISSING node in document
/// order.
fn first_error(path: &str, root: Node) -> EngineError {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            let pos = node.start_position();
            let message = if node.is_missing() {
                format!("missing `{}`", node.kind())
            } else {
                "unexpected syntax".to_string()
            };
            return EngineError::Parse {
                path: path.to_string(),
                line: pos.row + 1,
                column: pos.column + 1,
                message,
            };
        }
        for i in (0..node.child_count()).rev() {
            if let Some(child) = node.child(i) {
                stack.push(child);
            }
        }
    }
    EngineError::parse(path, "syntax error")
}

struct Walker<'a> {
    spec: &'static GrammarSpec,
    source: &'a [u8],
    tree: UnitTree,
}

impl<'a> Walker<'a> {
    fn visit(&mut self, node: Node, current: Option<UnitId>) {
        let spec = self.spec;
        if spec.is(spec.comment_kinds, node) {
            return;
        }

        let mut scope = current;
        if let Some(kind) = self.classify(node) {
            let id = self.register(node, kind, current);
            if kind == UnitKind::ComplexBlock && spec.is(spec.branch_kinds, node) {
                self.tree.units[id.0].branch_points += 1;
            }
            scope = Some(id);
        } else if self.is_branch_point(node) {
            if let Some(id) = current {
                self.tree.units[id.0].branch_points += 1;
            }
        }

        for i in 0..node.child_count() {
            if let Some(child) = node.child(i) {
                self.visit(child, scope);
            }
        }
    }

    fn is_branch_point(&self, node: Node) -> bool {
        let spec = self.spec;
        if spec.is(spec.branch_kinds, node) {
            return true;
        }
        !node.is_named()
            && spec.logical_operators.contains(&node.kind())
            && node
                .parent()
                .is_some_and(|p| spec.logical_parents.contains(&p.kind()))
    }

    fn classify(&self, node: Node) -> Option<UnitKind> {
        let spec = self.spec;
        if spec.is(spec.method_kinds, node) {
            Some(UnitKind::Method)
        } else if spec.is(spec.function_kinds, node) {
            Some(self.function_or_method(node))
        } else if spec.is(spec.anonymous_function_kinds, node) {
            self.binding_declarator(node)
                .map(|_| self.function_or_method(node))
        } else if spec.is(spec.class_kinds, node) {
            Some(UnitKind::Class)
        } else if spec.is(spec.block_kinds, node) {
            Some(UnitKind::ComplexBlock)
        } else {
            None
        }
    }

    /// A function is a method when its nearest enclosing function-or-container
    /// ancestor is a method container.
    fn function_or_method(&self, node: Node) -> UnitKind {
        let spec = self.spec;
        let mut ancestor = node.parent();
        while let Some(p) = ancestor {
            if spec.is_function_like(p) {
                return UnitKind::Function;
            }
            if spec.is(spec.method_containers, p) {
                return UnitKind::Method;
            }
            ancestor = p.parent();
        }
        UnitKind::Function
    }

    fn binding_declarator<'t>(&self, node: Node<'t>) -> Option<Node<'t>> {
        let parent = node.parent()?;
        if !self.spec.is(self.spec.declarator_kinds, parent) {
            return None;
        }
        let value = parent.child_by_field_name("value")?;
        (value.id() == node.id()).then_some(parent)
    }

    fn text(&self, node: Node) -> &'a str {
        node.utf8_text(self.source).unwrap_or("")
    }

    fn register(&mut self, node: Node, kind: UnitKind, parent: Option<UnitId>) -> UnitId {
        let id = UnitId(self.tree.units.len());
        let spec = self.spec;

        let (identifier, span) = if kind == UnitKind::ComplexBlock {
            (String::new(), Span::from_node(node))
        } else {
            (self.name_of(node), self.declaration_span(node))
        };

        let body = if kind == UnitKind::ComplexBlock {
            None
        } else {
            spec.body_fields
                .iter()
                .find_map(|f| node.child_by_field_name(f))
        };
        let statements = body.map(|b| self.body_statements(b)).unwrap_or_default();
        let docstring = if spec.docstring_in_body {
            statements.first().copied().filter(|s| self.is_docstring(*s))
        } else {
            None
        };

        let body_first_line = statements.first().map(|s| s.start_position().row + 1);
        let docstring_line = docstring.map(|d| d.start_position().row + 1);
        let code_statements: Vec<Node> = statements
            .iter()
            .copied()
            .filter(|s| docstring.map_or(true, |d| d.id() != s.id()))
            .collect();
        let sole_statement = match code_statements.as_slice() {
            [only] => Some((only.start_byte(), only.end_byte())),
            _ => None,
        };

        let (signature_text, parameters, has_return) = match kind {
            UnitKind::Function | UnitKind::Method => self.signature(node),
            UnitKind::ComplexBlock => (
                node.child_by_field_name("condition")
                    .map(|c| self.leaf_text(c))
                    .unwrap_or_default(),
                Vec::new(),
                false,
            ),
            UnitKind::Class => (String::new(), Vec::new(), false),
        };

        let body_fingerprint = self.fingerprint(body.unwrap_or(node), docstring);

        self.tree.units.push(CodeUnit {
            id,
            kind,
            identifier,
            span,
            signature_text,
            parameters,
            has_return,
            body_fingerprint,
            body_first_line,
            docstring_line,
            sole_statement,
            branch_points: 0,
            complexity: 1,
            candidate: kind == UnitKind::ComplexBlock,
            parent,
            children: Vec::new(),
        });
        match parent {
            Some(p) => self.tree.units[p.0].children.push(id),
            None => self.tree.roots.push(id),
        }
        id
    }

    fn name_of(&self, node: Node) -> String {
        let named = node
            .child_by_field_name("name")
            .or_else(|| {
                self.binding_declarator(node)
                    .and_then(|d| d.child_by_field_name("name"))
            })
            .map(|n| self.text(n).to_string());
        named.unwrap_or_else(|| "<anonymous>".to_string())
    }

    /// Span of a declaration including its wrappers and leading attributes.
    fn declaration_span(&self, node: Node) -> Span {
        let spec = self.spec;
        let mut outer = self.binding_declarator(node).unwrap_or(node);
        if let Some(group) = outer.parent() {
            let members = (0..group.named_child_count())
                .filter_map(|i| group.named_child(i))
                .filter(|c| c.kind() == outer.kind())
                .count();
            if spec.is(spec.declaration_kinds, group) && members == 1 {
                outer = group;
            }
        }
        while let Some(parent) = outer.parent() {
            if !spec.is(spec.wrapper_kinds, parent) {
                break;
            }
            outer = parent;
        }

        let mut span = Span::from_node(outer);
        let mut previous = outer.prev_named_sibling();
        while let Some(sibling) = previous {
            if !spec.is(spec.attribute_kinds, sibling) {
                break;
            }
            span = span.extend_from(&Span::from_node(sibling));
            previous = sibling.prev_named_sibling();
        }
        span
    }

    /// Statements (or members) of a body, comments excluded.
    fn body_statements<'t>(&self, body: Node<'t>) -> Vec<Node<'t>> {
        let spec = self.spec;
        if !spec.is(spec.body_container_kinds, body) {
            return vec![body];
        }
        let statements: Vec<Node<'t>> = (0..body.named_child_count())
            .filter_map(|i| body.named_child(i))
            .filter(|c| !spec.is(spec.comment_kinds, *c))
            .collect();
        match statements.as_slice() {
            [only] if spec.is(spec.body_container_kinds, *only) => self.body_statements(*only),
            _ => statements,
        }
    }

    fn is_docstring(&self, statement: Node) -> bool {
        statement.kind() == "expression_statement"
            && statement.named_child_count() == 1
            && statement
                .named_child(0)
                .is_some_and(|c| self.spec.is(self.spec.string_kinds, c))
    }

    fn signature(&self, node: Node) -> (String, Vec<String>, bool) {
        let spec = self.spec;
        let mut signature = String::new();
        let mut parameters = Vec::new();

        if let Some(params) = spec
            .parameter_fields
            .iter()
            .find_map(|f| node.child_by_field_name(f))
        {
            signature.push_str(&self.leaf_text(params));
            if spec.is(spec.identifier_kinds, params) {
                parameters.push(self.text(params).to_string());
            } else {
                for i in 0..params.named_child_count() {
                    if let Some(param) = params.named_child(i) {
                        if !spec.is(spec.comment_kinds, param) {
                            parameters.extend(self.parameter_names(param));
                        }
                    }
                }
            }
        }

        let mut has_return = false;
        if let Some(ret) = spec
            .return_fields
            .iter()
            .find_map(|f| node.child_by_field_name(f))
        {
            let annotation = self.leaf_text(ret);
            let bare = annotation.trim_start_matches(':').to_string();
            has_return = !spec.void_kinds.contains(&ret.kind()) && !VOID_RETURNS.contains(&bare.as_str());
            signature = format!("{}->{}", signature, bare);
        }

        parameters.retain(|p| !spec.receivers.contains(&p.as_str()));
        (signature, parameters, has_return)
    }

    /// Names bound by one parameter node.
    fn parameter_names(&self, param: Node) -> Vec<String> {
        let spec = self.spec;
        if spec.is(spec.identifier_kinds, param) {
            return vec![self.text(param).to_string()];
        }

        let mut cursor = param.walk();
        let names: Vec<String> = param
            .children_by_field_name("name", &mut cursor)
            .filter(|n| spec.is(spec.identifier_kinds, *n))
            .map(|n| self.text(n).to_string())
            .collect();
        if !names.is_empty() {
            return names;
        }

        let found = ["pattern", "left"]
            .iter()
            .find_map(|f| param.child_by_field_name(f))
            .and_then(|p| self.first_identifier(p))
            .or_else(|| {
                (0..param.named_child_count())
                    .filter_map(|i| param.named_child(i))
                    .find(|c| spec.is(spec.identifier_kinds, *c))
            })
            .or_else(|| self.first_identifier(param));
        found.map(|n| vec![self.text(n).to_string()]).unwrap_or_default()
    }

    fn first_identifier<'t>(&self, node: Node<'t>) -> Option<Node<'t>> {
        if self.spec.is(self.spec.identifier_kinds, node) {
            return Some(node);
        }
        (0..node.named_child_count())
            .filter_map(|i| node.named_child(i))
            .find_map(|c| self.first_identifier(c))
    }

    /// Leaf texts of a node, comments removed, whitespace canonicalized.
    fn leaf_text(&self, node: Node) -> String {
        let mut leaves = Vec::new();
        self.collect_leaves(node, None, &mut leaves);
        text::canonical_whitespace(&leaves.join(" "))
    }

    fn collect_leaves(&self, node: Node, skip: Option<Node>, out: &mut Vec<&'a str>) {
        let spec = self.spec;
        if spec.is(spec.comment_kinds, node) || skip.is_some_and(|s| s.id() == node.id()) {
            return;
        }
        if node.child_count() == 0 || spec.is(spec.string_kinds, node) {
            let text = self.text(node);
            if !text.is_empty() {
                out.push(text);
            }
            return;
        }
        for i in 0..node.child_count() {
            if let Some(child) = node.child(i) {
                self.collect_leaves(child, skip, out);
            }
        }
    }

    fn fingerprint(&self, node: Node, docstring: Option<Node>) -> BodyFingerprint {
        let mut leaves = Vec::new();
        self.collect_leaves(node, docstring, &mut leaves);
        let mut tokens = BTreeMap::new();
        for leaf in &leaves {
            text::add_token_words(&mut tokens, leaf);
        }
        BodyFingerprint {
            digest: text::sha256_hex(&leaves.join(TOKEN_SEPARATOR)),
            tokens,
        }
    }
}
