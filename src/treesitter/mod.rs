//! Tree-sitter Python parsing and single-buffer name resolution.
//!
//! Everything here works on one parse of one unsaved buffer. There is no
//! index and no import following: a name resolves to whatever binds it in
//! the enclosing scopes of that buffer.

pub mod builtins;
pub mod engine;

pub use engine::PythonEngine;

use tree_sitter::{Node, Parser, Tree};

use crate::lsp::EngineError;

/// Parse Python source. A fresh parser per call keeps the engine `Sync`.
pub fn parse(source: &str) -> Result<Tree, EngineError> {
    let mut parser = Parser::new();
    let language: tree_sitter::Language = tree_sitter_python::LANGUAGE.into();
    parser
        .set_language(&language)
        .map_err(|e| EngineError::Setup(e.to_string()))?;
    parser
        .parse(source, None)
        .ok_or_else(|| EngineError::Parse("parser returned no tree".into()))
}

/// Source text of a node. Empty on invalid UTF-8 boundaries.
pub fn node_text<'s>(node: Node<'_>, source: &'s str) -> &'s str {
    node.utf8_text(source.as_bytes()).unwrap_or("")
}

pub fn named_children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

fn field_children<'t>(node: Node<'t>, field: &str) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.children_by_field_name(field, &mut cursor).collect()
}

/// What introduced a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    Function,
    Class,
    /// `import a.b` binds `a`.
    Module,
    /// `from m import x` binds `x`; its real type is unknown without following the import.
    Imported,
    Param,
    Variable,
    /// `self.x = ...` inside a method.
    Attribute,
}

impl BindingKind {
    /// Engine vocabulary for the shaper's kind mapping.
    pub fn type_name(self) -> &'static str {
        match self {
            Self::Function => "function",
            Self::Class => "class",
            Self::Module => "module",
            Self::Imported | Self::Attribute => "instance",
            Self::Param => "param",
            Self::Variable => "statement",
        }
    }
}

/// A name bound somewhere in the buffer.
#[derive(Debug, Clone, Copy)]
pub struct Binding<'t> {
    pub kind: BindingKind,
    /// The identifier that introduces the name.
    pub name_node: Node<'t>,
    /// The defining construct: def/class node, assignment, parameter, import statement.
    pub def_node: Node<'t>,
}

impl<'t> Binding<'t> {
    pub fn name<'s>(&self, source: &'s str) -> &'s str {
        node_text(self.name_node, source)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Module,
    Class,
    Function,
}

/// A lexical scope.
#[derive(Debug, Clone, Copy)]
pub struct Scope<'t> {
    pub kind: ScopeKind,
    pub node: Node<'t>,
}

impl<'t> Scope<'t> {
    /// Bindings in source order. Function parameters come first.
    pub fn bindings(&self, source: &str) -> Vec<Binding<'t>> {
        let mut out = Vec::new();
        match self.kind {
            ScopeKind::Module => collect_block(self.node, source, &mut out),
            ScopeKind::Class => {
                if let Some(body) = self.node.child_by_field_name("body") {
                    collect_block(body, source, &mut out);
                }
            }
            ScopeKind::Function => {
                if let Some(params) = self.node.child_by_field_name("parameters") {
                    collect_params(params, &mut out);
                }
                if let Some(body) = self.node.child_by_field_name("body") {
                    collect_block(body, source, &mut out);
                }
            }
        }
        out
    }
}

/// Scopes enclosing byte offset `byte`, innermost first. The module is always last.
///
/// A function's scope starts at its parameter list, a class's at its body,
/// so a cursor on a definition's own name belongs to the outer scope. Range
/// ends are inclusive to cover a cursor just past the last token.
pub fn scopes_at(root: Node<'_>, byte: usize) -> Vec<Scope<'_>> {
    let mut outer_to_inner = vec![Scope {
        kind: ScopeKind::Module,
        node: root,
    }];
    descend_scopes(root, byte, &mut outer_to_inner);
    outer_to_inner.reverse();
    outer_to_inner
}

fn descend_scopes<'t>(node: Node<'t>, byte: usize, out: &mut Vec<Scope<'t>>) {
    for child in named_children(node) {
        if child.start_byte() > byte || byte > child.end_byte() {
            continue;
        }
        match child.kind() {
            "function_definition" => {
                let starts = child
                    .child_by_field_name("parameters")
                    .map(|p| p.start_byte())
                    .unwrap_or(child.end_byte());
                if byte >= starts {
                    out.push(Scope {
                        kind: ScopeKind::Function,
                        node: child,
                    });
                }
            }
            "class_definition" => {
                let starts = child
                    .child_by_field_name("body")
                    .map(|b| b.start_byte())
                    .unwrap_or(child.end_byte());
                if byte >= starts {
                    out.push(Scope {
                        kind: ScopeKind::Class,
                        node: child,
                    });
                }
            }
            _ => {}
        }
        descend_scopes(child, byte, out);
    }
}

/// Resolve `name` as seen from `scopes` (innermost first).
///
/// Class bodies are only visible when they are the innermost scope. Within
/// a scope the last binding at or before `byte` wins, else the first one.
pub fn resolve<'t>(
    scopes: &[Scope<'t>],
    name: &str,
    byte: usize,
    source: &str,
) -> Option<Binding<'t>> {
    for (i, scope) in scopes.iter().enumerate() {
        if scope.kind == ScopeKind::Class && i != 0 {
            continue;
        }
        let matches: Vec<Binding<'t>> = scope
            .bindings(source)
            .into_iter()
            .filter(|b| b.name(source) == name)
            .collect();
        let before = matches
            .iter()
            .rev()
            .find(|b| b.name_node.start_byte() <= byte)
            .or_else(|| matches.first());
        if let Some(b) = before {
            return Some(*b);
        }
    }
    None
}

/// Innermost class whose method body encloses the cursor.
pub fn enclosing_class<'t>(scopes: &[Scope<'t>]) -> Option<Node<'t>> {
    scopes
        .iter()
        .find(|s| s.kind == ScopeKind::Class)
        .map(|s| s.node)
}

/// Members visible through an instance or the class itself: methods,
/// class-level names, and `self.x` assignments in any method.
pub fn class_members<'t>(class: Node<'t>, source: &str) -> Vec<Binding<'t>> {
    let mut members = Scope {
        kind: ScopeKind::Class,
        node: class,
    }
    .bindings(source);

    let methods: Vec<Node<'t>> = members
        .iter()
        .filter(|b| b.kind == BindingKind::Function)
        .map(|b| b.def_node)
        .collect();
    for method in methods {
        if let Some(body) = method.child_by_field_name("body") {
            collect_self_attributes(body, source, &mut members);
        }
    }

    let mut seen = std::collections::HashSet::new();
    members.retain(|b| seen.insert(b.name(source).to_string()));
    members
}

fn collect_self_attributes<'t>(node: Node<'t>, source: &str, out: &mut Vec<Binding<'t>>) {
    for child in named_children(node) {
        match child.kind() {
            "function_definition" | "class_definition" => continue,
            "assignment" => {
                if let Some(left) = child.child_by_field_name("left") {
                    if let Some(attr) = self_attribute(left, source) {
                        out.push(Binding {
                            kind: BindingKind::Attribute,
                            name_node: attr,
                            def_node: child,
                        });
                    }
                }
            }
            _ => {}
        }
        collect_self_attributes(child, source, out);
    }
}

fn self_attribute<'t>(node: Node<'t>, source: &str) -> Option<Node<'t>> {
    if node.kind() != "attribute" {
        return None;
    }
    let object = node.child_by_field_name("object")?;
    if object.kind() == "identifier" && node_text(object, source) == "self" {
        node.child_by_field_name("attribute")
    } else {
        None
    }
}

/// Bindings introduced by the statements of a block, descending into
/// compound statements but not into nested function or class bodies.
fn collect_block<'t>(block: Node<'t>, source: &str, out: &mut Vec<Binding<'t>>) {
    for stmt in named_children(block) {
        collect_statement(stmt, source, out);
    }
}

fn collect_statement<'t>(stmt: Node<'t>, source: &str, out: &mut Vec<Binding<'t>>) {
    match stmt.kind() {
        "function_definition" => push_named(stmt, BindingKind::Function, out),
        "class_definition" => push_named(stmt, BindingKind::Class, out),
        "decorated_definition" => {
            if let Some(def) = stmt.child_by_field_name("definition") {
                collect_statement(def, source, out);
            }
        }
        "expression_statement" => {
            for expr in named_children(stmt) {
                collect_assignment(expr, out);
            }
        }
        "import_statement" => {
            for name in field_children(stmt, "name") {
                match name.kind() {
                    "dotted_name" => {
                        if let Some(first) = named_children(name).into_iter().next() {
                            out.push(Binding {
                                kind: BindingKind::Module,
                                name_node: first,
                                def_node: stmt,
                            });
                        }
                    }
                    "aliased_import" => push_alias(name, stmt, BindingKind::Module, out),
                    _ => {}
                }
            }
        }
        "import_from_statement" => {
            for name in field_children(stmt, "name") {
                match name.kind() {
                    "dotted_name" => {
                        if let Some(last) = named_children(name).into_iter().last() {
                            out.push(Binding {
                                kind: BindingKind::Imported,
                                name_node: last,
                                def_node: stmt,
                            });
                        }
                    }
                    "aliased_import" => push_alias(name, stmt, BindingKind::Imported, out),
                    _ => {}
                }
            }
        }
        "for_statement" => {
            if let Some(left) = stmt.child_by_field_name("left") {
                let mut names = Vec::new();
                collect_targets(left, &mut names);
                out.extend(names.into_iter().map(|n| Binding {
                    kind: BindingKind::Variable,
                    name_node: n,
                    def_node: stmt,
                }));
            }
            collect_compound(stmt, source, out);
        }
        "with_statement" => {
            let mut names = Vec::new();
            collect_with_targets(stmt, &mut names);
            out.extend(names.into_iter().map(|n| Binding {
                kind: BindingKind::Variable,
                name_node: n,
                def_node: stmt,
            }));
            collect_compound(stmt, source, out);
        }
        // Partial input often parses as ERROR around otherwise valid statements.
        "ERROR" => {
            for child in named_children(stmt) {
                if child.kind() == "identifier" {
                    continue;
                }
                collect_statement(child, source, out);
            }
        }
        "assignment" => collect_assignment(stmt, out),
        _ => collect_compound(stmt, source, out),
    }
}

/// Descend into the blocks and clauses of a compound statement.
fn collect_compound<'t>(stmt: Node<'t>, source: &str, out: &mut Vec<Binding<'t>>) {
    for child in named_children(stmt) {
        let kind = child.kind();
        if kind == "block" {
            collect_block(child, source, out);
        } else if kind.ends_with("_clause") {
            collect_compound(child, source, out);
        }
    }
}

fn collect_assignment<'t>(expr: Node<'t>, out: &mut Vec<Binding<'t>>) {
    if expr.kind() != "assignment" {
        return;
    }
    if let Some(left) = expr.child_by_field_name("left") {
        let mut names = Vec::new();
        collect_targets(left, &mut names);
        out.extend(names.into_iter().map(|n| Binding {
            kind: BindingKind::Variable,
            name_node: n,
            def_node: expr,
        }));
    }
    // a = b = 1
    if let Some(right) = expr.child_by_field_name("right") {
        collect_assignment(right, out);
    }
}

fn collect_targets<'t>(node: Node<'t>, out: &mut Vec<Node<'t>>) {
    match node.kind() {
        "identifier" => out.push(node),
        "pattern_list" | "tuple_pattern" | "list_pattern" | "list_splat_pattern"
        | "as_pattern_target" | "parenthesized_expression" | "tuple" | "list" => {
            for child in named_children(node) {
                collect_targets(child, out);
            }
        }
        _ => {}
    }
}

fn collect_with_targets<'t>(node: Node<'t>, out: &mut Vec<Node<'t>>) {
    for child in named_children(node) {
        match child.kind() {
            "block" => continue,
            "as_pattern_target" => collect_targets(child, out),
            _ => collect_with_targets(child, out),
        }
    }
}

fn collect_params<'t>(params: Node<'t>, out: &mut Vec<Binding<'t>>) {
    for param in named_children(params) {
        if let Some(name) = param_name(param) {
            out.push(Binding {
                kind: BindingKind::Param,
                name_node: name,
                def_node: param,
            });
        }
    }
}

fn param_name(param: Node<'_>) -> Option<Node<'_>> {
    match param.kind() {
        "identifier" => Some(param),
        "default_parameter" | "typed_default_parameter" => param.child_by_field_name("name"),
        "typed_parameter" | "list_splat_pattern" | "dictionary_splat_pattern" => {
            named_children(param).into_iter().find_map(param_name)
        }
        _ => None,
    }
}

fn push_named<'t>(def: Node<'t>, kind: BindingKind, out: &mut Vec<Binding<'t>>) {
    if let Some(name) = def.child_by_field_name("name") {
        out.push(Binding {
            kind,
            name_node: name,
            def_node: def,
        });
    }
}

fn push_alias<'t>(
    aliased: Node<'t>,
    stmt: Node<'t>,
    kind: BindingKind,
    out: &mut Vec<Binding<'t>>,
) {
    if let Some(alias) = aliased.child_by_field_name("alias") {
        out.push(Binding {
            kind,
            name_node: alias,
            def_node: stmt,
        });
    }
}

/// Whether a function definition sits directly in a class body.
pub fn is_method(def: Node<'_>) -> bool {
    let mut parent = def.parent();
    if parent.is_some_and(|p| p.kind() == "decorated_definition") {
        parent = parent.and_then(|p| p.parent());
    }
    parent
        .filter(|p| p.kind() == "block")
        .and_then(|b| b.parent())
        .is_some_and(|c| c.kind() == "class_definition")
}

/// `name(params) -> ret` for a function, `Name(init params)` for a class.
/// Methods drop a leading `self`/`cls`.
pub fn signature(def: Node<'_>, source: &str) -> Option<String> {
    let name = node_text(def.child_by_field_name("name")?, source);
    match def.kind() {
        "function_definition" => {
            let params = def.child_by_field_name("parameters")?;
            let mut rendered = format!("{name}({})", render_params(params, source, is_method(def)));
            if let Some(ret) = def.child_by_field_name("return_type") {
                rendered.push_str(" -> ");
                rendered.push_str(&collapse_whitespace(node_text(ret, source)));
            }
            Some(rendered)
        }
        "class_definition" => {
            let init = find_init(def, source);
            let params = init
                .and_then(|f| f.child_by_field_name("parameters"))
                .map(|p| render_params(p, source, true))
                .unwrap_or_default();
            Some(format!("{name}({params})"))
        }
        _ => None,
    }
}

fn find_init<'t>(class: Node<'t>, source: &str) -> Option<Node<'t>> {
    Scope {
        kind: ScopeKind::Class,
        node: class,
    }
    .bindings(source)
    .into_iter()
    .find(|b| b.kind == BindingKind::Function && b.name(source) == "__init__")
    .map(|b| b.def_node)
}

fn render_params(params: Node<'_>, source: &str, drop_receiver: bool) -> String {
    let mut parts: Vec<String> = named_children(params)
        .into_iter()
        .filter(|p| p.kind() != "comment")
        .map(|p| collapse_whitespace(node_text(p, source)))
        .collect();
    if drop_receiver && parts.first().is_some_and(|p| p == "self" || p == "cls") {
        parts.remove(0);
    }
    parts.join(", ")
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Docstring of a function or class: the first statement of its body when
/// that statement is a bare string. A class without one falls back to its
/// `__init__` docstring.
pub fn docstring(def: Node<'_>, source: &str) -> String {
    let own = def
        .child_by_field_name("body")
        .and_then(|body| named_children(body).into_iter().next())
        .filter(|stmt| stmt.kind() == "expression_statement")
        .and_then(|stmt| named_children(stmt).into_iter().next())
        .filter(|expr| expr.kind() == "string")
        .map(|s| clean_docstring(strip_quotes(node_text(s, source))))
        .unwrap_or_default();
    if own.is_empty() && def.kind() == "class_definition" {
        return find_init(def, source)
            .map(|init| docstring(init, source))
            .unwrap_or_default();
    }
    own
}

fn strip_quotes(literal: &str) -> &str {
    let body = literal.trim_start_matches(|c: char| "rRuUbBfF".contains(c));
    for quote in ["\"\"\"", "'''", "\"", "'"] {
        if let Some(inner) = body.strip_prefix(quote) {
            return inner.strip_suffix(quote).unwrap_or(inner);
        }
    }
    body
}

/// Trim the first line, remove the common indentation of the rest, drop
/// leading and trailing blank lines.
pub fn clean_docstring(raw: &str) -> String {
    let mut lines: Vec<&str> = raw.lines().collect();
    if lines.is_empty() {
        return String::new();
    }
    let indent = lines[1..]
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| leading_whitespace(l))
        .min()
        .unwrap_or(0);

    let mut cleaned: Vec<String> = Vec::with_capacity(lines.len());
    cleaned.push(lines.remove(0).trim().to_string());
    for line in lines {
        cleaned.push(strip_indent(line, indent).trim_end().to_string());
    }
    while cleaned.last().is_some_and(|l| l.is_empty()) {
        cleaned.pop();
    }
    while cleaned.first().is_some_and(|l| l.is_empty()) {
        cleaned.remove(0);
    }
    cleaned.join("\n")
}

/// Leading whitespace, counted in chars.
fn leading_whitespace(line: &str) -> usize {
    line.chars().take_while(|c| c.is_whitespace()).count()
}

/// Drop up to `indent` leading whitespace chars.
fn strip_indent(line: &str, indent: usize) -> &str {
    let cut = line
        .char_indices()
        .take_while(|(_, c)| c.is_whitespace())
        .nth(indent)
        .map_or_else(|| line.len() - line.trim_start().len(), |(i, _)| i);
    &line[cut..]
}

/// First line of a node's text, trimmed.
pub fn first_line(node: Node<'_>, source: &str) -> String {
    node_text(node, source)
        .lines()
        .next()
        .unwrap_or("")
        .trim()
        .to_string()
}

/// The identifier at or immediately before byte `byte`.
pub fn identifier_at(root: Node<'_>, byte: usize) -> Option<Node<'_>> {
    let mut on = None;
    let mut before = None;
    find_identifier(root, byte, &mut on, &mut before);
    on.or(before)
}

fn find_identifier<'t>(
    node: Node<'t>,
    byte: usize,
    on: &mut Option<Node<'t>>,
    before: &mut Option<Node<'t>>,
) {
    for child in named_children(node) {
        if child.start_byte() > byte || byte > child.end_byte() {
            continue;
        }
        if child.kind() == "identifier" {
            if byte < child.end_byte() {
                *on = Some(child);
            } else {
                *before = Some(child);
            }
        }
        find_identifier(child, byte, on, before);
    }
}

/// Whether the text just before `byte` is inside a comment or string literal.
pub fn in_comment_or_string(root: Node<'_>, byte: usize) -> bool {
    if byte == 0 {
        return false;
    }
    let mut node = root.descendant_for_byte_range(byte - 1, byte - 1);
    while let Some(n) = node {
        if n.kind() == "comment" || n.kind() == "string" {
            return true;
        }
        node = n.parent();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    const SRC: &str = r#"import os
import numpy as np
from kfp.dsl import pipeline, component as comp

LIMIT = 10

def train(data, epochs: int = 3, *args, **kwargs) -> float:
    """Train a model.

    Runs for a number of epochs.
    """
    loss = 0.0
    for step, batch in enumerate(data):
        loss += step
    return loss

@dataclass
class Trainer:
    """Drives training."""

    rate = 0.1

    def __init__(self, model, rate=0.1):
        self.model = model
        self.history = []

    def fit(self, data):
        return train(data)
"#;

    fn names(bindings: &[Binding<'_>]) -> Vec<String> {
        bindings.iter().map(|b| b.name(SRC).to_string()).collect()
    }

    fn find_def<'t>(root: Node<'t>, name: &str) -> Node<'t> {
        let module = Scope {
            kind: ScopeKind::Module,
            node: root,
        };
        module
            .bindings(SRC)
            .into_iter()
            .find(|b| b.name(SRC) == name)
            .map(|b| b.def_node)
            .unwrap()
    }

    // ── Bindings ──

    #[test]
    fn module_bindings_in_source_order() {
        let tree = parse(SRC).unwrap();
        let module = Scope {
            kind: ScopeKind::Module,
            node: tree.root_node(),
        };
        let bindings = module.bindings(SRC);
        assert_eq!(
            names(&bindings),
            ["os", "np", "pipeline", "comp", "LIMIT", "train", "Trainer"]
        );
        assert_eq!(bindings[0].kind, BindingKind::Module);
        assert_eq!(bindings[2].kind, BindingKind::Imported);
        assert_eq!(bindings[6].kind, BindingKind::Class);
    }

    #[test]
    fn function_scope_has_params_and_locals() {
        let tree = parse(SRC).unwrap();
        let byte = SRC.find("return loss").unwrap();
        let scopes = scopes_at(tree.root_node(), byte);
        assert_eq!(scopes.len(), 2);
        assert_eq!(scopes[0].kind, ScopeKind::Function);
        let local = names(&scopes[0].bindings(SRC));
        assert_eq!(
            local,
            ["data", "epochs", "args", "kwargs", "loss", "step", "batch"]
        );
    }

    #[test]
    fn class_members_include_self_attributes() {
        let tree = parse(SRC).unwrap();
        let class = find_def(tree.root_node(), "Trainer");
        let members = class_members(class, SRC);
        assert_eq!(names(&members), ["rate", "__init__", "fit", "model", "history"]);
        assert_eq!(members[3].kind, BindingKind::Attribute);
    }

    #[test]
    fn resolve_skips_outer_class_scope() {
        let tree = parse(SRC).unwrap();
        let byte = SRC.find("return train(data)").unwrap();
        let scopes = scopes_at(tree.root_node(), byte);
        assert_eq!(scopes[0].kind, ScopeKind::Function);
        assert_eq!(scopes[1].kind, ScopeKind::Class);
        // `rate` lives in the class body, invisible from inside `fit`.
        assert!(resolve(&scopes, "rate", byte, SRC).is_none());
        let train = resolve(&scopes, "train", byte, SRC).unwrap();
        assert_eq!(train.kind, BindingKind::Function);
    }

    #[test]
    fn resolve_prefers_latest_binding_before_cursor() {
        let src = "x = 1\nx = 2\nprint(x)\n";
        let tree = parse(src).unwrap();
        let byte = src.find("print").unwrap();
        let scopes = scopes_at(tree.root_node(), byte);
        let b = resolve(&scopes, "x", byte, src).unwrap();
        assert_eq!(b.name_node.start_position().row, 1);
    }

    // ── Signatures and docstrings ──

    #[test]
    fn function_signature_and_docstring() {
        let tree = parse(SRC).unwrap();
        let train = find_def(tree.root_node(), "train");
        assert_eq!(
            signature(train, SRC).unwrap(),
            "train(data, epochs: int = 3, *args, **kwargs) -> float"
        );
        assert_eq!(
            docstring(train, SRC),
            "Train a model.\n\nRuns for a number of epochs."
        );
    }

    #[test]
    fn class_signature_uses_init_without_self() {
        let tree = parse(SRC).unwrap();
        let class = find_def(tree.root_node(), "Trainer");
        assert_eq!(signature(class, SRC).unwrap(), "Trainer(model, rate=0.1)");
        assert_eq!(docstring(class, SRC), "Drives training.");
    }

    #[test]
    fn method_detection() {
        let tree = parse(SRC).unwrap();
        let class = find_def(tree.root_node(), "Trainer");
        let fit = class_members(class, SRC)
            .into_iter()
            .find(|b| b.name(SRC) == "fit")
            .unwrap();
        assert!(is_method(fit.def_node));
        assert_eq!(signature(fit.def_node, SRC).unwrap(), "fit(data)");
        assert!(!is_method(find_def(tree.root_node(), "train")));
    }

    #[test]
    fn strip_quotes_variants() {
        assert_eq!(strip_quotes(r#""""doc""""#), "doc");
        assert_eq!(strip_quotes("'''doc'''"), "doc");
        assert_eq!(strip_quotes("r'doc'"), "doc");
        assert_eq!(strip_quotes("\"doc"), "doc");
    }

    #[test]
    fn clean_docstring_dedents() {
        let raw = "Summary.\n\n        Detail one.\n          Nested.\n    ";
        assert_eq!(clean_docstring(raw), "Summary.\n\nDetail one.\n  Nested.");
    }

    #[test]
    fn clean_docstring_counts_indent_in_chars() {
        let raw = "Doc.\n\u{3000}wide indent\n one space\n    ";
        assert_eq!(clean_docstring(raw), "Doc.\nwide indent\none space");

        let raw = "Doc.\n\u{3000}\u{3000}deeper\n\u{3000}wide";
        assert_eq!(clean_docstring(raw), "Doc.\n\u{3000}deeper\nwide");
    }

    // ── Cursor helpers ──

    #[test]
    fn identifier_at_and_after() {
        let src = "value = other\n";
        let tree = parse(src).unwrap();
        let root = tree.root_node();
        let on = identifier_at(root, 2).unwrap();
        assert_eq!(node_text(on, src), "value");
        let after = identifier_at(root, 13).unwrap();
        assert_eq!(node_text(after, src), "other");
        assert!(identifier_at(root, 6).is_none());
    }

    #[test]
    fn comment_and_string_detection() {
        let src = "x = 'abc'  # note\ny = x\n";
        let tree = parse(src).unwrap();
        let root = tree.root_node();
        assert!(in_comment_or_string(root, src.find("note").unwrap() + 2));
        assert!(in_comment_or_string(root, src.find("abc").unwrap() + 2));
        assert!(!in_comment_or_string(root, src.find("y = x").unwrap() + 5));
    }
}
