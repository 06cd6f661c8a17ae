//! `AnalysisEngine` implementation over tree-sitter Python.
//!
//! Parses the buffer on every call. Knows the buffer's own definitions,
//! Python builtins and keywords, and nothing about imported packages: a
//! receiver it cannot trace to a class in the buffer yields no members,
//! which is what hands SDK attribute access over to the dictionary tier.

use std::collections::HashSet;

use tree_sitter::{Node, Point};

use super::builtins::{builtin, Builtin, BUILTINS, KEYWORDS};
use super::{
    class_members, docstring, enclosing_class, first_line, identifier_at, in_comment_or_string,
    node_text, parse, resolve, scopes_at, signature, Binding, BindingKind, Scope, ScopeKind,
};
use crate::lsp::position::{
    byte_offset, byte_to_char, from_engine, line_at, line_prefix, Coordinate, EngineCoordinate,
};
use crate::lsp::{
    AnalysisEngine, EngineError, EngineLocation, EngineSpan, RawCompletion, RawHover,
};

/// Single-buffer Python analyzer.
#[derive(Debug, Default, Clone, Copy)]
pub struct PythonEngine;

impl PythonEngine {
    pub fn new() -> Self {
        Self
    }
}

/// What the user is typing at the cursor.
#[derive(Debug, PartialEq, Eq)]
pub enum CompletionContext<'a> {
    /// A bare name.
    Name { partial: &'a str },
    /// An attribute after `receiver.`
    Member { receiver: &'a str, partial: &'a str },
}

fn is_ident_char(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    chars.next().is_some_and(|c| c == '_' || c.is_alphabetic()) && chars.all(is_ident_char)
}

/// Start of the trailing run of characters matching `pred`.
fn trailing_start(text: &str, pred: impl Fn(char) -> bool) -> usize {
    text.char_indices()
        .rev()
        .take_while(|(_, c)| pred(*c))
        .last()
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}

/// Classify the line text before the cursor.
pub fn completion_context(prefix: &str) -> CompletionContext<'_> {
    let start = trailing_start(prefix, is_ident_char);
    let partial = &prefix[start..];
    let before = prefix[..start].trim_end();
    match before.strip_suffix('.') {
        Some(rest) => {
            let rest = rest.trim_end();
            let receiver = &rest[trailing_start(rest, |c| is_ident_char(c) || c == '.')..];
            CompletionContext::Member { receiver, partial }
        }
        None => CompletionContext::Name { partial },
    }
}

/// A resolved hover or definition target.
enum Target<'t> {
    Binding(Binding<'t>),
    Builtin(&'static Builtin),
}

/// Validate an engine coordinate and turn it into a byte offset.
fn locate(source: &str, at: EngineCoordinate) -> Result<(Coordinate, usize), EngineError> {
    let out_of_range = || EngineError::OutOfRange {
        line: at.line,
        column: at.column,
    };
    let coord = from_engine(at).map_err(|_| out_of_range())?;
    coord.check_bounds(source).map_err(|_| out_of_range())?;
    let byte = byte_offset(source, coord).ok_or_else(out_of_range)?;
    Ok((coord, byte))
}

fn engine_point(point: Point, source: &str) -> EngineCoordinate {
    let column = line_at(source, point.row)
        .map(|l| byte_to_char(l, point.column))
        .unwrap_or(point.column);
    EngineCoordinate::new(point.row + 1, column)
}

fn span_of(node: Node<'_>, source: &str) -> EngineSpan {
    EngineSpan {
        start: engine_point(node.start_position(), source),
        end: engine_point(node.end_position(), source),
    }
}

/// Where scope lookup starts for a completion: the start of the dotted
/// expression being typed, or the last non-blank byte before the cursor.
/// A half-typed `self.` may leave the cursor outside every parsed scope.
fn anchor_byte(source: &str, prefix: &str, byte: usize) -> usize {
    let start = trailing_start(prefix, |c| is_ident_char(c) || c == '.');
    if start < prefix.len() {
        return byte - (prefix.len() - start);
    }
    source[..byte].trim_end().len().saturating_sub(1)
}

/// Scopes for a completion, dropping function and class scopes the cursor
/// line is not indented under.
fn completion_scopes<'t>(
    root: Node<'t>,
    source: &str,
    prefix: &str,
    byte: usize,
) -> Vec<Scope<'t>> {
    let indent = prefix.len() - prefix.trim_start().len();
    let mut scopes = scopes_at(root, anchor_byte(source, prefix, byte));
    scopes.retain(|s| s.kind == ScopeKind::Module || s.node.start_position().column < indent);
    scopes
}

/// The identifier currently being typed is not a candidate for itself.
fn is_being_typed(b: &Binding<'_>, byte: usize) -> bool {
    b.name_node.start_byte() < byte && byte <= b.name_node.end_byte()
}

fn binding_completion(b: &Binding<'_>, source: &str) -> RawCompletion {
    let (signature, docstring) = match b.kind {
        BindingKind::Function | BindingKind::Class => {
            (signature(b.def_node, source), docstring(b.def_node, source))
        }
        _ => (None, String::new()),
    };
    RawCompletion {
        name: b.name(source).to_string(),
        type_name: b.kind.type_name().to_string(),
        signature,
        docstring,
    }
}

/// The class a receiver expression refers to: `self`/`cls` inside a method,
/// a class name, or a variable assigned from a class call.
fn receiver_class<'t>(
    receiver: &str,
    scopes: &[Scope<'t>],
    byte: usize,
    source: &str,
) -> Option<Node<'t>> {
    if receiver == "self" || receiver == "cls" {
        return enclosing_class(scopes);
    }
    if !is_identifier(receiver) {
        return None;
    }
    let binding = resolve(scopes, receiver, byte, source)?;
    match binding.kind {
        BindingKind::Class => Some(binding.def_node),
        BindingKind::Variable => {
            let callee = binding
                .def_node
                .child_by_field_name("right")
                .filter(|r| r.kind() == "call")
                .and_then(|call| call.child_by_field_name("function"))
                .filter(|f| f.kind() == "identifier")?;
            let class = resolve(scopes, node_text(callee, source), byte, source)?;
            (class.kind == BindingKind::Class).then_some(class.def_node)
        }
        _ => None,
    }
}

fn resolve_target<'t>(ident: Node<'t>, source: &str, root: Node<'t>) -> Option<Target<'t>> {
    let name = node_text(ident, source);
    let byte = ident.start_byte();
    let scopes = scopes_at(root, byte);

    if let Some(parent) = ident.parent().filter(|p| p.kind() == "attribute") {
        let is_attribute = parent
            .child_by_field_name("attribute")
            .is_some_and(|a| a.id() == ident.id());
        if is_attribute {
            let object = parent
                .child_by_field_name("object")
                .filter(|o| o.kind() == "identifier")?;
            let class = receiver_class(node_text(object, source), &scopes, byte, source)?;
            return class_members(class, source)
                .into_iter()
                .find(|b| b.name(source) == name)
                .map(Target::Binding);
        }
    }

    if let Some(b) = resolve(&scopes, name, byte, source) {
        return Some(Target::Binding(b));
    }
    builtin(name).map(Target::Builtin)
}

impl PythonEngine {
    fn name_completions(
        &self,
        scopes: &[Scope<'_>],
        partial: &str,
        byte: usize,
        source: &str,
    ) -> Vec<RawCompletion> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();

        for (i, scope) in scopes.iter().enumerate() {
            if scope.kind == ScopeKind::Class && i != 0 {
                continue;
            }
            for b in scope.bindings(source) {
                let name = b.name(source);
                if is_being_typed(&b, byte) || !name.starts_with(partial) {
                    continue;
                }
                if seen.insert(name.to_string()) {
                    out.push(binding_completion(&b, source));
                }
            }
        }

        for b in BUILTINS {
            if b.name.starts_with(partial) && seen.insert(b.name.to_string()) {
                out.push(RawCompletion {
                    name: b.name.to_string(),
                    type_name: b.type_name.to_string(),
                    signature: Some(b.signature.to_string()),
                    docstring: b.doc.to_string(),
                });
            }
        }

        for kw in KEYWORDS {
            if kw.starts_with(partial) && seen.insert(kw.to_string()) {
                out.push(RawCompletion {
                    name: kw.to_string(),
                    type_name: "keyword".into(),
                    ..Default::default()
                });
            }
        }

        out
    }

    fn member_completions(
        &self,
        scopes: &[Scope<'_>],
        receiver: &str,
        partial: &str,
        byte: usize,
        source: &str,
    ) -> Vec<RawCompletion> {
        let Some(class) = receiver_class(receiver, scopes, byte, source) else {
            return Vec::new();
        };
        let show_private = partial.starts_with('_');
        class_members(class, source)
            .iter()
            .filter(|b| !is_being_typed(b, byte))
            .filter(|b| {
                let name = b.name(source);
                name.starts_with(partial) && (show_private || !name.starts_with("__"))
            })
            .map(|b| binding_completion(b, source))
            .collect()
    }
}

impl AnalysisEngine for PythonEngine {
    fn name(&self) -> &str {
        "tree-sitter-python"
    }

    fn complete(
        &self,
        source: &str,
        at: EngineCoordinate,
    ) -> Result<Vec<RawCompletion>, EngineError> {
        let (coord, byte) = locate(source, at)?;
        let tree = parse(source)?;
        let root = tree.root_node();
        if in_comment_or_string(root, byte) {
            return Ok(Vec::new());
        }

        let prefix = line_prefix(source, coord).unwrap_or("");
        let scopes = completion_scopes(root, source, prefix, byte);
        let items = match completion_context(prefix) {
            CompletionContext::Name { partial } => {
                self.name_completions(&scopes, partial, byte, source)
            }
            CompletionContext::Member { receiver, partial } => {
                self.member_completions(&scopes, receiver, partial, byte, source)
            }
        };
        Ok(items)
    }

    fn hover(&self, source: &str, at: EngineCoordinate) -> Result<Option<RawHover>, EngineError> {
        let (_, byte) = locate(source, at)?;
        let tree = parse(source)?;
        let root = tree.root_node();
        let Some(ident) = identifier_at(root, byte) else {
            return Ok(None);
        };
        let span = Some(span_of(ident, source));

        let hover = match resolve_target(ident, source, root) {
            Some(Target::Binding(b)) => match b.kind {
                BindingKind::Function | BindingKind::Class => RawHover {
                    signature: signature(b.def_node, source),
                    description: String::new(),
                    docstring: docstring(b.def_node, source),
                    span,
                },
                BindingKind::Param => RawHover {
                    description: node_text(b.def_node, source)
                        .split_whitespace()
                        .collect::<Vec<_>>()
                        .join(" "),
                    span,
                    ..Default::default()
                },
                _ => RawHover {
                    description: first_line(b.def_node, source),
                    span,
                    ..Default::default()
                },
            },
            Some(Target::Builtin(b)) => RawHover {
                signature: Some(b.signature.to_string()),
                description: String::new(),
                docstring: b.doc.to_string(),
                span,
            },
            None => return Ok(None),
        };
        Ok(Some(hover))
    }

    fn definitions(
        &self,
        source: &str,
        at: EngineCoordinate,
    ) -> Result<Vec<EngineLocation>, EngineError> {
        let (_, byte) = locate(source, at)?;
        let tree = parse(source)?;
        let root = tree.root_node();
        let Some(ident) = identifier_at(root, byte) else {
            return Ok(Vec::new());
        };
        match resolve_target(ident, source, root) {
            Some(Target::Binding(b)) => Ok(vec![EngineLocation {
                module_path: None,
                span: span_of(b.name_node, source),
            }]),
            // Builtins have no source in the buffer.
            Some(Target::Builtin(_)) | None => Ok(Vec::new()),
        }
    }
}
