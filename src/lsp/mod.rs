//! Code intelligence for a single in-memory buffer. No JSON-RPC, no LSP transport.
//!
//! Two tiers answer every query. A pluggable [`AnalysisEngine`] does the
//! precise work; when it fails or finds nothing in a buffer that imports a
//! known SDK, a dictionary-driven resolver backed by the [`knowledge`] table
//! takes over. [`shaper`] turns whatever won into one stable result schema.
//!
//! Uses `lsp-types` for kinds and ranges so editor front ends can consume
//! the payloads directly.

pub mod adapter;
pub mod fallback;
pub mod knowledge;
pub mod position;
pub mod service;
pub mod shaper;

use lsp_types::{CompletionItemKind, Range};
use serde::Serialize;
use thiserror::Error;

use position::EngineCoordinate;

/// Most completions returned for one request.
pub const MAX_COMPLETIONS: usize = 50;

/// Fixed classification shared by both tiers.
///
/// Serialized as the LSP `CompletionItemKind` integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "CompletionItemKind")]
pub enum SymbolKind {
    Module,
    Class,
    Function,
    Variable,
    Keyword,
}

impl From<SymbolKind> for CompletionItemKind {
    fn from(kind: SymbolKind) -> Self {
        match kind {
            SymbolKind::Module => CompletionItemKind::MODULE,
            SymbolKind::Class => CompletionItemKind::CLASS,
            SymbolKind::Function => CompletionItemKind::FUNCTION,
            SymbolKind::Variable => CompletionItemKind::VARIABLE,
            SymbolKind::Keyword => CompletionItemKind::KEYWORD,
        }
    }
}

/// One completion candidate as the editor sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Symbol {
    /// Raw identifier.
    #[serde(rename = "label")]
    pub name: String,
    pub kind: SymbolKind,
    pub detail: String,
    pub documentation: String,
    /// Text inserted on accept. `name(` for callables with a known signature.
    pub insert_text: String,
}

/// Hover payload. `None` at the call site means nothing resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HoverResult {
    pub contents: String,
    pub range: Option<Range>,
}

/// A go-to-definition target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DefinitionLocation {
    /// File URI, or the configured buffer URI for definitions in the request buffer.
    pub uri: String,
    pub range: Range,
}

/// A completion candidate straight from an engine, before shaping.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawCompletion {
    pub name: String,
    /// Engine vocabulary: `function`, `class`, `module`, `param`, `statement`, ...
    pub type_name: String,
    /// Rendered call signature, e.g. `mean(a, axis=None)`. Only callables have one.
    pub signature: Option<String>,
    pub docstring: String,
}

/// Hover material from an engine.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawHover {
    pub signature: Option<String>,
    /// Fallback header for symbols without a signature (an assignment, an import).
    pub description: String,
    pub docstring: String,
    pub span: Option<EngineSpan>,
}

/// A span in engine coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSpan {
    pub start: EngineCoordinate,
    pub end: EngineCoordinate,
}

/// A definition site in engine coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineLocation {
    /// `None` when the definition lives in the analyzed buffer.
    pub module_path: Option<String>,
    pub span: EngineSpan,
}

/// Errors an engine may raise. The adapter absorbs all of them.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("engine setup failed: {0}")]
    Setup(String),

    #[error("parse failed: {0}")]
    Parse(String),

    #[error("coordinate outside buffer: line {line}, column {column}")]
    OutOfRange { line: usize, column: usize },

    #[error("engine unavailable: {0}")]
    Unavailable(String),
}

/// Pluggable static-analysis engine. Pure functions over unsaved text.
///
/// Coordinates are engine-native: one-indexed lines, zero-indexed
/// code-point columns.
pub trait AnalysisEngine: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Completion candidates at `at`, most relevant first.
    fn complete(&self, source: &str, at: EngineCoordinate)
        -> Result<Vec<RawCompletion>, EngineError>;

    /// Hover material for the symbol at `at`.
    fn hover(&self, source: &str, at: EngineCoordinate) -> Result<Option<RawHover>, EngineError>;

    /// Definition sites for the symbol at `at`.
    fn definitions(
        &self,
        source: &str,
        at: EngineCoordinate,
    ) -> Result<Vec<EngineLocation>, EngineError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_serializes_as_lsp_integer() {
        let json = serde_json::to_value(SymbolKind::Function).unwrap();
        assert_eq!(json, serde_json::json!(3));
        let json = serde_json::to_value(SymbolKind::Module).unwrap();
        assert_eq!(json, serde_json::json!(9));
    }

    #[test]
    fn symbol_uses_editor_field_names() {
        let sym = Symbol {
            name: "dsl".into(),
            kind: SymbolKind::Function,
            detail: "kfp".into(),
            documentation: String::new(),
            insert_text: "dsl".into(),
        };
        let json = serde_json::to_value(&sym).unwrap();
        assert_eq!(json["label"], "dsl");
        assert_eq!(json["insertText"], "dsl");
        assert_eq!(json["documentation"], "");
        assert!(json.get("name").is_none());
    }
}
