//! Semantic tier: wraps an [`AnalysisEngine`] so that nothing it does can
//! escape as an error or a panic.
//!
//! Every call ends in an [`AnalyzerOutcome`]. `EmptyDefer` is the signal that
//! the buffer imports a known SDK but the engine found nothing, which is the
//! one case the dictionary tier is allowed to answer.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use lsp_types::{Position, Range};
use thiserror::Error;
use tracing::{debug, warn};

use super::position::{from_engine, to_engine, CallerInputError, Coordinate, EngineCoordinate};
use super::shaper::kind_for_type;
use super::{
    AnalysisEngine, DefinitionLocation, EngineError, EngineLocation, EngineSpan, HoverResult,
    RawCompletion, RawHover, Symbol, MAX_COMPLETIONS,
};

/// Why the semantic tier produced nothing usable.
#[derive(Debug, Error)]
pub enum AnalyzerFailure {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("engine panicked: {0}")]
    Panicked(String),

    #[error("engine returned an unmappable coordinate: {0}")]
    BadCoordinate(#[from] CallerInputError),
}

/// Tagged result of one semantic query.
#[derive(Debug)]
pub enum AnalyzerOutcome<T> {
    Success(T),
    /// Nothing found in a buffer that imports a known SDK.
    EmptyDefer,
    Failure(AnalyzerFailure),
}

impl<T> AnalyzerOutcome<T> {
    /// The successful value, if any.
    pub fn success(self) -> Option<T> {
        match self {
            Self::Success(v) => Some(v),
            _ => None,
        }
    }
}

/// The semantic tier.
pub struct SemanticAdapter {
    engine: Arc<dyn AnalysisEngine>,
    markers: Vec<String>,
    buffer_uri: String,
}

impl SemanticAdapter {
    /// `markers` are the import markers that make an empty answer defer to
    /// the dictionary tier.
    pub fn new(
        engine: Arc<dyn AnalysisEngine>,
        markers: Vec<String>,
        buffer_uri: impl Into<String>,
    ) -> Self {
        Self {
            engine,
            markers,
            buffer_uri: buffer_uri.into(),
        }
    }

    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    fn has_marker(&self, source: &str) -> bool {
        self.markers.iter().any(|m| source.contains(m.as_str()))
    }

    /// Run an engine call, turning errors and panics into `Failure`.
    fn guarded<T>(
        &self,
        op: &str,
        call: impl FnOnce() -> Result<T, EngineError>,
    ) -> Result<T, AnalyzerFailure> {
        match catch_unwind(AssertUnwindSafe(call)) {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                warn!(engine = self.engine.name(), op, error = %e, "engine error");
                Err(e.into())
            }
            Err(payload) => {
                let msg = panic_message(payload.as_ref());
                warn!(engine = self.engine.name(), op, panic = %msg, "engine panicked");
                Err(AnalyzerFailure::Panicked(msg))
            }
        }
    }

    pub fn complete(&self, source: &str, at: Coordinate) -> AnalyzerOutcome<Vec<Symbol>> {
        let raw = match self.guarded("complete", || self.engine.complete(source, to_engine(at))) {
            Ok(raw) => raw,
            Err(e) => return AnalyzerOutcome::Failure(e),
        };
        if raw.is_empty() && self.has_marker(source) {
            return AnalyzerOutcome::EmptyDefer;
        }
        debug!(count = raw.len(), "engine completions");
        AnalyzerOutcome::Success(
            raw.into_iter()
                .take(MAX_COMPLETIONS)
                .map(completion_symbol)
                .collect(),
        )
    }

    pub fn hover(&self, source: &str, at: Coordinate) -> AnalyzerOutcome<Option<HoverResult>> {
        let raw = match self.guarded("hover", || self.engine.hover(source, to_engine(at))) {
            Ok(raw) => raw,
            Err(e) => return AnalyzerOutcome::Failure(e),
        };
        let hover = match raw {
            Some(raw) => match hover_result(raw) {
                Ok(hover) => hover,
                Err(e) => return AnalyzerOutcome::Failure(e),
            },
            None => None,
        };
        if hover.is_none() && self.has_marker(source) {
            return AnalyzerOutcome::EmptyDefer;
        }
        AnalyzerOutcome::Success(hover)
    }

    pub fn definitions(
        &self,
        source: &str,
        at: Coordinate,
    ) -> AnalyzerOutcome<Vec<DefinitionLocation>> {
        let call = || self.engine.definitions(source, to_engine(at));
        let raw = match self.guarded("definitions", call) {
            Ok(raw) => raw,
            Err(e) => return AnalyzerOutcome::Failure(e),
        };
        let mapped: Result<Vec<_>, _> = raw
            .into_iter()
            .map(|loc| self.definition_location(loc))
            .collect();
        match mapped {
            Ok(locations) => AnalyzerOutcome::Success(locations),
            Err(e) => AnalyzerOutcome::Failure(e),
        }
    }

    fn definition_location(
        &self,
        loc: EngineLocation,
    ) -> Result<DefinitionLocation, AnalyzerFailure> {
        Ok(DefinitionLocation {
            uri: loc.module_path.unwrap_or_else(|| self.buffer_uri.clone()),
            range: to_range(loc.span)?,
        })
    }
}

fn is_callable(type_name: &str) -> bool {
    matches!(type_name, "function" | "method" | "class")
}

/// Signature first, then the docstring after a blank line.
fn join_doc(header: &str, docstring: &str) -> String {
    match (header.is_empty(), docstring.is_empty()) {
        (true, _) => docstring.to_string(),
        (false, true) => header.to_string(),
        (false, false) => format!("{header}\n\n{docstring}"),
    }
}

fn completion_symbol(raw: RawCompletion) -> Symbol {
    let kind = kind_for_type(&raw.type_name);
    let (insert_text, documentation) = match raw.signature.as_deref() {
        Some(sig) if is_callable(&raw.type_name) => {
            (format!("{}(", raw.name), join_doc(sig, &raw.docstring))
        }
        _ => (raw.name.clone(), raw.docstring),
    };
    Symbol {
        name: raw.name,
        kind,
        detail: raw.type_name,
        documentation,
        insert_text,
    }
}

fn hover_result(raw: RawHover) -> Result<Option<HoverResult>, AnalyzerFailure> {
    let header = raw.signature.unwrap_or(raw.description);
    let contents = join_doc(&header, &raw.docstring);
    if contents.is_empty() {
        return Ok(None);
    }
    let range = raw.span.map(to_range).transpose()?;
    Ok(Some(HoverResult { contents, range }))
}

fn to_position(at: EngineCoordinate) -> Result<Position, CallerInputError> {
    let c = from_engine(at)?;
    Ok(Position::new(
        u32::try_from(c.line).unwrap_or(u32::MAX),
        u32::try_from(c.character).unwrap_or(u32::MAX),
    ))
}

fn to_range(span: EngineSpan) -> Result<Range, CallerInputError> {
    Ok(Range::new(to_position(span.start)?, to_position(span.end)?))
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
