//! `CodeIntel`: the two-tier resolution every request goes through.
//!
//! Validate, ask the semantic tier, fall back to the dictionary only when
//! the semantic tier defers or fails, shape. Never returns an error: bad
//! input and analyzer trouble both end as an empty answer.

use std::sync::Arc;

use tracing::{debug, info};

use super::adapter::{AnalyzerOutcome, SemanticAdapter};
use super::fallback::FallbackResolver;
use super::knowledge::KnowledgeBase;
use super::position::{CallerInputError, Coordinate};
use super::shaper::{shape_completions, shape_definitions, shape_hover, Tier};
use super::{AnalysisEngine, DefinitionLocation, HoverResult, Symbol};

pub struct CodeIntel {
    adapter: SemanticAdapter,
    fallback: FallbackResolver,
}

impl CodeIntel {
    pub fn new(
        engine: Arc<dyn AnalysisEngine>,
        kb: Arc<KnowledgeBase>,
        buffer_uri: impl Into<String>,
    ) -> Result<Self, regex::Error> {
        let adapter = SemanticAdapter::new(engine, kb.import_markers(), buffer_uri);
        Ok(Self {
            adapter,
            fallback: FallbackResolver::new(kb)?,
        })
    }

    pub fn engine_name(&self) -> &str {
        self.adapter.engine_name()
    }

    /// Check raw request values against the buffer.
    pub fn validate(
        source: &str,
        line: i64,
        character: i64,
    ) -> Result<Coordinate, CallerInputError> {
        if source.is_empty() {
            return Err(CallerInputError::EmptySource);
        }
        let at = Coordinate::from_request(line, character)?;
        at.check_bounds(source)?;
        Ok(at)
    }

    fn accept(op: &str, source: &str, line: i64, character: i64) -> Option<Coordinate> {
        match Self::validate(source, line, character) {
            Ok(at) => Some(at),
            Err(e) => {
                debug!(op, error = %e, "rejected request");
                None
            }
        }
    }

    pub fn completion(&self, source: &str, line: i64, character: i64) -> Vec<Symbol> {
        info!(line, character, code_len = source.len(), "completion request");
        let Some(at) = Self::accept("completion", source, line, character) else {
            return Vec::new();
        };

        let items = match self.adapter.complete(source, at) {
            AnalyzerOutcome::Success(items) => shape_completions(Tier::Semantic, items),
            AnalyzerOutcome::EmptyDefer | AnalyzerOutcome::Failure(_) => {
                shape_completions(Tier::Fallback, self.fallback.complete(source, at))
            }
        };
        info!(count = items.len(), "completions");
        items
    }

    pub fn hover(&self, source: &str, line: i64, character: i64) -> Option<HoverResult> {
        debug!(line, character, "hover request");
        let at = Self::accept("hover", source, line, character)?;
        let hover = match self.adapter.hover(source, at) {
            AnalyzerOutcome::Success(hover) => hover,
            AnalyzerOutcome::EmptyDefer | AnalyzerOutcome::Failure(_) => {
                self.fallback.hover(source, at)
            }
        };
        shape_hover(hover)
    }

    pub fn definition(&self, source: &str, line: i64, character: i64) -> Vec<DefinitionLocation> {
        debug!(line, character, "definition request");
        let Some(at) = Self::accept("definition", source, line, character) else {
            return Vec::new();
        };
        match self.adapter.definitions(source, at) {
            AnalyzerOutcome::Success(locations) => shape_definitions(locations),
            // The dictionary knows no source locations.
            AnalyzerOutcome::EmptyDefer | AnalyzerOutcome::Failure(_) => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::treesitter::PythonEngine;

    fn intel() -> CodeIntel {
        let kb = Arc::new(KnowledgeBase::builtin().unwrap());
        CodeIntel::new(Arc::new(PythonEngine::new()), kb, "untitled.py").unwrap()
    }

    // ── Validation ──

    #[test]
    fn validation_rejects_bad_input() {
        assert_eq!(
            CodeIntel::validate("", 0, 0),
            Err(CallerInputError::EmptySource)
        );
        assert!(matches!(
            CodeIntel::validate("x", -1, 0),
            Err(CallerInputError::Negative { .. })
        ));
        assert!(matches!(
            CodeIntel::validate("x", 3, 0),
            Err(CallerInputError::LineOutOfRange { .. })
        ));
        assert!(matches!(
            CodeIntel::validate("x", 0, 2),
            Err(CallerInputError::CharacterOutOfRange { .. })
        ));
        assert_eq!(CodeIntel::validate("x", 0, 1), Ok(Coordinate::new(0, 1)));
    }

    // ── Tiers ──

    #[test]
    fn semantic_answer_wins() {
        let src = "def train(data):\n    pass\n\ntr";
        let items = intel().completion(src, 3, 2);
        assert_eq!(items[0].name, "train");
        assert_eq!(items[0].insert_text, "train(");
    }

    #[test]
    fn sdk_attribute_falls_back_sorted() {
        let src = "import kfp\nkfp.";
        let names: Vec<String> = intel()
            .completion(src, 1, 4)
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, ["client", "compiler", "components", "dsl", "v2"]);
    }

    #[test]
    fn hover_falls_back_for_sdk_member() {
        let src = "import kfp\nkfp.dsl.pipeline";
        let hover = intel().hover(src, 1, 10).unwrap();
        assert!(hover.contents.starts_with("kfp.dsl.pipeline\n\n"));
    }

    #[test]
    fn definition_in_buffer() {
        let src = "value = 1\nprint(value)";
        let defs = intel().definition(src, 1, 8);
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].uri, "untitled.py");
        assert_eq!(defs[0].range.start.line, 0);
    }

    #[test]
    fn invalid_input_is_empty() {
        let intel = intel();
        assert!(intel.completion("", 0, 0).is_empty());
        assert!(intel.completion("import kfp\nkfp.", 1, -1).is_empty());
        assert!(intel.hover("x", 9, 0).is_none());
        assert!(intel.definition("x", 0, 9).is_empty());
    }
}
