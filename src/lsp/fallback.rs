//! Dictionary tier: answers attribute access on known SDK namespaces from
//! the [`KnowledgeBase`] when the semantic tier has nothing.
//!
//! Works on raw text only. Nothing here parses Python; a miss of any kind is
//! just an empty answer.

use std::sync::Arc;

use lsp_types::{Position, Range};
use regex::Regex;
use tracing::debug;

use super::knowledge::KnowledgeBase;
use super::position::{line_at, line_prefix, Coordinate};
use super::{HoverResult, Symbol};

/// Longest trailing dotted path that ends in a dot, plus the partial member.
const TRAILING_ACCESS: &str = r"([A-Za-z_]\w*(?:\.[A-Za-z_]\w*)*)\s*\.\s*(\w*)$";

pub struct FallbackResolver {
    kb: Arc<KnowledgeBase>,
    access: Regex,
}

impl FallbackResolver {
    pub fn new(kb: Arc<KnowledgeBase>) -> Result<Self, regex::Error> {
        Ok(Self {
            kb,
            access: Regex::new(TRAILING_ACCESS)?,
        })
    }

    /// Split the text before the cursor into `(namespace, partial)`.
    pub fn trailing_access<'a>(&self, prefix: &'a str) -> Option<(&'a str, &'a str)> {
        let caps = self.access.captures(prefix)?;
        let namespace = caps.get(1)?.as_str();
        let partial = caps.get(2).map_or("", |m| m.as_str());
        Some((namespace, partial))
    }

    /// Members of the namespace being accessed at `at`, in table order.
    /// Empty unless the namespace's SDK is imported by `source`.
    pub fn complete(&self, source: &str, at: Coordinate) -> Vec<Symbol> {
        if !self.kb.has_import_marker(source) {
            return Vec::new();
        }
        let Some(prefix) = line_prefix(source, at) else {
            return Vec::new();
        };
        let Some((namespace, partial)) = self.trailing_access(prefix) else {
            return Vec::new();
        };
        let imported = self
            .kb
            .sdk_of(namespace)
            .is_some_and(|sdk| sdk.is_imported_by(source));
        if !imported {
            let active: Vec<&str> = self
                .kb
                .active_sdks(source)
                .iter()
                .map(|sdk| sdk.name.as_str())
                .collect();
            debug!(namespace, ?active, "fallback miss");
            return Vec::new();
        }
        let symbols = self.kb.lookup(namespace, partial);
        debug!(namespace, partial, count = symbols.len(), "fallback completions");
        symbols
    }

    /// One-line doc for the dotted SDK path under the cursor.
    pub fn hover(&self, source: &str, at: Coordinate) -> Option<HoverResult> {
        if !self.kb.has_import_marker(source) {
            return None;
        }
        let line = line_at(source, at.line)?;
        let (start, end) = dotted_path_at(line, at.character)?;
        let path: String = line.chars().skip(start).take(end - start).collect();
        let (namespace, name) = path.rsplit_once('.')?;
        let sdk = self.kb.sdk_of(namespace)?;
        if !sdk.is_imported_by(source) {
            return None;
        }
        let member = self.kb.member(namespace, name)?;
        let contents = if member.doc.is_empty() {
            path.clone()
        } else {
            format!("{path}\n\n{}", member.doc)
        };
        debug!(path = %path, "fallback hover");
        let line_no = u32::try_from(at.line).ok()?;
        Some(HoverResult {
            contents,
            range: Some(Range::new(
                Position::new(line_no, u32::try_from(start).ok()?),
                Position::new(line_no, u32::try_from(end).ok()?),
            )),
        })
    }
}

fn is_ident_char(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}

/// Character span of the dotted path ending in the segment under `character`.
/// Text after that segment is ignored: on `dsl` in `kfp.dsl.pipeline` the
/// path is `kfp.dsl`.
fn dotted_path_at(line: &str, character: usize) -> Option<(usize, usize)> {
    let chars: Vec<char> = line.chars().collect();
    if character > chars.len() {
        return None;
    }
    let mut end = character;
    while end < chars.len() && is_ident_char(chars[end]) {
        end += 1;
    }
    let mut start = character;
    while start > 0 && (is_ident_char(chars[start - 1]) || chars[start - 1] == '.') {
        start -= 1;
    }
    while start < end && chars[start] == '.' {
        start += 1;
    }
    (start < end && is_ident_char(chars[end - 1])).then_some((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lsp::SymbolKind;

    fn resolver() -> FallbackResolver {
        FallbackResolver::new(Arc::new(KnowledgeBase::builtin().unwrap())).unwrap()
    }

    fn labels(symbols: &[Symbol]) -> Vec<&str> {
        symbols.iter().map(|s| s.name.as_str()).collect()
    }

    // ── Trailing access ──

    #[test]
    fn splits_namespace_and_partial() {
        let r = resolver();
        assert_eq!(r.trailing_access("kfp.dsl."), Some(("kfp.dsl", "")));
        assert_eq!(r.trailing_access("kfp.Cl"), Some(("kfp", "Cl")));
        assert_eq!(r.trailing_access("    x = kfp . dsl . pi"), Some(("dsl", "pi")));
        assert_eq!(r.trailing_access("@kfp.dsl.pipe"), Some(("kfp.dsl", "pipe")));
        assert_eq!(r.trailing_access("kfp"), None);
        assert_eq!(r.trailing_access(""), None);
    }

    // ── Completion ──

    #[test]
    fn root_namespace_after_import() {
        let src = "import kfp\nkfp.";
        let items = resolver().complete(src, Coordinate::new(1, 4));
        assert_eq!(
            labels(&items),
            ["dsl", "components", "client", "compiler", "v2"]
        );
        assert!(items.iter().all(|s| s.kind == SymbolKind::Function));
        assert!(items.iter().all(|s| s.detail == "kfp"));
    }

    #[test]
    fn nested_namespace_with_partial() {
        let src = "from kfp import dsl\n@kfp.dsl.p";
        let items = resolver().complete(src, Coordinate::new(1, 10));
        assert_eq!(labels(&items), ["pipeline"]);
        assert_eq!(
            items[0].documentation,
            "Decorator that turns a function into a pipeline"
        );
    }

    #[test]
    fn partial_matching_nothing_is_empty() {
        let src = "import kfp\nkfp.Cl";
        assert!(resolver().complete(src, Coordinate::new(1, 6)).is_empty());
    }

    #[test]
    fn no_marker_never_answers() {
        let src = "kfp.\nkfp.dsl.\nnp.";
        let r = resolver();
        for (line, text) in src.lines().enumerate() {
            for character in 0..=text.chars().count() {
                assert!(r.complete(src, Coordinate::new(line, character)).is_empty());
            }
        }
    }

    #[test]
    fn sdk_must_be_the_imported_one() {
        // numpy is imported, kfp is not.
        let src = "import numpy as np\nkfp.";
        assert!(resolver().complete(src, Coordinate::new(1, 4)).is_empty());

        let src = "import numpy as np\nnp.ze";
        let items = resolver().complete(src, Coordinate::new(1, 5));
        assert_eq!(labels(&items), ["zeros"]);
    }

    #[test]
    fn unknown_namespace_is_empty() {
        let src = "import kfp\nkfp.nope.";
        assert!(resolver().complete(src, Coordinate::new(1, 9)).is_empty());
    }

    // ── Hover ──

    #[test]
    fn hover_on_sdk_member() {
        let src = "import kfp\n@kfp.dsl.pipeline(name='x')";
        let hover = resolver().hover(src, Coordinate::new(1, 12)).unwrap();
        assert_eq!(
            hover.contents,
            "kfp.dsl.pipeline\n\nDecorator that turns a function into a pipeline"
        );
        let range = hover.range.unwrap();
        assert_eq!(range.start, Position::new(1, 1));
        assert_eq!(range.end, Position::new(1, 17));
    }

    #[test]
    fn hover_on_inner_segment_stops_there() {
        let src = "import kfp\nkfp.dsl.pipeline";
        let hover = resolver().hover(src, Coordinate::new(1, 5)).unwrap();
        assert!(hover.contents.starts_with("kfp.dsl\n\n"));
    }

    #[test]
    fn hover_misses() {
        let r = resolver();
        assert!(r.hover("kfp.dsl.pipeline", Coordinate::new(0, 10)).is_none());
        assert!(r.hover("import kfp\nkfp", Coordinate::new(1, 1)).is_none());
        assert!(r.hover("import kfp\nkfp.dsl.nope", Coordinate::new(1, 10)).is_none());
        assert!(r.hover("import kfp\n   ", Coordinate::new(1, 2)).is_none());
    }

    #[test]
    fn dotted_path_bounds() {
        assert_eq!(dotted_path_at("x = a.b.c", 7), Some((4, 7)));
        assert_eq!(dotted_path_at("x = a.b.c", 9), Some((4, 9)));
        assert_eq!(dotted_path_at("x = .b", 5), Some((5, 6)));
        assert_eq!(dotted_path_at("a.", 2), None);
        assert_eq!(dotted_path_at("ab", 5), None);
    }
}
