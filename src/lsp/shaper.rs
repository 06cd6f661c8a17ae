//! Result shaping: one schema out of two tiers.

use super::{DefinitionLocation, HoverResult, Symbol, SymbolKind, MAX_COMPLETIONS};

/// Which tier produced a result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    /// Engine order is relevance order and is kept.
    Semantic,
    /// Dictionary results carry no ranking and are sorted by name.
    Fallback,
}

/// Map engine type vocabulary onto [`SymbolKind`]. Unknown types are variables.
pub fn kind_for_type(type_name: &str) -> SymbolKind {
    match type_name {
        "module" => SymbolKind::Module,
        "class" | "type" => SymbolKind::Class,
        "function" | "method" | "property" => SymbolKind::Function,
        "keyword" => SymbolKind::Keyword,
        _ => SymbolKind::Variable,
    }
}

pub fn shape_completions(tier: Tier, symbols: Vec<Symbol>) -> Vec<Symbol> {
    let mut out: Vec<Symbol> = symbols
        .into_iter()
        .filter(|s| !s.name.is_empty())
        .map(|mut s| {
            if s.insert_text.is_empty() {
                s.insert_text = s.name.clone();
            }
            s
        })
        .collect();
    if tier == Tier::Fallback {
        out.sort_by(|a, b| a.name.cmp(&b.name));
    }
    out.truncate(MAX_COMPLETIONS);
    out
}

/// Blank hover text is no hover.
pub fn shape_hover(hover: Option<HoverResult>) -> Option<HoverResult> {
    hover.filter(|h| !h.contents.trim().is_empty())
}

/// Drop exact duplicates, keeping first occurrence.
pub fn shape_definitions(locations: Vec<DefinitionLocation>) -> Vec<DefinitionLocation> {
    let mut out: Vec<DefinitionLocation> = Vec::with_capacity(locations.len());
    for loc in locations {
        if !out.contains(&loc) {
            out.push(loc);
        }
    }
    out
}
