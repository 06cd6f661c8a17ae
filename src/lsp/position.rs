//! Coordinate mapping between the editor and the analysis engine.
//!
//! Editor coordinates are zero-indexed on both axes. The engine counts lines
//! from one and characters from zero. Both count characters in Unicode code
//! points; byte columns only appear inside the tree-sitter engine.
//!
//! The knowledge-base path never goes through [`to_engine`]: it slices raw
//! text with [`line_prefix`].

use thiserror::Error;

/// Bad or missing coordinates. Always degrades to an empty result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallerInputError {
    #[error("empty source text")]
    EmptySource,

    #[error("negative coordinate: line {line}, character {character}")]
    Negative { line: i64, character: i64 },

    #[error("line {line} out of range (buffer has {count} lines)")]
    LineOutOfRange { line: usize, count: usize },

    #[error("character {character} past end of line {line} (length {len})")]
    CharacterOutOfRange {
        line: usize,
        character: usize,
        len: usize,
    },
}

/// A validated editor coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Coordinate {
    pub line: usize,
    pub character: usize,
}

impl Coordinate {
    pub fn new(line: usize, character: usize) -> Self {
        Self { line, character }
    }

    /// Validate raw request values.
    pub fn from_request(line: i64, character: i64) -> Result<Self, CallerInputError> {
        let (Ok(l), Ok(c)) = (usize::try_from(line), usize::try_from(character)) else {
            return Err(CallerInputError::Negative { line, character });
        };
        Ok(Self::new(l, c))
    }

    /// Check `0 <= line < lineCount` and `0 <= character <= length(line)`.
    pub fn check_bounds(&self, source: &str) -> Result<(), CallerInputError> {
        let Some(text) = line_at(source, self.line) else {
            return Err(CallerInputError::LineOutOfRange {
                line: self.line,
                count: line_count(source),
            });
        };
        let len = text.chars().count();
        if self.character > len {
            return Err(CallerInputError::CharacterOutOfRange {
                line: self.line,
                character: self.character,
                len,
            });
        }
        Ok(())
    }
}

/// Engine-native coordinate: one-indexed line, zero-indexed column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EngineCoordinate {
    pub line: usize,
    pub column: usize,
}

impl EngineCoordinate {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// Editor -> engine.
pub fn to_engine(at: Coordinate) -> EngineCoordinate {
    EngineCoordinate::new(at.line + 1, at.character)
}

/// Engine -> editor. Engine line 0 would map to a negative editor line.
pub fn from_engine(at: EngineCoordinate) -> Result<Coordinate, CallerInputError> {
    match at.line.checked_sub(1) {
        Some(line) => Ok(Coordinate::new(line, at.column)),
        None => Err(CallerInputError::Negative {
            line: -1,
            character: i64::try_from(at.column).unwrap_or(i64::MAX),
        }),
    }
}

/// Lines of `source`, split on `\n` with a trailing `\r` removed.
pub fn lines(source: &str) -> impl Iterator<Item = &str> {
    source
        .split('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
}

pub fn line_count(source: &str) -> usize {
    lines(source).count()
}

pub fn line_at(source: &str, line: usize) -> Option<&str> {
    lines(source).nth(line)
}

/// Text of the cursor line up to the cursor.
pub fn line_prefix(source: &str, at: Coordinate) -> Option<&str> {
    let text = line_at(source, at.line)?;
    let end = char_to_byte(text, at.character)?;
    Some(&text[..end])
}

/// Byte offset of code point `character` in `line`. `character == len` maps to `line.len()`.
pub fn char_to_byte(line: &str, character: usize) -> Option<usize> {
    line.char_indices()
        .map(|(b, _)| b)
        .chain(std::iter::once(line.len()))
        .nth(character)
}

/// Code-point column of byte offset `byte` in `line`.
pub fn byte_to_char(line: &str, byte: usize) -> usize {
    line.char_indices().take_while(|(b, _)| *b < byte).count()
}

/// Absolute byte offset of `at` in `source`.
pub fn byte_offset(source: &str, at: Coordinate) -> Option<usize> {
    let mut offset = 0;
    for (i, raw) in source.split('\n').enumerate() {
        if i == at.line {
            let text = raw.strip_suffix('\r').unwrap_or(raw);
            return char_to_byte(text, at.character).map(|b| offset + b);
        }
        offset += raw.len() + 1;
    }
    None
}
