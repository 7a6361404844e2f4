//! Coordinates shared by the index and the editor boundary.
//!
//! The index works in one-based lines and passes columns through untouched;
//! the editor speaks zero-based LSP positions. Every value that crosses the
//! boundary goes through [`to_internal_point`] / [`to_editor_position`] (or
//! their range counterparts), which shift the line axis only.

use std::fmt;

use tower_lsp::lsp_types::{Position, Range};

/// Column budget of a single line in [`Span::size`].
///
/// A multi-line span always ranks larger than a single-line one as long as no
/// line is wider than this many columns. Wider lines make the ranking
/// approximate.
pub const LINE_WEIGHT: i64 = 8_000;

/// A location in source text: one-based line, column as reported by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Point {
    pub line: u32,
    pub column: u32,
}

impl Point {
    pub const fn new(
        line: u32,
        column: u32,
    ) -> Self {
        Self {
            line,
            column,
        }
    }
}

impl fmt::Display for Point {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Inclusive source range in internal coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: Point,
    pub end: Point,
}

impl Span {
    pub const fn new(
        start: Point,
        end: Point,
    ) -> Self {
        Self {
            start,
            end,
        }
    }

    /// Empty span located at a single point.
    pub const fn at(point: Point) -> Self {
        Self {
            start: point,
            end: point,
        }
    }

    pub fn contains_point(
        &self,
        point: Point,
    ) -> bool {
        self.start <= point && point <= self.end
    }

    pub fn contains_span(
        &self,
        other: &Span,
    ) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    pub fn overlaps(
        &self,
        other: &Span,
    ) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// Ranking weight used to pick the narrowest of several containing spans.
    ///
    /// `(end_line - start_line) * LINE_WEIGHT + (end_column - start_column)`.
    pub fn size(&self) -> i64 {
        let lines = i64::from(self.end.line) - i64::from(self.start.line);
        let columns = i64::from(self.end.column) - i64::from(self.start.column);
        lines * LINE_WEIGHT + columns
    }
}

impl fmt::Display for Span {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

pub fn to_internal_point(position: Position) -> Point {
    Point::new(position.line.saturating_add(1), position.character)
}

pub fn to_internal_span(range: Range) -> Span {
    Span::new(to_internal_point(range.start), to_internal_point(range.end))
}

pub fn to_editor_position(point: Point) -> Position {
    Position::new(point.line.saturating_sub(1), point.column)
}

pub fn to_editor_range(span: Span) -> Range {
    Range::new(to_editor_position(span.start), to_editor_position(span.end))
}

/// Convert a byte offset into an internal point with a UTF-16 column.
///
/// Offsets past the end of `source` clamp to the last position.
pub fn point_from_byte_offset(
    source: &str,
    byte_offset: usize,
) -> Point {
    let mut remaining = byte_offset.min(source.len());

    for (line_index, line) in source.split('\n').enumerate() {
        let line_len = line.len();
        if remaining <= line_len {
            let mut utf16_col = 0u32;
            let mut byte_count = 0usize;
            for ch in line.chars() {
                if byte_count >= remaining {
                    break;
                }
                utf16_col += ch.len_utf16() as u32;
                byte_count += ch.len_utf8();
            }
            return Point::new(line_index as u32 + 1, utf16_col);
        }
        remaining = remaining.saturating_sub(line_len + 1);
    }

    Point::new(1, 0)
}

/// Internal span covering `source[range]`.
pub fn span_from_byte_range(
    source: &str,
    range: std::ops::Range<usize>,
) -> Span {
    Span::new(point_from_byte_offset(source, range.start), point_from_byte_offset(source, range.end))
}

/// Byte offset of an internal point, or `None` when the line does not exist.
pub fn byte_offset_from_point(
    source: &str,
    point: Point,
) -> Option<usize> {
    let line_idx = point.line.checked_sub(1)? as usize;
    let mut lines = source.split('\n');
    let mut byte_offset = 0usize;

    for _ in 0..line_idx {
        let line = lines.next()?;
        byte_offset += line.len() + 1;
    }

    let line = lines.next()?;
    let mut utf16_offset = 0u32;
    let mut char_offset = 0usize;
    for ch in line.chars() {
        if utf16_offset >= point.column {
            break;
        }
        utf16_offset += ch.len_utf16() as u32;
        char_offset += ch.len_utf8();
    }

    Some(byte_offset + char_offset)
}

/// Source text covered by `span`, if both ends resolve.
pub fn slice_span(
    source: &str,
    span: Span,
) -> Option<&str> {
    let start = byte_offset_from_point(source, span.start)?;
    let end = byte_offset_from_point(source, span.end)?;
    source.get(start..end.max(start))
}

#[cfg(test)]
#[path = "../tests/src/text_pos_tests.rs"]
mod tests;
