use nom_locate::LocatedSpan;

/// A span over the expression source being lexed.
pub type Span<'a> = LocatedSpan<&'a str>;

/// A position in the expression source, as a line and column (both 1-based).
#[derive(Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Clone, Hash)]
pub struct Position {
    pub line: u32,
    pub column: usize,
}

impl Default for Position {
    fn default() -> Self {
        Position { line: 1, column: 1 }
    }
}

impl Position {
    pub fn new(line: u32, column: usize) -> Self {
        Position { line, column }
    }
}

/// A range in the expression source, from a start position to an end position.
#[derive(Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Clone, Default, Hash)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl<'a> From<Span<'a>> for Range {
    fn from(span: Span<'a>) -> Self {
        Range {
            start: Position {
                line: span.location_line(),
                column: span.get_utf8_column(),
            },
            end: Position {
                line: span.location_line(),
                column: span.get_utf8_column() + span.fragment().chars().count(),
            },
        }
    }
}

impl<'a> From<Span<'a>> for Position {
    fn from(span: Span<'a>) -> Self {
        Position {
            line: span.location_line(),
            column: span.get_utf8_column(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_from_span() {
        let span = Span::new("a + b");
        let range = Range::from(span);
        assert_eq!(range.start, Position::new(1, 1));
        assert_eq!(range.end, Position::new(1, 6));
    }

    #[test]
    fn test_default_position() {
        assert_eq!(Position::default(), Position::new(1, 1));
    }
}
