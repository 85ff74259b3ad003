use nom_locate::LocatedSpan;

pub type Span<'a> = LocatedSpan<&'a str>;

#[derive(PartialEq, Eq, PartialOrd, Ord, Debug, Clone, Copy, Hash)]
pub struct Position {
    pub line: u32,
    pub column: usize,
    /// Byte offset into the source text.
    pub offset: usize,
}

impl Default for Position {
    fn default() -> Self {
        Position {
            line: 1,
            column: 1,
            offset: 0,
        }
    }
}

impl Position {
    pub fn new(line: u32, column: usize, offset: usize) -> Self {
        Position {
            line,
            column,
            offset,
        }
    }
}

#[derive(PartialEq, Eq, PartialOrd, Ord, Debug, Clone, Copy, Default, Hash)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub fn new(start: Position, end: Position) -> Self {
        Range { start, end }
    }

    pub fn contains(&self, position: &Position) -> bool {
        (self.start.line < position.line
            || (self.start.line == position.line && self.start.column <= position.column))
            && (self.end.line > position.line
                || (self.end.line == position.line && self.end.column >= position.column))
    }

    /// Returns the slice of `source` covered by this range, if it is in bounds.
    pub fn slice<'a>(&self, source: &'a str) -> Option<&'a str> {
        source.get(self.start.offset..self.end.offset)
    }

    /// Number of bytes covered by this range.
    pub fn len(&self) -> usize {
        self.end.offset.saturating_sub(self.start.offset)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Smallest range covering both `self` and `other`.
    pub fn join(&self, other: &Range) -> Range {
        Range {
            start: std::cmp::min(self.start, other.start),
            end: std::cmp::max(self.end, other.end),
        }
    }
}

impl<'a> From<Span<'a>> for Position {
    fn from(span: Span<'a>) -> Self {
        Position {
            line: span.location_line(),
            column: span.get_utf8_column(),
            offset: span.location_offset(),
        }
    }
}

impl<'a> From<Span<'a>> for Range {
    fn from(span: Span<'a>) -> Self {
        let fragment = span.fragment();

        Range {
            start: Position::from(span),
            end: Position {
                line: span.location_line(),
                column: span.get_utf8_column() + fragment.chars().count(),
                offset: span.location_offset() + fragment.len(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn range(start: (u32, usize, usize), end: (u32, usize, usize)) -> Range {
        Range::new(
            Position::new(start.0, start.1, start.2),
            Position::new(end.0, end.1, end.2),
        )
    }

    #[rstest]
    #[case(Position::new(1, 1, 0), true)]
    #[case(Position::new(1, 5, 4), true)]
    #[case(Position::new(2, 1, 10), false)]
    fn test_contains(#[case] position: Position, #[case] expected: bool) {
        let r = range((1, 1, 0), (1, 6, 5));
        assert_eq!(r.contains(&position), expected);
    }

    #[test]
    fn test_slice() {
        let r = range((1, 5, 4), (1, 9, 8));
        assert_eq!(r.slice("let item = 1;"), Some("item"));
        assert_eq!(r.len(), 4);
    }

    #[test]
    fn test_slice_out_of_bounds() {
        let r = range((1, 1, 0), (1, 100, 99));
        assert_eq!(r.slice("short"), None);
    }

    #[test]
    fn test_join() {
        let a = range((1, 1, 0), (1, 3, 2));
        let b = range((1, 7, 6), (1, 9, 8));
        assert_eq!(a.join(&b), range((1, 1, 0), (1, 9, 8)));
    }

    #[test]
    fn test_from_span() {
        let span = Span::new("value");
        let r: Range = span.into();
        assert_eq!(r, range((1, 1, 0), (1, 6, 5)));
    }
}
