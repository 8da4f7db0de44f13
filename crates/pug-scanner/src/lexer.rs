//! Cursor interface the scanner reads through, plus an in-memory source.
//!
//! The scanner never sees the whole input. It looks at one character at a
//! time and decides for each whether it belongs to the token ([`Lexer::advance`])
//! or is leading trivia ([`Lexer::skip`]). [`Lexer::mark_end`] pins the token's
//! end; characters consumed after the last mark are lookahead only.

use crate::token::Span;

/// Cursor over the input as seen by the scanner.
pub trait Lexer {
    /// Next character without consuming it, `None` at end of input.
    fn peek(&self) -> Option<char>;

    /// Consume the lookahead as part of the token.
    fn advance(&mut self);

    /// Consume the lookahead as trivia, outside the token text.
    fn skip(&mut self);

    /// Record the current position as the token end. The last call wins.
    fn mark_end(&mut self);

    /// 0-based column of the lookahead.
    fn current_column(&self) -> usize;

    fn at_end_of_input(&self) -> bool {
        self.peek().is_none()
    }
}

/// A point in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    /// Byte offset.
    pub offset: usize,
    /// 1-based line.
    pub line: usize,
    /// 0-based column, counted in characters.
    pub column: usize,
}

impl Position {
    const START: Position = Position {
        offset: 0,
        line: 1,
        column: 0,
    };
}

/// [`Lexer`] over a string held in memory.
///
/// Call [`begin_token`](Self::begin_token) before handing it to the scanner
/// and [`finish_token`](Self::finish_token) after a token was found.
pub struct SourceLexer<'a> {
    source: &'a str,
    pos: Position,
    token_start: Position,
    marked_end: Option<Position>,
    has_text: bool,
}

impl<'a> SourceLexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            pos: Position::START,
            token_start: Position::START,
            marked_end: None,
            has_text: false,
        }
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    pub fn position(&self) -> Position {
        self.pos
    }

    /// Unread remainder of the source.
    pub fn rest(&self) -> &'a str {
        &self.source[self.pos.offset..]
    }

    pub fn slice(&self, span: Span) -> &'a str {
        &self.source[span.start..span.end]
    }

    /// Start a new token at the current position.
    pub fn begin_token(&mut self) {
        self.token_start = self.pos;
        self.marked_end = None;
        self.has_text = false;
    }

    /// Close the token and move the cursor to its end.
    ///
    /// Without a [`mark_end`](Lexer::mark_end) the token ends at the current
    /// position. Trivia skipped past the marked end collapses the token to a
    /// zero-width span at that end.
    pub fn finish_token(&mut self) -> Span {
        let end = self.marked_end.unwrap_or(self.pos);
        let start = if self.token_start.offset > end.offset {
            end
        } else {
            self.token_start
        };
        self.pos = end;
        self.begin_token();
        Span::new(start.offset, end.offset, start.line, start.column)
    }

    /// Move the cursor back (or forward) to a position seen earlier.
    pub fn reset_to(&mut self, position: Position) {
        self.pos = position;
        self.begin_token();
    }

    /// Consume one character on behalf of the host grammar.
    pub fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.step(c);
        Some(c)
    }

    fn step(&mut self, c: char) {
        self.pos.offset += c.len_utf8();
        if c == '\n' {
            self.pos.line += 1;
            self.pos.column = 0;
        } else {
            self.pos.column += 1;
        }
    }
}

impl Lexer for SourceLexer<'_> {
    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek() {
            self.step(c);
            self.has_text = true;
        }
    }

    fn skip(&mut self) {
        if let Some(c) = self.peek() {
            self.step(c);
            if !self.has_text {
                self.token_start = self.pos;
            }
        }
    }

    fn mark_end(&mut self) {
        self.marked_end = Some(self.pos);
    }

    fn current_column(&self) -> usize {
        self.pos.column
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_source_is_at_end() {
        let lexer = SourceLexer::new("");
        assert!(lexer.at_end_of_input());
        assert_eq!(lexer.peek(), None);
        assert_eq!(lexer.current_column(), 0);
    }

    #[test]
    fn test_advance_tracks_lines_and_columns() {
        let mut lexer = SourceLexer::new("ab\ncd");
        lexer.advance();
        lexer.advance();
        assert_eq!(lexer.current_column(), 2);
        lexer.advance();
        assert_eq!(
            lexer.position(),
            Position {
                offset: 3,
                line: 2,
                column: 0
            }
        );
        assert_eq!(lexer.peek(), Some('c'));
    }

    #[test]
    fn test_advance_past_end_is_noop() {
        let mut lexer = SourceLexer::new("a");
        lexer.advance();
        lexer.advance();
        assert_eq!(lexer.position().offset, 1);
    }

    #[test]
    fn test_multibyte_offsets() {
        let mut lexer = SourceLexer::new("é=1");
        lexer.advance();
        assert_eq!(lexer.position().offset, 2);
        assert_eq!(lexer.current_column(), 1);
        assert_eq!(lexer.peek(), Some('='));
    }

    #[test]
    fn test_token_without_mark_ends_at_cursor() {
        let mut lexer = SourceLexer::new("abc def");
        lexer.begin_token();
        lexer.advance();
        lexer.advance();
        lexer.advance();
        let span = lexer.finish_token();
        assert_eq!(span, Span::new(0, 3, 1, 0));
        assert_eq!(lexer.slice(span), "abc");
    }

    #[test]
    fn test_mark_end_discards_lookahead() {
        let mut lexer = SourceLexer::new("ab  cd");
        lexer.begin_token();
        lexer.advance();
        lexer.advance();
        lexer.mark_end();
        lexer.advance();
        lexer.advance();
        let span = lexer.finish_token();
        assert_eq!(lexer.slice(span), "ab");
        assert_eq!(lexer.rest(), "  cd");
    }

    #[test]
    fn test_leading_skip_moves_start() {
        let mut lexer = SourceLexer::new("\nfoo");
        lexer.begin_token();
        lexer.skip();
        let span = lexer.finish_token();
        assert_eq!(span, Span::new(1, 1, 2, 0));
        assert_eq!(lexer.rest(), "foo");
    }

    #[test]
    fn test_skip_after_mark_is_zero_width() {
        let mut lexer = SourceLexer::new("    foo");
        lexer.begin_token();
        lexer.mark_end();
        lexer.skip();
        lexer.skip();
        let span = lexer.finish_token();
        assert!(span.is_empty());
        assert_eq!(span.start, 0);
        assert_eq!(lexer.rest(), "    foo");
    }

    #[test]
    fn test_reset_to_rewinds() {
        let mut lexer = SourceLexer::new("abc");
        let start = lexer.position();
        lexer.advance();
        lexer.advance();
        lexer.reset_to(start);
        assert_eq!(lexer.rest(), "abc");
    }

    #[test]
    fn test_bump() {
        let mut lexer = SourceLexer::new("x");
        assert_eq!(lexer.bump(), Some('x'));
        assert_eq!(lexer.bump(), None);
    }
}
