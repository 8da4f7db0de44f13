//! Host-side driver: one source, one scanner, one token per call.
//!
//! [`Session`] plays the part of the parsing engine around the scanner. It
//! begins and finishes tokens on the [`SourceLexer`], rolls back the cursor
//! and scanner state when a scan finds nothing, and can checkpoint both so a
//! parse can be resumed from an earlier token.

use tracing::debug;

use crate::lexer::{Lexer, Position, SourceLexer};
use crate::scanner::Scanner;
use crate::token::{Span, Token, TokenKind, ValidSymbols};
use crate::ScanError;

/// Saved cursor position plus serialized scanner state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkpoint {
    position: Position,
    state: Vec<u8>,
}

impl Checkpoint {
    pub fn position(&self) -> Position {
        self.position
    }

    pub fn state_bytes(&self) -> &[u8] {
        &self.state
    }
}

pub struct Session<'a> {
    lexer: SourceLexer<'a>,
    scanner: Scanner,
}

impl<'a> Session<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            lexer: SourceLexer::new(source),
            scanner: Scanner::new(),
        }
    }

    /// Layout tokens for a whole document. See [`Outline`].
    pub fn outline(source: &'a str) -> Outline<'a> {
        Outline {
            session: Session::new(source),
            finished: false,
        }
    }

    /// Attribute tokens for a run of attribute values. See [`Attributes`].
    pub fn attributes(source: &'a str, valid: ValidSymbols) -> Attributes<'a> {
        Attributes {
            session: Session::new(source),
            valid,
        }
    }

    /// Ask the scanner for one token at the current position.
    ///
    /// On `None` the cursor and scanner state are exactly as before the call.
    pub fn scan(&mut self, valid: ValidSymbols) -> Option<Token> {
        let start = self.lexer.position();
        let saved = self.scanner.state().clone();

        self.lexer.begin_token();
        match self.scanner.scan(&mut self.lexer, valid) {
            Some(kind) => Some(Token::new(kind, self.lexer.finish_token())),
            None => {
                self.lexer.reset_to(start);
                self.scanner.restore(saved);
                None
            }
        }
    }

    /// Consume one character as grammar text, outside the scanner.
    pub fn bump(&mut self) -> Option<char> {
        self.lexer.bump()
    }

    /// Consume up to (not including) the next newline.
    pub fn skip_line(&mut self) -> &'a str {
        let start = self.lexer.position().offset;
        while self.lexer.peek().is_some_and(|c| c != '\n') {
            self.lexer.bump();
        }
        &self.lexer.source()[start..self.lexer.position().offset]
    }

    /// Zero-width `DEDENT` for an indentation level still open at end of input.
    pub fn close_indent(&mut self) -> Option<Token> {
        if !self.scanner.close_indent() {
            return None;
        }
        let pos = self.lexer.position();
        let span = Span::new(pos.offset, pos.offset, pos.line, pos.column);
        Some(Token::new(TokenKind::Dedent, span))
    }

    pub fn is_at_end(&self) -> bool {
        self.lexer.at_end_of_input()
    }

    pub fn position(&self) -> Position {
        self.lexer.position()
    }

    pub fn rest(&self) -> &'a str {
        self.lexer.rest()
    }

    pub fn text(&self, span: Span) -> &'a str {
        self.lexer.slice(span)
    }

    pub fn scanner(&self) -> &Scanner {
        &self.scanner
    }

    pub fn checkpoint(&self) -> Result<Checkpoint, ScanError> {
        let checkpoint = Checkpoint {
            position: self.lexer.position(),
            state: self.scanner.serialize()?,
        };
        debug!(
            offset = checkpoint.position.offset,
            bytes = checkpoint.state.len(),
            "checkpoint"
        );
        Ok(checkpoint)
    }

    /// Continue from a checkpoint taken on this session's source.
    pub fn resume(&mut self, checkpoint: &Checkpoint) -> Result<(), ScanError> {
        self.scanner.deserialize(&checkpoint.state)?;
        self.lexer.reset_to(checkpoint.position);
        debug!(offset = checkpoint.position.offset, "resumed from checkpoint");
        Ok(())
    }
}

/// Layout tokens of a document.
///
/// Stands in for the grammar the way it uses the scanner between tags:
/// `NEWLINE`, `INDENT` and `DEDENT` are valid everywhere, any other line
/// content is consumed as text, and levels still open at end of input are
/// closed with trailing `DEDENT`s.
pub struct Outline<'a> {
    session: Session<'a>,
    finished: bool,
}

impl<'a> Outline<'a> {
    pub fn session(&self) -> &Session<'a> {
        &self.session
    }
}

impl Iterator for Outline<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        loop {
            if self.finished {
                return self.session.close_indent();
            }
            if let Some(token) = self.session.scan(ValidSymbols::LAYOUT) {
                return Some(token);
            }
            if self.session.is_at_end() {
                self.finished = true;
                continue;
            }
            self.session.skip_line();
        }
    }
}

/// Attribute tokens of a run of attribute values, such as the inside of
/// `tag(...)`.
///
/// Characters the scanner leaves behind (`,`, the closing `)`, stray
/// punctuation) are consumed one at a time as grammar text.
pub struct Attributes<'a> {
    session: Session<'a>,
    valid: ValidSymbols,
}

impl<'a> Attributes<'a> {
    pub fn session(&self) -> &Session<'a> {
        &self.session
    }
}

impl Iterator for Attributes<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        while !self.session.is_at_end() {
            if let Some(token) = self.session.scan(self.valid) {
                if token.span.is_empty() {
                    self.session.bump();
                }
                return Some(token);
            }
            self.session.bump();
        }
        None
    }
}
