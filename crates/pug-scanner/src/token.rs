use std::fmt;

use bitflags::bitflags;

/// Byte range of a token in the source text.
///
/// `line` is 1-based and `column` is 0-based, both describing `start`.
/// Layout tokens are zero-width, so `start == end` for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
}

impl Span {
    pub fn new(start: usize, end: usize, line: usize, column: usize) -> Self {
        Self {
            start,
            end,
            line,
            column,
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Token kinds the external scanner can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Newline,
    Indent,
    Dedent,
    /// Free-form script expression: identifiers, operators, brackets.
    JsAttr,
    /// Quoted run of word characters and escapes only.
    String,
}

impl TokenKind {
    /// Grammar-facing name of the kind.
    pub fn name(self) -> &'static str {
        match self {
            TokenKind::Newline => "NEWLINE",
            TokenKind::Indent => "INDENT",
            TokenKind::Dedent => "DEDENT",
            TokenKind::JsAttr => "JS_ATTR",
            TokenKind::String => "STRING",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

bitflags! {
    /// Token kinds the grammar is willing to accept at the current position.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct ValidSymbols: u8 {
        const NEWLINE = 1 << 0;
        const INDENT = 1 << 1;
        const DEDENT = 1 << 2;
        const JS_ATTR = 1 << 3;
        const STRING = 1 << 4;

        /// Everything the indentation protocol can produce.
        const LAYOUT = Self::NEWLINE.bits() | Self::INDENT.bits() | Self::DEDENT.bits();
        /// Everything the attribute protocol can produce.
        const ATTRIBUTE = Self::JS_ATTR.bits() | Self::STRING.bits();
    }
}

impl ValidSymbols {
    pub fn allows(self, kind: TokenKind) -> bool {
        self.contains(Self::from(kind))
    }
}

impl From<TokenKind> for ValidSymbols {
    fn from(kind: TokenKind) -> Self {
        match kind {
            TokenKind::Newline => ValidSymbols::NEWLINE,
            TokenKind::Indent => ValidSymbols::INDENT,
            TokenKind::Dedent => ValidSymbols::DEDENT,
            TokenKind::JsAttr => ValidSymbols::JS_ATTR,
            TokenKind::String => ValidSymbols::STRING,
        }
    }
}

/// A token produced by the external scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}
