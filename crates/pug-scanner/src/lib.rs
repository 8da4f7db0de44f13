//! Pug external scanner
//!
//! Produces the tokens a context-free Pug grammar cannot describe on its own:
//! `NEWLINE`, `INDENT` and `DEDENT` from leading whitespace, and `JS_ATTR` /
//! `STRING` attribute values such as `tag(attr=a ? b : c)`.
//!
//! The [`Scanner`] emits at most one token per [`Scanner::scan`] call and keeps
//! all of its state (indent levels, open brackets, ternary depths and the
//! operator-pending flag) in a [`ScannerState`] that can be serialized so a host
//! parser can snapshot and restore it.
//!
//! # Example
//!
//! ```
//! use pug_scanner::{Session, TokenKind, ValidSymbols};
//!
//! let mut session = Session::new("a ? b : c)");
//! let token = session.scan(ValidSymbols::JS_ATTR).unwrap();
//! assert_eq!(token.kind, TokenKind::JsAttr);
//! assert_eq!(session.text(token.span), "a ? b : c");
//! ```

pub mod classify;
pub mod lexer;
pub mod scanner;
pub mod session;
pub mod state;
pub mod token;

pub use lexer::{Lexer, Position, SourceLexer};
pub use scanner::Scanner;
pub use session::{Attributes, Checkpoint, Outline, Session};
pub use state::{ScannerState, SERIALIZATION_BUFFER_SIZE};
pub use token::{Span, Token, TokenKind, ValidSymbols};

/// Failure to encode or decode a [`ScannerState`].
///
/// Scanning itself never fails: a scan that finds nothing returns `None`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScanError {
    #[error("{stack} stack holds {len} entries, at most 255 can be serialized")]
    StackTooDeep { stack: &'static str, len: usize },

    #[error("{stack} stack entry {value} does not fit in one byte")]
    ValueTooWide { stack: &'static str, value: u32 },

    #[error("serialized state needs {needed} bytes, buffer holds {limit}")]
    BufferOverflow { needed: usize, limit: usize },

    #[error("serialized state ends early at byte {offset}")]
    Truncated { offset: usize },

    #[error("serialized {stack} stack has length 0, expected at least the sentinel")]
    EmptyStack { stack: &'static str },
}
