use std::cmp::Ordering;

use tracing::trace;

use crate::classify;
use crate::lexer::Lexer;
use crate::state::ScannerState;
use crate::token::{TokenKind, ValidSymbols};
use crate::ScanError;

/// External scanner for the Pug grammar.
///
/// One instance belongs to one parse session. Each [`scan`](Self::scan) call
/// reads through a [`Lexer`] and produces at most one token:
///
/// - `JS_ATTR` / `STRING` whenever the grammar accepts either of them, tracking
///   brackets, quotes, operators and `? :` pairs across whitespace
/// - otherwise `NEWLINE`, `INDENT` or `DEDENT` from the line structure
///
/// Dropping the scanner releases its stacks.
#[derive(Debug, Clone, Default)]
pub struct Scanner {
    state: ScannerState,
}

impl Scanner {
    pub fn new() -> Self {
        Self {
            state: ScannerState::new(),
        }
    }

    pub fn state(&self) -> &ScannerState {
        &self.state
    }

    pub fn serialize(&self) -> Result<Vec<u8>, ScanError> {
        self.state.serialize()
    }

    /// Restore from [`serialize`](Self::serialize) output. Empty input resets.
    pub fn deserialize(&mut self, bytes: &[u8]) -> Result<(), ScanError> {
        self.state.deserialize(bytes)
    }

    pub(crate) fn restore(&mut self, state: ScannerState) {
        self.state = state;
    }

    /// Drop one indentation level without reading input.
    pub(crate) fn close_indent(&mut self) -> bool {
        self.state.indents.pop().is_some()
    }

    /// Try to produce one token at the lexer's position.
    ///
    /// `None` means no token applies here and the host should fall back to
    /// its own rules. Token boundaries are reported through the lexer.
    pub fn scan<L: Lexer>(&mut self, lexer: &mut L, valid: ValidSymbols) -> Option<TokenKind> {
        let found = if valid.intersects(ValidSymbols::ATTRIBUTE) {
            self.scan_attribute(lexer, valid)
        } else if valid.intersects(ValidSymbols::LAYOUT) {
            self.scan_layout(lexer, valid)
        } else {
            None
        };

        trace!(
            ?valid,
            found = found.map(TokenKind::name),
            brackets = self.state.brackets.len(),
            indent = self.state.current_indent(),
            "scan"
        );
        found
    }

    // --- Layout ---

    /// Newlines and changes in leading whitespace.
    fn scan_layout<L: Lexer>(&mut self, lexer: &mut L, valid: ValidSymbols) -> Option<TokenKind> {
        if lexer.peek() == Some('\n') {
            if !valid.contains(ValidSymbols::NEWLINE) {
                return None;
            }
            lexer.skip();
            return Some(TokenKind::Newline);
        }

        if lexer.at_end_of_input() || lexer.current_column() != 0 {
            return None;
        }

        // Indentation tokens are zero width
        lexer.mark_end();

        let mut width: u32 = 0;
        while let Some(step) = lexer.peek().and_then(classify::indent_width) {
            width = width.saturating_add(step);
            lexer.skip();
        }

        let current = self.state.current_indent();
        match width.cmp(&current) {
            Ordering::Greater if valid.contains(ValidSymbols::INDENT) => {
                self.state.indents.push(width);
                Some(TokenKind::Indent)
            }
            Ordering::Less if valid.contains(ValidSymbols::DEDENT) => {
                self.state.indents.pop();
                Some(TokenKind::Dedent)
            }
            _ => None,
        }
    }

    // --- Attributes ---

    /// One attribute value: a quoted string or a script expression.
    ///
    /// A `STRING` result only survives while the token is a quoted run of word
    /// characters and escapes. Any bracket, operator or template quote turns
    /// it into `JS_ATTR`.
    fn scan_attribute<L: Lexer>(
        &mut self,
        lexer: &mut L,
        valid: ValidSymbols,
    ) -> Option<TokenKind> {
        let string_or_js = if valid.contains(ValidSymbols::STRING) {
            TokenKind::String
        } else {
            TokenKind::JsAttr
        };
        let mut result: Option<TokenKind> = None;

        loop {
            let Some(c) = lexer.peek() else {
                lexer.mark_end();
                return result;
            };
            let in_string = self.state.is_in_string(c);

            if c == '\\' && in_string {
                result = result.or(Some(string_or_js));
                // The backslash and the escaped character
                lexer.advance();
                lexer.advance();
            } else if classify::is_word(c) || in_string {
                result = result.or(Some(TokenKind::JsAttr));
                self.state.operator_pending = false;
                lexer.advance();
            } else if classify::is_quote(c) {
                if classify::is_template_quote(c) {
                    result = Some(TokenKind::JsAttr);
                } else {
                    result = result.or(Some(string_or_js));
                }
                self.state.toggle_quote(c);
                lexer.advance();
            } else if classify::is_open_bracket(c) {
                result = Some(TokenKind::JsAttr);
                self.state.operator_pending = false;
                self.state.brackets.push(c);
                lexer.advance();
            } else if classify::is_close_bracket(c) {
                self.state.operator_pending = false;
                if Some(self.state.brackets.top()) != classify::opening_bracket(c) {
                    trace!(close = %c, "unmatched closing bracket ends attribute");
                    lexer.mark_end();
                    return result;
                }
                self.state.brackets.pop();
                result = Some(TokenKind::JsAttr);
                lexer.advance();
            } else if classify::is_operator(c) && self.state.is_in_parens() {
                result = Some(TokenKind::JsAttr);
                self.state.operator_pending = true;
                lexer.advance();
            } else if classify::is_root_operator(c) {
                result = Some(TokenKind::JsAttr);
                if c == ':' && !self.closes_ternary() {
                    // Belongs to the surrounding grammar, e.g. `&attributes(a):b`
                    trace!("unpaired ':' ends attribute");
                    self.state.operator_pending = false;
                    lexer.mark_end();
                    return result;
                }
                if c == '?' {
                    let depth = self.state.bracket_len();
                    self.state.ternary_depths.push(depth);
                }
                self.state.operator_pending = true;
                lexer.advance();
            } else if classify::is_inline_space(c) {
                if self.scan_separator(lexer, result) {
                    return result;
                }
            } else {
                lexer.mark_end();
                return result;
            }
        }
    }

    /// A `:` closes the innermost `?` opened at the current bracket depth.
    fn closes_ternary(&mut self) -> bool {
        if self.state.ternary_depths.top() != self.state.bracket_len() {
            return false;
        }
        self.state.ternary_depths.pop();
        true
    }

    /// Consume a run of spaces and tabs. Returns `true` when it separates the
    /// attribute from the next term and the token should end here.
    fn scan_separator<L: Lexer>(&mut self, lexer: &mut L, result: Option<TokenKind>) -> bool {
        lexer.mark_end();
        while lexer.peek().is_some_and(classify::is_inline_space) {
            lexer.advance();
        }

        // Whitespace between an operator and its operand
        let continues =
            self.state.operator_pending || lexer.peek().is_some_and(classify::is_operator);
        if continues {
            return false;
        }

        lexer.mark_end();
        self.state.operator_pending = false;
        result.is_some() && !self.state.is_in_parens()
    }
}
