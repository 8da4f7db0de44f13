//! Character classes used by the attribute scanner.
//!
//! Everything here is ASCII-only. Identifiers are runs of ASCII letters and
//! digits; anything else has to be a quote, a bracket, an operator or
//! whitespace to keep an attribute token going.

/// Width of a tab when measuring indentation.
pub const TAB_WIDTH: u32 = 8;

/// Bottom entry of the bracket stack: not inside any bracket or quote.
pub const NO_BRACKET: char = '\0';

pub fn is_quote(c: char) -> bool {
    matches!(c, '"' | '\'' | '`')
}

/// Backticks open template literals, which are never plain strings.
pub fn is_template_quote(c: char) -> bool {
    c == '`'
}

pub fn is_open_bracket(c: char) -> bool {
    matches!(c, '(' | '[' | '{')
}

pub fn is_close_bracket(c: char) -> bool {
    matches!(c, ')' | ']' | '}')
}

/// The opening bracket a closing bracket pairs with.
pub fn opening_bracket(close: char) -> Option<char> {
    match close {
        ')' => Some('('),
        ']' => Some('['),
        '}' => Some('{'),
        _ => None,
    }
}

/// Operators allowed at the root of an attribute value, outside any bracket.
pub fn is_root_operator(c: char) -> bool {
    matches!(
        c,
        '$' | '&' | '*' | '+' | '-' | '.' | '/' | ':' | ';' | '<' | '=' | '>' | '?' | '^' | '|'
    )
}

/// Operators allowed inside brackets: every root operator plus `,`.
pub fn is_operator(c: char) -> bool {
    is_root_operator(c) || c == ','
}

pub fn is_word(c: char) -> bool {
    c.is_ascii_alphanumeric()
}

pub fn is_inline_space(c: char) -> bool {
    matches!(c, ' ' | '\t')
}

/// Indentation weight of a leading whitespace character.
pub fn indent_width(c: char) -> Option<u32> {
    match c {
        ' ' => Some(1),
        '\t' => Some(TAB_WIDTH),
        _ => None,
    }
}
