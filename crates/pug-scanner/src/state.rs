//! Persistent scanner state and its byte encoding.
//!
//! Layout of a serialized state, each stack written in order (indents,
//! brackets, ternary depths):
//!
//! ```text
//! [len][entry 1]..[entry len-1]   one block per stack, sentinel not written
//! [operator pending]              0 or 1
//! ```
//!
//! Every length and entry is a single byte. Values that do not fit are
//! reported as errors instead of being truncated.

use tracing::debug;

use crate::classify::{self, NO_BRACKET};
use crate::ScanError;

/// Largest serialized state the host parser will store.
pub const SERIALIZATION_BUFFER_SIZE: usize = 1024;

const MAX_STACK_LEN: usize = u8::MAX as usize;

/// A stack whose bottom entry is a sentinel that is never popped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Stack<T> {
    items: Vec<T>,
}

impl<T: Copy + PartialEq> Stack<T> {
    fn new(sentinel: T) -> Self {
        Self {
            items: vec![sentinel],
        }
    }

    pub(crate) fn push(&mut self, item: T) {
        self.items.push(item);
    }

    /// Pops the top entry. The sentinel stays.
    pub(crate) fn pop(&mut self) -> Option<T> {
        if self.items.len() > 1 {
            self.items.pop()
        } else {
            None
        }
    }

    pub(crate) fn top(&self) -> T {
        *self.items.last().expect("stack never empty")
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    fn as_slice(&self) -> &[T] {
        &self.items
    }
}

/// Stack entries that round-trip through a single byte.
trait ByteEntry: Copy {
    fn to_byte(self) -> Option<u8>;
    fn from_byte(byte: u8) -> Self;
    fn widen(self) -> u32;
}

impl ByteEntry for u32 {
    fn to_byte(self) -> Option<u8> {
        u8::try_from(self).ok()
    }

    fn from_byte(byte: u8) -> Self {
        u32::from(byte)
    }

    fn widen(self) -> u32 {
        self
    }
}

impl ByteEntry for char {
    fn to_byte(self) -> Option<u8> {
        u8::try_from(self).ok()
    }

    fn from_byte(byte: u8) -> Self {
        char::from(byte)
    }

    fn widen(self) -> u32 {
        u32::from(self)
    }
}

/// Everything the scanner remembers between calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannerState {
    /// Indentation widths, strictly increasing from the bottom `0`.
    pub(crate) indents: Stack<u32>,
    /// Open brackets and quotes, bottom entry [`NO_BRACKET`].
    pub(crate) brackets: Stack<char>,
    /// Bracket stack length recorded at each unmatched `?`.
    pub(crate) ternary_depths: Stack<u32>,
    /// An operand is expected, so whitespace does not end the token.
    pub(crate) operator_pending: bool,
}

impl Default for ScannerState {
    fn default() -> Self {
        Self::new()
    }
}

impl ScannerState {
    /// The initial state: every stack holds only its sentinel.
    pub fn new() -> Self {
        Self {
            indents: Stack::new(0),
            brackets: Stack::new(NO_BRACKET),
            ternary_depths: Stack::new(0),
            operator_pending: false,
        }
    }

    pub fn indent_levels(&self) -> &[u32] {
        self.indents.as_slice()
    }

    pub fn current_indent(&self) -> u32 {
        self.indents.top()
    }

    /// Open brackets and quotes, innermost last, sentinel excluded.
    pub fn open_brackets(&self) -> &[char] {
        &self.brackets.as_slice()[1..]
    }

    pub fn ternary_depths(&self) -> &[u32] {
        &self.ternary_depths.as_slice()[1..]
    }

    pub fn operator_pending(&self) -> bool {
        self.operator_pending
    }

    /// Inside any bracket or quote.
    pub fn is_in_parens(&self) -> bool {
        self.brackets.top() != NO_BRACKET
    }

    /// `c` sits inside a quoted run: the innermost open entry is a quote and
    /// `c` is not itself a quote.
    pub fn is_in_string(&self, c: char) -> bool {
        classify::is_quote(self.brackets.top()) && !classify::is_quote(c)
    }

    /// Bracket stack length as recorded by `?`, sentinel included.
    pub(crate) fn bracket_len(&self) -> u32 {
        u32::try_from(self.brackets.len()).unwrap_or(u32::MAX)
    }

    /// Closes the quote if it is the innermost open entry, opens it otherwise.
    pub(crate) fn toggle_quote(&mut self, quote: char) {
        if self.brackets.top() == quote {
            self.brackets.pop();
        } else {
            self.brackets.push(quote);
        }
    }

    /// Number of bytes [`serialize`](Self::serialize) will produce.
    pub fn serialized_len(&self) -> usize {
        self.indents.len() + self.brackets.len() + self.ternary_depths.len() + 1
    }

    pub fn serialize(&self) -> Result<Vec<u8>, ScanError> {
        let needed = self.serialized_len();
        if needed > SERIALIZATION_BUFFER_SIZE {
            return Err(ScanError::BufferOverflow {
                needed,
                limit: SERIALIZATION_BUFFER_SIZE,
            });
        }

        let mut buffer = Vec::with_capacity(needed);
        write_stack(&mut buffer, "indent", &self.indents)?;
        write_stack(&mut buffer, "bracket", &self.brackets)?;
        write_stack(&mut buffer, "ternary", &self.ternary_depths)?;
        buffer.push(u8::from(self.operator_pending));
        Ok(buffer)
    }

    /// Restores a state written by [`serialize`](Self::serialize).
    ///
    /// An empty buffer resets to the initial state. On error `self` is left
    /// untouched.
    pub fn deserialize(&mut self, bytes: &[u8]) -> Result<(), ScanError> {
        if bytes.is_empty() {
            debug!("scanner state reset");
            *self = Self::new();
            return Ok(());
        }

        let mut reader = ByteReader { bytes, offset: 0 };
        let mut state = Self::new();
        read_stack(&mut reader, "indent", &mut state.indents)?;
        read_stack(&mut reader, "bracket", &mut state.brackets)?;
        read_stack(&mut reader, "ternary", &mut state.ternary_depths)?;
        state.operator_pending = reader.next()? != 0;

        debug!(
            indents = state.indents.len(),
            brackets = state.brackets.len(),
            ternaries = state.ternary_depths.len(),
            "scanner state restored"
        );
        *self = state;
        Ok(())
    }
}

fn write_stack<T: ByteEntry + PartialEq>(
    buffer: &mut Vec<u8>,
    name: &'static str,
    stack: &Stack<T>,
) -> Result<(), ScanError> {
    let len = stack.len();
    if len > MAX_STACK_LEN {
        return Err(ScanError::StackTooDeep { stack: name, len });
    }
    buffer.push(len as u8);

    for &item in &stack.as_slice()[1..] {
        let byte = item.to_byte().ok_or(ScanError::ValueTooWide {
            stack: name,
            value: item.widen(),
        })?;
        buffer.push(byte);
    }
    Ok(())
}

struct ByteReader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl ByteReader<'_> {
    fn next(&mut self) -> Result<u8, ScanError> {
        let byte = *self.bytes.get(self.offset).ok_or(ScanError::Truncated {
            offset: self.offset,
        })?;
        self.offset += 1;
        Ok(byte)
    }
}

fn read_stack<T: ByteEntry + PartialEq>(
    reader: &mut ByteReader<'_>,
    name: &'static str,
    stack: &mut Stack<T>,
) -> Result<(), ScanError> {
    let len = reader.next()?;
    if len == 0 {
        return Err(ScanError::EmptyStack { stack: name });
    }
    for _ in 1..len {
        stack.push(T::from_byte(reader.next()?));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn nested_state() -> ScannerState {
        let mut state = ScannerState::new();
        state.indents.push(2);
        state.indents.push(10);
        state.brackets.push('(');
        state.brackets.push('"');
        state.ternary_depths.push(1);
        state.operator_pending = true;
        state
    }

    // =========================================================================
    // Initial state
    // =========================================================================

    #[test]
    fn test_new_state_holds_only_sentinels() {
        let state = ScannerState::new();
        assert_eq!(state.indent_levels(), &[0]);
        assert_eq!(state.open_brackets(), &[] as &[char]);
        assert_eq!(state.ternary_depths(), &[] as &[u32]);
        assert!(!state.operator_pending());
        assert!(!state.is_in_parens());
        assert_eq!(state.bracket_len(), 1);
    }

    #[test]
    fn test_sentinel_is_never_popped() {
        let mut state = ScannerState::new();
        assert_eq!(state.indents.pop(), None);
        assert_eq!(state.brackets.pop(), None);
        assert_eq!(state.indent_levels(), &[0]);
    }

    #[test]
    fn test_in_string_depends_on_innermost_entry() {
        let mut state = ScannerState::new();
        state.toggle_quote('`');
        assert!(state.is_in_string('+'));
        assert!(!state.is_in_string('`'));
        assert!(!state.is_in_string('"'));

        state.brackets.push('{');
        assert!(!state.is_in_string('+'));
        assert!(state.is_in_parens());
    }

    #[test]
    fn test_toggle_quote_opens_then_closes() {
        let mut state = ScannerState::new();
        state.toggle_quote('\'');
        assert_eq!(state.open_brackets(), &['\'']);
        state.toggle_quote('\'');
        assert_eq!(state.open_brackets(), &[] as &[char]);
    }

    // =========================================================================
    // Serialization
    // =========================================================================

    #[test]
    fn test_serialize_initial_state() {
        assert_eq!(ScannerState::new().serialize().unwrap(), vec![1, 1, 1, 0]);
    }

    #[test]
    fn test_serialize_layout() {
        let bytes = nested_state().serialize().unwrap();
        assert_eq!(bytes, vec![3, 2, 10, 3, b'(', b'"', 2, 1, 1]);
        assert_eq!(bytes.len(), nested_state().serialized_len());
    }

    #[test]
    fn test_deserialize_restores_serialized_state() {
        let state = nested_state();
        let mut restored = ScannerState::new();
        restored.deserialize(&state.serialize().unwrap()).unwrap();
        assert_eq!(restored, state);
    }

    #[test]
    fn test_deserialize_empty_resets() {
        let mut state = nested_state();
        state.deserialize(&[]).unwrap();
        assert_eq!(state, ScannerState::new());
    }

    #[test]
    fn test_deserialize_truncated() {
        let mut state = ScannerState::new();
        assert_eq!(
            state.deserialize(&[3, 2]),
            Err(ScanError::Truncated { offset: 2 })
        );
        // Missing flag byte
        assert_eq!(
            state.deserialize(&[1, 1, 1]),
            Err(ScanError::Truncated { offset: 3 })
        );
    }

    #[test]
    fn test_deserialize_zero_length_stack() {
        let mut state = ScannerState::new();
        assert_eq!(
            state.deserialize(&[1, 0, 1, 0]),
            Err(ScanError::EmptyStack { stack: "bracket" })
        );
    }

    #[test]
    fn test_failed_deserialize_keeps_state() {
        let mut state = nested_state();
        assert!(state.deserialize(&[2, 4]).is_err());
        assert_eq!(state, nested_state());
    }

    #[test]
    fn test_wide_indent_is_rejected() {
        let mut state = ScannerState::new();
        state.indents.push(300);
        assert_eq!(
            state.serialize(),
            Err(ScanError::ValueTooWide {
                stack: "indent",
                value: 300
            })
        );
    }

    #[test]
    fn test_deep_stack_is_rejected() {
        let mut state = ScannerState::new();
        for _ in 0..255 {
            state.brackets.push('[');
        }
        assert_eq!(
            state.serialize(),
            Err(ScanError::StackTooDeep {
                stack: "bracket",
                len: 256
            })
        );
    }

    #[test]
    fn test_widest_values_still_fit() {
        let mut state = ScannerState::new();
        state.indents.push(255);
        for _ in 0..254 {
            state.brackets.push('(');
        }
        let bytes = state.serialize().unwrap();
        assert_eq!(bytes.len(), 2 + 255 + 1 + 1);

        let mut restored = ScannerState::new();
        restored.deserialize(&bytes).unwrap();
        assert_eq!(restored, state);
    }
}
