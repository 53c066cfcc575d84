//! Character cursor for traversing source code.
//!
//! The `Cursor` maintains position state while iterating through the
//! source: byte offset for spans, line/column for diagnostics. Columns are
//! 0-based to match the diagnostic wire format.

/// A cursor for traversing source code character by character.
///
/// # Example
///
/// ```
/// use csc_lex::cursor::Cursor;
///
/// let mut cursor = Cursor::new("var x;");
/// assert_eq!(cursor.current(), 'v');
/// cursor.advance();
/// assert_eq!(cursor.current(), 'a');
/// ```
pub struct Cursor<'a> {
    /// The source text being traversed.
    source: &'a str,

    /// Current byte position in the source.
    position: usize,

    /// Current line number (1-based).
    line: u32,

    /// Current column number (0-based, in characters).
    column: u32,
}

/// Saved cursor position for backtracking.
///
/// # Example
///
/// ```
/// use csc_lex::cursor::Cursor;
///
/// let mut cursor = Cursor::new("abc");
/// let saved = cursor.snapshot();
/// cursor.advance();
/// cursor.restore(saved);
/// assert_eq!(cursor.current(), 'a');
/// ```
#[derive(Clone, Copy, Debug)]
pub struct CursorSnapshot {
    position: usize,
    line: u32,
    column: u32,
}

impl<'a> Cursor<'a> {
    /// Creates a new cursor at the start of the source.
    ///
    /// # Example
    ///
    /// ```
    /// use csc_lex::cursor::Cursor;
    ///
    /// let cursor = Cursor::new("var x;");
    /// assert_eq!(cursor.offset(), 0);
    /// assert_eq!(cursor.line(), 1);
    /// ```
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            position: 0,
            line: 1,
            column: 0,
        }
    }

    /// Returns the character at the cursor, or `'\0'` at end of input.
    ///
    /// # Example
    ///
    /// ```
    /// use csc_lex::cursor::Cursor;
    ///
    /// let cursor = Cursor::new("x");
    /// assert_eq!(cursor.current(), 'x');
    /// assert_eq!(Cursor::new("").current(), '\0');
    /// ```
    #[inline]
    pub fn current(&self) -> char {
        self.peek(0)
    }

    /// Returns the character `offset` bytes ahead, or `'\0'` past the end.
    ///
    /// Offsets land on char boundaries for ASCII lookahead, which is all
    /// the lexer needs; a non-boundary offset falls back to `'\0'`.
    ///
    /// # Example
    ///
    /// ```
    /// use csc_lex::cursor::Cursor;
    ///
    /// let cursor = Cursor::new("xyz");
    /// assert_eq!(cursor.peek(0), 'x');
    /// assert_eq!(cursor.peek(1), 'y');
    /// assert_eq!(cursor.peek(3), '\0');
    /// ```
    #[inline]
    pub fn peek(&self, offset: usize) -> char {
        let pos = self.position + offset;
        if pos >= self.source.len() {
            return '\0';
        }

        // Fast path for ASCII (most common case)
        let b = self.source.as_bytes()[pos];
        if b < 128 {
            return b as char;
        }

        self.source
            .get(pos..)
            .and_then(|rest| rest.chars().next())
            .unwrap_or('\0')
    }

    /// True when the cursor has consumed the whole source.
    ///
    /// # Example
    ///
    /// ```
    /// use csc_lex::cursor::Cursor;
    ///
    /// let mut cursor = Cursor::new("a");
    /// assert!(!cursor.is_at_end());
    /// cursor.advance();
    /// assert!(cursor.is_at_end());
    /// ```
    #[inline]
    pub fn is_at_end(&self) -> bool {
        self.position >= self.source.len()
    }

    /// Current byte offset.
    ///
    /// # Example
    ///
    /// ```
    /// use csc_lex::cursor::Cursor;
    ///
    /// let mut cursor = Cursor::new("ab");
    /// cursor.advance();
    /// assert_eq!(cursor.offset(), 1);
    /// ```
    #[inline]
    pub fn offset(&self) -> usize {
        self.position
    }

    /// Current line (1-based).
    ///
    /// # Example
    ///
    /// ```
    /// use csc_lex::cursor::Cursor;
    ///
    /// let mut cursor = Cursor::new("a\nb");
    /// assert_eq!(cursor.line(), 1);
    /// cursor.advance();
    /// cursor.advance();
    /// assert_eq!(cursor.line(), 2);
    /// ```
    #[inline]
    pub fn line(&self) -> u32 {
        self.line
    }

    /// Current column (0-based).
    ///
    /// # Example
    ///
    /// ```
    /// use csc_lex::cursor::Cursor;
    ///
    /// let mut cursor = Cursor::new("ab");
    /// assert_eq!(cursor.column(), 0);
    /// cursor.advance();
    /// assert_eq!(cursor.column(), 1);
    /// ```
    #[inline]
    pub fn column(&self) -> u32 {
        self.column
    }

    /// Advance past the current character, updating line/column state.
    ///
    /// Does nothing at end of input.
    ///
    /// # Example
    ///
    /// ```
    /// use csc_lex::cursor::Cursor;
    ///
    /// let mut cursor = Cursor::new("ab");
    /// cursor.advance();
    /// assert_eq!(cursor.current(), 'b');
    /// ```
    pub fn advance(&mut self) {
        if self.is_at_end() {
            return;
        }
        let c = self.current();
        self.position += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 0;
        } else {
            self.column += 1;
        }
    }

    /// Matches and consumes the expected character if present.
    ///
    /// Returns true if the character was matched and consumed.
    ///
    /// # Example
    ///
    /// ```
    /// use csc_lex::cursor::Cursor;
    ///
    /// let mut cursor = Cursor::new("=>");
    /// assert!(cursor.match_char('='));
    /// assert!(!cursor.match_char('='));
    /// assert_eq!(cursor.current(), '>');
    /// ```
    pub fn match_char(&mut self, expected: char) -> bool {
        if self.current() == expected {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Save the current position for later backtracking.
    ///
    /// # Example
    ///
    /// ```
    /// use csc_lex::cursor::Cursor;
    ///
    /// let mut cursor = Cursor::new("abc");
    /// cursor.advance();
    /// let saved = cursor.snapshot();
    /// cursor.advance();
    /// cursor.restore(saved);
    /// assert_eq!(cursor.current(), 'b');
    /// ```
    #[inline]
    pub fn snapshot(&self) -> CursorSnapshot {
        CursorSnapshot {
            position: self.position,
            line: self.line,
            column: self.column,
        }
    }

    /// Rewind to a previously saved position.
    #[inline]
    pub fn restore(&mut self, snapshot: CursorSnapshot) {
        self.position = snapshot.position;
        self.line = snapshot.line;
        self.column = snapshot.column;
    }

    /// Slice of the source between two byte offsets.
    ///
    /// # Example
    ///
    /// ```
    /// use csc_lex::cursor::Cursor;
    ///
    /// let cursor = Cursor::new("var x;");
    /// assert_eq!(cursor.slice(0, 3), "var");
    /// ```
    #[inline]
    pub fn slice(&self, start: usize, end: usize) -> &'a str {
        &self.source[start..end]
    }
}
