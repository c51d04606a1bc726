//! The scanner: bytes in, tokens out.
//!
//! One [`Scanner`] lexes one buffer. It never looks at preprocessor state;
//! directive handling, macro replacement, and token-stream assembly all
//! live above it. The only lexical subtlety it owns is the escaped
//! newline: a backslash, optional horizontal whitespace, and a line
//! terminator are transparently absorbed *anywhere*, including inside
//! identifiers and literals, and any token scanned across one carries
//! [`TokenFlags::NEEDS_CLEANING`].
//!
//! Malformed input never aborts a scan. A literal cut off by a newline or
//! EOF, a stray backslash, or an interior NUL each recover to a single
//! [`TokenKind::Unknown`] token (with a diagnostic in instrumented mode)
//! and scanning continues at the next byte.

use std::borrow::Cow;

use cinder_diagnostic::{Diagnostic, DiagnosticSink};
use cinder_lexer_core::Cursor;
use cinder_source::{FileEntry, SourceLocation};
use cinder_token::{StringInterner, Token, TokenFlags, TokenKind};

use crate::cleaning::{clean_text, splice_len};
use crate::keywords;

enum Mode<'src> {
    /// No side effects: no keyword resolution, no interning, no
    /// diagnostics. Identifier-shaped tokens come back as
    /// [`TokenKind::RawIdentifier`].
    Raw,
    Instrumented {
        interner: &'src StringInterner,
        sink: &'src mut dyn DiagnosticSink,
    },
}

/// Hand-written maximal-munch scanner over one buffer.
pub struct Scanner<'src> {
    cursor: Cursor<'src>,
    /// Sentinel-terminated bytes, for splice scanning past the cursor.
    bytes: &'src [u8],
    /// Location of buffer byte 0 in the global offset space.
    start_loc: SourceLocation,
    mode: Mode<'src>,
    at_line_start: bool,
    has_leading_space: bool,
}

impl<'src> Scanner<'src> {
    /// Create an instrumented scanner: keywords resolve, identifiers
    /// intern through `interner`, malformed input reports to `sink`.
    pub fn new(
        entry: &'src FileEntry,
        interner: &'src StringInterner,
        sink: &'src mut dyn DiagnosticSink,
    ) -> Self {
        Self::with_mode(entry, Mode::Instrumented { interner, sink })
    }

    /// Create a raw scanner: pure, no side effects, safe to run over any
    /// buffer at any time.
    pub fn raw(entry: &'src FileEntry) -> Self {
        Self::with_mode(entry, Mode::Raw)
    }

    fn with_mode(entry: &'src FileEntry, mode: Mode<'src>) -> Self {
        Self {
            cursor: entry.buffer().cursor(),
            bytes: entry.buffer().as_sentinel_bytes(),
            start_loc: entry.start_location(),
            mode,
            at_line_start: true,
            has_leading_space: false,
        }
    }

    /// Reposition to an absolute byte offset in the buffer.
    ///
    /// Start-of-line state is recomputed from the preceding byte, so
    /// re-lexing from a saved token offset reproduces the original flags.
    pub fn seek(&mut self, offset: u32) {
        self.cursor.seek(offset);
        let pos = self.cursor.pos();
        self.at_line_start = pos == 0 || matches!(self.cursor.byte_at(pos - 1), b'\n' | b'\r');
        self.has_leading_space = false;
    }

    /// Current byte offset in the buffer.
    pub fn offset(&self) -> u32 {
        self.cursor.pos()
    }

    /// Produce the next token. Past the end of the buffer this keeps
    /// returning [`TokenKind::Eof`] tokens.
    pub fn lex(&mut self) -> Token {
        loop {
            self.skip_trivia();
            let start = self.cursor.pos();
            if self.cursor.is_eof() {
                return self.finish_token(TokenKind::Eof, start, false, false);
            }

            let mut cleaning = false;
            let first = self.next_char(&mut cleaning);
            match first {
                // Sentinel reached through trailing escaped newlines.
                0 if self.cursor.pos() > self.cursor.source_len() => {
                    let end = self.cursor.source_len();
                    self.cursor.seek(end);
                    return self.finish_token(TokenKind::Eof, end, false, false);
                }
                // Interior NUL: one Unknown token, then keep going.
                0 => {
                    self.report(start, "null character in source");
                    return self.finish_token(TokenKind::Unknown, start, cleaning, true);
                }

                // Whitespace surfacing from behind a splice.
                b' ' | b'\t' | 0x0B | 0x0C => self.has_leading_space = true,
                b'\n' | b'\r' => {
                    self.at_line_start = true;
                    self.has_leading_space = false;
                }

                b'a'..=b'z' | b'A'..=b'Z' | b'_' | 0x80..=0xFF => {
                    return self.scan_identifier(start, cleaning);
                }
                b'0'..=b'9' => return self.scan_number(start, first, cleaning),
                b'.' if self.peek_char().0.is_ascii_digit() => {
                    return self.scan_number(start, first, cleaning);
                }

                b'"' => {
                    return self.scan_literal(start, b'"', TokenKind::StringLiteral, cleaning);
                }
                b'\'' => {
                    return self.scan_literal(start, b'\'', TokenKind::CharConstant, cleaning);
                }

                // Comments reached through a splice miss the fast path in
                // `skip_trivia`, so `/` is classified here.
                b'/' => {
                    let (next, width) = self.peek_char();
                    match next {
                        b'/' => {
                            self.bump(width, &mut cleaning);
                            self.skip_line_comment();
                            self.has_leading_space = true;
                        }
                        b'*' => {
                            self.bump(width, &mut cleaning);
                            self.skip_block_comment(start);
                            self.has_leading_space = true;
                        }
                        b'=' => {
                            self.bump(width, &mut cleaning);
                            return self.finish_token(TokenKind::SlashEqual, start, cleaning, false);
                        }
                        _ => return self.finish_token(TokenKind::Slash, start, cleaning, false),
                    }
                }

                // `next_char` absorbs splices, so a surviving backslash is
                // a stray one.
                b'\\' => {
                    self.report(start, "stray '\\' in source");
                    return self.finish_token(TokenKind::Unknown, start, cleaning, true);
                }

                _ => return self.scan_punctuation(start, first, cleaning),
            }
        }
    }

    // ─── Trivia ──────────────────────────────────────────────────────

    /// Skip whitespace and comments, tracking line-start and
    /// leading-space state. Operates on raw bytes; splice-obscured trivia
    /// falls through to the dispatch in [`lex`](Self::lex).
    fn skip_trivia(&mut self) {
        loop {
            match self.cursor.current() {
                b' ' | b'\t' | 0x0B | 0x0C => {
                    self.has_leading_space = true;
                    self.cursor.advance();
                }
                b'\n' | b'\r' => {
                    self.at_line_start = true;
                    self.has_leading_space = false;
                    self.cursor.advance();
                }
                b'/' => match self.cursor.peek() {
                    b'/' => {
                        self.cursor.advance_n(2);
                        self.skip_line_comment();
                        self.has_leading_space = true;
                    }
                    b'*' => {
                        let open = self.cursor.pos();
                        self.cursor.advance_n(2);
                        self.skip_block_comment(open);
                        self.has_leading_space = true;
                    }
                    _ => return,
                },
                _ => return,
            }
        }
    }

    /// Skip to (not past) the next line terminator. A spliced newline
    /// continues the comment.
    fn skip_line_comment(&mut self) {
        loop {
            let (b, width) = self.char_at(self.cursor.pos());
            match b {
                b'\n' | b'\r' => return,
                0 if self.cursor.pos() + width > self.cursor.source_len() => return,
                _ => self.cursor.advance_n(width),
            }
        }
    }

    /// Skip past `*/`, splice-transparently. An unterminated comment
    /// swallows the rest of the buffer and reports at the opening `/*`.
    fn skip_block_comment(&mut self, open: u32) {
        let mut prev = 0u8;
        loop {
            let (b, width) = self.char_at(self.cursor.pos());
            if b == 0 && self.cursor.pos() + width > self.cursor.source_len() {
                self.report(open, "unterminated block comment");
                return;
            }
            self.cursor.advance_n(width);
            if prev == b'*' && b == b'/' {
                return;
            }
            prev = b;
        }
    }

    // ─── Token rules ─────────────────────────────────────────────────

    fn scan_identifier(&mut self, start: u32, mut cleaning: bool) -> Token {
        loop {
            let (b, width) = self.peek_char();
            if is_identifier_continue(b) {
                self.bump(width, &mut cleaning);
            } else {
                break;
            }
        }
        let len = self.cursor.pos() - start;
        let flags = self.finish_flags(cleaning, false);
        let location = self.start_loc.with_offset(start);

        match &mut self.mode {
            Mode::Raw => Token::new(TokenKind::RawIdentifier, location, len, flags),
            Mode::Instrumented { interner, .. } => {
                let raw = self.cursor.slice(start, start + len);
                let text = if cleaning {
                    clean_text(raw)
                } else {
                    Cow::Borrowed(raw)
                };
                match keywords::lookup(&text) {
                    Some(kw) => Token::new(kw, location, len, flags),
                    None => Token::identifier(location, len, flags, interner.intern(&text)),
                }
            }
        }
    }

    /// Scan a numeric constant without validating it; the token covers
    /// the maximal plausible extent (digits, letters, periods) and a
    /// sign directly after a non-hex `e`/`E` or any `p`/`P` exponent
    /// marker. Validation happens in later phases against the full text.
    fn scan_number(&mut self, start: u32, first: u8, mut cleaning: bool) -> Token {
        let mut prev = first;
        let mut is_hex = false;
        let mut second = true;
        loop {
            let (b, width) = self.peek_char();
            let accept = match b {
                b'0'..=b'9' | b'a'..=b'z' | b'A'..=b'Z' | b'.' => true,
                b'+' | b'-' => {
                    (matches!(prev, b'e' | b'E') && !is_hex) || matches!(prev, b'p' | b'P')
                }
                _ => false,
            };
            if !accept {
                break;
            }
            if second && first == b'0' && matches!(b, b'x' | b'X') {
                is_hex = true;
            }
            second = false;
            self.bump(width, &mut cleaning);
            prev = b;
        }
        self.finish_token(TokenKind::NumericConstant, start, cleaning, false)
    }

    /// Scan a string literal or character constant. A line terminator,
    /// EOF, or interior NUL before the closing quote recovers to one
    /// `Unknown` token covering what was consumed so far; the offending
    /// byte is left for the next scan.
    fn scan_literal(
        &mut self,
        start: u32,
        terminator: u8,
        kind: TokenKind,
        mut cleaning: bool,
    ) -> Token {
        loop {
            let (b, width) = self.peek_char();
            match b {
                _ if b == terminator => {
                    self.bump(width, &mut cleaning);
                    return self.finish_token(kind, start, cleaning, false);
                }
                // A surviving backslash is a real escape; the escaped
                // character is consumed blindly (it may be the
                // terminator). Splice absorption already happened in
                // `peek_char`, so the escaped char is never a newline.
                b'\\' => {
                    self.bump(width, &mut cleaning);
                    let (escaped, esc_width) = self.peek_char();
                    if escaped != 0 {
                        self.bump(esc_width, &mut cleaning);
                    }
                }
                b'\n' | b'\r' => {
                    return self.literal_error(start, kind, cleaning, "missing terminating");
                }
                0 if self.cursor.pos() + width > self.cursor.source_len() => {
                    return self.literal_error(start, kind, cleaning, "missing terminating");
                }
                0 => {
                    return self.literal_error(start, kind, cleaning, "null character in");
                }
                _ => self.bump(width, &mut cleaning),
            }
        }
    }

    fn literal_error(&mut self, start: u32, kind: TokenKind, cleaning: bool, what: &str) -> Token {
        let noun = if kind == TokenKind::CharConstant {
            "character constant"
        } else {
            "string literal"
        };
        let message = format!("{what} {noun}");
        self.report(start, &message);
        self.finish_token(TokenKind::Unknown, start, cleaning, true)
    }

    fn scan_punctuation(&mut self, start: u32, first: u8, mut cleaning: bool) -> Token {
        use TokenKind::*;

        let kind = match first {
            b'(' => LParen,
            b')' => RParen,
            b'[' => LBracket,
            b']' => RBracket,
            b'{' => LBrace,
            b'}' => RBrace,
            b',' => Comma,
            b';' => Semi,
            b'?' => Question,
            b'~' => Tilde,
            b'.' => {
                // `..` is not a token; only `...` munches further.
                let (c1, w1) = self.peek_char();
                if c1 == b'.' {
                    let (c2, w2) = self.char_at(self.cursor.pos() + w1);
                    if c2 == b'.' {
                        self.bump(w1, &mut cleaning);
                        self.bump(w2, &mut cleaning);
                        Ellipsis
                    } else {
                        Dot
                    }
                } else {
                    Dot
                }
            }
            b'+' => {
                if self.eat_if(b'+', &mut cleaning) {
                    PlusPlus
                } else if self.eat_if(b'=', &mut cleaning) {
                    PlusEqual
                } else {
                    Plus
                }
            }
            b'-' => {
                if self.eat_if(b'-', &mut cleaning) {
                    MinusMinus
                } else if self.eat_if(b'=', &mut cleaning) {
                    MinusEqual
                } else if self.eat_if(b'>', &mut cleaning) {
                    Arrow
                } else {
                    Minus
                }
            }
            b'*' => {
                if self.eat_if(b'=', &mut cleaning) {
                    StarEqual
                } else {
                    Star
                }
            }
            b'%' => {
                if self.eat_if(b'=', &mut cleaning) {
                    PercentEqual
                } else {
                    Percent
                }
            }
            b'^' => {
                if self.eat_if(b'=', &mut cleaning) {
                    CaretEqual
                } else {
                    Caret
                }
            }
            b'=' => {
                if self.eat_if(b'=', &mut cleaning) {
                    EqualEqual
                } else {
                    Equal
                }
            }
            b'!' => {
                if self.eat_if(b'=', &mut cleaning) {
                    BangEqual
                } else {
                    Bang
                }
            }
            b'&' => {
                if self.eat_if(b'&', &mut cleaning) {
                    AmpAmp
                } else if self.eat_if(b'=', &mut cleaning) {
                    AmpEqual
                } else {
                    Amp
                }
            }
            b'|' => {
                if self.eat_if(b'|', &mut cleaning) {
                    PipePipe
                } else if self.eat_if(b'=', &mut cleaning) {
                    PipeEqual
                } else {
                    Pipe
                }
            }
            b'<' => {
                if self.eat_if(b'<', &mut cleaning) {
                    if self.eat_if(b'=', &mut cleaning) {
                        ShlEqual
                    } else {
                        Shl
                    }
                } else if self.eat_if(b'=', &mut cleaning) {
                    LessEqual
                } else {
                    Less
                }
            }
            b'>' => {
                if self.eat_if(b'>', &mut cleaning) {
                    if self.eat_if(b'=', &mut cleaning) {
                        ShrEqual
                    } else {
                        Shr
                    }
                } else if self.eat_if(b'=', &mut cleaning) {
                    GreaterEqual
                } else {
                    Greater
                }
            }
            b':' => {
                if self.eat_if(b':', &mut cleaning) {
                    ColonColon
                } else {
                    Colon
                }
            }
            b'#' => {
                if self.eat_if(b'#', &mut cleaning) {
                    HashHash
                } else {
                    Hash
                }
            }
            _ => {
                self.report(start, "unexpected character");
                return self.finish_token(Unknown, start, cleaning, true);
            }
        };
        self.finish_token(kind, start, cleaning, false)
    }

    // ─── Splice-transparent character reads ──────────────────────────

    /// The effective character at `pos` after absorbing any run of
    /// escaped newlines, and the total byte width consumed (splice bytes
    /// plus the character itself).
    fn char_at(&self, pos: u32) -> (u8, u32) {
        let mut p = pos;
        loop {
            match splice_len(self.bytes, p as usize) {
                #[allow(
                    clippy::cast_possible_truncation,
                    reason = "splice lengths are bounded by the buffer, which fits in u32"
                )]
                Some(len) => p += len as u32,
                None => return (self.cursor.byte_at(p), p - pos + 1),
            }
        }
    }

    fn peek_char(&self) -> (u8, u32) {
        self.char_at(self.cursor.pos())
    }

    fn next_char(&mut self, cleaning: &mut bool) -> u8 {
        let (b, width) = self.peek_char();
        self.bump(width, cleaning);
        b
    }

    fn bump(&mut self, width: u32, cleaning: &mut bool) {
        if width > 1 {
            *cleaning = true;
        }
        self.cursor.advance_n(width);
    }

    fn eat_if(&mut self, expected: u8, cleaning: &mut bool) -> bool {
        let (b, width) = self.peek_char();
        if b == expected {
            self.bump(width, cleaning);
            true
        } else {
            false
        }
    }

    // ─── Token assembly ──────────────────────────────────────────────

    /// Compute the flags for the token being finished and reset the
    /// between-token state.
    fn finish_flags(&mut self, cleaning: bool, error: bool) -> TokenFlags {
        let mut flags = TokenFlags::EMPTY;
        if self.at_line_start {
            flags.set(TokenFlags::START_OF_LINE);
        }
        if self.has_leading_space {
            flags.set(TokenFlags::LEADING_SPACE);
        }
        if cleaning {
            flags.set(TokenFlags::NEEDS_CLEANING);
        }
        if error {
            flags.set(TokenFlags::HAS_ERROR);
        }
        self.at_line_start = false;
        self.has_leading_space = false;
        flags
    }

    fn finish_token(&mut self, kind: TokenKind, start: u32, cleaning: bool, error: bool) -> Token {
        let len = self.cursor.pos() - start;
        let flags = self.finish_flags(cleaning, error);
        Token::new(kind, self.start_loc.with_offset(start), len, flags)
    }

    fn report(&mut self, start: u32, message: &str) {
        if let Mode::Instrumented { sink, .. } = &mut self.mode {
            sink.report(Diagnostic::error(
                self.start_loc.with_offset(start),
                message,
            ));
        }
    }
}

fn is_identifier_continue(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b >= 0x80
}
