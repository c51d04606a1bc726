//! The token value and its per-token metadata flags.

use cinder_source::SourceLocation;

use crate::{Name, TokenKind};

/// Per-token metadata flags packed into a single byte.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct TokenFlags(u8);

impl TokenFlags {
    /// Token is the first token on its line.
    pub const START_OF_LINE: u8 = 1 << 0;
    /// Whitespace (or a skipped comment) immediately preceded this token.
    pub const LEADING_SPACE: u8 = 1 << 1;
    /// The token text contains escaped newlines; exact-text extraction
    /// must re-scan instead of trusting a flat substring.
    pub const NEEDS_CLEANING: u8 = 1 << 2;
    /// The scanner raised a diagnostic while forming this token.
    pub const HAS_ERROR: u8 = 1 << 3;

    /// Empty flags (no bits set).
    pub const EMPTY: Self = TokenFlags(0);

    /// Create flags from raw bits.
    #[inline]
    pub const fn from_bits(bits: u8) -> Self {
        TokenFlags(bits)
    }

    /// Get the raw bits.
    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Check if a specific flag is set.
    #[inline]
    pub const fn contains(self, flag: u8) -> bool {
        self.0 & flag != 0
    }

    /// Set a flag.
    #[inline]
    pub fn set(&mut self, flag: u8) {
        self.0 |= flag;
    }

    /// Check if this token starts its line.
    #[inline]
    pub const fn is_start_of_line(self) -> bool {
        self.contains(Self::START_OF_LINE)
    }

    /// Check if whitespace preceded this token.
    #[inline]
    pub const fn has_leading_space(self) -> bool {
        self.contains(Self::LEADING_SPACE)
    }

    /// Check if exact-text extraction must re-scan for splices.
    #[inline]
    pub const fn needs_cleaning(self) -> bool {
        self.contains(Self::NEEDS_CLEANING)
    }

    /// Check if the scanner raised a diagnostic on this token.
    #[inline]
    pub const fn has_error(self) -> bool {
        self.contains(Self::HAS_ERROR)
    }
}

const _: () = assert!(std::mem::size_of::<TokenFlags>() == 1);

/// One lexical unit.
///
/// Immutable once constructed by the scanner. `name` is the interned
/// identifier payload ([`Name::NONE`] for everything else); literal text
/// is recovered from `(location, len)` through the location space.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct Token {
    /// Classification.
    pub kind: TokenKind,
    /// Position of the first byte.
    pub location: SourceLocation,
    /// Byte length in the buffer the token was scanned from (includes any
    /// escaped newlines; see [`TokenFlags::NEEDS_CLEANING`]).
    pub len: u32,
    /// Metadata flags.
    pub flags: TokenFlags,
    /// Interned identifier payload, or [`Name::NONE`].
    pub name: Name,
}

/// Size assertion: tokens stay fixed-size and cheap to copy.
const _: () = assert!(std::mem::size_of::<Token>() <= 16);

impl Token {
    /// Create a token without an identifier payload.
    #[inline]
    pub fn new(kind: TokenKind, location: SourceLocation, len: u32, flags: TokenFlags) -> Self {
        Token {
            kind,
            location,
            len,
            flags,
            name: Name::NONE,
        }
    }

    /// Create an identifier token carrying its interned name.
    #[inline]
    pub fn identifier(location: SourceLocation, len: u32, flags: TokenFlags, name: Name) -> Self {
        Token {
            kind: TokenKind::Identifier,
            location,
            len,
            flags,
            name,
        }
    }

    /// Returns `true` for the end-of-file sentinel.
    #[inline]
    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }

    /// Location one past the last byte of the token.
    #[inline]
    pub fn end_location(&self) -> SourceLocation {
        if self.location.is_file_location() {
            self.location.with_offset(self.len)
        } else {
            self.location
        }
    }
}

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?} @ {:?}+{}", self.kind, self.location, self.len)?;
        if self.flags.bits() != 0 {
            write!(f, " [{:#04x}]", self.flags.bits())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests;
