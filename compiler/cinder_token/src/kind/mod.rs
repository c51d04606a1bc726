//! Token classification.
//!
//! `TokenKind` is a fieldless discriminant: payloads (identifier names,
//! literal text) live outside the kind so a token stays a small `Copy`
//! value. Keyword kinds exist only in instrumented scanning; raw-mode
//! scanning reports every identifier-shaped token as `RawIdentifier`.

/// Token kinds for the Cinder language.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
#[repr(u8)]
pub enum TokenKind {
    /// End of file. The expanded stream ends with exactly one of these.
    #[default]
    Eof,
    /// Unrecognized byte, or a malformed literal recovered locally.
    Unknown,

    /// Resolved identifier (instrumented mode; carries an interned name).
    Identifier,
    /// Identifier-shaped token from raw mode: neither keyword-resolved
    /// nor interned.
    RawIdentifier,
    /// Numeric constant: integer or floating, any radix, suffixes intact.
    NumericConstant,
    /// String literal including its quotes.
    StringLiteral,
    /// Character constant including its quotes.
    CharConstant,

    // ─── Keywords ────────────────────────────────────────────────────
    KwAuto,
    KwBreak,
    KwCase,
    KwChar,
    KwConst,
    KwContinue,
    KwDefault,
    KwDo,
    KwDouble,
    KwElse,
    KwEnum,
    KwExtern,
    KwFloat,
    KwFor,
    KwGoto,
    KwIf,
    KwInline,
    KwInt,
    KwLong,
    KwRegister,
    KwRestrict,
    KwReturn,
    KwShort,
    KwSigned,
    KwSizeof,
    KwStatic,
    KwStruct,
    KwSwitch,
    KwTypedef,
    KwUnion,
    KwUnsigned,
    KwVoid,
    KwVolatile,
    KwWhile,

    // ─── Punctuation ─────────────────────────────────────────────────
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Semi,
    Question,
    Tilde,
    Dot,
    Ellipsis,
    Arrow,
    Plus,
    PlusPlus,
    PlusEqual,
    Minus,
    MinusMinus,
    MinusEqual,
    Star,
    StarEqual,
    Slash,
    SlashEqual,
    Percent,
    PercentEqual,
    Amp,
    AmpAmp,
    AmpEqual,
    Pipe,
    PipePipe,
    PipeEqual,
    Caret,
    CaretEqual,
    Bang,
    BangEqual,
    Equal,
    EqualEqual,
    Less,
    LessEqual,
    Shl,
    ShlEqual,
    Greater,
    GreaterEqual,
    Shr,
    ShrEqual,
    Colon,
    ColonColon,
    Hash,
    HashHash,
}

const _: () = assert!(std::mem::size_of::<TokenKind>() == 1);

impl TokenKind {
    /// Returns `true` for keyword kinds.
    pub fn is_keyword(self) -> bool {
        (self as u8) >= (TokenKind::KwAuto as u8) && (self as u8) <= (TokenKind::KwWhile as u8)
    }

    /// Returns `true` for punctuation kinds.
    pub fn is_punctuation(self) -> bool {
        (self as u8) >= (TokenKind::LParen as u8)
    }

    /// Returns `true` for literal kinds.
    pub fn is_literal(self) -> bool {
        matches!(
            self,
            TokenKind::NumericConstant | TokenKind::StringLiteral | TokenKind::CharConstant
        )
    }

    /// Returns `true` for identifier-shaped kinds (resolved or raw).
    pub fn is_identifier_like(self) -> bool {
        matches!(self, TokenKind::Identifier | TokenKind::RawIdentifier)
    }

    /// Fixed spelling for keywords and punctuation, `None` otherwise.
    pub fn spelling(self) -> Option<&'static str> {
        use TokenKind::*;
        Some(match self {
            KwAuto => "auto",
            KwBreak => "break",
            KwCase => "case",
            KwChar => "char",
            KwConst => "const",
            KwContinue => "continue",
            KwDefault => "default",
            KwDo => "do",
            KwDouble => "double",
            KwElse => "else",
            KwEnum => "enum",
            KwExtern => "extern",
            KwFloat => "float",
            KwFor => "for",
            KwGoto => "goto",
            KwIf => "if",
            KwInline => "inline",
            KwInt => "int",
            KwLong => "long",
            KwRegister => "register",
            KwRestrict => "restrict",
            KwReturn => "return",
            KwShort => "short",
            KwSigned => "signed",
            KwSizeof => "sizeof",
            KwStatic => "static",
            KwStruct => "struct",
            KwSwitch => "switch",
            KwTypedef => "typedef",
            KwUnion => "union",
            KwUnsigned => "unsigned",
            KwVoid => "void",
            KwVolatile => "volatile",
            KwWhile => "while",
            LParen => "(",
            RParen => ")",
            LBracket => "[",
            RBracket => "]",
            LBrace => "{",
            RBrace => "}",
            Comma => ",",
            Semi => ";",
            Question => "?",
            Tilde => "~",
            Dot => ".",
            Ellipsis => "...",
            Arrow => "->",
            Plus => "+",
            PlusPlus => "++",
            PlusEqual => "+=",
            Minus => "-",
            MinusMinus => "--",
            MinusEqual => "-=",
            Star => "*",
            StarEqual => "*=",
            Slash => "/",
            SlashEqual => "/=",
            Percent => "%",
            PercentEqual => "%=",
            Amp => "&",
            AmpAmp => "&&",
            AmpEqual => "&=",
            Pipe => "|",
            PipePipe => "||",
            PipeEqual => "|=",
            Caret => "^",
            CaretEqual => "^=",
            Bang => "!",
            BangEqual => "!=",
            Equal => "=",
            EqualEqual => "==",
            Less => "<",
            LessEqual => "<=",
            Shl => "<<",
            ShlEqual => "<<=",
            Greater => ">",
            GreaterEqual => ">=",
            Shr => ">>",
            ShrEqual => ">>=",
            Colon => ":",
            ColonColon => "::",
            Hash => "#",
            HashHash => "##",
            Eof | Unknown | Identifier | RawIdentifier | NumericConstant | StringLiteral
            | CharConstant => return None,
        })
    }
}
