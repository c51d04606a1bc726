//! Keyword resolution for instrumented scanning.
//!
//! The lookup uses the identifier's length as a first-pass filter
//! (keywords range from 2-8 chars), then matches against the keywords of
//! that length. Raw-mode scanning never calls this; it reports every
//! identifier-shaped token as `RawIdentifier`.

use cinder_token::TokenKind;

/// Look up a keyword by text.
///
/// Returns the keyword kind if `text` is a reserved word, `None` for a
/// regular identifier.
#[inline]
pub fn lookup(text: &str) -> Option<TokenKind> {
    let len = text.len();

    // Guard: all keywords are 2-8 chars and start with a lowercase letter.
    if !(2..=8).contains(&len) {
        return None;
    }
    if !text.as_bytes()[0].is_ascii_lowercase() {
        return None;
    }

    match len {
        2 => match text {
            "do" => Some(TokenKind::KwDo),
            "if" => Some(TokenKind::KwIf),
            _ => None,
        },
        3 => match text {
            "for" => Some(TokenKind::KwFor),
            "int" => Some(TokenKind::KwInt),
            _ => None,
        },
        4 => match text {
            "auto" => Some(TokenKind::KwAuto),
            "case" => Some(TokenKind::KwCase),
            "char" => Some(TokenKind::KwChar),
            "else" => Some(TokenKind::KwElse),
            "enum" => Some(TokenKind::KwEnum),
            "goto" => Some(TokenKind::KwGoto),
            "long" => Some(TokenKind::KwLong),
            "void" => Some(TokenKind::KwVoid),
            _ => None,
        },
        5 => match text {
            "break" => Some(TokenKind::KwBreak),
            "const" => Some(TokenKind::KwConst),
            "float" => Some(TokenKind::KwFloat),
            "short" => Some(TokenKind::KwShort),
            "union" => Some(TokenKind::KwUnion),
            "while" => Some(TokenKind::KwWhile),
            _ => None,
        },
        6 => match text {
            "double" => Some(TokenKind::KwDouble),
            "extern" => Some(TokenKind::KwExtern),
            "inline" => Some(TokenKind::KwInline),
            "return" => Some(TokenKind::KwReturn),
            "signed" => Some(TokenKind::KwSigned),
            "sizeof" => Some(TokenKind::KwSizeof),
            "static" => Some(TokenKind::KwStatic),
            "struct" => Some(TokenKind::KwStruct),
            "switch" => Some(TokenKind::KwSwitch),
            _ => None,
        },
        7 => match text {
            "default" => Some(TokenKind::KwDefault),
            "typedef" => Some(TokenKind::KwTypedef),
            _ => None,
        },
        8 => match text {
            "continue" => Some(TokenKind::KwContinue),
            "register" => Some(TokenKind::KwRegister),
            "restrict" => Some(TokenKind::KwRestrict),
            "unsigned" => Some(TokenKind::KwUnsigned),
            "volatile" => Some(TokenKind::KwVolatile),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests;
