use cinder_token::TokenKind;
use pretty_assertions::assert_eq;

use super::lookup;

#[test]
fn resolves_every_keyword() {
    for kind in [
        TokenKind::KwAuto,
        TokenKind::KwBreak,
        TokenKind::KwCase,
        TokenKind::KwChar,
        TokenKind::KwConst,
        TokenKind::KwContinue,
        TokenKind::KwDefault,
        TokenKind::KwDo,
        TokenKind::KwDouble,
        TokenKind::KwElse,
        TokenKind::KwEnum,
        TokenKind::KwExtern,
        TokenKind::KwFloat,
        TokenKind::KwFor,
        TokenKind::KwGoto,
        TokenKind::KwIf,
        TokenKind::KwInline,
        TokenKind::KwInt,
        TokenKind::KwLong,
        TokenKind::KwRegister,
        TokenKind::KwRestrict,
        TokenKind::KwReturn,
        TokenKind::KwShort,
        TokenKind::KwSigned,
        TokenKind::KwSizeof,
        TokenKind::KwStatic,
        TokenKind::KwStruct,
        TokenKind::KwSwitch,
        TokenKind::KwTypedef,
        TokenKind::KwUnion,
        TokenKind::KwUnsigned,
        TokenKind::KwVoid,
        TokenKind::KwVolatile,
        TokenKind::KwWhile,
    ] {
        let spelling = kind.spelling().expect("keywords have a fixed spelling");
        assert_eq!(lookup(spelling), Some(kind), "spelling {spelling:?}");
    }
}

#[test]
fn rejects_non_keywords() {
    assert_eq!(lookup(""), None);
    assert_eq!(lookup("x"), None);
    assert_eq!(lookup("interned"), None);
    assert_eq!(lookup("Int"), None);
    assert_eq!(lookup("int0"), None);
    assert_eq!(lookup("_static"), None);
    assert_eq!(lookup("whiles"), None);
}

#[test]
fn rejects_near_misses_at_keyword_length() {
    assert_eq!(lookup("iff"), None);
    assert_eq!(lookup("vodi"), None);
    assert_eq!(lookup("shrot"), None);
    assert_eq!(lookup("regsiter"), None);
}
