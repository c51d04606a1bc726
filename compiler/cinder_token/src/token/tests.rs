use super::*;
use crate::StringInterner;
use cinder_source::LocationSpace;
use pretty_assertions::assert_eq;

fn file_location(offset: u32) -> SourceLocation {
    let space = LocationSpace::new();
    let id = space
        .register_file("t.c", &"x".repeat(64))
        .expect("registration fits");
    space
        .location_for_offset(id, offset)
        .expect("offset within file")
}

#[test]
fn flags_set_and_query() {
    let mut flags = TokenFlags::EMPTY;
    assert!(!flags.is_start_of_line());
    flags.set(TokenFlags::START_OF_LINE);
    flags.set(TokenFlags::NEEDS_CLEANING);
    assert!(flags.is_start_of_line());
    assert!(flags.needs_cleaning());
    assert!(!flags.has_leading_space());
    assert!(!flags.has_error());
    assert_eq!(
        flags.bits(),
        TokenFlags::START_OF_LINE | TokenFlags::NEEDS_CLEANING
    );
}

#[test]
fn plain_token_has_no_name() {
    let tok = Token::new(TokenKind::Semi, file_location(3), 1, TokenFlags::EMPTY);
    assert_eq!(tok.name, Name::NONE);
    assert!(!tok.is_eof());
}

#[test]
fn identifier_token_carries_its_name() {
    let interner = StringInterner::new();
    let name = interner.intern("main");
    let tok = Token::identifier(file_location(0), 4, TokenFlags::EMPTY, name);
    assert_eq!(tok.kind, TokenKind::Identifier);
    assert_eq!(interner.resolve(tok.name), Some("main"));
}

#[test]
fn end_location_spans_the_token() {
    let loc = file_location(5);
    let tok = Token::new(TokenKind::NumericConstant, loc, 3, TokenFlags::EMPTY);
    assert_eq!(tok.end_location(), loc.with_offset(3));
}

#[test]
fn eof_token() {
    let tok = Token::new(TokenKind::Eof, file_location(10), 0, TokenFlags::EMPTY);
    assert!(tok.is_eof());
    assert_eq!(tok.end_location(), tok.location);
}
