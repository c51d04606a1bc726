use super::*;
use pretty_assertions::assert_eq;

#[test]
fn sentinel_follows_content() {
    let buf = SourceBuffer::new("int x;");
    let bytes = buf.as_sentinel_bytes();
    assert_eq!(bytes[buf.len() as usize], 0, "sentinel must be 0x00");
    assert_eq!(buf.as_bytes(), b"int x;");
    assert_eq!(buf.as_str(), "int x;");
}

#[test]
fn padding_is_zero_filled() {
    let buf = SourceBuffer::new("x");
    let bytes = buf.as_sentinel_bytes();
    assert_eq!(bytes.len() % 64, 0, "buffer rounds up to 64-byte boundary");
    assert!(bytes[buf.len() as usize..].iter().all(|&b| b == 0));
}

#[test]
fn empty_source() {
    let buf = SourceBuffer::new("");
    assert!(buf.is_empty());
    assert_eq!(buf.len(), 0);
    assert_eq!(buf.as_sentinel_bytes().len(), 64);
    assert!(buf.cursor().is_eof());
}

#[test]
fn exact_boundary_still_has_sentinel() {
    // 63 bytes of content + sentinel fills one cache line exactly;
    // 64 bytes of content must spill into a second line.
    let src63 = "a".repeat(63);
    let src64 = "a".repeat(64);
    assert_eq!(SourceBuffer::new(&src63).as_sentinel_bytes().len(), 64);
    assert_eq!(SourceBuffer::new(&src64).as_sentinel_bytes().len(), 128);
}

#[test]
fn cursor_at_clamps_to_eof() {
    let buf = SourceBuffer::new("ab");
    let cursor = buf.cursor_at(100);
    assert!(cursor.is_eof());
    assert_eq!(cursor.pos(), 2);
}

#[test]
fn interior_null_is_not_eof() {
    let buf = SourceBuffer::new("a\0b");
    let mut cursor = buf.cursor();
    cursor.advance();
    assert_eq!(cursor.current(), 0);
    assert!(!cursor.is_eof(), "interior null must not read as EOF");
}
