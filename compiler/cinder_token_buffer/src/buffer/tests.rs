use std::sync::Arc;

use cinder_source::{FileId, LocationSpace, SourceLocation};
use cinder_token::{Token, TokenFlags, TokenKind};
use pretty_assertions::assert_eq;
use rustc_hash::FxHashMap;

use super::{Mapping, MarkedFile, TokenBuffer};

fn dummy_token() -> Token {
    Token::new(TokenKind::Unknown, SourceLocation::INVALID, 0, TokenFlags::EMPTY)
}

/// A hand-built file: ten spelled tokens, expanded range starting at 1,
/// one real mapping (spelled 2..5 -> expanded 3..4) and one empty one
/// (spelled 7..8 -> expanded 6..6).
fn fixture() -> (TokenBuffer, FileId) {
    let space = Arc::new(LocationSpace::new());
    let file_id = space
        .register_file("fixture.c", "irrelevant")
        .expect("file registers");
    let marked = MarkedFile {
        spelled: vec![dummy_token(); 10],
        mappings: vec![
            Mapping {
                begin_spelled: 2,
                end_spelled: 5,
                begin_expanded: 3,
                end_expanded: 4,
            },
            Mapping {
                begin_spelled: 7,
                end_spelled: 8,
                begin_expanded: 6,
                end_expanded: 6,
            },
        ],
        begin_expanded: 1,
        end_expanded: 8,
    };
    let mut files = FxHashMap::default();
    files.insert(file_id, marked);
    (TokenBuffer::from_parts(space, Vec::new(), files), file_id)
}

#[test]
fn mapping_range_accessors() {
    let mapping = Mapping {
        begin_spelled: 1,
        end_spelled: 5,
        begin_expanded: 1,
        end_expanded: 3,
    };
    assert_eq!(mapping.spelled_range(), 1..5);
    assert_eq!(mapping.expanded_range(), 1..3);
}

#[test]
fn pass_through_translates_by_arithmetic() {
    let (buffer, file) = fixture();
    assert_eq!(buffer.expanded_for_spelled(file, 0..2), Some(1..3));
    assert_eq!(buffer.expanded_for_spelled(file, 5..7), Some(4..6));
    assert_eq!(buffer.expanded_for_spelled(file, 8..10), Some(6..8));
}

#[test]
fn whole_mappings_translate_to_their_expanded_side() {
    let (buffer, file) = fixture();
    assert_eq!(buffer.expanded_for_spelled(file, 2..5), Some(3..4));
    // The empty mapping: this text expanded to nothing.
    assert_eq!(buffer.expanded_for_spelled(file, 7..8), Some(6..6));
}

#[test]
fn ranges_spanning_regions_translate_when_aligned() {
    let (buffer, file) = fixture();
    assert_eq!(buffer.expanded_for_spelled(file, 0..10), Some(1..8));
    assert_eq!(buffer.expanded_for_spelled(file, 6..8), Some(5..6));
}

#[test]
fn endpoints_inside_a_mapping_are_rejected() {
    let (buffer, file) = fixture();
    assert_eq!(buffer.expanded_for_spelled(file, 3..5), None);
    assert_eq!(buffer.expanded_for_spelled(file, 2..4), None);
    assert_eq!(buffer.expanded_for_spelled(file, 3..4), None);
}

#[test]
fn empty_spelled_range_maps_to_a_point() {
    let (buffer, file) = fixture();
    assert_eq!(buffer.expanded_for_spelled(file, 0..0), Some(1..1));
    assert_eq!(buffer.expanded_for_spelled(file, 2..2), Some(3..3));
    assert_eq!(buffer.expanded_for_spelled(file, 10..10), Some(8..8));
    // Strictly inside a mapping even a zero-width point is meaningless.
    assert_eq!(buffer.expanded_for_spelled(file, 3..3), None);
}

#[test]
fn out_of_range_queries_fail() {
    let (buffer, file) = fixture();
    assert_eq!(buffer.expanded_for_spelled(file, 5..11), None);
    assert_eq!(buffer.expanded_for_spelled(FileId::INVALID, 0..1), None);
    assert_eq!(buffer.spelled_for_expanded(0..0), None);
}
