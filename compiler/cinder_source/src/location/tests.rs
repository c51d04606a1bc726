use super::*;
use pretty_assertions::assert_eq;

#[test]
fn invalid_sentinel_is_not_a_location() {
    let loc = SourceLocation::INVALID;
    assert!(!loc.is_valid());
    assert!(!loc.is_file_location());
    assert!(!loc.is_macro_location());
    assert_eq!(loc, SourceLocation::default());
}

#[test]
fn file_and_macro_interpretations_are_disjoint() {
    let file = SourceLocation::from_offset(42);
    assert!(file.is_valid());
    assert!(file.is_file_location());
    assert!(!file.is_macro_location());
    assert_eq!(file.offset(), 42);

    let mac = SourceLocation::from_macro_index(0);
    assert!(mac.is_valid());
    assert!(mac.is_macro_location());
    assert!(!mac.is_file_location());
    assert_eq!(mac.macro_index(), 0);
}

#[test]
fn with_offset_advances_file_locations() {
    let loc = SourceLocation::from_offset(10);
    assert_eq!(loc.with_offset(5).offset(), 15);
    assert_eq!(loc.with_offset(0), loc);
}

#[test]
fn raw_roundtrip() {
    let loc = SourceLocation::from_macro_index(7);
    assert_eq!(SourceLocation::from_raw(loc.raw()), loc);
}

#[test]
fn file_id_tables_are_disjoint() {
    let local = FileId::local(3);
    assert!(local.is_local());
    assert!(!local.is_loaded());
    assert_eq!(local.local_index(), Some(3));
    assert_eq!(local.loaded_index(), None);

    let loaded = FileId::loaded(0);
    assert!(loaded.is_loaded());
    assert!(!loaded.is_local());
    assert_eq!(loaded.loaded_index(), Some(0));
    assert_eq!(loaded.local_index(), None);

    assert!(!FileId::INVALID.is_valid());
    assert_eq!(FileId::INVALID.local_index(), None);
    assert_eq!(FileId::INVALID.loaded_index(), None);
}

#[test]
fn debug_formatting_names_the_variant() {
    assert_eq!(format!("{:?}", SourceLocation::INVALID), "loc(invalid)");
    assert_eq!(format!("{:?}", SourceLocation::from_offset(9)), "loc(9)");
    assert_eq!(
        format!("{:?}", SourceLocation::from_macro_index(2)),
        "loc(macro#2)"
    );
    assert_eq!(format!("{:?}", FileId::loaded(1)), "file(loaded#1)");
}
