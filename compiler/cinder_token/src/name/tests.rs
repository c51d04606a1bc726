use super::*;
use pretty_assertions::assert_eq;

#[test]
fn interning_is_idempotent() {
    let interner = StringInterner::new();
    let a = interner.intern("count");
    let b = interner.intern("count");
    assert_eq!(a, b);
    assert_eq!(interner.resolve(a), Some("count"));
}

#[test]
fn distinct_strings_get_distinct_names() {
    let interner = StringInterner::new();
    let a = interner.intern("x");
    let b = interner.intern("y");
    assert_ne!(a, b);
    assert_eq!(interner.resolve(a), Some("x"));
    assert_eq!(interner.resolve(b), Some("y"));
}

#[test]
fn empty_string_is_preinterned() {
    let interner = StringInterner::new();
    assert_eq!(interner.len(), 1);
    let empty = interner.intern("");
    assert_eq!(empty.raw(), 0);
    assert_eq!(interner.len(), 1);
}

#[test]
fn none_sentinel_does_not_resolve() {
    let interner = StringInterner::new();
    assert!(!Name::NONE.is_some());
    assert_eq!(interner.resolve(Name::NONE), None);
}

#[test]
fn names_are_stable_across_later_inserts() {
    let interner = StringInterner::new();
    let first = interner.intern("alpha");
    for i in 0..100 {
        interner.intern(&format!("ident{i}"));
    }
    assert_eq!(interner.resolve(first), Some("alpha"));
    assert_eq!(interner.intern("alpha"), first);
}

#[test]
fn shared_across_threads() {
    let interner = std::sync::Arc::new(StringInterner::new());
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let interner = std::sync::Arc::clone(&interner);
            std::thread::spawn(move || interner.intern("shared"))
        })
        .collect();
    let names: Vec<Name> = handles
        .into_iter()
        .map(|h| h.join().expect("thread completes"))
        .collect();
    assert!(names.windows(2).all(|w| w[0] == w[1]));
}
