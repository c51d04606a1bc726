use super::*;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn space_with_files(texts: &[&str]) -> (LocationSpace, Vec<FileId>) {
    let space = LocationSpace::new();
    let ids = texts
        .iter()
        .enumerate()
        .map(|(i, text)| {
            space
                .register_file(format!("file{i}.c"), text)
                .expect("registration fits in offset space")
        })
        .collect();
    (space, ids)
}

#[test]
fn register_reserves_strictly_increasing_ranges() {
    let (space, ids) = space_with_files(&["abc", "", "xy"]);
    let starts: Vec<u32> = ids
        .iter()
        .map(|&id| {
            space
                .start_location(id)
                .expect("registered file has a start")
                .offset()
        })
        .collect();
    // abc: [1, 4], empty: [5, 5], xy: [6, 8]
    assert_eq!(starts, vec![1, 5, 6]);
}

#[test]
fn round_trip_decomposition() {
    let (space, ids) = space_with_files(&["int main", "void f", "x"]);
    for &id in &ids {
        let len = space.file(id).expect("local entry resolves").len();
        for offset in 0..=len {
            let loc = space
                .location_for_offset(id, offset)
                .expect("every in-range offset has a location");
            assert_eq!(space.decompose(loc), Some((id, offset)));
            // Reconstructing from (handle, offset) yields the original.
            assert_eq!(space.location_for_offset(id, offset), Some(loc));
        }
    }
}

#[test]
fn out_of_range_offsets_do_not_resolve() {
    let (space, ids) = space_with_files(&["ab"]);
    assert_eq!(space.file_for_offset(0), None);
    assert_eq!(space.location_for_offset(ids[0], 3), None);
    assert_eq!(space.decompose(SourceLocation::INVALID), None);
    // One past this file's EOF offset belongs to nobody.
    assert_eq!(space.file_for_offset(4), None);
}

#[test]
fn sequential_then_random_lookup_agree() {
    let texts: Vec<String> = (0..32).map(|i| "x".repeat(i % 7 + 1)).collect();
    let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
    let (space, ids) = space_with_files(&refs);

    // Sequential pattern: the scanner advancing through every file.
    let mut expected = Vec::new();
    for &id in &ids {
        let len = space.file(id).expect("local entry resolves").len();
        for offset in 0..=len {
            let loc = space
                .location_for_offset(id, offset)
                .expect("in-range offset");
            expected.push((loc.offset(), id));
            assert_eq!(space.file_for_offset(loc.offset()), Some(id));
        }
    }

    // Random-access pattern: tooling probing arbitrary offsets. Striding
    // by a large co-prime visits the same offsets out of order, defeating
    // the cache and the linear probe.
    let n = expected.len();
    for k in 0..n {
        let (offset, id) = expected[(k * 17) % n];
        assert_eq!(space.file_for_offset(offset), Some(id));
    }
}

#[test]
fn expansion_chain_decomposes_to_call_site() {
    let (space, ids) = space_with_files(&["A B(C) D"]);
    let file = ids[0];
    let at = |off| {
        space
            .location_for_offset(file, off)
            .expect("offset within file")
    };

    // B(C) at offsets 2..6; the expansion is spelled at C (offset 4).
    let mac = space
        .register_expansion(at(4), at(2), at(6))
        .expect("expansion table has room");
    assert!(mac.is_macro_location());
    assert_eq!(space.decompose(mac), Some((file, 2)));
    assert_eq!(space.decompose_spelling(mac), Some((file, 4)));

    // A nested record chains through the first one.
    let nested = space
        .register_expansion(mac, mac, mac)
        .expect("expansion table has room");
    assert_eq!(space.decompose(nested), Some((file, 2)));
    assert_eq!(space.decompose_spelling(nested), Some((file, 4)));

    // The outermost record is the one written directly in the file.
    assert_eq!(
        space.top_expansion_record(nested),
        Some(ExpansionRecord {
            spelling: at(4),
            call_begin: at(2),
            call_end: at(6),
        })
    );
    assert_eq!(space.top_expansion_record(at(0)), None);
}

#[test]
fn single_hop_accessors() {
    let (space, ids) = space_with_files(&["abcdef"]);
    let file = ids[0];
    let at = |off| {
        space
            .location_for_offset(file, off)
            .expect("offset within file")
    };
    let (spell, begin, end) = (at(1), at(3), at(5));
    let mac = space
        .register_expansion(spell, begin, end)
        .expect("expansion table has room");

    assert_eq!(space.expansion_location(mac), begin);
    assert_eq!(space.spelling_location(mac), spell);
    // File locations hop to themselves.
    assert_eq!(space.expansion_location(begin), begin);
    assert_eq!(space.spelling_location(begin), begin);
    // Records are exposed for the token-buffer builder.
    assert_eq!(
        space.expansion_record(mac),
        Some(ExpansionRecord {
            spelling: spell,
            call_begin: begin,
            call_end: end,
        })
    );
}

struct FakeExternal {
    entries: Vec<Option<(String, String)>>,
}

impl ExternalLocationSource for FakeExternal {
    fn entry_count(&self) -> u32 {
        u32::try_from(self.entries.len()).unwrap_or(0)
    }

    fn entry_len(&self, index: u32) -> Option<u32> {
        self.entries
            .get(index as usize)?
            .as_ref()
            .map(|(_, text)| u32::try_from(text.len()).unwrap_or(u32::MAX))
    }

    fn materialize(&self, index: u32) -> Option<(String, String)> {
        self.entries.get(index as usize)?.clone()
    }
}

#[test]
fn lazy_entries_materialize_on_first_touch() {
    let space = LocationSpace::new();
    let local = space
        .register_file("main.c", "local")
        .expect("registration fits");
    space
        .attach_external(Box::new(FakeExternal {
            entries: vec![
                Some(("pch0.h".into(), "extern".into())),
                None, // unreadable header
                Some(("pch2.h".into(), "ok".into())),
            ],
        }))
        .expect("first attach succeeds");

    let id0 = FileId::loaded(0);
    let id1 = FileId::loaded(1);
    let id2 = FileId::loaded(2);

    // Start locations resolve without materializing.
    let start0 = space
        .start_location(id0)
        .expect("reserved entry has a start");

    // Offsets inside the reserved ranges resolve to loaded handles.
    assert_eq!(space.file_for_offset(start0.offset() + 2), Some(id0));

    // Materialization happens on first content access.
    let entry0 = space.file(id0).expect("entry materializes");
    assert_eq!(entry0.text(), "extern");
    assert_eq!(entry0.name(), "pch0.h");
    assert_eq!(entry0.id(), id0);

    // A failed entry is permanently invalid but isolates the damage.
    assert!(space.file(id1).is_none());
    assert!(space.file(id1).is_none(), "failure is sticky");
    assert_eq!(
        space.file(id2).as_deref().map(FileEntry::text),
        Some("ok")
    );
    assert_eq!(
        space.file(local).as_deref().map(FileEntry::text),
        Some("local")
    );
}

#[test]
fn second_external_source_is_rejected() {
    let space = LocationSpace::new();
    let attach =
        |space: &LocationSpace| space.attach_external(Box::new(FakeExternal { entries: vec![] }));
    assert!(attach(&space).is_ok());
    assert!(matches!(
        attach(&space),
        Err(RegisterError::ExternalAlreadyAttached)
    ));
}

#[test]
fn decompose_of_broken_chain_is_none() {
    let space = LocationSpace::new();
    // A record whose call site is the invalid sentinel.
    let mac = space
        .register_expansion(
            SourceLocation::INVALID,
            SourceLocation::INVALID,
            SourceLocation::INVALID,
        )
        .expect("expansion table has room");
    assert_eq!(space.decompose(mac), None);
    assert_eq!(space.decompose_spelling(mac), None);
}

proptest! {
    /// The hybrid lookup agrees with a straightforward scan over the
    /// registered entries for arbitrary query patterns.
    #[test]
    fn hybrid_lookup_matches_linear_scan(
        lens in prop::collection::vec(0u32..20, 1..20),
        queries in prop::collection::vec(0u32..600, 1..60),
    ) {
        let space = LocationSpace::new();
        let mut spans = Vec::new();
        let mut next = 1u32;
        for (i, &len) in lens.iter().enumerate() {
            let text = "y".repeat(len as usize);
            let id = space.register_file(format!("f{i}"), &text)
                .expect("registration fits");
            spans.push((next, next + len, id));
            next += len + 1;
        }
        for &q in &queries {
            let expected = spans
                .iter()
                .find(|&&(start, end, _)| q >= start && q <= end)
                .map(|&(_, _, id)| id);
            prop_assert_eq!(space.file_for_offset(q), expected);
        }
    }
}
