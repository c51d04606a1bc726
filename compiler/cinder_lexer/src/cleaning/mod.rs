//! Escaped-newline removal and exact token text recovery.
//!
//! A backslash, optional horizontal whitespace, and a line terminator form
//! a *splice*: the scanner treats the sequence as if it were absent, so a
//! token's buffer bytes may not be its logical text. Tokens scanned across
//! a splice carry `NEEDS_CLEANING`, and [`clean_text`] strips the splices
//! back out. [`token_text`] packages the whole round trip: location
//! decomposition, buffer slicing, and cleaning when the flag demands it.

use std::borrow::Cow;

use cinder_source::{FileEntry, LocationSpace};
use cinder_token::Token;

/// Length in bytes of the escaped-newline sequence starting at `pos`, or
/// `None` if `bytes[pos]` does not begin one.
///
/// The sequence is a backslash, any run of spaces or tabs, and then one
/// line terminator (`\n`, `\r\n`, or `\r`). A backslash followed by
/// anything else is not a splice.
pub(crate) fn splice_len(bytes: &[u8], pos: usize) -> Option<usize> {
    if bytes.get(pos) != Some(&b'\\') {
        return None;
    }
    let mut cursor = pos + 1;
    while matches!(bytes.get(cursor), Some(b' ' | b'\t')) {
        cursor += 1;
    }
    match bytes.get(cursor) {
        Some(b'\n') => Some(cursor + 1 - pos),
        Some(b'\r') => {
            if bytes.get(cursor + 1) == Some(&b'\n') {
                Some(cursor + 2 - pos)
            } else {
                Some(cursor + 1 - pos)
            }
        }
        _ => None,
    }
}

/// Remove every escaped newline from `text`.
///
/// Borrows the input unchanged when it contains no splices, which is the
/// overwhelmingly common case.
pub fn clean_text(text: &str) -> Cow<'_, str> {
    let bytes = text.as_bytes();
    let Some(first) = first_splice(bytes) else {
        return Cow::Borrowed(text);
    };

    let mut cleaned = String::with_capacity(text.len());
    cleaned.push_str(&text[..first]);
    let mut pos = first;
    while pos < bytes.len() {
        if let Some(len) = splice_len(bytes, pos) {
            pos += len;
        } else {
            // Splices sit on ASCII boundaries, so byte-wise copying of the
            // remainder preserves UTF-8 sequences intact.
            let next = first_splice(&bytes[pos..]).map_or(bytes.len(), |off| pos + off);
            cleaned.push_str(&text[pos..next]);
            pos = next;
        }
    }
    Cow::Owned(cleaned)
}

fn first_splice(bytes: &[u8]) -> Option<usize> {
    let mut from = 0;
    while let Some(off) = memchr::memchr(b'\\', &bytes[from..]) {
        let pos = from + off;
        if splice_len(bytes, pos).is_some() {
            return Some(pos);
        }
        from = pos + 1;
    }
    None
}

/// The logical text of `token`, resolved through `space`.
///
/// Follows the spelling side of any expansion chain so macro-produced
/// tokens recover the text they were physically written with. Returns
/// `None` when the location cannot be resolved (invalid handle, failed
/// lazily-loaded entry, broken chain).
pub fn token_text(space: &LocationSpace, token: &Token) -> Option<String> {
    let (id, offset) = space.decompose_spelling(token.location)?;
    let entry = space.file(id)?;
    let raw = entry.text_range(offset, token.len);
    Some(if token.flags.needs_cleaning() {
        clean_text(raw).into_owned()
    } else {
        raw.to_owned()
    })
}

/// The logical text of a token known to be spelled inside `entry`.
///
/// Avoids the location-space lookup when the caller already holds the
/// entry; returns `None` if the token's location is not a file location
/// within it.
pub fn token_text_in<'a>(entry: &'a FileEntry, token: &Token) -> Option<Cow<'a, str>> {
    let offset = entry.local_offset(token.location)?;
    let raw = entry.text_range(offset, token.len);
    Some(if token.flags.needs_cleaning() {
        clean_text(raw)
    } else {
        Cow::Borrowed(raw)
    })
}
