//! The built token buffer and its range-translation queries.
//!
//! Index spaces: expanded indices address the buffer-wide expanded
//! stream; spelled indices address one file's spelled stream. A file's
//! spelled stream partitions into *pass-through* regions, where spelled
//! and expanded tokens correspond one-to-one and no mapping is stored,
//! and [`Mapping`]-covered regions, where a spelled range produced a
//! (possibly empty) expanded range through macro expansion. Pass-through
//! positions translate by arithmetic from the nearest mapping boundary;
//! mapped positions translate only at mapping edges.

use std::ops::Range;
use std::sync::Arc;

use cinder_source::{FileId, LocationSpace, SourceLocation};
use cinder_token::Token;
use rustc_hash::FxHashMap;

/// One correlated range pair: spelled tokens `[begin_spelled,
/// end_spelled)` of a file produced expanded tokens `[begin_expanded,
/// end_expanded)`.
///
/// An empty expanded range records text that vanished (an expansion to
/// nothing, or tokens consumed by directives). An empty spelled range
/// anchors an expanded sub-range that came from another file (an
/// included file's tokens interleaving with this one's), keeping the
/// pass-through arithmetic on both sides of it aligned.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct Mapping {
    pub begin_spelled: u32,
    pub end_spelled: u32,
    pub begin_expanded: u32,
    pub end_expanded: u32,
}

impl Mapping {
    /// The spelled side as a `usize` range.
    pub fn spelled_range(&self) -> Range<usize> {
        self.begin_spelled as usize..self.end_spelled as usize
    }

    /// The expanded side as a `usize` range.
    pub fn expanded_range(&self) -> Range<usize> {
        self.begin_expanded as usize..self.end_expanded as usize
    }
}

/// Per-file record: the spelled stream, its mappings, and the range of
/// expanded indices that resolve into this file.
#[derive(Debug)]
pub(crate) struct MarkedFile {
    pub(crate) spelled: Vec<Token>,
    /// Sorted and non-overlapping on both axes.
    pub(crate) mappings: Vec<Mapping>,
    pub(crate) begin_expanded: u32,
    pub(crate) end_expanded: u32,
}

/// The immutable artifact of a finished translation unit.
///
/// Built once by [`TokenCollector::consume`](crate::TokenCollector::consume),
/// read-only and freely shareable afterward.
#[derive(Debug)]
pub struct TokenBuffer {
    space: Arc<LocationSpace>,
    expanded: Vec<Token>,
    files: FxHashMap<FileId, MarkedFile>,
}

impl TokenBuffer {
    pub(crate) fn from_parts(
        space: Arc<LocationSpace>,
        expanded: Vec<Token>,
        files: FxHashMap<FileId, MarkedFile>,
    ) -> Self {
        Self {
            space,
            expanded,
            files,
        }
    }

    /// The parser-facing stream, ending with one end-of-file token.
    pub fn expanded_tokens(&self) -> &[Token] {
        &self.expanded
    }

    /// The literal tokens of `file`, in source order, ending with that
    /// file's end-of-file token. `None` if the file contributed nothing.
    pub fn spelled_tokens(&self, file: FileId) -> Option<&[Token]> {
        self.files.get(&file).map(|f| f.spelled.as_slice())
    }

    /// The mapping records of `file`, sorted on both axes.
    pub fn mappings(&self, file: FileId) -> Option<&[Mapping]> {
        self.files.get(&file).map(|f| f.mappings.as_slice())
    }

    /// The range of expanded indices whose provenance is `file`.
    pub fn expanded_range(&self, file: FileId) -> Option<Range<usize>> {
        self.files
            .get(&file)
            .map(|f| f.begin_expanded as usize..f.end_expanded as usize)
    }

    /// Files that contributed tokens to this buffer.
    pub fn file_ids(&self) -> impl Iterator<Item = FileId> + '_ {
        self.files.keys().copied()
    }

    /// Translate a non-empty expanded range to the spelled range that
    /// produced it.
    ///
    /// Tries first to narrow to a run of argument-spelled tokens (both
    /// endpoints inside expansions whose spellings form a contiguous run
    /// in one file); otherwise both endpoints must align with mapping or
    /// pass-through boundaries. Returns `None` for empty ranges, for
    /// ranges spanning files, and for ranges that would split an
    /// expansion.
    pub fn spelled_for_expanded(&self, range: Range<usize>) -> Option<(FileId, Range<usize>)> {
        if range.is_empty() || range.end > self.expanded.len() {
            return None;
        }

        if let Some(narrowed) = self.narrow_to_spelled_run(range.clone()) {
            return Some(narrowed);
        }

        let file_id = self.file_of_expanded(range.start)?;
        if self.file_of_expanded(range.end - 1)? != file_id {
            return None;
        }
        let file = self.files.get(&file_id)?;
        let begin = spelled_point_for_begin(file, range.start)?;
        let end = spelled_point_for_end(file, range.end)?;
        Some((file_id, begin..end))
    }

    /// Translate a spelled range of `file` to the expanded range it
    /// produced.
    ///
    /// An empty input maps to the empty expanded range at the
    /// corresponding position. Endpoints strictly inside a mapping's
    /// spelled range are unrepresentable and yield `None`.
    pub fn expanded_for_spelled(&self, file: FileId, range: Range<usize>) -> Option<Range<usize>> {
        let file = self.files.get(&file)?;
        if range.end > file.spelled.len() || range.start > range.end {
            return None;
        }
        let begin = expanded_point_for_begin(file, range.start)?;
        if range.is_empty() {
            return Some(begin..begin);
        }
        let end = expanded_point_for_end(file, range.end)?;
        Some(begin..end)
    }

    /// The file an expanded token's provenance chain resolves to.
    fn file_of_expanded(&self, index: usize) -> Option<FileId> {
        let top = self
            .space
            .expansion_location_full(self.expanded[index].location);
        if !top.is_file_location() {
            return None;
        }
        self.space.file_for_offset(top.offset())
    }

    /// Narrow an expanded range to the contiguous run of spelled tokens
    /// the expansions were spelled from, when one exists.
    ///
    /// Succeeds only when every token in the range comes from an
    /// expansion, is spelled inside its own top-level invocation range
    /// (macro arguments; body text is spelled at the definition, not the
    /// invocation), and the spellings are exactly consecutive spelled
    /// tokens of one file. A spelled token reused twice (an argument
    /// substituted into two positions) breaks consecutiveness and fails
    /// the narrowing.
    fn narrow_to_spelled_run(&self, range: Range<usize>) -> Option<(FileId, Range<usize>)> {
        let mut run: Option<(FileId, Range<usize>)> = None;
        for token in &self.expanded[range] {
            if !token.location.is_macro_location() {
                return None;
            }
            let record = self.space.top_expansion_record(token.location)?;
            if !record.call_begin.is_file_location() || !record.call_end.is_file_location() {
                return None;
            }
            let spelling = self.space.spelling_location_full(token.location);
            if !spelling.is_file_location()
                || spelling.offset() < record.call_begin.offset()
                || spelling.offset() >= record.call_end.offset()
            {
                return None;
            }
            let file_id = self.space.file_for_offset(spelling.offset())?;
            let file = self.files.get(&file_id)?;
            let index = spelled_index_exact(&file.spelled, spelling)?;
            match &mut run {
                None => run = Some((file_id, index..index + 1)),
                Some((run_file, run_range)) => {
                    if *run_file != file_id || index != run_range.end {
                        return None;
                    }
                    run_range.end = index + 1;
                }
            }
        }
        run
    }
}

/// Binary search a spelled stream for the token at exactly `location`.
fn spelled_index_exact(spelled: &[Token], location: SourceLocation) -> Option<usize> {
    spelled
        .binary_search_by_key(&location.raw(), |t| t.location.raw())
        .ok()
}

/// Spelled index corresponding to expanded index `b` used as a range
/// start. `None` if `b` falls strictly inside a mapping.
fn spelled_point_for_begin(file: &MarkedFile, b: usize) -> Option<usize> {
    let mappings = &file.mappings;
    let idx = mappings.partition_point(|m| (m.end_expanded as usize) <= b);
    if let Some(m) = mappings.get(idx) {
        if (m.begin_expanded as usize) <= b {
            return if (m.begin_expanded as usize) == b {
                Some(m.begin_spelled as usize)
            } else {
                None
            };
        }
    }
    // Pass-through: lock-step arithmetic from the previous boundary.
    Some(match idx.checked_sub(1).map(|i| &mappings[i]) {
        Some(prev) => prev.end_spelled as usize + (b - prev.end_expanded as usize),
        None => b - file.begin_expanded as usize,
    })
}

/// Spelled index corresponding to expanded index `e` used as an
/// exclusive range end. `None` if `e` falls strictly inside a mapping.
fn spelled_point_for_end(file: &MarkedFile, e: usize) -> Option<usize> {
    let mappings = &file.mappings;
    let last = e - 1;
    let idx = mappings.partition_point(|m| (m.end_expanded as usize) <= last);
    if let Some(m) = mappings.get(idx) {
        if (m.begin_expanded as usize) <= last {
            return if (m.end_expanded as usize) == e {
                Some(m.end_spelled as usize)
            } else {
                None
            };
        }
    }
    Some(match idx.checked_sub(1).map(|i| &mappings[i]) {
        Some(prev) => prev.end_spelled as usize + (e - prev.end_expanded as usize),
        None => e - file.begin_expanded as usize,
    })
}

/// Expanded index corresponding to spelled index `b` used as a range
/// start.
fn expanded_point_for_begin(file: &MarkedFile, b: usize) -> Option<usize> {
    let mappings = &file.mappings;
    let idx = mappings.partition_point(|m| (m.end_spelled as usize) <= b);
    if let Some(m) = mappings.get(idx) {
        if (m.begin_spelled as usize) <= b {
            return if (m.begin_spelled as usize) == b {
                Some(m.begin_expanded as usize)
            } else {
                None
            };
        }
    }
    Some(match idx.checked_sub(1).map(|i| &mappings[i]) {
        Some(prev) => prev.end_expanded as usize + (b - prev.end_spelled as usize),
        None => file.begin_expanded as usize + b,
    })
}

/// Expanded index corresponding to spelled index `e` used as an
/// exclusive range end.
fn expanded_point_for_end(file: &MarkedFile, e: usize) -> Option<usize> {
    let mappings = &file.mappings;
    let last = e - 1;
    let idx = mappings.partition_point(|m| (m.end_spelled as usize) <= last);
    if let Some(m) = mappings.get(idx) {
        if (m.begin_spelled as usize) <= last {
            return if (m.end_spelled as usize) == e {
                Some(m.end_expanded as usize)
            } else {
                None
            };
        }
    }
    Some(match idx.checked_sub(1).map(|i| &mappings[i]) {
        Some(prev) => prev.end_expanded as usize + (e - prev.end_spelled as usize),
        None => file.begin_expanded as usize + e,
    })
}

#[cfg(test)]
mod tests;
