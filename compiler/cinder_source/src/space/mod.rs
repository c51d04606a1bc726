//! The append-only location space and its resolution machinery.
//!
//! [`LocationSpace`] assigns every registered file a contiguous range of
//! offsets (one extra offset past the end so EOF positions are
//! representable) and every macro expansion an entry in a flat side table.
//! Registration is single-writer; resolution is lock-free in the common
//! case and safe under concurrent readers.
//!
//! # Offset lookup
//!
//! Offset-to-file resolution is overwhelmingly sequential (the scanner asks
//! for nearby offsets as it advances), so the space keeps a "last resolved
//! entry" cache: a hit is O(1), a miss probes a few neighboring entries
//! linearly, and only then does a binary search over the full table run.
//! The cache is pure memoization -- results never depend on its contents.
//!
//! # Lazily-loaded entries
//!
//! Entries imported from an already-serialized program state live in a
//! separate table addressed by negative [`FileId`]s. Their offset ranges
//! are reserved eagerly (so locations referring into them resolve to a
//! handle immediately), but their contents are materialized on first
//! touch. A materialization failure marks that entry permanently invalid
//! without disturbing resolution for any other handle.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use cinder_lexer_core::SourceBuffer;
use parking_lot::RwLock;
use thiserror::Error;
use tracing::debug;

use crate::{FileId, SourceLocation};

/// Maximum offset usable for file locations (the tag bit is reserved).
const OFFSET_LIMIT: u32 = 1 << 31;

/// Linear probe distance before falling back to binary search.
const MAX_PROBE: usize = 8;

/// Registration failure.
#[derive(Debug, Error)]
pub enum RegisterError {
    /// The global offset space cannot fit another `requested` offsets.
    #[error("location space exhausted: {requested} more offsets requested")]
    OffsetSpaceExhausted {
        /// Number of offsets the failed registration asked for.
        requested: u64,
    },
    /// An external location source is already attached.
    #[error("an external location source is already attached")]
    ExternalAlreadyAttached,
}

/// One loaded buffer: a real file or a synthesized one.
///
/// Owns the buffer bytes (NUL-terminated via [`SourceBuffer`]) and the
/// entry's starting offset in the global space.
#[derive(Debug)]
pub struct FileEntry {
    id: FileId,
    name: String,
    start: u32,
    buffer: SourceBuffer,
}

impl FileEntry {
    /// The handle this entry is registered under.
    pub fn id(&self) -> FileId {
        self.id
    }

    /// The name the buffer was registered with (a path or a synthetic tag).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// First offset of this entry's reserved range.
    pub fn start_offset(&self) -> u32 {
        self.start
    }

    /// Location of the first byte of the buffer.
    pub fn start_location(&self) -> SourceLocation {
        SourceLocation::from_offset(self.start)
    }

    /// The sentinel-terminated buffer.
    pub fn buffer(&self) -> &SourceBuffer {
        &self.buffer
    }

    /// The buffer content as text.
    pub fn text(&self) -> &str {
        self.buffer.as_str()
    }

    /// Content length in bytes.
    pub fn len(&self) -> u32 {
        self.buffer.len()
    }

    /// Returns `true` for an empty buffer.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Returns `true` if `offset` (global) falls in this entry's range.
    ///
    /// The range includes one offset past the last byte, so EOF locations
    /// resolve to their file.
    pub fn contains_offset(&self, offset: u32) -> bool {
        offset >= self.start && offset <= self.start + self.len()
    }

    /// Translate a location inside this entry to a local byte offset.
    pub fn local_offset(&self, loc: SourceLocation) -> Option<u32> {
        if loc.is_file_location() && self.contains_offset(loc.offset()) {
            Some(loc.offset() - self.start)
        } else {
            None
        }
    }

    /// Slice of the buffer text for a local `[offset, offset + len)` range.
    pub fn text_range(&self, offset: u32, len: u32) -> &str {
        let end = (offset + len).min(self.buffer.len());
        let start = offset.min(end);
        &self.text()[start as usize..end as usize]
    }
}

/// Metadata linking a macro-produced location to its provenance.
///
/// `spelling` is where the expanded text was physically written (inside a
/// macro body or an argument); `call_begin..call_end` is the invocation
/// range that triggered the substitution. Records chain: `spelling` (or
/// `call_begin`) may itself be a macro location pointing at an earlier
/// record, and every hop refers to a strictly earlier location, so
/// decomposition terminates.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ExpansionRecord {
    /// Where the expanded text was physically spelled.
    pub spelling: SourceLocation,
    /// Start of the invocation range that triggered the expansion.
    pub call_begin: SourceLocation,
    /// End (exclusive) of the invocation range.
    pub call_end: SourceLocation,
}

/// Source of lazily-loaded entries from a serialized program state.
///
/// The wire format is out of scope here; the space only needs to reserve
/// offset ranges up front and fetch contents on first touch.
pub trait ExternalLocationSource: Send + Sync {
    /// Number of entries the serialized state provides.
    fn entry_count(&self) -> u32;

    /// Content length in bytes of entry `index`, or `None` if the entry
    /// header itself is unreadable.
    fn entry_len(&self, index: u32) -> Option<u32>;

    /// Produce `(name, text)` for entry `index`.
    ///
    /// Returning `None`, or text whose length disagrees with
    /// [`entry_len`](Self::entry_len), marks the entry permanently invalid.
    fn materialize(&self, index: u32) -> Option<(String, String)>;
}

struct LocalTable {
    files: Vec<Arc<FileEntry>>,
    /// Next free offset. Starts at 1; offset 0 is the invalid sentinel.
    next_offset: u32,
}

enum LoadedState {
    NotLoaded,
    Loaded(Arc<FileEntry>),
    Failed,
}

struct LoadedEntry {
    start: u32,
    len: u32,
    state: LoadedState,
}

struct LoadedTable {
    entries: Vec<LoadedEntry>,
    source: Option<Box<dyn ExternalLocationSource>>,
}

/// The process-wide virtual address space for source locations.
///
/// Append-only and single-writer: the component registering files and
/// expansions is the only mutator, and previously returned data is never
/// changed, so readers on other threads need no coordination beyond the
/// internal locks.
pub struct LocationSpace {
    local: RwLock<LocalTable>,
    loaded: RwLock<LoadedTable>,
    expansions: RwLock<Vec<ExpansionRecord>>,
    /// Index of the most recently resolved local entry. Pure memoization:
    /// stale or garbage values only cost extra probes, never wrong answers.
    last_local: AtomicUsize,
}

impl Default for LocationSpace {
    fn default() -> Self {
        Self::new()
    }
}

impl LocationSpace {
    /// Create an empty location space.
    pub fn new() -> Self {
        Self {
            local: RwLock::new(LocalTable {
                files: Vec::new(),
                next_offset: 1,
            }),
            loaded: RwLock::new(LoadedTable {
                entries: Vec::new(),
                source: None,
            }),
            expansions: RwLock::new(Vec::new()),
            last_local: AtomicUsize::new(usize::MAX),
        }
    }

    // ─── Registration ────────────────────────────────────────────────

    /// Register a buffer and reserve `[start, start + len + 1)` in the
    /// offset space (the extra offset makes EOF positions representable).
    pub fn register_file(
        &self,
        name: impl Into<String>,
        text: &str,
    ) -> Result<FileId, RegisterError> {
        let name = name.into();
        let mut local = self.local.write();
        let len = u64::try_from(text.len()).unwrap_or(u64::MAX);
        let start = local.next_offset;
        let end = u64::from(start) + len + 1;
        if end > u64::from(OFFSET_LIMIT) {
            return Err(RegisterError::OffsetSpaceExhausted { requested: len + 1 });
        }
        #[allow(
            clippy::cast_possible_truncation,
            reason = "end checked against OFFSET_LIMIT above"
        )]
        let next = end as u32;

        let id = FileId::local(local.files.len());
        debug!(name = %name, start, len, "registering file");
        local.files.push(Arc::new(FileEntry {
            id,
            name,
            start,
            buffer: SourceBuffer::new(text),
        }));
        local.next_offset = next;
        Ok(id)
    }

    /// Attach a source of lazily-loaded entries, reserving offset ranges
    /// for all of its entries up front. Contents are fetched on first
    /// touch via [`file`](Self::file).
    ///
    /// Lock order: local table before loaded table.
    pub fn attach_external(
        &self,
        source: Box<dyn ExternalLocationSource>,
    ) -> Result<(), RegisterError> {
        let mut local = self.local.write();
        let mut loaded = self.loaded.write();
        if loaded.source.is_some() {
            return Err(RegisterError::ExternalAlreadyAttached);
        }

        let count = source.entry_count();
        for index in 0..count {
            // An unreadable header still reserves a 1-offset slot so the
            // entry has a stable, permanently-failed handle.
            let (len, state) = match source.entry_len(index) {
                Some(len) => (len, LoadedState::NotLoaded),
                None => (0, LoadedState::Failed),
            };
            let start = local.next_offset;
            let end = u64::from(start) + u64::from(len) + 1;
            if end > u64::from(OFFSET_LIMIT) {
                return Err(RegisterError::OffsetSpaceExhausted {
                    requested: u64::from(len) + 1,
                });
            }
            #[allow(
                clippy::cast_possible_truncation,
                reason = "end checked against OFFSET_LIMIT above"
            )]
            {
                local.next_offset = end as u32;
            }
            loaded.entries.push(LoadedEntry {
                start,
                len,
                state,
            });
        }
        debug!(count, "attached external location source");
        loaded.source = Some(source);
        Ok(())
    }

    /// Record one macro expansion and return its macro location.
    pub fn register_expansion(
        &self,
        spelling: SourceLocation,
        call_begin: SourceLocation,
        call_end: SourceLocation,
    ) -> Result<SourceLocation, RegisterError> {
        let mut expansions = self.expansions.write();
        let index = expansions.len();
        if index as u64 >= u64::from(OFFSET_LIMIT) {
            return Err(RegisterError::OffsetSpaceExhausted { requested: 1 });
        }
        expansions.push(ExpansionRecord {
            spelling,
            call_begin,
            call_end,
        });
        #[allow(
            clippy::cast_possible_truncation,
            reason = "index checked against OFFSET_LIMIT above"
        )]
        Ok(SourceLocation::from_macro_index(index as u32))
    }

    // ─── Handle access ───────────────────────────────────────────────

    /// Number of locally registered files.
    pub fn local_file_count(&self) -> usize {
        self.local.read().files.len()
    }

    /// The entry for a handle, materializing lazily-loaded entries on
    /// first touch. Returns `None` for invalid handles and for entries
    /// whose materialization failed.
    pub fn file(&self, id: FileId) -> Option<Arc<FileEntry>> {
        if let Some(index) = id.local_index() {
            return self.local.read().files.get(index).cloned();
        }
        let index = id.loaded_index()?;
        // Fast path: already materialized (or already known bad).
        {
            let loaded = self.loaded.read();
            match loaded.entries.get(index)?.state {
                LoadedState::Loaded(ref entry) => return Some(Arc::clone(entry)),
                LoadedState::Failed => return None,
                LoadedState::NotLoaded => {}
            }
        }
        self.materialize_loaded(id, index)
    }

    fn materialize_loaded(&self, id: FileId, index: usize) -> Option<Arc<FileEntry>> {
        let mut loaded = self.loaded.write();
        // Re-check: another thread may have materialized while we waited.
        match loaded.entries.get(index)?.state {
            LoadedState::Loaded(ref entry) => return Some(Arc::clone(entry)),
            LoadedState::Failed => return None,
            LoadedState::NotLoaded => {}
        }

        let produced = loaded
            .source
            .as_ref()
            .and_then(|source| source.materialize(u32::try_from(index).ok()?));
        let entry = loaded.entries.get_mut(index)?;
        let expected_len = entry.len;
        match produced {
            Some((name, text)) if text.len() as u64 == u64::from(expected_len) => {
                let materialized = Arc::new(FileEntry {
                    id,
                    name,
                    start: entry.start,
                    buffer: SourceBuffer::new(&text),
                });
                entry.state = LoadedState::Loaded(Arc::clone(&materialized));
                Some(materialized)
            }
            _ => {
                // Permanent: resolution for this handle degrades to
                // "invalid" without affecting any other entry.
                debug!(index, "external entry failed to materialize");
                entry.state = LoadedState::Failed;
                None
            }
        }
    }

    /// Location of the first byte of `id`'s buffer.
    ///
    /// Works for lazily-loaded entries without materializing them; the
    /// start offset is part of the reserved metadata.
    pub fn start_location(&self, id: FileId) -> Option<SourceLocation> {
        if let Some(index) = id.local_index() {
            return self
                .local
                .read()
                .files
                .get(index)
                .map(|e| e.start_location());
        }
        let index = id.loaded_index()?;
        self.loaded
            .read()
            .entries
            .get(index)
            .map(|e| SourceLocation::from_offset(e.start))
    }

    /// The location of local byte `offset` within `id`'s buffer.
    pub fn location_for_offset(&self, id: FileId, offset: u32) -> Option<SourceLocation> {
        let (start, len) = self.entry_span(id)?;
        if offset > len {
            return None;
        }
        Some(SourceLocation::from_offset(start + offset))
    }

    fn entry_span(&self, id: FileId) -> Option<(u32, u32)> {
        if let Some(index) = id.local_index() {
            return self
                .local
                .read()
                .files
                .get(index)
                .map(|e| (e.start, e.len()));
        }
        let index = id.loaded_index()?;
        self.loaded.read().entries.get(index).map(|e| (e.start, e.len))
    }

    // ─── Offset resolution ───────────────────────────────────────────

    /// Resolve a raw offset to the handle whose range contains it.
    ///
    /// Hybrid strategy: last-entry cache, then a short linear probe around
    /// it (sequential access pattern), then binary search (random access).
    pub fn file_for_offset(&self, offset: u32) -> Option<FileId> {
        if offset == 0 || offset >= OFFSET_LIMIT {
            return None;
        }
        if let Some(id) = self.local_for_offset(offset) {
            return Some(id);
        }
        self.loaded_for_offset(offset)
    }

    fn local_for_offset(&self, offset: u32) -> Option<FileId> {
        let local = self.local.read();
        let files = &local.files;
        if files.is_empty() {
            return None;
        }

        let contains =
            |idx: usize| -> bool { files.get(idx).is_some_and(|e| e.contains_offset(offset)) };

        // Cache hit: O(1) for the scanner's sequential queries.
        let cached = self.last_local.load(Ordering::Relaxed);
        if contains(cached) {
            return Some(files[cached].id);
        }

        // Short linear probe around the cached entry before giving up on
        // locality. Walk toward the queried offset.
        if cached < files.len() {
            let mut idx = cached;
            for _ in 0..MAX_PROBE {
                if offset < files[idx].start {
                    if idx == 0 {
                        break;
                    }
                    idx -= 1;
                } else if idx + 1 < files.len() {
                    idx += 1;
                } else {
                    break;
                }
                if contains(idx) {
                    self.last_local.store(idx, Ordering::Relaxed);
                    return Some(files[idx].id);
                }
            }
        }

        // Binary search over starting offsets: worst case stays O(log n).
        let idx = files.partition_point(|e| e.start <= offset);
        if idx == 0 {
            return None;
        }
        let idx = idx - 1;
        if contains(idx) {
            self.last_local.store(idx, Ordering::Relaxed);
            Some(files[idx].id)
        } else {
            None
        }
    }

    fn loaded_for_offset(&self, offset: u32) -> Option<FileId> {
        let loaded = self.loaded.read();
        let entries = &loaded.entries;
        let idx = entries.partition_point(|e| e.start <= offset);
        if idx == 0 {
            return None;
        }
        let entry = &entries[idx - 1];
        if offset <= entry.start + entry.len {
            Some(FileId::loaded(idx - 1))
        } else {
            None
        }
    }

    // ─── Expansion-aware decomposition ───────────────────────────────

    /// The expansion record behind a macro location.
    pub fn expansion_record(&self, loc: SourceLocation) -> Option<ExpansionRecord> {
        if !loc.is_macro_location() {
            return None;
        }
        self.expansions
            .read()
            .get(loc.macro_index() as usize)
            .copied()
    }

    /// The outermost expansion record behind a macro location: the one
    /// whose invocation range is written directly in a file. `None` for
    /// file locations and broken chains.
    pub fn top_expansion_record(&self, loc: SourceLocation) -> Option<ExpansionRecord> {
        let mut loc = loc;
        let bound = self.expansions.read().len() + 1;
        for _ in 0..bound {
            let rec = self.expansion_record(loc)?;
            if !rec.call_begin.is_macro_location() {
                return Some(rec);
            }
            loc = rec.call_begin;
        }
        None
    }

    /// One hop toward the invocation site. File locations map to
    /// themselves; unresolvable macro locations map to `INVALID`.
    pub fn expansion_location(&self, loc: SourceLocation) -> SourceLocation {
        if loc.is_macro_location() {
            self.expansion_record(loc)
                .map_or(SourceLocation::INVALID, |rec| rec.call_begin)
        } else {
            loc
        }
    }

    /// One hop toward where the text was spelled.
    pub fn spelling_location(&self, loc: SourceLocation) -> SourceLocation {
        if loc.is_macro_location() {
            self.expansion_record(loc)
                .map_or(SourceLocation::INVALID, |rec| rec.spelling)
        } else {
            loc
        }
    }

    /// Iterate [`expansion_location`](Self::expansion_location) until a
    /// file location is reached.
    pub fn expansion_location_full(&self, loc: SourceLocation) -> SourceLocation {
        self.walk_to_file(loc, |space, l| space.expansion_location(l))
    }

    /// Iterate [`spelling_location`](Self::spelling_location) until a
    /// file location is reached.
    pub fn spelling_location_full(&self, loc: SourceLocation) -> SourceLocation {
        self.walk_to_file(loc, |space, l| space.spelling_location(l))
    }

    fn walk_to_file(
        &self,
        mut loc: SourceLocation,
        hop: impl Fn(&Self, SourceLocation) -> SourceLocation,
    ) -> SourceLocation {
        // Chain length is bounded by the number of expansion records:
        // each record only references earlier locations. The explicit
        // bound keeps a corrupted table from looping.
        let bound = self.expansions.read().len() + 1;
        for _ in 0..bound {
            if !loc.is_macro_location() {
                return loc;
            }
            loc = hop(self, loc);
        }
        SourceLocation::INVALID
    }

    /// Decompose any location into `(handle, local offset)`, following
    /// expansion chains to the invocation site.
    ///
    /// Never panics: unresolvable input (invalid location, broken chain,
    /// failed lazy entry) yields `None`, and callers check before touching
    /// buffer bytes.
    pub fn decompose(&self, loc: SourceLocation) -> Option<(FileId, u32)> {
        let file_loc = self.expansion_location_full(loc);
        self.decompose_file_location(file_loc)
    }

    /// Decompose toward the spelling site instead of the invocation site.
    pub fn decompose_spelling(&self, loc: SourceLocation) -> Option<(FileId, u32)> {
        let file_loc = self.spelling_location_full(loc);
        self.decompose_file_location(file_loc)
    }

    fn decompose_file_location(&self, loc: SourceLocation) -> Option<(FileId, u32)> {
        if !loc.is_file_location() {
            return None;
        }
        let offset = loc.offset();
        let id = self.file_for_offset(offset)?;
        let (start, _) = self.entry_span(id)?;
        Some((id, offset - start))
    }
}

impl std::fmt::Debug for LocationSpace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocationSpace")
            .field("local_files", &self.local.read().files.len())
            .field("loaded_entries", &self.loaded.read().entries.len())
            .field("expansions", &self.expansions.read().len())
            .finish()
    }
}

#[cfg(test)]
mod tests;
