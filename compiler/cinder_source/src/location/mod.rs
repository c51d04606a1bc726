//! Opaque location and file handles.
//!
//! A [`SourceLocation`] is a single `u32` with two disjoint interpretations
//! distinguished by the high tag bit: a *file location* is a raw offset into
//! the global location space; a *macro location* is an index into the
//! expansion-record side table. The raw value `0` is the invalid sentinel.
//!
//! Handles are plain integers rather than pointers so they can be copied
//! into tokens and diagnostics without lifetime coupling to the registry
//! that owns the underlying buffers.

use std::fmt;

/// Tag bit distinguishing macro locations from file locations.
const MACRO_BIT: u32 = 1 << 31;

/// Opaque handle identifying one position in the global location space.
///
/// File locations hold a 31-bit offset; macro locations hold a 31-bit
/// index into the expansion-record table. `SourceLocation::INVALID`
/// (raw value 0) is never a real position.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default)]
#[repr(transparent)]
pub struct SourceLocation(u32);

/// Size assertion: locations stay pointer-free and 4 bytes wide.
const _: () = assert!(std::mem::size_of::<SourceLocation>() == 4);

impl SourceLocation {
    /// The invalid sentinel location.
    pub const INVALID: SourceLocation = SourceLocation(0);

    /// Returns `true` unless this is the invalid sentinel.
    #[inline]
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }

    /// Returns `true` for a valid location that points directly into a file.
    #[inline]
    pub const fn is_file_location(self) -> bool {
        self.0 != 0 && self.0 & MACRO_BIT == 0
    }

    /// Returns `true` for a location produced by a macro expansion.
    #[inline]
    pub const fn is_macro_location(self) -> bool {
        self.0 & MACRO_BIT != 0
    }

    /// Build a file location from a raw offset into the location space.
    ///
    /// Offset 0 is reserved as the invalid sentinel; the registry never
    /// hands it out.
    #[inline]
    pub(crate) fn from_offset(offset: u32) -> Self {
        debug_assert!(offset != 0, "offset 0 is the invalid sentinel");
        debug_assert!(offset & MACRO_BIT == 0, "offset exceeds file-location range");
        SourceLocation(offset)
    }

    /// Build a macro location from an expansion-record index.
    #[inline]
    pub(crate) fn from_macro_index(index: u32) -> Self {
        debug_assert!(index & MACRO_BIT == 0, "expansion index exceeds range");
        SourceLocation(MACRO_BIT | index)
    }

    /// The raw offset of a file location.
    ///
    /// Only meaningful when [`is_file_location`](Self::is_file_location)
    /// holds; callers check first.
    #[inline]
    pub fn offset(self) -> u32 {
        debug_assert!(self.is_file_location());
        self.0
    }

    /// The expansion-record index of a macro location.
    #[inline]
    pub(crate) fn macro_index(self) -> u32 {
        debug_assert!(self.is_macro_location());
        self.0 & !MACRO_BIT
    }

    /// A file location advanced by `delta` bytes.
    ///
    /// Used by the scanner to stamp tokens relative to the buffer start.
    #[inline]
    pub fn with_offset(self, delta: u32) -> Self {
        debug_assert!(self.is_file_location());
        SourceLocation(self.0 + delta)
    }

    /// The raw `u32` value, for use as a map key.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Rebuild a location from a raw value previously obtained via
    /// [`raw()`](Self::raw).
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        SourceLocation(raw)
    }
}

impl fmt::Debug for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_valid() {
            write!(f, "loc(invalid)")
        } else if self.is_macro_location() {
            write!(f, "loc(macro#{})", self.0 & !MACRO_BIT)
        } else {
            write!(f, "loc({})", self.0)
        }
    }
}

/// Identifies one loaded buffer and its reserved offset range.
///
/// Non-negative values index the local file table; negative values address
/// the lazily-loaded table (entries materialized on demand from an external,
/// already-serialized source).
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
#[repr(transparent)]
pub struct FileId(i32);

const _: () = assert!(std::mem::size_of::<FileId>() == 4);

impl FileId {
    /// Sentinel for "no file" / failed resolution.
    pub const INVALID: FileId = FileId(i32::MIN);

    /// Handle for the `n`-th locally registered file.
    #[inline]
    pub(crate) fn local(index: usize) -> Self {
        debug_assert!(index < i32::MAX as usize);
        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_possible_wrap,
            reason = "index bounded by i32::MAX above"
        )]
        FileId(index as i32)
    }

    /// Handle for the `n`-th lazily-loaded entry.
    #[inline]
    pub(crate) fn loaded(index: usize) -> Self {
        debug_assert!(index < i32::MAX as usize);
        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_possible_wrap,
            reason = "index bounded by i32::MAX above"
        )]
        FileId(-(index as i32) - 1)
    }

    /// Returns `true` unless this is the invalid sentinel.
    #[inline]
    pub const fn is_valid(self) -> bool {
        self.0 != i32::MIN
    }

    /// Returns `true` for a handle into the local file table.
    #[inline]
    pub const fn is_local(self) -> bool {
        self.0 >= 0
    }

    /// Returns `true` for a handle into the lazily-loaded table.
    #[inline]
    pub const fn is_loaded(self) -> bool {
        self.is_valid() && self.0 < 0
    }

    /// Index into the local file table, if this is a local handle.
    #[inline]
    pub(crate) fn local_index(self) -> Option<usize> {
        usize::try_from(self.0).ok()
    }

    /// Index into the lazily-loaded table, if this is a loaded handle.
    #[inline]
    pub(crate) fn loaded_index(self) -> Option<usize> {
        if self.is_loaded() {
            usize::try_from(-(self.0 + 1)).ok()
        } else {
            None
        }
    }
}

impl fmt::Debug for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_valid() {
            write!(f, "file(invalid)")
        } else if self.0 < 0 {
            write!(f, "file(loaded#{})", -(self.0 + 1))
        } else {
            write!(f, "file({})", self.0)
        }
    }
}

#[cfg(test)]
mod tests;
