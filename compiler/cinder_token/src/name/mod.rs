//! Interned identifier names.
//!
//! Provides O(1) interning and lookup with thread-safe access. Interned
//! strings are leaked into `'static` storage; the interner lives for the
//! whole compilation, so the leak is bounded by the set of distinct
//! identifiers in the translation unit.

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

/// Interned identifier reference.
///
/// Two `Name`s compare equal iff their underlying strings are equal.
/// [`Name::NONE`] is the "no payload" sentinel carried by tokens that are
/// not identifiers.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
#[repr(transparent)]
pub struct Name(u32);

const _: () = assert!(std::mem::size_of::<Name>() == 4);

impl Name {
    /// Sentinel for "no identifier payload".
    pub const NONE: Name = Name(u32::MAX);

    /// Returns `true` unless this is the `NONE` sentinel.
    #[inline]
    pub const fn is_some(self) -> bool {
        self.0 != u32::MAX
    }

    /// The raw index, for debugging.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl std::fmt::Debug for Name {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_some() {
            write!(f, "name#{}", self.0)
        } else {
            write!(f, "name(none)")
        }
    }
}

struct Inner {
    map: FxHashMap<&'static str, u32>,
    strings: Vec<&'static str>,
}

/// Thread-safe string interner for identifiers.
///
/// The scanner interns every resolved identifier; the parser and tooling
/// resolve names back to text without touching source buffers.
pub struct StringInterner {
    inner: RwLock<Inner>,
}

impl Default for StringInterner {
    fn default() -> Self {
        Self::new()
    }
}

impl StringInterner {
    /// Create an interner with the empty string pre-interned at index 0.
    pub fn new() -> Self {
        let mut map = FxHashMap::default();
        map.insert("", 0u32);
        Self {
            inner: RwLock::new(Inner {
                map,
                strings: vec![""],
            }),
        }
    }

    /// Intern a string, returning a stable [`Name`].
    ///
    /// Idempotent: interning the same text twice yields the same `Name`.
    pub fn intern(&self, text: &str) -> Name {
        // Fast path: already interned.
        {
            let inner = self.inner.read();
            if let Some(&idx) = inner.map.get(text) {
                return Name(idx);
            }
        }

        let mut inner = self.inner.write();
        // Re-check: another thread may have interned while we waited.
        if let Some(&idx) = inner.map.get(text) {
            return Name(idx);
        }
        let leaked: &'static str = Box::leak(text.to_owned().into_boxed_str());
        let idx = u32::try_from(inner.strings.len()).unwrap_or(u32::MAX - 1);
        inner.strings.push(leaked);
        inner.map.insert(leaked, idx);
        Name(idx)
    }

    /// Resolve a [`Name`] back to its text.
    ///
    /// Returns `None` for [`Name::NONE`] and for names from a different
    /// interner.
    pub fn resolve(&self, name: Name) -> Option<&'static str> {
        if !name.is_some() {
            return None;
        }
        self.inner.read().strings.get(name.0 as usize).copied()
    }

    /// Number of interned strings (including the pre-interned empty one).
    pub fn len(&self) -> usize {
        self.inner.read().strings.len()
    }

    /// Never true: the empty string is always present.
    pub fn is_empty(&self) -> bool {
        false
    }
}

impl std::fmt::Debug for StringInterner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StringInterner")
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests;
