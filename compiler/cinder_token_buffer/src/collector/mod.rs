//! One-shot construction of a [`TokenBuffer`] from expansion events.
//!
//! The collector is wired to the expansion layer before it runs: it is
//! fed every token that reaches the expanded stream, in order, and the
//! file range `[begin, end)` of every top-level macro invocation as it
//! is recognized. It stores both verbatim. All correlation work is
//! deferred to [`TokenCollector::consume`], which re-lexes each touched
//! file in raw mode and reconciles the two token streams in one pass.

use std::sync::Arc;

use cinder_lexer::Scanner;
use cinder_source::{FileId, LocationSpace, SourceLocation};
use cinder_token::Token;
use rustc_hash::FxHashMap;
use thiserror::Error;
use tracing::debug;

use crate::buffer::{Mapping, MarkedFile, TokenBuffer};

/// Internal-consistency failure while reconciling the token streams.
///
/// These indicate broken wiring between the expansion layer and the
/// collector (missed notifications, tokens from an unregistered buffer),
/// never a problem with the user's source.
#[derive(Debug, Error)]
pub enum BuildError {
    /// An expanded token's location could not be resolved to a file.
    #[error("expanded token {index} has an unresolvable location")]
    UnresolvedLocation {
        /// Index of the offending token in the expanded stream.
        index: usize,
    },
    /// An expansion-produced token has no matching invocation record.
    #[error("no recorded invocation at {location:?} for expanded token {index}")]
    UnknownInvocation {
        index: usize,
        location: SourceLocation,
    },
    /// The spelled and expanded cursors could not both advance.
    #[error("token streams desynchronized at expanded token {index}")]
    Desynchronized { index: usize },
}

/// Observer of the expansion layer; builds the buffer once it finishes.
#[derive(Debug)]
pub struct TokenCollector {
    space: Arc<LocationSpace>,
    expanded: Vec<Token>,
    /// Top-level invocation ranges, keyed by the raw begin location.
    invocations: FxHashMap<u32, SourceLocation>,
}

impl TokenCollector {
    /// Create a collector over `space`. Attach it to the expansion layer
    /// before expansion begins.
    pub fn new(space: Arc<LocationSpace>) -> Self {
        Self {
            space,
            expanded: Vec::new(),
            invocations: FxHashMap::default(),
        }
    }

    /// Record the next token of the expanded stream.
    pub fn token_produced(&mut self, token: Token) {
        self.expanded.push(token);
    }

    /// Record the file range `[begin, end)` of a recognized top-level
    /// macro invocation. Both locations must be file locations; `end` is
    /// exclusive (the first offset after the closing token).
    pub fn expansion_recognized(&mut self, begin: SourceLocation, end: SourceLocation) {
        debug_assert!(begin.is_file_location() && end.is_file_location());
        self.invocations.insert(begin.raw(), end);
    }

    /// Build the [`TokenBuffer`]. The collector is consumed; the
    /// expansion layer must be finished feeding it.
    pub fn consume(self) -> Result<TokenBuffer, BuildError> {
        let TokenCollector {
            space,
            expanded,
            invocations,
        } = self;
        debug!(
            expanded = expanded.len(),
            invocations = invocations.len(),
            "building token buffer"
        );

        let mut files: FxHashMap<FileId, FileBuilder> = FxHashMap::default();
        let mut i = 0usize;
        while i < expanded.len() {
            let token = expanded[i];
            let top = space.expansion_location_full(token.location);
            if !top.is_file_location() {
                return Err(BuildError::UnresolvedLocation { index: i });
            }
            let file_id = space
                .file_for_offset(top.offset())
                .ok_or(BuildError::UnresolvedLocation { index: i })?;
            let builder = match files.entry(file_id) {
                std::collections::hash_map::Entry::Occupied(entry) => entry.into_mut(),
                std::collections::hash_map::Entry::Vacant(slot) => {
                    let spelled = lex_spelled(&space, file_id)
                        .ok_or(BuildError::UnresolvedLocation { index: i })?;
                    slot.insert(FileBuilder::new(spelled, i))
                }
            };

            // Tokens from other files interleaved since this file last
            // appeared; anchor the foreign expanded sub-range to a
            // zero-width spelled point so the pass-through arithmetic on
            // both sides of it stays aligned.
            let foreign_from = builder.end_expanded;
            if foreign_from < i {
                let at_spelled = builder.next_spelled;
                builder.push_mapping(at_spelled, at_spelled, foreign_from, i);
                builder.end_expanded = i;
            }

            if token.location.is_file_location() {
                // Pass-through: the expanded token must line up exactly
                // with the next unconsumed spelled token; anything
                // skipped in between drains into empty mappings.
                let target = builder
                    .index_exact(token.location)
                    .ok_or(BuildError::Desynchronized { index: i })?;
                if target < builder.next_spelled {
                    return Err(BuildError::Desynchronized { index: i });
                }
                drain_gap(&invocations, builder, target, i)?;
                builder.next_spelled = target + 1;
                builder.note_expanded(i + 1);
                i += 1;
            } else {
                // Expansion run: all consecutive expanded tokens tracing
                // to the same top-level invocation become one mapping.
                let end_loc = invocations
                    .get(&top.raw())
                    .copied()
                    .ok_or(BuildError::UnknownInvocation { index: i, location: top })?;
                let begin_spelled = builder
                    .index_exact(top)
                    .ok_or(BuildError::Desynchronized { index: i })?;
                if begin_spelled < builder.next_spelled {
                    return Err(BuildError::Desynchronized { index: i });
                }
                drain_gap(&invocations, builder, begin_spelled, i)?;
                let end_spelled = builder.index_at_or_after(end_loc);
                if end_spelled <= begin_spelled {
                    return Err(BuildError::Desynchronized { index: i });
                }

                let run_begin = i;
                while i < expanded.len()
                    && expanded[i].location.is_macro_location()
                    && space.expansion_location_full(expanded[i].location) == top
                {
                    i += 1;
                }
                debug_assert!(i > run_begin, "expansion run must consume a token");

                builder.push_mapping(begin_spelled, end_spelled, run_begin, i);
                builder.next_spelled = end_spelled;
                builder.note_expanded(i);
            }
        }

        // Spelled tokens left after the expanded stream is exhausted
        // (e.g. a disabled region at end of file) drain into trailing
        // empty mappings.
        let end_point = expanded.len();
        let mut marked = FxHashMap::default();
        for (file_id, mut builder) in files {
            let target = builder.spelled.len();
            drain_gap(&invocations, &mut builder, target, end_point)?;
            marked.insert(file_id, builder.into_marked());
        }
        debug!(files = marked.len(), "token buffer built");
        Ok(TokenBuffer::from_parts(space, expanded, marked))
    }
}

/// Re-lex one file in raw mode, yielding its full spelled stream
/// (terminated by that file's end-of-file token).
fn lex_spelled(space: &LocationSpace, id: FileId) -> Option<Vec<Token>> {
    let entry = space.file(id)?;
    let mut scanner = Scanner::raw(&entry);
    let mut tokens = Vec::new();
    loop {
        let token = scanner.lex();
        let eof = token.is_eof();
        tokens.push(token);
        if eof {
            break;
        }
    }
    Some(tokens)
}

struct FileBuilder {
    spelled: Vec<Token>,
    next_spelled: usize,
    mappings: Vec<Mapping>,
    begin_expanded: usize,
    end_expanded: usize,
}

impl FileBuilder {
    fn new(spelled: Vec<Token>, first_expanded: usize) -> Self {
        Self {
            spelled,
            next_spelled: 0,
            mappings: Vec::new(),
            begin_expanded: first_expanded,
            end_expanded: first_expanded,
        }
    }

    fn note_expanded(&mut self, end: usize) {
        self.end_expanded = self.end_expanded.max(end);
    }

    /// Index of the spelled token at exactly `location`.
    fn index_exact(&self, location: SourceLocation) -> Option<usize> {
        self.spelled
            .binary_search_by_key(&location.raw(), |t| t.location.raw())
            .ok()
    }

    /// Index of the first spelled token at or after `location`.
    fn index_at_or_after(&self, location: SourceLocation) -> usize {
        self.spelled
            .partition_point(|t| t.location.raw() < location.raw())
    }

    #[allow(
        clippy::cast_possible_truncation,
        reason = "token counts are bounded by the u32 offset space"
    )]
    fn push_mapping(
        &mut self,
        begin_spelled: usize,
        end_spelled: usize,
        begin_expanded: usize,
        end_expanded: usize,
    ) {
        self.mappings.push(Mapping {
            begin_spelled: begin_spelled as u32,
            end_spelled: end_spelled as u32,
            begin_expanded: begin_expanded as u32,
            end_expanded: end_expanded as u32,
        });
    }

    #[allow(
        clippy::cast_possible_truncation,
        reason = "token counts are bounded by the u32 offset space"
    )]
    fn into_marked(self) -> MarkedFile {
        MarkedFile {
            spelled: self.spelled,
            mappings: self.mappings,
            begin_expanded: self.begin_expanded as u32,
            end_expanded: self.end_expanded as u32,
        }
    }
}

/// Consume spelled tokens `[builder.next_spelled, target)` into empty
/// mappings anchored at expanded index `at`.
///
/// A recorded invocation beginning strictly inside the gap splits it:
/// the tokens before it form one empty mapping, the invocation's own
/// range forms another (this is how an expansion to zero tokens stays
/// representable).
fn drain_gap(
    invocations: &FxHashMap<u32, SourceLocation>,
    builder: &mut FileBuilder,
    target: usize,
    at: usize,
) -> Result<(), BuildError> {
    while builder.next_spelled < target {
        let from = builder.next_spelled;
        let invocation = (from..target).find_map(|j| {
            invocations
                .get(&builder.spelled[j].location.raw())
                .map(|&end| (j, end))
        });
        match invocation {
            Some((begin, end_loc)) => {
                if begin > from {
                    builder.push_mapping(from, begin, at, at);
                }
                let end = builder.index_at_or_after(end_loc);
                if end <= begin || end > target {
                    return Err(BuildError::Desynchronized { index: at });
                }
                builder.push_mapping(begin, end, at, at);
                builder.next_spelled = end;
            }
            None => {
                builder.push_mapping(from, target, at, at);
                builder.next_spelled = target;
            }
        }
    }
    Ok(())
}
