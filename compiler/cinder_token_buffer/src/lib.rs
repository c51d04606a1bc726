//! Correlated spelled and expanded token streams.
//!
//! The macro-expansion layer hands the parser a single linear *expanded*
//! token stream; tooling that edits source needs the *spelled* tokens as
//! they were literally written in each file. [`TokenCollector`] observes
//! the expansion layer while it runs and, once the translation unit is
//! complete, builds a [`TokenBuffer`]: the expanded stream, the per-file
//! spelled streams (recovered by raw re-lexing), and the [`Mapping`]
//! records that correlate ranges across the two.
//!
//! The buffer is immutable after construction and answers range
//! translation queries in `O(log n)` via binary search over the sorted
//! mapping lists.

pub mod buffer;
pub mod collector;

pub use buffer::{Mapping, TokenBuffer};
pub use collector::{BuildError, TokenCollector};
