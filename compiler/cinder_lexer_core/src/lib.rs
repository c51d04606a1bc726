//! Low-level scanning substrate for the Cinder front end.
//!
//! Provides the sentinel-terminated [`SourceBuffer`] and the [`Cursor`]
//! that the scanner drives over it. This crate is deliberately standalone:
//! it knows nothing about tokens, locations, or diagnostics, so external
//! tooling can re-lex arbitrary text without pulling in the compiler.

pub mod cursor;
pub mod source_buffer;

pub use cursor::Cursor;
pub use source_buffer::SourceBuffer;
