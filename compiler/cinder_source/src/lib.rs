//! Global source location space for the Cinder front end.
//!
//! Every character of every loaded file, and every macro expansion point,
//! is assigned a unique offset in one process-wide, append-only address
//! space. [`SourceLocation`] is the opaque handle into that space;
//! [`LocationSpace`] is the only component that can decompose one back
//! into a file and an offset.
//!
//! Locations are freely copied into tokens, diagnostics, and syntax nodes
//! that may outlive the scan that produced them; resolving them never
//! fails with a panic, only with an explicit "invalid" result.

pub mod location;
pub mod space;

pub use location::{FileId, SourceLocation};
pub use space::{
    ExpansionRecord, ExternalLocationSource, FileEntry, LocationSpace, RegisterError,
};
