//! Diagnostic types and the reporting sink for the Cinder front end.
//!
//! This crate defines the `(location, severity, message)` surface between
//! producers (the instrumented scanner, later the parser) and whatever
//! formats diagnostics for the user. Rendering is deliberately out of
//! scope: a sink receives structured values and decides what to do with
//! them. Locations stay opaque [`SourceLocation`]s so a sink can resolve
//! them through the location space even for partially-broken programs.
//!
//! [`SourceLocation`]: cinder_source::SourceLocation

pub mod diagnostic;

pub use diagnostic::{Diagnostic, DiagnosticQueue, DiagnosticSink, Severity};
