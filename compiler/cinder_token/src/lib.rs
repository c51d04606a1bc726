//! Token vocabulary shared by the Cinder scanner, parser, and tooling.
//!
//! Tokens are immutable, fixed-size values: a kind, a source location, a
//! byte length, a small flag set, and an interned-identifier payload. The
//! canonical definitions live here so downstream crates can consume token
//! streams without depending on the scanner itself.

pub mod kind;
pub mod name;
pub mod token;

pub use kind::TokenKind;
pub use name::{Name, StringInterner};
pub use token::{Token, TokenFlags};
