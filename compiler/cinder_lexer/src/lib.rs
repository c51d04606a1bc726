//! Hand-written scanner for the Cinder front end.
//!
//! [`Scanner`] classifies the bytes of one buffer into
//! [`Token`](cinder_token::Token) values
//! with maximal-munch rules, transparently absorbing escaped newlines and
//! recovering from malformed literals. It runs in two modes:
//!
//! - **instrumented**: resolves keywords, interns identifiers, and reports
//!   malformed input to a diagnostics sink;
//! - **raw**: no side effects at all -- identifiers come back as
//!   [`TokenKind::RawIdentifier`](cinder_token::TokenKind::RawIdentifier)
//!   and nothing is reported. Raw mode is the only mode safe to invoke
//!   without a live diagnostics/identifier context, and is what the
//!   token-buffer builder uses to re-lex already-seen text.

pub mod cleaning;
pub mod keywords;
pub mod scanner;

pub use cleaning::{clean_text, token_text, token_text_in};
pub use scanner::Scanner;
