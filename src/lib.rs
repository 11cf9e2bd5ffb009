//! # rfc2ir: IETF packet diagrams to a typed protocol IR
//!
//! Reads the artwork of an IETF-style document, extracts the packet structure and enum
//! definitions drawn there, and compiles them into a type-checked protocol model.
//!
//! ## Pipeline
//!
//! 1. **Extraction** ([`grammar`]): each artwork block is parsed with a PEST grammar into raw
//!    structures (`Name { Field (size) = value, ... }`) or enums (`Name = A | B | C`).
//! 2. **Resolution** ([`extract`]): containers, named sizes, enum variants and length
//!    backreferences are bound across the whole document.
//! 3. **Lowering** ([`lower`]): raw definitions become bit strings, structs, arrays, options and
//!    enums in a [`Protocol`], with value constraints as typed expressions.
//!
//! ## Example
//!
//! ```text
//! Ping Frame {
//!   Type (i) = 0x01,
//!   Sequence Length (8),
//!   Sequence (..),
//! }
//! ```
//!
//! becomes a struct `Ping_frame` with fields `type`, `sequence_length` and `sequence`, where
//! `sequence` is sized by `self.sequence_length.to_number()` and a constraint requires
//! `self.type.to_number().eq(other=1)`.

pub mod config;
pub mod document;
pub mod dump;
pub mod error;
pub mod expr;
pub mod extract;
pub mod grammar;
pub mod lower;
pub mod protocol;
pub mod raw;
pub mod traits;
pub mod types;

pub use config::CompileOptions;
pub use document::Document;
pub use error::{ExtractError, TypeError, TypeResult};
pub use expr::Expression;
pub use extract::ParsedRepresentation;
pub use protocol::Protocol;
pub use types::{ProtocolType, Size, TypeId, TypeKind};

/// Extract, resolve and lower every definition in `document`.
pub fn compile(document: &Document, options: &CompileOptions) -> TypeResult<Protocol> {
    let parsed = ParsedRepresentation::new(document, options);
    tracing::debug!(
        structures = parsed.structs.len(),
        enums = parsed.enums.len(),
        "document extracted"
    );
    lower::lower(&parsed, options)
}

/// [`compile`] over plain text, where blank lines separate artwork blocks.
pub fn compile_text(text: &str, options: &CompileOptions) -> TypeResult<Protocol> {
    compile(&Document::from_text(text), options)
}
