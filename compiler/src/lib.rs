//! quill-compiler
//!
//! This crate implements:
//!  1) A state-machine scanner + recursive-descent parser for `.quill` IDL files,
//!  2) A whole-document validator (naming, uniqueness, constant resolution,
//!     type existence, stream placement),
//!  3) A lossless pretty-printer for formatting documents in place,
//!  4) Code generation (`gen::generate`) for Go and TypeScript targets,
//!  5) Error types (`QuillError`) with positioned, caret-annotated diagnostics.

pub mod ast;
pub mod error;
pub mod gen;
pub mod parser;
pub mod scanner;
pub mod strcase;
pub mod token;
pub mod utils;
pub mod validate;

pub use error::{Diagnostic, QuillError};
pub use gen::generate;
pub use parser::{parse_document, Parser};
pub use validate::validate;
