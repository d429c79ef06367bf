//! Typed tree for parsed documents together with its lossless pretty-printer.
//!
//! Nodes are built by the parser and never mutated afterwards, with two
//! exceptions owned by the validator: variable constants are resolved in
//! place, and auto-assigned enum values / error codes are filled in.

mod comment;
mod constant;
mod custom_error;
mod document;
mod enums;
mod identifier;
mod model;
mod option;
mod service;
mod types;
mod value;

pub use comment::{Comment, CommentPosition};
pub use constant::Const;
pub use custom_error::CustomError;
pub use document::Document;
pub use enums::{Enum, EnumSet};
pub use identifier::Identifier;
pub use model::{Extend, Field, Model};
pub use option::{OptionDecl, Options};
pub use service::{Arg, Method, Return, Service, ServiceKind};
pub use types::Type;
pub use value::{
    ByteSizeScale, DurationScale, Value, ValueBool, ValueByteSize, ValueDuration, ValueFloat,
    ValueInt, ValueNull, ValueString, ValueUint, ValueVariable,
};

/// Every AST node knows how to write its canonical textual form.
pub trait Format {
    fn format(&self, out: &mut String);
}

/// Formats any node into a fresh string.
pub fn format_node<T: Format + ?Sized>(node: &T) -> String {
    let mut out = String::new();
    node.format(&mut out);
    out
}
