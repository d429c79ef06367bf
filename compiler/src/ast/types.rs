use serde::Serialize;

use super::Format;
use crate::token::Token;

/// The closed set of field/argument/return types.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Type {
    Bool {
        token: Token,
    },
    Byte {
        token: Token,
    },
    Int {
        token: Token,
        /// 8, 16, 32, 64
        size: u8,
    },
    Uint {
        token: Token,
        /// 8, 16, 32, 64
        size: u8,
    },
    Float {
        token: Token,
        /// 32, 64
        size: u8,
    },
    String {
        token: Token,
    },
    Timestamp {
        token: Token,
    },
    Any {
        token: Token,
    },
    Array {
        /// the `[]` token
        token: Token,
        elem: Box<Type>,
    },
    Map {
        token: Token,
        key: Box<Type>,
        value: Box<Type>,
    },
    /// A reference to a declared model or enum.
    Custom {
        token: Token,
    },
}

impl Type {
    /// The token the type starts at, for diagnostics.
    pub fn token(&self) -> &Token {
        match self {
            Type::Bool { token }
            | Type::Byte { token }
            | Type::Int { token, .. }
            | Type::Uint { token, .. }
            | Type::Float { token, .. }
            | Type::String { token }
            | Type::Timestamp { token }
            | Type::Any { token }
            | Type::Array { token, .. }
            | Type::Map { token, .. }
            | Type::Custom { token } => token,
        }
    }

    /// True for `[]byte`, directly or nested through further arrays; returns
    /// the `byte` token for the diagnostic span.
    pub fn array_of_byte(&self) -> Option<&Token> {
        match self {
            Type::Array { elem, .. } => match elem.as_ref() {
                Type::Byte { token } => Some(token),
                other => other.array_of_byte(),
            },
            _ => None,
        }
    }

    /// True exactly for `[]byte`.
    pub fn is_byte_array(&self) -> bool {
        matches!(self, Type::Array { elem, .. } if matches!(elem.as_ref(), Type::Byte { .. }))
    }
}

impl Format for Type {
    fn format(&self, out: &mut String) {
        match self {
            Type::Bool { .. } => out.push_str("bool"),
            Type::Byte { .. } => out.push_str("byte"),
            Type::Int { token, .. }
            | Type::Uint { token, .. }
            | Type::Float { token, .. }
            | Type::Custom { token } => out.push_str(&token.value),
            Type::String { .. } => out.push_str("string"),
            Type::Timestamp { .. } => out.push_str("timestamp"),
            Type::Any { .. } => out.push_str("any"),
            Type::Array { elem, .. } => {
                out.push_str("[]");
                elem.format(out);
            }
            Type::Map { key, value, .. } => {
                out.push_str("map<");
                key.format(out);
                out.push_str(", ");
                value.format(out);
                out.push('>');
            }
        }
    }
}
