use serde::Serialize;

use super::{Comment, Format, Identifier, Value};
use crate::token::Token;

/// `const <PascalName> = <Value>`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Const {
    pub token: Token,
    pub identifier: Identifier,
    pub value: Value,
    pub comments: Vec<Comment>,
}

impl Format for Const {
    fn format(&self, out: &mut String) {
        for comment in &self.comments {
            comment.format(out);
            out.push('\n');
        }

        out.push_str("const ");
        self.identifier.format(out);
        out.push_str(" = ");
        self.value.format(out);
    }
}
