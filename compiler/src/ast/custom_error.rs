use serde::Serialize;

use super::{Comment, Format, Identifier, ValueString};
use crate::token::Token;

/// `error <PascalName> { Code = <Int> Msg = <String> }`. A zero code means
/// "auto-assign"; the validator fills it in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomError {
    pub token: Token,
    pub name: Identifier,
    pub code: i64,
    pub msg: ValueString,
    pub comments: Vec<Comment>,
}

impl Format for CustomError {
    fn format(&self, out: &mut String) {
        for comment in &self.comments {
            out.push('\n');
            comment.format(out);
        }

        if !self.comments.is_empty() {
            out.push('\n');
        }

        out.push_str("error ");
        self.name.format(out);
        out.push_str(" { ");

        if self.code != 0 {
            out.push_str("Code = ");
            out.push_str(&self.code.to_string());
            out.push(' ');
        }

        out.push_str("Msg = ");
        self.msg.format(out);
        out.push_str(" }");
    }
}
