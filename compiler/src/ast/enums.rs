use serde::Serialize;

use super::{Comment, CommentPosition, Format, Identifier, ValueInt};
use crate::token::Token;

/// One enum member. `defined` mirrors whether the value was written out; a
/// member named `_` is a placeholder that advances the implicit counter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnumSet {
    pub name: Identifier,
    pub value: ValueInt,
    pub defined: bool,
    pub comments: Vec<Comment>,
}

impl Format for EnumSet {
    fn format(&self, out: &mut String) {
        for comment in &self.comments {
            out.push_str("    ");
            comment.format(out);
            out.push('\n');
        }

        out.push_str("    ");
        self.name.format(out);
        if self.value.token.is_some() {
            out.push_str(" = ");
            self.value.format(out);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Enum {
    pub token: Token,
    pub name: Identifier,
    /// 8, 16, 32 or 64, fitting the smallest and largest member values
    pub size: u8,
    pub sets: Vec<EnumSet>,
    pub comments: Vec<Comment>,
}

impl Format for Enum {
    fn format(&self, out: &mut String) {
        for comment in &self.comments {
            if comment.position != CommentPosition::Top {
                continue;
            }
            comment.format(out);
            out.push('\n');
        }

        out.push_str("enum ");
        self.name.format(out);
        out.push_str(" {\n");

        for (i, set) in self.sets.iter().enumerate() {
            if i != 0 {
                out.push('\n');
            }
            set.format(out);
        }

        for comment in &self.comments {
            if comment.position != CommentPosition::Bottom {
                continue;
            }
            out.push_str("\n    ");
            comment.format(out);
        }

        out.push_str("\n}");
    }
}
