use serde::Serialize;

use super::{Comment, CommentPosition, Format, Identifier, Options, Type};
use crate::token::Token;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    pub name: Identifier,
    pub typ: Type,
    pub optional: bool,
    pub options: Options,
    pub comments: Vec<Comment>,
}

impl Format for Field {
    fn format(&self, out: &mut String) {
        for (i, comment) in self.comments.iter().enumerate() {
            if i != 0 {
                out.push('\n');
            }
            out.push_str("    ");
            comment.format(out);
        }

        if !self.comments.is_empty() {
            out.push('\n');
        }

        out.push_str("    ");
        self.name.format(out);
        if self.optional {
            out.push('?');
        }
        out.push_str(": ");
        self.typ.format(out);

        if self.options.is_empty() {
            return;
        }

        self.options.format(out);
    }
}

/// Spread-style inclusion of another model's fields, `...Other`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Extend {
    pub name: Identifier,
    pub comments: Vec<Comment>,
}

impl Format for Extend {
    fn format(&self, out: &mut String) {
        for comment in &self.comments {
            out.push_str("\n    ");
            comment.format(out);
        }

        out.push_str("    ...");
        self.name.format(out);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Model {
    pub token: Token,
    pub name: Identifier,
    pub extends: Vec<Extend>,
    pub fields: Vec<Field>,
    pub comments: Vec<Comment>,
}

impl Format for Model {
    fn format(&self, out: &mut String) {
        for comment in &self.comments {
            if comment.position != CommentPosition::Top {
                continue;
            }
            comment.format(out);
            out.push('\n');
        }

        out.push_str("model ");
        self.name.format(out);
        out.push_str(" {");

        for extend in &self.extends {
            out.push('\n');
            extend.format(out);
        }

        for field in &self.fields {
            out.push('\n');
            field.format(out);
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
