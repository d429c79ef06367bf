use serde::Serialize;

use super::{Comment, Format, Identifier, Value};

/// A single option inside a field or method body. A bare option name is a
/// flag and defaults to boolean `true`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionDecl {
    pub name: Identifier,
    pub value: Value,
    pub comments: Vec<Comment>,
}

impl Format for OptionDecl {
    fn format(&self, out: &mut String) {
        for comment in &self.comments {
            out.push_str("\n        ");
            comment.format(out);
        }

        out.push_str("\n        ");
        self.name.format(out);

        // flag options print without a value
        if let Value::Bool(v) = &self.value {
            if v.token.is_none() {
                return;
            }
        }

        out.push_str(" = ");
        self.value.format(out);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct Options {
    pub list: Vec<OptionDecl>,
    pub comments: Vec<Comment>,
}

impl Options {
    pub fn is_empty(&self) -> bool {
        self.list.is_empty() && self.comments.is_empty()
    }
}

impl Format for Options {
    fn format(&self, out: &mut String) {
        out.push_str(" {");
        for option in &self.list {
            option.format(out);
        }

        for comment in &self.comments {
            out.push_str("\n        ");
            comment.format(out);
        }

        out.push_str("\n    }");
    }
}
