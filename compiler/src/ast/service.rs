use serde::Serialize;
use std::fmt;

use super::{Comment, CommentPosition, Format, Identifier, Options, Type};
use crate::token::Token;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Arg {
    pub name: Identifier,
    pub typ: Type,
    pub stream: bool,
}

impl Format for Arg {
    fn format(&self, out: &mut String) {
        self.name.format(out);
        out.push_str(": ");
        if self.stream {
            out.push_str("stream ");
        }
        self.typ.format(out);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Return {
    pub name: Identifier,
    pub typ: Type,
    pub stream: bool,
}

impl Format for Return {
    fn format(&self, out: &mut String) {
        self.name.format(out);
        out.push_str(": ");
        if self.stream {
            out.push_str("stream ");
        }
        self.typ.format(out);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Method {
    pub name: Identifier,
    pub args: Vec<Arg>,
    pub returns: Vec<Return>,
    pub options: Options,
    pub comments: Vec<Comment>,
}

impl Format for Method {
    fn format(&self, out: &mut String) {
        for comment in &self.comments {
            out.push_str("\n    ");
            comment.format(out);
        }

        out.push_str("\n    ");
        self.name.format(out);
        out.push_str(" (");

        for (i, arg) in self.args.iter().enumerate() {
            if i != 0 {
                out.push_str(", ");
            }
            arg.format(out);
        }

        out.push(')');

        if !self.returns.is_empty() {
            out.push_str(" => (");
            for (i, ret) in self.returns.iter().enumerate() {
                if i != 0 {
                    out.push_str(", ");
                }
                ret.format(out);
            }
            out.push(')');
        }

        if !self.options.is_empty() {
            self.options.format(out);
        }
    }
}

/// Derived from the `Http`/`Rpc` prefix of the service name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ServiceKind {
    Rpc,
    Http,
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceKind::Rpc => f.write_str("rpc"),
            ServiceKind::Http => f.write_str("http"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Service {
    pub token: Token,
    pub name: Identifier,
    pub kind: ServiceKind,
    pub methods: Vec<Method>,
    pub comments: Vec<Comment>,
}

impl Format for Service {
    fn format(&self, out: &mut String) {
        for comment in &self.comments {
            if comment.position != CommentPosition::Top {
                continue;
            }
            comment.format(out);
            out.push('\n');
        }

        out.push_str("service ");
        self.name.format(out);
        out.push_str(" {");

        for method in &self.methods {
            method.format(out);
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
