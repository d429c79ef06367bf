use serde::Serialize;

use super::{Comment, Const, CustomError, Enum, Format, Model, Service};

/// An ordered bag of everything parsed out of one source file. Multiple
/// documents are merged by the validator and the generator.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct Document {
    pub comments: Vec<Comment>,
    pub consts: Vec<Const>,
    pub enums: Vec<Enum>,
    pub models: Vec<Model>,
    pub services: Vec<Service>,
    pub errors: Vec<CustomError>,
}

impl Format for Document {
    fn format(&self, out: &mut String) {
        for (i, c) in self.consts.iter().enumerate() {
            if i != 0 {
                out.push('\n');
            }
            c.format(out);
        }

        if !self.consts.is_empty()
            && (!self.enums.is_empty()
                || !self.models.is_empty()
                || !self.services.is_empty()
                || !self.errors.is_empty())
        {
            out.push_str("\n\n");
        }

        for (i, e) in self.enums.iter().enumerate() {
            if i != 0 {
                out.push_str("\n\n");
            }
            e.format(out);
        }

        if !self.enums.is_empty()
            && (!self.models.is_empty() || !self.services.is_empty() || !self.errors.is_empty())
        {
            out.push_str("\n\n");
        }

        for (i, m) in self.models.iter().enumerate() {
            if i != 0 {
                out.push_str("\n\n");
            }
            m.format(out);
        }

        if !self.models.is_empty() && (!self.services.is_empty() || !self.errors.is_empty()) {
            out.push_str("\n\n");
        }

        for (i, s) in self.services.iter().enumerate() {
            if i != 0 {
                out.push_str("\n\n");
            }
            s.format(out);
        }

        if !self.services.is_empty() && !self.errors.is_empty() {
            out.push_str("\n\n");
        }

        for (i, e) in self.errors.iter().enumerate() {
            if i != 0 {
                out.push('\n');
            }
            e.format(out);
        }

        // trailing free comments
        let needs_newline = !self.comments.is_empty()
            && (!self.consts.is_empty()
                || !self.enums.is_empty()
                || !self.models.is_empty()
                || !self.services.is_empty()
                || !self.errors.is_empty());

        if needs_newline {
            out.push('\n');
        }

        for (i, comment) in self.comments.iter().enumerate() {
            if i != 0 {
                out.push('\n');
            }
            comment.format(out);
        }
    }
}
