use std::fmt;
use std::fs;

use thiserror::Error;

use crate::token::Token;

#[derive(Debug, Error)]
pub enum QuillError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Diagnostic(#[from] Diagnostic),

    #[error("unknown output file type: {0}")]
    UnknownTarget(String),

    #[error("glob pattern should not be used in dir level: {0}")]
    GlobPattern(String),
}

/// A positioned compile error. The span is in byte offsets; the line/column
/// view and the source excerpt are produced lazily when the error is shown.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub filename: String,
    pub start: usize,
    pub end: usize,
    pub message: String,
}

impl Diagnostic {
    pub fn new(tok: &Token, message: impl Into<String>) -> Self {
        Diagnostic {
            filename: tok.filename.clone(),
            start: tok.start,
            end: tok.end,
            message: message.into(),
        }
    }

    /// A diagnostic spanning from the start of one token to the end of another.
    pub fn spanning(start: &Token, end: &Token, message: impl Into<String>) -> Self {
        Diagnostic {
            filename: start.filename.clone(),
            start: start.start,
            end: end.end,
            message: message.into(),
        }
    }

    /// Render the full message with a source excerpt: three lines of context
    /// before and after the offending line, with a caret row under the span.
    pub fn render(&self, src: &str) -> String {
        let lines: Vec<&str> = src.split('\n').collect();
        let (line, column) = line_and_column(src, self.start);

        let mut out = String::new();

        if !self.filename.is_empty() {
            out.push_str(&format!(
                "Error: {} at ({}:{}:{})\n\n",
                self.message,
                self.filename,
                line + 1,
                column + 1
            ));
        } else {
            out.push_str(&format!(
                "Error: {} at line {}, column {}\n\n",
                self.message,
                line + 1,
                column + 1
            ));
        }

        let first = line.saturating_sub(3);
        let last = (line + 4).min(lines.len());

        for i in first..last {
            out.push_str(&format!("{:>4} | {}\n", i + 1, lines[i]));

            if i == line {
                out.push_str(&format!(
                    "     | {}{}\n",
                    " ".repeat(column),
                    "^".repeat(self.end.saturating_sub(self.start))
                ));
            }
        }

        out
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match fs::read_to_string(&self.filename) {
            Ok(src) => f.write_str(&self.render(&src)),
            Err(_) => writeln!(f, "Error: {}", self.message),
        }
    }
}

impl std::error::Error for Diagnostic {}

/// Zero-based line and column of a byte offset, counting newlines up to the
/// offset and measuring from the last one.
pub fn line_and_column(source: &str, pos: usize) -> (usize, usize) {
    let pos = pos.min(source.len());
    let before = &source[..pos];
    let line = before.matches('\n').count();
    if line == 0 {
        return (0, pos);
    }
    let last_newline = before.rfind('\n').unwrap_or(0);
    (line, pos - last_newline - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenKind;

    #[test]
    fn test_line_and_column() {
        let src = "abc\ndef\nghi";
        assert_eq!(line_and_column(src, 0), (0, 0));
        assert_eq!(line_and_column(src, 2), (0, 2));
        assert_eq!(line_and_column(src, 4), (1, 0));
        assert_eq!(line_and_column(src, 9), (2, 1));
    }

    #[test]
    fn test_render_caret_row() {
        let src = "model user {\n}";
        let tok = Token::new(TokenKind::Identifier, "user", 6, 10);
        let diag = Diagnostic::new(&tok, "name should be PascalCase");
        let rendered = diag.render(src);

        assert!(rendered.starts_with("Error: name should be PascalCase at line 1, column 7\n"));
        assert!(rendered.contains("   1 | model user {\n     |       ^^^^\n"));
    }
}
