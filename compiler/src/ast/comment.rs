use serde::Serialize;

use super::Format;
use crate::token::Token;

/// Whether a comment is rendered above its owner or at the bottom of the
/// owner's body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CommentPosition {
    Top,
    Bottom,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comment {
    pub token: Token,
    pub position: CommentPosition,
}

impl Comment {
    pub fn new(token: Token) -> Self {
        Comment {
            token,
            position: CommentPosition::Top,
        }
    }
}

impl Format for Comment {
    fn format(&self, out: &mut String) {
        out.push_str("# ");
        out.push_str(self.token.value.trim());
    }
}
