use serde::Serialize;

use super::Format;
use crate::token::Token;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Identifier {
    pub token: Token,
}

impl Identifier {
    pub fn new(token: Token) -> Self {
        Identifier { token }
    }

    pub fn name(&self) -> &str {
        &self.token.value
    }
}

impl Format for Identifier {
    fn format(&self, out: &mut String) {
        out.push_str(&self.token.value);
    }
}
