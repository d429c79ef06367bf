use std::collections::{HashMap, VecDeque};

use lazy_static::lazy_static;

use crate::token::{Token, TokenKind};
use crate::utils::quote;

lazy_static! {
    static ref KEYWORDS: HashMap<&'static str, TokenKind> = {
        let mut m = HashMap::new();
        m.insert("const", TokenKind::Const);
        m.insert("enum", TokenKind::Enum);
        m.insert("model", TokenKind::Model);
        m.insert("service", TokenKind::Service);
        m.insert("error", TokenKind::CustomError);
        m.insert("byte", TokenKind::Byte);
        m.insert("bool", TokenKind::Bool);
        m.insert("int8", TokenKind::Int8);
        m.insert("int16", TokenKind::Int16);
        m.insert("int32", TokenKind::Int32);
        m.insert("int64", TokenKind::Int64);
        m.insert("uint8", TokenKind::Uint8);
        m.insert("uint16", TokenKind::Uint16);
        m.insert("uint32", TokenKind::Uint32);
        m.insert("uint64", TokenKind::Uint64);
        m.insert("float32", TokenKind::Float32);
        m.insert("float64", TokenKind::Float64);
        m.insert("timestamp", TokenKind::Timestamp);
        m.insert("string", TokenKind::String);
        m.insert("map", TokenKind::Map);
        m.insert("any", TokenKind::Any);
        m.insert("stream", TokenKind::Stream);
        m.insert("true", TokenKind::ConstBool);
        m.insert("false", TokenKind::ConstBool);
        m.insert("null", TokenKind::ConstNull);
        m
    };
}

/// A scanner state. States are first-class values: each one consumes input,
/// emits zero or more tokens, and returns the next state, or `None` once the
/// stream is finished.
#[derive(Clone, Copy)]
pub struct StateFn(fn(&mut Scanner) -> Option<StateFn>);

/// Push-style tokenizer driven by a state machine, realised as a synchronous
/// iterator: each `next_token` call advances the machine just far enough to
/// yield one token. After `Eof` (or an `Error` token) has been produced the
/// scanner keeps returning that terminal token.
pub struct Scanner {
    filename: String,
    src: String,
    start: usize,
    pos: usize,
    state: Option<StateFn>,
    queue: VecDeque<Token>,
    terminal: Option<Token>,
}

impl Scanner {
    pub fn new(filename: &str, src: &str) -> Self {
        Scanner {
            filename: filename.to_string(),
            src: src.to_string(),
            start: 0,
            pos: 0,
            state: Some(StateFn(lex)),
            queue: VecDeque::new(),
            terminal: None,
        }
    }

    pub fn next_token(&mut self) -> Token {
        loop {
            if let Some(tok) = self.queue.pop_front() {
                return tok;
            }

            match self.state.take() {
                Some(state) => self.state = (state.0)(self),
                None => {
                    return self.terminal.clone().unwrap_or_else(|| {
                        self.make_token(TokenKind::Eof, String::new(), self.pos, self.pos)
                    })
                }
            }
        }
    }

    fn peek_char(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek_char() {
            self.pos += c.len_utf8();
        }
    }

    fn ignore(&mut self) {
        self.start = self.pos;
    }

    fn current_text(&self) -> &str {
        &self.src[self.start..self.pos]
    }

    fn make_token(&self, kind: TokenKind, value: String, start: usize, end: usize) -> Token {
        Token {
            filename: self.filename.clone(),
            value,
            kind,
            start,
            end,
        }
    }

    fn emit(&mut self, kind: TokenKind) {
        let tok = self.make_token(kind, self.current_text().to_string(), self.start, self.pos);
        if matches!(kind, TokenKind::Eof | TokenKind::Error) {
            self.terminal = Some(tok.clone());
        }
        self.queue.push_back(tok);
        self.start = self.pos;
    }

    /// Emit an `Error` token carrying `message` over the current span and
    /// terminate the stream.
    fn errorf(&mut self, message: String) -> Option<StateFn> {
        let tok = self.make_token(TokenKind::Error, message, self.start, self.pos);
        self.terminal = Some(tok.clone());
        self.queue.push_back(tok);
        None
    }
}

/// Top-level state: dispatches on the first non-whitespace character.
fn lex(s: &mut Scanner) -> Option<StateFn> {
    loop {
        let c = match s.peek_char() {
            Some(c) => c,
            None => {
                s.ignore();
                s.emit(TokenKind::Eof);
                return None;
            }
        };

        match c {
            ' ' | '\t' | '\r' | '\n' => {
                s.advance();
                s.ignore();
            }
            'A'..='Z' | 'a'..='z' | '_' => return Some(StateFn(identifier)),
            '0'..='9' => return Some(StateFn(number)),
            '\'' => {
                s.advance();
                s.ignore();
                return Some(StateFn(string_single));
            }
            '"' => {
                s.advance();
                s.ignore();
                return Some(StateFn(string_double));
            }
            '`' => {
                s.advance();
                s.ignore();
                return Some(StateFn(string_backtick));
            }
            '#' => {
                s.advance();
                s.ignore();
                return Some(StateFn(comment));
            }
            '.' => return Some(StateFn(extend)),
            '[' => {
                s.advance();
                if s.peek_char() == Some(']') {
                    s.advance();
                    s.emit(TokenKind::Array);
                    return Some(StateFn(lex));
                }
                return s.errorf("expected ']' after '['".to_string());
            }
            '{' => return punct(s, TokenKind::OpenCurly),
            '}' => return punct(s, TokenKind::CloseCurly),
            '(' => return punct(s, TokenKind::OpenParen),
            ')' => return punct(s, TokenKind::CloseParen),
            '<' => return punct(s, TokenKind::OpenAngle),
            '>' => return punct(s, TokenKind::CloseAngle),
            ',' => return punct(s, TokenKind::Comma),
            ':' => return punct(s, TokenKind::Colon),
            '?' => return punct(s, TokenKind::Optional),
            '=' => {
                s.advance();
                if s.peek_char() == Some('>') {
                    s.advance();
                    s.emit(TokenKind::Return);
                } else {
                    s.emit(TokenKind::Assign);
                }
                return Some(StateFn(lex));
            }
            _ => {
                s.advance();
                return s.errorf(format!("unexpected character {}", quote(&c.to_string())));
            }
        }
    }
}

fn punct(s: &mut Scanner, kind: TokenKind) -> Option<StateFn> {
    s.advance();
    s.emit(kind);
    Some(StateFn(lex))
}

/// `[A-Za-z_][A-Za-z0-9_]*`, matched against the keyword table.
fn identifier(s: &mut Scanner) -> Option<StateFn> {
    while matches!(s.peek_char(), Some(c) if c.is_ascii_alphanumeric() || c == '_') {
        s.advance();
    }

    let kind = KEYWORDS
        .get(s.current_text())
        .copied()
        .unwrap_or(TokenKind::Identifier);
    s.emit(kind);
    Some(StateFn(lex))
}

fn scan_digits(s: &mut Scanner) {
    while matches!(s.peek_char(), Some(c) if c.is_ascii_digit() || c == '_') {
        s.advance();
    }
}

/// Integer or float literal with `_` separators, optionally reclassified by a
/// trailing duration (`ns us ms s m h`) or byte-size (`b kb mb gb tb pb eb`)
/// unit suffix. The token value keeps the separators; the parser strips them.
fn number(s: &mut Scanner) -> Option<StateFn> {
    if !matches!(s.peek_char(), Some(c) if c.is_ascii_digit()) {
        return None;
    }

    scan_digits(s);
    let mut is_float = false;

    if s.peek_char() == Some('.') {
        s.advance();
        if !matches!(s.peek_char(), Some(c) if c.is_ascii_digit()) {
            return s.errorf("expected digit after decimal point".to_string());
        }
        scan_digits(s);
        is_float = true;
    }

    let text = s.current_text();
    if text.contains("__") || text.ends_with('_') || text.contains("_.") || text.contains("._") {
        return s.errorf("expected digit after each underscore".to_string());
    }

    let mut kind = if is_float {
        TokenKind::ConstFloat
    } else {
        TokenKind::ConstInt
    };

    if matches!(s.peek_char(), Some(c) if c.is_ascii_alphabetic()) {
        let mark = s.pos;
        while matches!(s.peek_char(), Some(c) if c.is_ascii_alphabetic()) {
            s.advance();
        }

        let suffix = s.src[mark..s.pos].to_string();
        match suffix.as_str() {
            "ns" | "us" | "ms" | "s" | "m" | "h" => kind = TokenKind::ConstDuration,
            "b" | "kb" | "mb" | "gb" | "tb" | "pb" | "eb" => kind = TokenKind::ConstBytes,
            _ => {
                let c = suffix.chars().next().unwrap_or_default();
                s.pos = mark;
                return s.errorf(format!("unexpected character after number: {}", c));
            }
        }
    }

    if let Some(c) = s.peek_char() {
        if c == '.' || c.is_ascii_alphanumeric() || c == '_' {
            return s.errorf(format!("unexpected character after number: {}", c));
        }
    }

    s.emit(kind);
    Some(StateFn(lex))
}

fn scan_string(s: &mut Scanner, delim: char, kind: TokenKind) -> Option<StateFn> {
    loop {
        match s.peek_char() {
            None => return s.errorf("unterminated string".to_string()),
            Some(c) if c == delim => {
                // span and value cover the inner bytes only
                s.emit(kind);
                s.advance();
                s.ignore();
                return Some(StateFn(lex));
            }
            Some(_) => s.advance(),
        }
    }
}

fn string_single(s: &mut Scanner) -> Option<StateFn> {
    scan_string(s, '\'', TokenKind::ConstStringSingleQuote)
}

fn string_double(s: &mut Scanner) -> Option<StateFn> {
    scan_string(s, '"', TokenKind::ConstStringDoubleQuote)
}

fn string_backtick(s: &mut Scanner) -> Option<StateFn> {
    scan_string(s, '`', TokenKind::ConstStringBacktickQuote)
}

/// Everything after `#` up to the end of the line.
fn comment(s: &mut Scanner) -> Option<StateFn> {
    while matches!(s.peek_char(), Some(c) if c != '\n') {
        s.advance();
    }
    s.emit(TokenKind::Comment);
    Some(StateFn(lex))
}

/// Verifies `...`.
fn extend(s: &mut Scanner) -> Option<StateFn> {
    for _ in 0..3 {
        if s.peek_char() == Some('.') {
            s.advance();
        } else {
            return s.errorf("expected '...'".to_string());
        }
    }
    s.emit(TokenKind::Extend);
    Some(StateFn(lex))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenKind::*;

    fn tok(kind: TokenKind, value: &str, start: usize, end: usize) -> Token {
        Token::new(kind, value, start, end)
    }

    fn run_state(input: &str, init: StateFn) -> Vec<Token> {
        let mut s = Scanner::new("", input);
        let mut state = Some(init);
        while let Some(f) = state {
            state = (f.0)(&mut s);
        }
        s.queue.into_iter().collect()
    }

    fn run(input: &str) -> Vec<Token> {
        run_state(input, StateFn(lex))
    }

    #[test]
    fn test_lex_model() {
        let input = "model User {\n\t\t\t\tid: int64\n\t\t\t\tname?: string\n\t\t\t}";
        assert_eq!(
            run(input),
            vec![
                tok(Model, "model", 0, 5),
                tok(Identifier, "User", 6, 10),
                tok(OpenCurly, "{", 11, 12),
                tok(Identifier, "id", 17, 19),
                tok(Colon, ":", 19, 20),
                tok(Int64, "int64", 21, 26),
                tok(Identifier, "name", 31, 35),
                tok(Optional, "?", 35, 36),
                tok(Colon, ":", 36, 37),
                tok(String, "string", 38, 44),
                tok(CloseCurly, "}", 48, 49),
                tok(Eof, "", 49, 49),
            ]
        );
    }

    #[test]
    fn test_lex_service_with_streams() {
        let input = "service HttpFoo {\n\t\t\t\tGetAssetFile(assetId: string) => (result: stream []byte)\n\t\t\t}";
        assert_eq!(
            run(input),
            vec![
                tok(Service, "service", 0, 7),
                tok(Identifier, "HttpFoo", 8, 15),
                tok(OpenCurly, "{", 16, 17),
                tok(Identifier, "GetAssetFile", 22, 34),
                tok(OpenParen, "(", 34, 35),
                tok(Identifier, "assetId", 35, 42),
                tok(Colon, ":", 42, 43),
                tok(String, "string", 44, 50),
                tok(CloseParen, ")", 50, 51),
                tok(Return, "=>", 52, 54),
                tok(OpenParen, "(", 55, 56),
                tok(Identifier, "result", 56, 62),
                tok(Colon, ":", 62, 63),
                tok(Stream, "stream", 64, 70),
                tok(Array, "[]", 71, 73),
                tok(Byte, "byte", 73, 77),
                tok(CloseParen, ")", 77, 78),
                tok(CloseCurly, "}", 82, 83),
                tok(Eof, "", 83, 83),
            ]
        );
    }

    #[test]
    fn test_lex_service_with_options() {
        let input = "service RpcFoo {\n\t\t\t\tGetFoo() => (value: int64) {\n\t\t\t\t\tRequired\n\t\t\t\t\tA = 1mb\n\t\t\t\t\tB = 100h\n\t\t\t\t}\n\t\t\t}";
        assert_eq!(
            run(input),
            vec![
                tok(Service, "service", 0, 7),
                tok(Identifier, "RpcFoo", 8, 14),
                tok(OpenCurly, "{", 15, 16),
                tok(Identifier, "GetFoo", 21, 27),
                tok(OpenParen, "(", 27, 28),
                tok(CloseParen, ")", 28, 29),
                tok(Return, "=>", 30, 32),
                tok(OpenParen, "(", 33, 34),
                tok(Identifier, "value", 34, 39),
                tok(Colon, ":", 39, 40),
                tok(Int64, "int64", 41, 46),
                tok(CloseParen, ")", 46, 47),
                tok(OpenCurly, "{", 48, 49),
                tok(Identifier, "Required", 55, 63),
                tok(Identifier, "A", 69, 70),
                tok(Assign, "=", 71, 72),
                tok(ConstBytes, "1mb", 73, 76),
                tok(Identifier, "B", 82, 83),
                tok(Assign, "=", 84, 85),
                tok(ConstDuration, "100h", 86, 90),
                tok(CloseCurly, "}", 95, 96),
                tok(CloseCurly, "}", 100, 101),
                tok(Eof, "", 101, 101),
            ]
        );
    }

    #[test]
    fn test_lex_assignment() {
        assert_eq!(
            run("A = 1mb"),
            vec![
                tok(Identifier, "A", 0, 1),
                tok(Assign, "=", 2, 3),
                tok(ConstBytes, "1mb", 4, 7),
                tok(Eof, "", 7, 7),
            ]
        );

        assert_eq!(
            run("a=1"),
            vec![
                tok(Identifier, "a", 0, 1),
                tok(Assign, "=", 1, 2),
                tok(ConstInt, "1", 2, 3),
                tok(Eof, "", 3, 3),
            ]
        );
    }

    #[test]
    fn test_lex_string_spans_inner_bytes() {
        assert_eq!(
            run("vers = \"1.0.0-b01\""),
            vec![
                tok(Identifier, "vers", 0, 4),
                tok(Assign, "=", 5, 6),
                tok(ConstStringDoubleQuote, "1.0.0-b01", 8, 17),
                tok(Eof, "", 18, 18),
            ]
        );
    }

    #[test]
    fn test_lex_extends() {
        let input = "message A {\n\t\t\t\t...B\n\t\t\t\t...C\n\n\t\t\t\tfirst: int64\n\t\t\t}";
        assert_eq!(
            run(input),
            vec![
                tok(Identifier, "message", 0, 7),
                tok(Identifier, "A", 8, 9),
                tok(OpenCurly, "{", 10, 11),
                tok(Extend, "...", 16, 19),
                tok(Identifier, "B", 19, 20),
                tok(Extend, "...", 25, 28),
                tok(Identifier, "C", 28, 29),
                tok(Identifier, "first", 35, 40),
                tok(Colon, ":", 40, 41),
                tok(Int64, "int64", 42, 47),
                tok(CloseCurly, "}", 51, 52),
                tok(Eof, "", 52, 52),
            ]
        );
    }

    #[test]
    fn test_lex_enum() {
        let input = "enum a int64 {\n\t\t\t\tone = 1\n\t\t\t\ttwo = 2\n\t\t\t\tthree\n\t\t\t}";
        assert_eq!(
            run(input),
            vec![
                tok(Enum, "enum", 0, 4),
                tok(Identifier, "a", 5, 6),
                tok(Int64, "int64", 7, 12),
                tok(OpenCurly, "{", 13, 14),
                tok(Identifier, "one", 19, 22),
                tok(Assign, "=", 23, 24),
                tok(ConstInt, "1", 25, 26),
                tok(Identifier, "two", 31, 34),
                tok(Assign, "=", 35, 36),
                tok(ConstInt, "2", 37, 38),
                tok(Identifier, "three", 43, 48),
                tok(CloseCurly, "}", 52, 53),
                tok(Eof, "", 53, 53),
            ]
        );

        assert_eq!(
            run("enum a int64 {}"),
            vec![
                tok(Enum, "enum", 0, 4),
                tok(Identifier, "a", 5, 6),
                tok(Int64, "int64", 7, 12),
                tok(OpenCurly, "{", 13, 14),
                tok(CloseCurly, "}", 14, 15),
                tok(Eof, "", 15, 15),
            ]
        );
    }

    #[test]
    fn test_lex_mixed_document() {
        let input = "\n\n\t\t\ta = 1.0\n\n\t\t\tmessage A {\n\t\t\t\tfirstname: string {\n\t\t\t\t\trequired\n\t\t\t\t\tpattern = \"^[a-zA-Z]+$\"\n\t\t\t\t}\n\t\t\t}\n\n\t\t\tservice HttpMyService {\n\t\t\t\tGetUserById (id: int64) => (user: User) {\n\t\t\t\t\tmethod = \"GET\"\n\t\t\t\t}\n\t\t\t}\n\n\t\t\t";
        assert_eq!(
            run(input),
            vec![
                tok(Identifier, "a", 5, 6),
                tok(Assign, "=", 7, 8),
                tok(ConstFloat, "1.0", 9, 12),
                tok(Identifier, "message", 17, 24),
                tok(Identifier, "A", 25, 26),
                tok(OpenCurly, "{", 27, 28),
                tok(Identifier, "firstname", 33, 42),
                tok(Colon, ":", 42, 43),
                tok(String, "string", 44, 50),
                tok(OpenCurly, "{", 51, 52),
                tok(Identifier, "required", 58, 66),
                tok(Identifier, "pattern", 72, 79),
                tok(Assign, "=", 80, 81),
                tok(ConstStringDoubleQuote, "^[a-zA-Z]+$", 83, 94),
                tok(CloseCurly, "}", 100, 101),
                tok(CloseCurly, "}", 105, 106),
                tok(Service, "service", 111, 118),
                tok(Identifier, "HttpMyService", 119, 132),
                tok(OpenCurly, "{", 133, 134),
                tok(Identifier, "GetUserById", 139, 150),
                tok(OpenParen, "(", 151, 152),
                tok(Identifier, "id", 152, 154),
                tok(Colon, ":", 154, 155),
                tok(Int64, "int64", 156, 161),
                tok(CloseParen, ")", 161, 162),
                tok(Return, "=>", 163, 165),
                tok(OpenParen, "(", 166, 167),
                tok(Identifier, "user", 167, 171),
                tok(Colon, ":", 171, 172),
                tok(Identifier, "User", 173, 177),
                tok(CloseParen, ")", 177, 178),
                tok(OpenCurly, "{", 179, 180),
                tok(Identifier, "method", 186, 192),
                tok(Assign, "=", 193, 194),
                tok(ConstStringDoubleQuote, "GET", 196, 199),
                tok(CloseCurly, "}", 205, 206),
                tok(CloseCurly, "}", 210, 211),
                tok(Eof, "", 216, 216),
            ]
        );
    }

    #[test]
    fn test_lex_custom_error() {
        let input =
            r#"error ErrUserNotFound { Code = 1000 HttpStatus = NotFound Msg = "user not found" }"#;
        assert_eq!(
            run(input),
            vec![
                tok(CustomError, "error", 0, 5),
                tok(Identifier, "ErrUserNotFound", 6, 21),
                tok(OpenCurly, "{", 22, 23),
                tok(Identifier, "Code", 24, 28),
                tok(Assign, "=", 29, 30),
                tok(ConstInt, "1000", 31, 35),
                tok(Identifier, "HttpStatus", 36, 46),
                tok(Assign, "=", 47, 48),
                tok(Identifier, "NotFound", 49, 57),
                tok(Identifier, "Msg", 58, 61),
                tok(Assign, "=", 62, 63),
                tok(ConstStringDoubleQuote, "user not found", 65, 79),
                tok(CloseCurly, "}", 81, 82),
                tok(Eof, "", 82, 82),
            ]
        );
    }

    #[test]
    fn test_lex_comment() {
        assert_eq!(
            run("# hello\na = 1"),
            vec![
                tok(Comment, " hello", 1, 7),
                tok(Identifier, "a", 8, 9),
                tok(Assign, "=", 10, 11),
                tok(ConstInt, "1", 12, 13),
                tok(Eof, "", 13, 13),
            ]
        );
    }

    #[test]
    fn test_number_state() {
        let cases: Vec<(&str, Vec<Token>)> = vec![
            ("1", vec![tok(ConstInt, "1", 0, 1)]),
            ("1.0", vec![tok(ConstFloat, "1.0", 0, 3)]),
            (
                "1.",
                vec![tok(Error, "expected digit after decimal point", 0, 2)],
            ),
            (
                "1.0.0",
                vec![tok(Error, "unexpected character after number: .", 0, 3)],
            ),
            ("1_0_0", vec![tok(ConstInt, "1_0_0", 0, 5)]),
            ("_1_0_0", vec![]),
            (
                "1_0_0_",
                vec![tok(Error, "expected digit after each underscore", 0, 6)],
            ),
            ("0.1_0_0", vec![tok(ConstFloat, "0.1_0_0", 0, 7)]),
            (
                "0.1__0_0",
                vec![tok(Error, "expected digit after each underscore", 0, 8)],
            ),
            ("hello", vec![]),
            ("1_200kb", vec![tok(ConstBytes, "1_200kb", 0, 7)]),
        ];

        for (input, expected) in cases {
            assert_eq!(run_state(input, StateFn(number)), expected, "input: {input}");
        }
    }

    #[test]
    fn test_lex_unexpected_character() {
        assert_eq!(
            run("a = @"),
            vec![
                tok(Identifier, "a", 0, 1),
                tok(Assign, "=", 2, 3),
                tok(Error, "unexpected character \"@\"", 4, 5),
            ]
        );
    }

    #[test]
    fn test_next_token_repeats_terminal() {
        let mut s = Scanner::new("", "a");
        assert_eq!(s.next_token().kind, Identifier);
        assert_eq!(s.next_token().kind, Eof);
        assert_eq!(s.next_token().kind, Eof);
    }
}
