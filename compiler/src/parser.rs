use std::fs;
use std::path::Path;

use crate::ast::{
    Arg, ByteSizeScale, Comment, CommentPosition, Const, CustomError, Document, DurationScale,
    Enum, EnumSet, Extend, Field, Identifier, Method, Model, OptionDecl, Options, Return, Service,
    ServiceKind, Type, Value, ValueBool, ValueByteSize, ValueDuration, ValueFloat, ValueInt,
    ValueNull, ValueString, ValueVariable,
};
use crate::error::{Diagnostic, QuillError};
use crate::scanner::Scanner;
use crate::strcase;
use crate::token::{Token, TokenKind};

/// Recursive-descent parser. Owns the token stream through two slots so one
/// token of lookahead is always available, plus a floating list of pending
/// comments that attaches to the next completed production.
pub struct Parser {
    scanner: Scanner,
    curr: Option<Token>,
    next: Option<Token>,
    comments: Vec<Comment>,
}

impl Parser {
    pub fn new(input: &str) -> Self {
        Parser::with_filename("", input)
    }

    pub fn with_filename(filename: &str, input: &str) -> Self {
        Parser {
            scanner: Scanner::new(filename, input),
            curr: None,
            next: None,
            comments: Vec::new(),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, QuillError> {
        let input = fs::read_to_string(path)?;
        Ok(Parser::with_filename(&path.to_string_lossy(), &input))
    }

    /// The most recently consumed token.
    pub fn current(&self) -> Option<&Token> {
        self.curr.as_ref()
    }

    fn advance(&mut self) -> Token {
        let tok = match self.next.take() {
            Some(tok) => tok,
            None => self.scanner.next_token(),
        };
        self.curr = Some(tok.clone());
        tok
    }

    fn peek(&mut self) -> &Token {
        if self.next.is_none() {
            self.next = Some(self.scanner.next_token());
        }
        self.next.as_ref().expect("peek slot was just filled")
    }

    /// Error at the peeked token. A scanner `Error` token wins over the
    /// caller's message since it carries the lexical diagnostic.
    fn fail(&mut self, message: impl Into<String>) -> QuillError {
        let tok = self.peek().clone();
        if tok.kind == TokenKind::Error {
            let msg = tok.value.clone();
            return error_at(&tok, msg);
        }
        error_at(&tok, message)
    }

    fn take_comments(&mut self) -> Vec<Comment> {
        std::mem::take(&mut self.comments)
    }
}

fn error_at(tok: &Token, message: impl Into<String>) -> QuillError {
    QuillError::Diagnostic(Diagnostic::new(tok, message))
}

pub fn parse_comment(p: &mut Parser) -> Result<Comment, QuillError> {
    if p.peek().kind != TokenKind::Comment {
        let kind = p.peek().kind;
        return Err(p.fail(format!("expected comment but got {}", kind)));
    }

    Ok(Comment::new(p.advance()))
}

pub fn parse_const(p: &mut Parser) -> Result<Const, QuillError> {
    if p.peek().kind != TokenKind::Const {
        let kind = p.peek().kind;
        return Err(p.fail(format!("expected const, got {}", kind)));
    }

    let token = p.advance();

    if p.peek().kind != TokenKind::Identifier {
        let kind = p.peek().kind;
        return Err(p.fail(format!(
            "expected identifier after const keyword, got {}",
            kind
        )));
    }

    let identifier = Identifier::new(p.advance());

    if p.peek().kind != TokenKind::Assign {
        let kind = p.peek().kind;
        return Err(p.fail(format!("expected = after identifier, got {}", kind)));
    }

    p.advance();

    let value = parse_value(p)?;

    Ok(Const {
        token,
        identifier,
        value,
        comments: Vec::new(),
    })
}

pub fn parse_enum(p: &mut Parser) -> Result<Enum, QuillError> {
    if p.peek().kind != TokenKind::Enum {
        return Err(p.fail("expected 'enum' keyword"));
    }

    let token = p.advance();

    if p.peek().kind != TokenKind::Identifier {
        return Err(p.fail("expected identifier for defining an enum"));
    }

    let name_tok = p.advance();

    if !strcase::is_pascal(&name_tok.value) {
        return Err(error_at(&name_tok, "enum name must be in PascalCase format"));
    }

    if p.peek().kind != TokenKind::OpenCurly {
        return Err(p.fail("expected '{' after enum declaration"));
    }

    p.advance(); // skip '{'

    let mut sets: Vec<EnumSet> = Vec::new();

    loop {
        match p.peek().kind {
            TokenKind::CloseCurly => break,
            TokenKind::Comment => {
                let mut comment = parse_comment(p)?;
                comment.position = CommentPosition::Bottom;
                p.comments.push(comment);
            }
            _ => {
                let mut set = parse_enum_set(p)?;
                set.comments.append(&mut p.comments);
                sets.push(set);
            }
        }
    }

    p.advance(); // skip '}'

    // normalize the values: implicit members take the running counter, an
    // explicit assignment resets it to value+1
    let mut next_value: i64 = 0;
    let mut min_value: i64 = 0;
    let mut max_value: i64 = 0;

    for set in &mut sets {
        if set.defined {
            min_value = min_value.min(set.value.value);
            max_value = max_value.max(set.value.value);
            next_value = set.value.value.wrapping_add(1);
            continue;
        }

        set.value.value = next_value;
        min_value = min_value.min(next_value);
        max_value = max_value.max(next_value);
        next_value = next_value.wrapping_add(1);
    }

    let size = get_int_size(min_value, max_value);

    for set in &mut sets {
        set.value.size = size;
    }

    let comments = p.take_comments();

    Ok(Enum {
        token,
        name: Identifier::new(name_tok),
        size,
        sets,
        comments,
    })
}

fn parse_enum_set(p: &mut Parser) -> Result<EnumSet, QuillError> {
    if p.peek().kind != TokenKind::Identifier {
        return Err(p.fail("expected identifier for defining an enum constant"));
    }

    let name_tok = p.advance();

    if name_tok.value != "_" && !strcase::is_pascal(&name_tok.value) {
        return Err(error_at(
            &name_tok,
            "enum's set name must be in PascalCase format",
        ));
    }

    if p.peek().kind != TokenKind::Assign {
        return Ok(EnumSet {
            name: Identifier::new(name_tok),
            value: ValueInt {
                token: None,
                value: 0,
                size: 0,
                defined: false,
            },
            defined: false,
            comments: Vec::new(),
        });
    }

    p.advance(); // skip '='

    if p.peek().kind != TokenKind::ConstInt {
        return Err(p.fail("expected constant integer value for defining an enum set value"));
    }

    let value_tok = p.advance();
    let value: i64 = value_tok.value.replace('_', "").parse().map_err(|err| {
        error_at(
            &value_tok,
            format!(
                "invalid integer value for defining an enum constant value: {}",
                err
            ),
        )
    })?;

    Ok(EnumSet {
        name: Identifier::new(name_tok),
        value: ValueInt {
            token: Some(value_tok),
            value,
            size: 0,
            defined: true,
        },
        defined: true,
        comments: Vec::new(),
    })
}

fn parse_option(p: &mut Parser) -> Result<OptionDecl, QuillError> {
    if p.peek().kind != TokenKind::Identifier {
        return Err(p.fail("expected identifier for defining an option"));
    }

    let name = Identifier::new(p.advance());

    if p.peek().kind != TokenKind::Assign {
        // a bare option is a flag defaulting to true
        return Ok(OptionDecl {
            name,
            value: Value::Bool(ValueBool {
                token: None,
                value: true,
                user_defined: false,
            }),
            comments: Vec::new(),
        });
    }

    p.advance(); // skip '='

    let value = parse_value(p)?;

    Ok(OptionDecl {
        name,
        value,
        comments: Vec::new(),
    })
}

fn parse_options(p: &mut Parser) -> Result<Options, QuillError> {
    let mut options = Options::default();

    p.advance(); // skip '{'

    loop {
        match p.peek().kind {
            TokenKind::CloseCurly => break,
            TokenKind::Comment => {
                let comment = parse_comment(p)?;
                p.comments.push(comment);
            }
            _ => {
                let mut option = parse_option(p)?;
                option.comments.append(&mut p.comments);
                options.list.push(option);
            }
        }
    }

    p.advance(); // skip '}'

    for comment in &mut p.comments {
        comment.position = CommentPosition::Bottom;
    }
    options.comments.append(&mut p.comments);

    Ok(options)
}

pub fn parse_model(p: &mut Parser) -> Result<Model, QuillError> {
    if p.peek().kind != TokenKind::Model {
        return Err(p.fail("expected 'model' keyword"));
    }

    let token = p.advance();

    if p.peek().kind != TokenKind::Identifier {
        return Err(p.fail("expected identifier for defining a model"));
    }

    let name_tok = p.advance();

    if !strcase::is_pascal(&name_tok.value) {
        return Err(error_at(&name_tok, "model name must be in PascalCase format"));
    }

    if p.peek().kind != TokenKind::OpenCurly {
        return Err(p.fail("expected '{' after model declaration"));
    }

    p.advance(); // skip '{'

    let mut model = Model {
        token,
        name: Identifier::new(name_tok),
        extends: Vec::new(),
        fields: Vec::new(),
        comments: p.take_comments(),
    };

    loop {
        match p.peek().kind {
            TokenKind::CloseCurly => break,
            TokenKind::Comment => {
                let comment = parse_comment(p)?;
                p.comments.push(comment);
            }
            TokenKind::Extend => {
                let mut extend = parse_extend(p)?;
                extend.comments.append(&mut p.comments);
                model.extends.push(extend);
            }
            _ => {
                let field = parse_model_field(p)?;
                model.fields.push(field);
            }
        }
    }

    p.advance(); // skip '}'

    for comment in &mut p.comments {
        comment.position = CommentPosition::Bottom;
    }
    model.comments.append(&mut p.comments);

    Ok(model)
}

fn parse_extend(p: &mut Parser) -> Result<Extend, QuillError> {
    if p.peek().kind != TokenKind::Extend {
        return Err(p.fail("expected '...' keyword"));
    }

    p.advance(); // skip '...'

    if p.peek().kind != TokenKind::Identifier {
        return Err(p.fail("expected identifier for extending a model"));
    }

    let name_tok = p.advance();

    if !strcase::is_pascal(&name_tok.value) {
        return Err(error_at(
            &name_tok,
            "extend model name must be in PascalCase format",
        ));
    }

    Ok(Extend {
        name: Identifier::new(name_tok),
        comments: Vec::new(),
    })
}

fn parse_model_field(p: &mut Parser) -> Result<Field, QuillError> {
    if p.peek().kind != TokenKind::Identifier {
        return Err(p.fail("expected identifier for defining a model field"));
    }

    let name_tok = p.advance();

    if !strcase::is_pascal(&name_tok.value) {
        return Err(error_at(
            &name_tok,
            "model field name must be in PascalCase format",
        ));
    }

    let optional = match p.peek().kind {
        TokenKind::Optional => {
            p.advance(); // skip '?'

            if p.peek().kind != TokenKind::Colon {
                return Err(p.fail("expected ':' after '?'"));
            }
            p.advance(); // skip ':'
            true
        }
        TokenKind::Colon => {
            p.advance(); // skip ':'
            false
        }
        _ => return Err(p.fail("expected ':' or '?' after model field name")),
    };

    let typ = parse_type(p)?;

    let mut field = Field {
        name: Identifier::new(name_tok),
        typ,
        optional,
        options: Options::default(),
        comments: p.take_comments(),
    };

    if p.peek().kind != TokenKind::OpenCurly {
        return Ok(field);
    }

    field.options = parse_options(p)?;

    Ok(field)
}

pub fn parse_type(p: &mut Parser) -> Result<Type, QuillError> {
    match p.peek().kind {
        TokenKind::Map => parse_map_type(p),
        TokenKind::Array => parse_array_type(p),
        TokenKind::Bool => Ok(Type::Bool { token: p.advance() }),
        TokenKind::Byte => Ok(Type::Byte { token: p.advance() }),
        TokenKind::Int8 | TokenKind::Int16 | TokenKind::Int32 | TokenKind::Int64 => {
            let token = p.advance();
            let size = extract_type_bits("int", &token.value);
            Ok(Type::Int { token, size })
        }
        TokenKind::Uint8 | TokenKind::Uint16 | TokenKind::Uint32 | TokenKind::Uint64 => {
            let token = p.advance();
            let size = extract_type_bits("uint", &token.value);
            Ok(Type::Uint { token, size })
        }
        TokenKind::Float32 | TokenKind::Float64 => {
            let token = p.advance();
            let size = extract_type_bits("float", &token.value);
            Ok(Type::Float { token, size })
        }
        TokenKind::Timestamp => Ok(Type::Timestamp { token: p.advance() }),
        TokenKind::String => Ok(Type::String { token: p.advance() }),
        TokenKind::Any => Ok(Type::Any { token: p.advance() }),
        TokenKind::Identifier => {
            let name_tok = p.advance();

            if !strcase::is_pascal(&name_tok.value) {
                return Err(error_at(
                    &name_tok,
                    "custom type name must be in PascalCase format",
                ));
            }

            Ok(Type::Custom { token: name_tok })
        }
        _ => Err(p.fail("expected type")),
    }
}

fn parse_map_type(p: &mut Parser) -> Result<Type, QuillError> {
    let map_tok = p.advance(); // skip 'map'

    if p.peek().kind != TokenKind::OpenAngle {
        return Err(p.fail("expected '<' after 'map' keyword"));
    }

    p.advance(); // skip '<'

    let key = parse_map_key_type(p)?;

    if p.peek().kind != TokenKind::Comma {
        return Err(p.fail("expected ',' after map key type"));
    }

    p.advance(); // skip ','

    let value = parse_type(p)?;

    if p.peek().kind != TokenKind::CloseAngle {
        return Err(p.fail("expected '>' after map value type"));
    }

    p.advance(); // skip '>'

    Ok(Type::Map {
        token: map_tok,
        key: Box::new(key),
        value: Box::new(value),
    })
}

fn parse_map_key_type(p: &mut Parser) -> Result<Type, QuillError> {
    match p.peek().kind {
        TokenKind::Int8
        | TokenKind::Int16
        | TokenKind::Int32
        | TokenKind::Int64
        | TokenKind::Uint8
        | TokenKind::Uint16
        | TokenKind::Uint32
        | TokenKind::Uint64
        | TokenKind::String
        | TokenKind::Byte => parse_type(p),
        _ => Err(p.fail("expected map key type to be comparable")),
    }
}

fn parse_array_type(p: &mut Parser) -> Result<Type, QuillError> {
    let array_tok = p.advance(); // skip '[]'

    let elem = parse_type(p)?;

    Ok(Type::Array {
        token: array_tok,
        elem: Box::new(elem),
    })
}

fn extract_type_bits(prefix: &str, value: &str) -> u8 {
    // the scanner only hands over the sized int8..float64 keywords here, so
    // the numeric tail is always well-formed
    value[prefix.len()..].parse().unwrap_or(0)
}

pub fn parse_service(p: &mut Parser) -> Result<Service, QuillError> {
    if p.peek().kind != TokenKind::Service {
        return Err(p.fail("expected service keyword"));
    }

    let token = p.advance();

    if p.peek().kind != TokenKind::Identifier {
        return Err(p.fail("expected identifier for defining a service"));
    }

    let name_tok = p.advance();

    if !strcase::is_pascal(&name_tok.value) {
        return Err(error_at(&name_tok, "service name must be in PascalCase format"));
    }

    let kind = if name_tok.value.starts_with("Http") {
        ServiceKind::Http
    } else if name_tok.value.starts_with("Rpc") {
        ServiceKind::Rpc
    } else {
        return Err(error_at(
            &name_tok,
            "service name must start with 'Http' or 'Rpc'",
        ));
    };

    if p.peek().kind != TokenKind::OpenCurly {
        return Err(p.fail("expected '{' after service declaration"));
    }

    let mut service = Service {
        token,
        name: Identifier::new(name_tok),
        kind,
        methods: Vec::new(),
        comments: p.take_comments(),
    };

    p.advance(); // skip '{'

    loop {
        match p.peek().kind {
            TokenKind::CloseCurly => break,
            TokenKind::Comment => {
                let comment = parse_comment(p)?;
                p.comments.push(comment);
            }
            _ => {
                let method = parse_service_method(p)?;
                service.methods.push(method);
            }
        }
    }

    p.advance(); // skip '}'

    for comment in &mut p.comments {
        comment.position = CommentPosition::Bottom;
    }
    service.comments.append(&mut p.comments);

    Ok(service)
}

fn parse_service_method(p: &mut Parser) -> Result<Method, QuillError> {
    if p.peek().kind != TokenKind::Identifier {
        return Err(p.fail("expected identifier for defining a service method"));
    }

    let name_tok = p.advance();

    if !strcase::is_pascal(&name_tok.value) {
        return Err(error_at(
            &name_tok,
            "service method name must be in PascalCase format",
        ));
    }

    let mut method = Method {
        name: Identifier::new(name_tok),
        args: Vec::new(),
        returns: Vec::new(),
        options: Options::default(),
        comments: Vec::new(),
    };

    if p.peek().kind != TokenKind::OpenParen {
        return Err(p.fail("expected '(' after service method name"));
    }

    p.advance(); // skip '('

    while p.peek().kind != TokenKind::CloseParen {
        let arg = parse_service_method_arg(p)?;
        method.args.push(arg);
    }

    p.advance(); // skip ')'

    if p.peek().kind == TokenKind::Return {
        p.advance(); // skip '=>'

        if p.peek().kind != TokenKind::OpenParen {
            return Err(p.fail("expected '(' after '=>'"));
        }

        p.advance(); // skip '('

        while p.peek().kind != TokenKind::CloseParen {
            let ret = parse_service_method_return(p)?;
            method.returns.push(ret);
        }

        p.advance(); // skip ')'
    }

    method.comments.append(&mut p.comments);

    // options are optional and sit inside curly braces
    if p.peek().kind == TokenKind::OpenCurly {
        method.options = parse_options(p)?;
    }

    Ok(method)
}

fn parse_service_method_arg(p: &mut Parser) -> Result<Arg, QuillError> {
    if p.peek().kind != TokenKind::Identifier {
        return Err(p.fail("expected identifier for defining a service method argument"));
    }

    let name_tok = p.advance();

    if !strcase::is_camel(&name_tok.value) {
        return Err(error_at(
            &name_tok,
            "service method argument name must be in camelCase format",
        ));
    }

    if p.peek().kind != TokenKind::Colon {
        return Err(p.fail("expected ':' after service method argument name"));
    }

    p.advance(); // skip ':'

    let stream = if p.peek().kind == TokenKind::Stream {
        p.advance(); // skip 'stream'
        true
    } else {
        false
    };

    let typ = parse_type(p)?;

    if p.peek().kind == TokenKind::Comma {
        p.advance(); // skip ','
    }

    Ok(Arg {
        name: Identifier::new(name_tok),
        typ,
        stream,
    })
}

fn parse_service_method_return(p: &mut Parser) -> Result<Return, QuillError> {
    if p.peek().kind != TokenKind::Identifier {
        return Err(p.fail("expected identifier for defining a service method return"));
    }

    let name_tok = p.advance();

    if !strcase::is_camel(&name_tok.value) {
        return Err(error_at(
            &name_tok,
            "service method return name must be in camelCase format",
        ));
    }

    if p.peek().kind != TokenKind::Colon {
        return Err(p.fail("expected ':' after service method return name"));
    }

    p.advance(); // skip ':'

    let stream = if p.peek().kind == TokenKind::Stream {
        p.advance(); // skip 'stream'
        true
    } else {
        false
    };

    let typ = parse_type(p)?;

    if p.peek().kind == TokenKind::Comma {
        p.advance(); // skip ','
    }

    Ok(Return {
        name: Identifier::new(name_tok),
        typ,
        stream,
    })
}

pub fn parse_custom_error(p: &mut Parser) -> Result<CustomError, QuillError> {
    if p.peek().kind != TokenKind::CustomError {
        return Err(p.fail("expected 'error' keyword"));
    }

    let token = p.advance();

    if p.peek().kind != TokenKind::Identifier {
        return Err(p.fail("expected identifier for defining a custom error"));
    }

    let name_tok = p.advance();

    if !strcase::is_pascal(&name_tok.value) {
        return Err(error_at(
            &name_tok,
            "custom error name must be in PascalCase format",
        ));
    }

    if p.peek().kind != TokenKind::OpenCurly {
        return Err(p.fail("expected '{' after custom error declaration"));
    }

    p.advance(); // skip '{'

    let mut code: i64 = 0;
    let mut msg: Option<ValueString> = None;

    loop {
        match p.peek().kind {
            TokenKind::CloseCurly => break,
            TokenKind::Comment => {
                let comment = parse_comment(p)?;
                p.comments.push(comment);
            }
            _ => parse_custom_error_value(p, &mut code, &mut msg)?,
        }
    }

    p.advance(); // skip '}'

    let msg = match msg {
        Some(msg) => msg,
        None => return Err(error_at(&token, "message is not defined in custom error")),
    };

    let comments = p.take_comments();

    Ok(CustomError {
        token,
        name: Identifier::new(name_tok),
        code,
        msg,
        comments,
    })
}

fn parse_custom_error_value(
    p: &mut Parser,
    code: &mut i64,
    msg: &mut Option<ValueString>,
) -> Result<(), QuillError> {
    if p.peek().kind != TokenKind::Identifier {
        return Err(p.fail("expected identifier for defining a custom error value"));
    }

    match p.peek().value.as_str() {
        "Code" => parse_custom_error_code(p, code),
        "Msg" => parse_custom_error_msg(p, msg),
        _ => Err(p.fail("unexpected field name in custom error")),
    }
}

fn parse_custom_error_code(p: &mut Parser, code: &mut i64) -> Result<(), QuillError> {
    if *code != 0 {
        return Err(p.fail("code is already defined in custom error"));
    }

    p.advance(); // skip 'Code'

    if p.peek().kind != TokenKind::Assign {
        return Err(p.fail("expected '=' after 'Code'"));
    }

    p.advance(); // skip '='

    if p.peek().kind != TokenKind::ConstInt {
        return Err(p.fail("expected integer value for 'Code'"));
    }

    if let Value::Int(v) = parse_value(p)? {
        *code = v.value;
    }

    Ok(())
}

fn parse_custom_error_msg(p: &mut Parser, msg: &mut Option<ValueString>) -> Result<(), QuillError> {
    if msg.is_some() {
        return Err(p.fail("Msg is already defined in custom error"));
    }

    p.advance(); // skip 'Msg'

    if p.peek().kind != TokenKind::Assign {
        return Err(p.fail("expected '=' after 'Msg'"));
    }

    p.advance(); // skip '='

    match parse_value(p)? {
        Value::String(v) => *msg = Some(v),
        _ => return Err(p.fail("expected string value for 'Msg'")),
    }

    Ok(())
}

pub fn parse_document(p: &mut Parser) -> Result<Document, QuillError> {
    let mut doc = Document::default();

    while p.peek().kind != TokenKind::Eof {
        match p.peek().kind {
            TokenKind::Comment => {
                let comment = parse_comment(p)?;
                p.comments.push(comment);
            }
            TokenKind::Const => {
                let mut constant = parse_const(p)?;
                constant.comments.append(&mut p.comments);
                doc.consts.push(constant);
            }
            TokenKind::Enum => {
                let enum_decl = parse_enum(p)?;
                doc.enums.push(enum_decl);
            }
            TokenKind::Model => {
                let model = parse_model(p)?;
                doc.models.push(model);
            }
            TokenKind::Service => {
                let service = parse_service(p)?;
                doc.services.push(service);
            }
            TokenKind::CustomError => {
                let custom_error = parse_custom_error(p)?;
                doc.errors.push(custom_error);
            }
            _ => return Err(p.fail("unexpected token")),
        }
    }

    doc.comments.append(&mut p.comments);

    Ok(doc)
}

fn parse_byte_size_number(value: &str) -> (String, ByteSizeScale) {
    let bytes = value.as_bytes();
    if bytes.len() >= 2 {
        let scale = match bytes[bytes.len() - 2] {
            b'k' => Some(ByteSizeScale::Kb),
            b'm' => Some(ByteSizeScale::Mb),
            b'g' => Some(ByteSizeScale::Gb),
            b't' => Some(ByteSizeScale::Tb),
            b'p' => Some(ByteSizeScale::Pb),
            b'e' => Some(ByteSizeScale::Eb),
            _ => None,
        };
        if let Some(scale) = scale {
            return (value[..value.len() - 2].to_string(), scale);
        }
    }

    (value[..value.len() - 1].to_string(), ByteSizeScale::B)
}

fn parse_duration_number(value: &str) -> (String, DurationScale) {
    let bytes = value.as_bytes();
    if bytes.len() >= 2 {
        match bytes[bytes.len() - 2] {
            b'n' => {
                return (
                    value[..value.len() - 2].to_string(),
                    DurationScale::Nanosecond,
                )
            }
            b'u' => {
                return (
                    value[..value.len() - 2].to_string(),
                    DurationScale::Microsecond,
                )
            }
            b'm' if bytes[bytes.len() - 1] == b's' => {
                return (
                    value[..value.len() - 2].to_string(),
                    DurationScale::Millisecond,
                )
            }
            _ => {}
        }
    }

    let scale = match bytes[bytes.len() - 1] {
        b's' => DurationScale::Second,
        b'm' => DurationScale::Minute,
        _ => DurationScale::Hour,
    };

    (value[..value.len() - 1].to_string(), scale)
}

pub fn parse_value(p: &mut Parser) -> Result<Value, QuillError> {
    let peek_tok = p.peek().clone();

    let value = match peek_tok.kind {
        TokenKind::ConstBytes => {
            let (num, scale) = parse_byte_size_number(&peek_tok.value.replace('_', ""));
            let integer: i64 = num.parse().map_err(|err| {
                error_at(
                    &peek_tok,
                    format!("failed to parse int value for bytes size: {}", err),
                )
            })?;
            Value::ByteSize(ValueByteSize {
                token: peek_tok,
                value: integer,
                scale,
            })
        }
        TokenKind::ConstDuration => {
            let (num, scale) = parse_duration_number(&peek_tok.value.replace('_', ""));
            let integer: i64 = num.parse().map_err(|err| {
                error_at(
                    &peek_tok,
                    format!("failed to parse int value for duration size: {}", err),
                )
            })?;
            Value::Duration(ValueDuration {
                token: peek_tok,
                value: integer,
                scale,
            })
        }
        TokenKind::ConstFloat => {
            let float: f64 = peek_tok.value.replace('_', "").parse().map_err(|err| {
                error_at(&peek_tok, format!("failed to parse float value: {}", err))
            })?;
            Value::Float(ValueFloat {
                token: peek_tok,
                value: float,
                size: get_float_size(float),
            })
        }
        TokenKind::ConstInt => {
            let integer: i64 = peek_tok
                .value
                .replace('_', "")
                .parse()
                .map_err(|err| error_at(&peek_tok, format!("failed to parse int value: {}", err)))?;
            Value::Int(ValueInt {
                size: get_int_size(integer, integer),
                token: Some(peek_tok),
                value: integer,
                defined: true,
            })
        }
        TokenKind::ConstBool => Value::Bool(ValueBool {
            value: peek_tok.value == "true",
            token: Some(peek_tok),
            user_defined: true,
        }),
        TokenKind::ConstNull => Value::Null(ValueNull { token: peek_tok }),
        TokenKind::ConstStringSingleQuote
        | TokenKind::ConstStringDoubleQuote
        | TokenKind::ConstStringBacktickQuote => Value::String(ValueString {
            value: peek_tok.value.clone(),
            token: peek_tok,
        }),
        TokenKind::Identifier => Value::Variable(ValueVariable { token: peek_tok }),
        _ => {
            return Err(p.fail(format!(
                "expected one of the following, 'int', 'float', 'bool', 'null', 'string' values or identifier, got {}",
                peek_tok.kind
            )))
        }
    };

    p.advance(); // skip the value token

    Ok(value)
}

/// Smallest signed bit width that fits both bounds.
pub fn get_int_size(min: i64, max: i64) -> u8 {
    if min >= -128 && max <= 127 {
        8
    } else if min >= -32768 && max <= 32767 {
        16
    } else if min >= -2147483648 && max <= 2147483647 {
        32
    } else {
        64
    }
}

fn get_float_size(value: f64) -> u8 {
    if value >= f32::MIN_POSITIVE as f64 && value <= f32::MAX as f64 {
        32
    } else {
        64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::format_node;

    #[test]
    fn test_parse_value_round_trip() {
        let cases = [
            "true", "false", "\"hello\"", "123", "123.456", "null", "NewId", "1ns", "1us", "1ms",
            "1s", "1m", "1h", "1b", "1kb", "1mb", "1gb", "1tb", "1pb", "1eb",
        ];

        for input in cases {
            let mut parser = Parser::new(input);
            let value = parse_value(&mut parser).expect(input);
            assert_eq!(format_node(&value), input, "input: {input}");
        }
    }

    #[test]
    fn test_parse_value_scales() {
        let mut parser = Parser::new("2h");
        match parse_value(&mut parser).unwrap() {
            Value::Duration(v) => {
                assert_eq!(v.value, 2);
                assert_eq!(v.scale, DurationScale::Hour);
                assert_eq!(v.total_nanoseconds(), 7_200_000_000_000);
            }
            other => panic!("expected duration, got {other:?}"),
        }

        let mut parser = Parser::new("10gb");
        match parse_value(&mut parser).unwrap() {
            Value::ByteSize(v) => {
                assert_eq!(v.value, 10);
                assert_eq!(v.scale, ByteSizeScale::Gb);
                assert_eq!(v.total_bytes(), 10_737_418_240);
            }
            other => panic!("expected byte size, got {other:?}"),
        }

        let mut parser = Parser::new("1_200kb");
        match parse_value(&mut parser).unwrap() {
            Value::ByteSize(v) => {
                assert_eq!(v.value, 1200);
                assert_eq!(v.scale, ByteSizeScale::Kb);
            }
            other => panic!("expected byte size, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_const_round_trip() {
        let cases = [
            "const A = true",
            "const B = false",
            "const C = \"hello\"",
            "const D = 123",
            "const E = 123.456",
            "const H = null",
            "const I = NewId",
            "const J = 1ns",
            "const O = 1h",
            "const P = 1b",
            "const V = 1eb",
        ];

        for input in cases {
            let mut parser = Parser::new(input);
            let constant = parse_const(&mut parser).expect(input);
            assert_eq!(format_node(&constant), input, "input: {input}");
        }
    }

    #[test]
    fn test_parse_document_formats_canonically() {
        let input = "\nmodel User {\n\tId: string\n\tName?: string\n}\n\t\t\t";
        let expected = "model User {\n    Id: string\n    Name?: string\n}";

        let mut parser = Parser::new(input);
        let doc = parse_document(&mut parser).unwrap();
        assert_eq!(format_node(&doc), expected);
    }

    #[test]
    fn test_parse_service_round_trip() {
        let input = "\nservice RpcUserService {\n    GetUserById(id: string) => (user: User)\n}\n";
        let expected = "service RpcUserService {\n    GetUserById (id: string) => (user: User)\n}";

        let mut parser = Parser::new(input);
        let doc = parse_document(&mut parser).unwrap();
        assert_eq!(format_node(&doc), expected);

        let input =
            "\nservice HttpUserService {\n    UploadAvatar(id: string, data: stream []byte)\n}\n";
        let expected =
            "service HttpUserService {\n    UploadAvatar (id: string, data: stream []byte)\n}";

        let mut parser = Parser::new(input);
        let doc = parse_document(&mut parser).unwrap();
        assert_eq!(format_node(&doc), expected);
    }

    #[test]
    fn test_parse_enum_auto_values() {
        let input = "enum Status {\n\tActive\n\tInactive\n\tBanned = 10\n\tDeleted\n}";
        let mut parser = Parser::new(input);
        let enum_decl = parse_enum(&mut parser).unwrap();

        let values: Vec<i64> = enum_decl.sets.iter().map(|s| s.value.value).collect();
        assert_eq!(values, vec![0, 1, 10, 11]);
        assert_eq!(enum_decl.size, 8);
    }

    #[test]
    fn test_parse_enum_placeholder_advances_counter() {
        let input = "enum Kind {\n\t_\n\tFirst\n\t_\n\tSecond\n}";
        let mut parser = Parser::new(input);
        let enum_decl = parse_enum(&mut parser).unwrap();

        let values: Vec<i64> = enum_decl.sets.iter().map(|s| s.value.value).collect();
        assert_eq!(values, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_parse_enum_bit_width() {
        let cases = [
            ("enum A {\n\tX = 127\n}", 8),
            ("enum A {\n\tX = 128\n}", 16),
            ("enum A {\n\tX = 32767\n}", 16),
            ("enum A {\n\tX = 32768\n}", 32),
            ("enum A {\n\tX = 2147483647\n}", 32),
            ("enum A {\n\tX = 2147483648\n}", 64),
            ("enum A {}", 8),
        ];

        for (input, size) in cases {
            let mut parser = Parser::new(input);
            let enum_decl = parse_enum(&mut parser).expect(input);
            assert_eq!(enum_decl.size, size, "input: {input}");
        }
    }

    #[test]
    fn test_parse_custom_error() {
        let input = r#"error ErrNotFound { Code = 1000 Msg = "not found" }"#;
        let mut parser = Parser::new(input);
        let err = parse_custom_error(&mut parser).unwrap();

        assert_eq!(err.name.name(), "ErrNotFound");
        assert_eq!(err.code, 1000);
        assert_eq!(err.msg.value, "not found");
        assert_eq!(format_node(&err), input);
    }

    #[test]
    fn test_parse_custom_error_requires_msg() {
        let input = "error ErrNotFound { Code = 1000 }";
        let mut parser = Parser::new(input);
        let err = parse_custom_error(&mut parser).unwrap_err();
        assert!(err
            .to_string()
            .contains("message is not defined in custom error"));
    }

    #[test]
    fn test_parse_custom_error_rejects_http_status() {
        let input = r#"error ErrNotFound { HttpStatus = NotFound Msg = "not found" }"#;
        let mut parser = Parser::new(input);
        let err = parse_custom_error(&mut parser).unwrap_err();
        assert!(err
            .to_string()
            .contains("unexpected field name in custom error"));
    }

    #[test]
    fn test_parse_model_with_options_and_comments() {
        let input = "# user record\nmodel User {\n    # primary key\n    Id: int64 {\n        Json = \"id\"\n    }\n    Name?: string\n}";
        let mut parser = Parser::new(input);
        let doc = parse_document(&mut parser).unwrap();

        assert_eq!(doc.models.len(), 1);
        let model = &doc.models[0];
        assert_eq!(model.comments.len(), 1);
        assert_eq!(model.fields[0].comments.len(), 1);
        assert_eq!(model.fields[0].options.list.len(), 1);
        assert!(model.fields[1].optional);

        assert_eq!(format_node(model), input);
    }

    #[test]
    fn test_parse_bare_option_defaults_to_true() {
        let input = "model User {\n    Name: string {\n        Required\n    }\n}";
        let mut parser = Parser::new(input);
        let doc = parse_document(&mut parser).unwrap();

        match &doc.models[0].fields[0].options.list[0].value {
            Value::Bool(v) => {
                assert!(v.value);
                assert!(!v.user_defined);
                assert!(v.token.is_none());
            }
            other => panic!("expected bool, got {other:?}"),
        }

        // flag options round-trip without a value
        assert_eq!(format_node(&doc), input);
    }

    #[test]
    fn test_parse_lex_error_surfaces_message() {
        let mut parser = Parser::new("const A = 1_0_0_");
        let err = parse_document(&mut parser).unwrap_err();
        assert!(err
            .to_string()
            .contains("expected digit after each underscore"));
    }

    #[test]
    fn test_parser_current_tracks_last_token() {
        let mut parser = Parser::new("const A = 1");
        assert!(parser.current().is_none());
        parse_document(&mut parser).unwrap();
        assert_eq!(parser.current().map(|t| t.kind), Some(TokenKind::ConstInt));
    }

    #[test]
    fn test_map_key_must_be_comparable() {
        let mut parser = Parser::new("model A {\n\tB: map<float32, string>\n}");
        let err = parse_document(&mut parser).unwrap_err();
        assert!(err
            .to_string()
            .contains("expected map key type to be comparable"));
    }
}
