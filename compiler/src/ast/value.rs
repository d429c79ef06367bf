use serde::Serialize;

use super::Format;
use crate::token::{Token, TokenKind};

/// A literal (or not-yet-resolved variable) value attached to a constant or
/// an option.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Value {
    Bool(ValueBool),
    String(ValueString),
    Int(ValueInt),
    /// Reserved for future use; the parser never produces it.
    Uint(ValueUint),
    Float(ValueFloat),
    Duration(ValueDuration),
    ByteSize(ValueByteSize),
    Null(ValueNull),
    Variable(ValueVariable),
}

impl Format for Value {
    fn format(&self, out: &mut String) {
        match self {
            Value::Bool(v) => v.format(out),
            Value::String(v) => v.format(out),
            Value::Int(v) => v.format(out),
            Value::Uint(v) => v.format(out),
            Value::Float(v) => v.format(out),
            Value::Duration(v) => v.format(out),
            Value::ByteSize(v) => v.format(out),
            Value::Null(v) => v.format(out),
            Value::Variable(v) => v.format(out),
        }
    }
}

/// `token` is `None` when the value stands for a bare option flag rather
/// than written-out `true`/`false`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueBool {
    pub token: Option<Token>,
    pub value: bool,
    pub user_defined: bool,
}

impl Format for ValueBool {
    fn format(&self, out: &mut String) {
        out.push_str(if self.value { "true" } else { "false" });
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueString {
    pub token: Token,
    pub value: String,
}

impl Format for ValueString {
    fn format(&self, out: &mut String) {
        let quote = match self.token.kind {
            TokenKind::ConstStringSingleQuote => '\'',
            TokenKind::ConstStringBacktickQuote => '`',
            _ => '"',
        };
        out.push(quote);
        out.push_str(&self.value);
        out.push(quote);
    }
}

/// `token` is `None` for implicit enum values assigned by the compiler;
/// `defined` records whether the user wrote the value out.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueInt {
    pub token: Option<Token>,
    pub value: i64,
    /// 8, 16, 32, 64
    pub size: u8,
    pub defined: bool,
}

impl Format for ValueInt {
    fn format(&self, out: &mut String) {
        match &self.token {
            Some(token) => out.push_str(&token.value),
            None => out.push_str(&self.value.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueUint {
    pub token: Token,
    pub value: u64,
    /// 8, 16, 32, 64
    pub size: u8,
}

impl Format for ValueUint {
    fn format(&self, out: &mut String) {
        out.push_str(&self.token.value);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueFloat {
    pub token: Token,
    pub value: f64,
    /// 32, 64
    pub size: u8,
}

impl Format for ValueFloat {
    fn format(&self, out: &mut String) {
        out.push_str(&self.token.value);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DurationScale {
    Nanosecond,
    Microsecond,
    Millisecond,
    Second,
    Minute,
    Hour,
}

impl DurationScale {
    /// Multiplier into nanoseconds, the smallest unit.
    pub fn nanoseconds(self) -> i64 {
        match self {
            DurationScale::Nanosecond => 1,
            DurationScale::Microsecond => 1_000,
            DurationScale::Millisecond => 1_000_000,
            DurationScale::Second => 1_000_000_000,
            DurationScale::Minute => 60 * 1_000_000_000,
            DurationScale::Hour => 3_600 * 1_000_000_000,
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            DurationScale::Nanosecond => "ns",
            DurationScale::Microsecond => "us",
            DurationScale::Millisecond => "ms",
            DurationScale::Second => "s",
            DurationScale::Minute => "m",
            DurationScale::Hour => "h",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueDuration {
    pub token: Token,
    pub value: i64,
    pub scale: DurationScale,
}

impl ValueDuration {
    /// The literal expanded into nanoseconds.
    pub fn total_nanoseconds(&self) -> i64 {
        self.value * self.scale.nanoseconds()
    }
}

impl Format for ValueDuration {
    fn format(&self, out: &mut String) {
        out.push_str(&self.token.value);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ByteSizeScale {
    B,
    Kb,
    Mb,
    Gb,
    Tb,
    Pb,
    Eb,
}

impl ByteSizeScale {
    /// Multiplier into bytes, the smallest unit.
    pub fn bytes(self) -> i64 {
        match self {
            ByteSizeScale::B => 1,
            ByteSizeScale::Kb => 1 << 10,
            ByteSizeScale::Mb => 1 << 20,
            ByteSizeScale::Gb => 1 << 30,
            ByteSizeScale::Tb => 1 << 40,
            ByteSizeScale::Pb => 1 << 50,
            ByteSizeScale::Eb => 1 << 60,
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            ByteSizeScale::B => "b",
            ByteSizeScale::Kb => "kb",
            ByteSizeScale::Mb => "mb",
            ByteSizeScale::Gb => "gb",
            ByteSizeScale::Tb => "tb",
            ByteSizeScale::Pb => "pb",
            ByteSizeScale::Eb => "eb",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueByteSize {
    pub token: Token,
    pub value: i64,
    pub scale: ByteSizeScale,
}

impl ValueByteSize {
    /// The literal expanded into bytes.
    pub fn total_bytes(&self) -> i64 {
        self.value * self.scale.bytes()
    }
}

impl Format for ValueByteSize {
    fn format(&self, out: &mut String) {
        out.push_str(&self.token.value);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueNull {
    pub token: Token,
}

impl Format for ValueNull {
    fn format(&self, out: &mut String) {
        out.push_str("null");
    }
}

/// An unresolved reference to another constant. The validator replaces these
/// with the literal they point at.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueVariable {
    pub token: Token,
}

impl Format for ValueVariable {
    fn format(&self, out: &mut String) {
        out.push_str(&self.token.value);
    }
}
