use indexmap::IndexMap;
use thiserror::Error;

use crate::value::Value;

use super::MAX_NESTING_DEPTH;

/// A JSON parse error.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{message} at line {line} column {column}")]
pub struct JsonParseError {
    message: String,
    line: usize,
    column: usize,
}

impl JsonParseError {
    /// The line of the error, starting at 1.
    #[must_use]
    pub fn line(&self) -> usize {
        self.line
    }

    /// The column of the error, starting at 1.
    #[must_use]
    pub fn column(&self) -> usize {
        self.column
    }
}

/// Parse a JSON document.
///
/// The tokens `NaN`, `Infinity` and `-Infinity` are accepted as non-finite floats.
/// Integers that fit in an [`i64`] or [`u64`] are parsed exactly, larger integers as floats.
/// If a map has duplicate keys, the last value wins.
/// Lists and maps may be nested at most [`MAX_NESTING_DEPTH`] deep.
///
/// # Errors
/// Returns a [`JsonParseError`] if `text` is not a single valid JSON value.
pub fn parse(text: &str) -> Result<Value, JsonParseError> {
    let mut parser = Parser {
        text,
        bytes: text.as_bytes(),
        pos: 0,
        depth: 0,
    };
    parser.skip_whitespace();
    let value = parser.parse_value()?;
    parser.skip_whitespace();
    if parser.pos < parser.bytes.len() {
        return Err(parser.error("trailing characters"));
    }
    Ok(value)
}

struct Parser<'a> {
    text: &'a str,
    bytes: &'a [u8],
    pos: usize,
    depth: usize,
}

impl Parser<'_> {
    fn error(&self, message: impl Into<String>) -> JsonParseError {
        let consumed = &self.bytes[..self.pos.min(self.bytes.len())];
        let line = consumed.iter().filter(|&&b| b == b'\n').count() + 1;
        let line_start = consumed
            .iter()
            .rposition(|&b| b == b'\n')
            .map_or(0, |i| i + 1);
        JsonParseError {
            message: message.into(),
            line,
            column: self.pos - line_start + 1,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\n' | b'\r')) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, byte: u8) -> Result<(), JsonParseError> {
        if self.peek() == Some(byte) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(format!("expected '{}'", char::from(byte))))
        }
    }

    fn consume_literal(&mut self, literal: &str) -> bool {
        if self.bytes[self.pos..].starts_with(literal.as_bytes()) {
            self.pos += literal.len();
            true
        } else {
            false
        }
    }

    fn parse_value(&mut self) -> Result<Value, JsonParseError> {
        match self.peek() {
            None => Err(self.error("unexpected end of input")),
            Some(b'{') => self.nested(Self::parse_map),
            Some(b'[') => self.nested(Self::parse_list),
            Some(b'"') => Ok(Value::String(self.parse_string()?)),
            Some(b't') if self.consume_literal("true") => Ok(Value::Bool(true)),
            Some(b'f') if self.consume_literal("false") => Ok(Value::Bool(false)),
            Some(b'n') if self.consume_literal("null") => Ok(Value::Null),
            Some(b'N') if self.consume_literal("NaN") => Ok(Value::Float(f64::NAN)),
            Some(b'I') if self.consume_literal("Infinity") => Ok(Value::Float(f64::INFINITY)),
            Some(b'-') if self.consume_literal("-Infinity") => {
                Ok(Value::Float(f64::NEG_INFINITY))
            }
            Some(b'-' | b'0'..=b'9') => self.parse_number(),
            Some(_) => Err(self.error("expected a value")),
        }
    }

    fn nested(
        &mut self,
        parse: fn(&mut Self) -> Result<Value, JsonParseError>,
    ) -> Result<Value, JsonParseError> {
        if self.depth == MAX_NESTING_DEPTH {
            return Err(self.error("exceeded the maximum nesting depth"));
        }
        self.depth += 1;
        let value = parse(self);
        self.depth -= 1;
        value
    }

    fn parse_list(&mut self) -> Result<Value, JsonParseError> {
        self.expect(b'[')?;
        let mut items = Vec::new();
        self.skip_whitespace();
        if self.peek() == Some(b']') {
            self.pos += 1;
            return Ok(Value::List(items));
        }
        loop {
            self.skip_whitespace();
            items.push(self.parse_value()?);
            self.skip_whitespace();
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b']') => {
                    self.pos += 1;
                    return Ok(Value::List(items));
                }
                _ => return Err(self.error("expected ',' or ']'")),
            }
        }
    }

    fn parse_map(&mut self) -> Result<Value, JsonParseError> {
        self.expect(b'{')?;
        let mut entries = IndexMap::new();
        self.skip_whitespace();
        if self.peek() == Some(b'}') {
            self.pos += 1;
            return Ok(Value::Map(entries));
        }
        loop {
            self.skip_whitespace();
            if self.peek() != Some(b'"') {
                return Err(self.error("expected a string key"));
            }
            let key = self.parse_string()?;
            self.skip_whitespace();
            self.expect(b':')?;
            self.skip_whitespace();
            let value = self.parse_value()?;
            entries.insert(key, value);
            self.skip_whitespace();
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b'}') => {
                    self.pos += 1;
                    return Ok(Value::Map(entries));
                }
                _ => return Err(self.error("expected ',' or '}'")),
            }
        }
    }

    fn parse_number(&mut self) -> Result<Value, JsonParseError> {
        let start = self.pos;
        let mut is_float = false;
        if self.peek() == Some(b'-') {
            self.pos += 1;
        }
        let digits = |parser: &mut Self| {
            let start = parser.pos;
            while matches!(parser.peek(), Some(b'0'..=b'9')) {
                parser.pos += 1;
            }
            parser.pos > start
        };
        let leading_zero = self.peek() == Some(b'0');
        if !digits(self) {
            return Err(self.error("expected a digit"));
        }
        if leading_zero && self.pos - start > usize::from(self.bytes[start] == b'-') + 1 {
            return Err(self.error("leading zero in number"));
        }
        if self.peek() == Some(b'.') {
            self.pos += 1;
            is_float = true;
            if !digits(self) {
                return Err(self.error("expected a digit after the decimal point"));
            }
        }
        if matches!(self.peek(), Some(b'e' | b'E')) {
            self.pos += 1;
            is_float = true;
            if matches!(self.peek(), Some(b'+' | b'-')) {
                self.pos += 1;
            }
            if !digits(self) {
                return Err(self.error("expected a digit in the exponent"));
            }
        }
        let number = &self.text[start..self.pos];
        if !is_float {
            if let Ok(int) = number.parse::<i64>() {
                return Ok(Value::Int(int));
            }
            if let Ok(uint) = number.parse::<u64>() {
                return Ok(Value::UInt(uint));
            }
        }
        number
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|err| self.error(err.to_string()))
    }

    fn parse_string(&mut self) -> Result<String, JsonParseError> {
        self.expect(b'"')?;
        let mut string = String::new();
        loop {
            let start = self.pos;
            while !matches!(self.peek(), None | Some(b'"' | b'\\')) {
                if self.bytes[self.pos] < 0x20 {
                    return Err(self.error("control character in string"));
                }
                self.pos += 1;
            }
            // the run ends at an ASCII byte, so it is a char boundary
            string.push_str(&self.text[start..self.pos]);
            match self.peek() {
                None => return Err(self.error("unterminated string")),
                Some(b'"') => {
                    self.pos += 1;
                    return Ok(string);
                }
                _ => {
                    self.pos += 1;
                    self.parse_escape(&mut string)?;
                }
            }
        }
    }

    fn parse_escape(&mut self, string: &mut String) -> Result<(), JsonParseError> {
        let escaped = self
            .peek()
            .ok_or_else(|| self.error("unterminated string"))?;
        self.pos += 1;
        let c = match escaped {
            b'"' => '"',
            b'\\' => '\\',
            b'/' => '/',
            b'b' => '\u{08}',
            b'f' => '\u{0c}',
            b'n' => '\n',
            b'r' => '\r',
            b't' => '\t',
            b'u' => {
                let high = self.parse_hex4()?;
                if (0xD800..0xDC00).contains(&high) {
                    if !self.consume_literal("\\u") {
                        return Err(self.error("unpaired surrogate"));
                    }
                    let low = self.parse_hex4()?;
                    if !(0xDC00..0xE000).contains(&low) {
                        return Err(self.error("invalid low surrogate"));
                    }
                    let code = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
                    char::from_u32(code).ok_or_else(|| self.error("invalid unicode escape"))?
                } else {
                    char::from_u32(high).ok_or_else(|| self.error("invalid unicode escape"))?
                }
            }
            _ => return Err(self.error("invalid escape")),
        };
        string.push(c);
        Ok(())
    }

    fn parse_hex4(&mut self) -> Result<u32, JsonParseError> {
        let hex = self
            .text
            .get(self.pos..self.pos + 4)
            .ok_or_else(|| self.error("truncated unicode escape"))?;
        let code =
            u32::from_str_radix(hex, 16).map_err(|_| self.error("invalid unicode escape"))?;
        self.pos += 4;
        Ok(code)
    }
}
