//! S-expression reader
//!
//! Reads the query grammar: parenthesised lists, double-quoted strings with
//! backslash escapes, symbols, `:keywords` and numbers. The same reader takes
//! encoded answers back apart so they can be re-encoded.

use crate::date::Date;
use crate::lisp::encoder::lispify;
use crate::lisp::types::Value;
use crate::EncodeError;
use std::fmt;
use thiserror::Error;

/// A malformed s-expression
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at offset {position}")]
pub struct SyntaxError {
    pub position: usize,
    pub message: String,
}

impl SyntaxError {
    fn new(position: usize, message: impl Into<String>) -> Self {
        Self {
            position,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Sexp {
    List(Vec<Sexp>),
    Str(String),
    Symbol(String),
    Keyword(String),
    Int(i64),
    Float(f64),
}

impl Sexp {
    /// Name of a symbol or the contents of a string
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Str(s) | Self::Symbol(s) => Some(s),
            _ => None,
        }
    }

    /// Splits a form headed by a keyword into `(typecode, operands)`
    pub fn typed(&self) -> Option<(&str, &[Sexp])> {
        match self {
            Self::List(items) => match items.split_first() {
                Some((Self::Keyword(tc), rest)) => Some((tc.as_str(), rest)),
                _ => None,
            },
            _ => None,
        }
    }

    /// Converts an encoded answer back into a value and its typecode
    ///
    /// `lispify` on the result renders the same text the answer was read from.
    pub fn decode(&self) -> Result<(Value, Option<String>), EncodeError> {
        if let Some((typecode, rest)) = self.typed() {
            let value = match (typecode, rest) {
                ("yyyymmdd", [Sexp::Int(n)]) => match Date::from_yyyymmdd(*n) {
                    Some(date) => Value::Date(date),
                    None => Value::Int(*n),
                },
                ("error", [Sexp::Symbol(symbol), fields @ ..]) => {
                    let mut entries = vec![("symbol".to_string(), Value::Str(symbol.clone()))];
                    for pair in fields.chunks(2) {
                        if let [Sexp::Keyword(k), v] = pair {
                            entries.push((k.clone(), v.decode_nested()?));
                        }
                    }
                    Value::Dict(entries)
                }
                (_, [single]) if !matches!(single, Sexp::List(_)) => single.decode_nested()?,
                (_, items) => Value::List(
                    items
                        .iter()
                        .map(Sexp::decode_nested)
                        .collect::<Result<_, _>>()?,
                ),
            };
            return Ok((value, Some(typecode.to_string())));
        }

        Ok((self.decode_nested()?, None))
    }

    /// Decodes an element; typed elements are encoded in place
    fn decode_nested(&self) -> Result<Value, EncodeError> {
        match self {
            Self::Str(s) => Ok(Value::Str(s.clone())),
            Self::Symbol(s) if s == "t" => Ok(Value::Bool(true)),
            Self::Symbol(s) if s == "nil" => Ok(Value::Nil),
            Self::Symbol(s) => Ok(Value::Str(s.clone())),
            Self::Keyword(k) => Ok(Value::Str(format!(":{}", k))),
            Self::Int(n) => Ok(Value::Int(*n)),
            Self::Float(x) => Ok(Value::Float(*x)),
            Self::List(items) => match self.typed() {
                Some(_) => {
                    let (value, typecode) = self.decode()?;
                    Ok(lispify(value, typecode.as_deref(), None)?.into())
                }
                None => Ok(Value::List(
                    items
                        .iter()
                        .map(Sexp::decode_nested)
                        .collect::<Result<_, _>>()?,
                )),
            },
        }
    }
}

impl fmt::Display for Sexp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::List(items) => {
                f.write_str("(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str(")")
            }
            Self::Str(s) => write!(f, "{:?}", s),
            Self::Symbol(s) => f.write_str(s),
            Self::Keyword(k) => write!(f, ":{}", k),
            Self::Int(n) => write!(f, "{}", n),
            Self::Float(x) => write!(f, "{}", x),
        }
    }
}

/// Reads exactly one form from `input`
///
/// ```
/// use wikipediabase::lisp::{parse, Sexp};
///
/// let form = parse(r#"(get "wikibase-person" "Bill Clinton" "BIRTH-DATE")"#).unwrap();
/// let Sexp::List(items) = form else { panic!() };
/// assert_eq!(items[0], Sexp::Symbol("get".to_string()));
/// assert_eq!(items.len(), 4);
/// ```
pub fn parse(input: &str) -> Result<Sexp, SyntaxError> {
    let mut reader = Reader {
        chars: input.char_indices().collect(),
        pos: 0,
        len: input.len(),
        depth: 0,
    };

    reader.skip_whitespace();
    let form = reader.read_form()?;
    reader.skip_whitespace();

    if let Some(offset) = reader.offset() {
        return Err(SyntaxError::new(offset, "trailing input after form"));
    }
    Ok(form)
}

/// Deepest list nesting a query may use
const MAX_DEPTH: usize = 64;

struct Reader {
    chars: Vec<(usize, char)>,
    pos: usize,
    len: usize,
    depth: usize,
}

impl Reader {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).map(|&(_, c)| c)
    }

    /// Byte offset of the next character, `None` at end of input
    fn offset(&self) -> Option<usize> {
        self.chars.get(self.pos).map(|&(i, _)| i)
    }

    fn here(&self) -> usize {
        self.offset().unwrap_or(self.len)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn read_form(&mut self) -> Result<Sexp, SyntaxError> {
        match self.peek() {
            None => Err(SyntaxError::new(self.here(), "unexpected end of input")),
            Some('(') => self.read_list(),
            Some(')') => Err(SyntaxError::new(self.here(), "unbalanced ')'")),
            Some('"') => self.read_string(),
            Some(_) => self.read_atom(),
        }
    }

    fn read_list(&mut self) -> Result<Sexp, SyntaxError> {
        let start = self.here();
        if self.depth == MAX_DEPTH {
            return Err(SyntaxError::new(start, "lists nested too deeply"));
        }
        self.depth += 1;
        self.pos += 1;
        let mut items = Vec::new();

        loop {
            self.skip_whitespace();
            match self.peek() {
                None => return Err(SyntaxError::new(start, "unclosed '('")),
                Some(')') => {
                    self.pos += 1;
                    self.depth -= 1;
                    return Ok(Sexp::List(items));
                }
                Some(_) => items.push(self.read_form()?),
            }
        }
    }

    fn read_string(&mut self) -> Result<Sexp, SyntaxError> {
        let start = self.here();
        self.pos += 1;
        let mut out = String::new();

        loop {
            match self.peek() {
                None => return Err(SyntaxError::new(start, "unterminated string")),
                Some('"') => {
                    self.pos += 1;
                    return Ok(Sexp::Str(out));
                }
                Some('\\') => {
                    self.pos += 1;
                    match self.peek() {
                        None => return Err(SyntaxError::new(start, "unterminated string")),
                        Some('n') => out.push('\n'),
                        Some('t') => out.push('\t'),
                        Some(c) => out.push(c),
                    }
                    self.pos += 1;
                }
                Some(c) => {
                    out.push(c);
                    self.pos += 1;
                }
            }
        }
    }

    fn read_atom(&mut self) -> Result<Sexp, SyntaxError> {
        let start = self.here();
        let mut token = String::new();
        while let Some(c) = self.peek() {
            if c.is_whitespace() || c == '(' || c == ')' || c == '"' {
                break;
            }
            token.push(c);
            self.pos += 1;
        }

        if let Some(name) = token.strip_prefix(':') {
            if name.is_empty() {
                return Err(SyntaxError::new(start, "empty keyword"));
            }
            return Ok(Sexp::Keyword(name.to_string()));
        }

        let numeric = token
            .trim_start_matches(['-', '+'])
            .starts_with(|c: char| c.is_ascii_digit());
        if numeric {
            if let Ok(n) = token.parse::<i64>() {
                return Ok(Sexp::Int(n));
            }
            if let Ok(x) = token.parse::<f64>() {
                return Ok(Sexp::Float(x));
            }
            return Err(SyntaxError::new(start, format!("malformed number {:?}", token)));
        }

        let valid = token
            .chars()
            .next()
            .is_some_and(|c| c.is_alphabetic() || c == '_' || c == '-')
            && token
                .chars()
                .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | '*' | '?' | '!'));
        if !valid {
            return Err(SyntaxError::new(start, format!("invalid symbol {:?}", token)));
        }
        Ok(Sexp::Symbol(token))
    }
}
