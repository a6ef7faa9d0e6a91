use crate::date::Date;
use std::collections::BTreeMap;
use std::fmt;

/// A scraped value on its way to becoming a [`LispType`]
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Nil,
    Date(Date),
    List(Vec<Value>),
    /// Key/value pairs; `Nil` values are dropped when encoded
    Dict(Vec<(String, Value)>),
    /// Already encoded; passes through `lispify` untouched
    Lisp(Box<LispType>),
}

impl Value {
    /// Short description used in error messages
    pub fn describe(&self) -> String {
        match self {
            Self::Str(s) => format!("string {:?}", s),
            Self::Int(n) => format!("integer {}", n),
            Self::Float(n) => format!("float {}", n),
            Self::Bool(b) => format!("bool {}", b),
            Self::Nil => "nil".to_string(),
            Self::Date(d) => format!("date {}", d),
            Self::List(items) => format!("list of {}", items.len()),
            Self::Dict(items) => format!("dict of {}", items.len()),
            Self::Lisp(l) => format!("lisp {}", l),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Float(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<Date> for Value {
    fn from(d: Date) -> Self {
        Self::Date(d)
    }
}

impl From<LispType> for Value {
    fn from(l: LispType) -> Self {
        Self::Lisp(Box::new(l))
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Nil, Into::into)
    }
}

/// A numeric literal
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{}", n),
            Self::Float(x) if x.fract() == 0.0 && x.abs() < 1e15 => write!(f, "{}", *x as i64),
            Self::Float(x) => write!(f, "{}", x),
        }
    }
}

/// Encoded payload of a [`LispType`]
#[derive(Debug, Clone, PartialEq)]
pub enum LispBody {
    Str(String),
    List(Vec<LispType>),
    Dict(BTreeMap<String, LispType>),
    Date(Date),
    Bool(bool),
    Nil,
    Number(Number),
    Keyword(String),
    Error {
        symbol: String,
        fields: BTreeMap<String, LispType>,
    },
}

/// A value tagged with an optional typecode, rendered as an s-expression
#[derive(Debug, Clone, PartialEq)]
pub struct LispType {
    typecode: Option<String>,
    body: LispBody,
}

impl LispType {
    pub fn new(typecode: Option<&str>, body: LispBody) -> Self {
        Self {
            typecode: typecode.map(str::to_string),
            body,
        }
    }

    pub fn string(typecode: Option<&str>, s: impl Into<String>) -> Self {
        Self::new(typecode, LispBody::Str(s.into()))
    }

    pub fn list(typecode: Option<&str>, items: Vec<LispType>) -> Self {
        Self::new(typecode, LispBody::List(items))
    }

    pub fn int(n: i64) -> Self {
        Self::new(None, LispBody::Number(Number::Int(n)))
    }

    pub fn float(x: f64) -> Self {
        Self::new(None, LispBody::Number(Number::Float(x)))
    }

    pub fn bool(typecode: Option<&str>, b: bool) -> Self {
        Self::new(typecode, LispBody::Bool(b))
    }

    pub fn nil() -> Self {
        Self::new(None, LispBody::Nil)
    }

    pub fn keyword(name: &str) -> Self {
        Self::new(None, LispBody::Keyword(name.trim_start_matches(':').to_string()))
    }

    pub fn date(date: Date) -> Self {
        Self::new(Some("yyyymmdd"), LispBody::Date(date))
    }

    /// `(:error SYMBOL :k v …)`
    pub fn error(symbol: &str, fields: Vec<(&str, LispType)>) -> Self {
        Self::new(
            Some("error"),
            LispBody::Error {
                symbol: symbol.to_string(),
                fields: fields
                    .into_iter()
                    .map(|(k, v)| (k.to_string(), v))
                    .collect(),
            },
        )
    }

    /// `(:error SYMBOL :reply "…")`
    pub fn error_reply(symbol: &str, reply: &str) -> Self {
        Self::error(symbol, vec![("reply", Self::string(None, reply))])
    }

    /// Error built from a raised error: symbol from its type, `:message` from its text
    pub fn from_error(err: &crate::WikibaseError) -> Self {
        Self::error(
            &crate::error_symbol(err.type_name()),
            vec![("message", Self::string(None, err.to_string()))],
        )
    }

    pub fn typecode(&self) -> Option<&str> {
        self.typecode.as_deref()
    }

    pub fn body(&self) -> &LispBody {
        &self.body
    }

    /// Same payload under a different typecode
    pub fn with_typecode(mut self, typecode: Option<&str>) -> Self {
        self.typecode = typecode.map(str::to_string);
        self
    }

    /// String payload, if this is a string
    pub fn as_str(&self) -> Option<&str> {
        match &self.body {
            LispBody::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.body, LispBody::Error { .. })
    }

    /// Errors, `nil` and false are falsy
    pub fn is_truthy(&self) -> bool {
        !matches!(
            self.body,
            LispBody::Error { .. } | LispBody::Nil | LispBody::Bool(false)
        )
    }

    fn render_body(&self) -> String {
        match &self.body {
            LispBody::Str(s) => quote(s),
            LispBody::List(items) => items
                .iter()
                .map(|i| i.to_string())
                .collect::<Vec<_>>()
                .join(" "),
            LispBody::Dict(entries) => render_fields(entries),
            LispBody::Date(d) => d.yyyymmdd(),
            LispBody::Bool(true) => "t".to_string(),
            LispBody::Bool(false) | LispBody::Nil => "nil".to_string(),
            LispBody::Number(n) => n.to_string(),
            LispBody::Keyword(k) => format!(":{}", k),
            LispBody::Error { symbol, fields } => {
                let rendered = render_fields(fields);
                if rendered.is_empty() {
                    symbol.clone()
                } else {
                    format!("{} {}", symbol, rendered)
                }
            }
        }
    }
}

impl fmt::Display for LispType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let body = self.render_body();
        let wraps = matches!(self.body, LispBody::List(_) | LispBody::Dict(_));

        match &self.typecode {
            Some(tc) if body.is_empty() => write!(f, "(:{})", tc),
            Some(tc) => write!(f, "(:{} {})", tc, body),
            None if wraps => write!(f, "({})", body),
            None => f.write_str(&body),
        }
    }
}

fn render_fields(fields: &BTreeMap<String, LispType>) -> String {
    fields
        .iter()
        .map(|(k, v)| format!(":{} {}", k, v))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Double-quotes with backslash escapes; non-ASCII passes through
fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}
