//! Encoder registry
//!
//! Each entry declares a priority and an `accepts` predicate over
//! `(value, typecode, attribute)`. [`lispify`] walks the entries from the
//! highest priority down and encodes with the first one that accepts.

use crate::date::{best_date, Date};
use crate::lisp::types::{LispBody, LispType, Number, Value};
use crate::symbol::unlink;
use crate::EncodeError;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

type Accepts = fn(&Value, Option<&str>, Option<&str>) -> bool;
type Encode = fn(Value, Option<&str>, Option<&str>) -> Result<LispType, EncodeError>;

/// One registered encoder
pub struct EncoderEntry {
    pub name: &'static str,
    pub priority: i32,
    pub accepts: Accepts,
    pub encode: Encode,
}

static REFERENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[(?:\d+|[a-z]|note \d+|citation needed)\]").expect("valid reference regex")
});

/// Typecodes that describe where a value came from rather than its shape
const SOURCE_TYPECODES: &[&str] = &["code", "rendered"];

static ENCODERS: LazyLock<Vec<EncoderEntry>> = LazyLock::new(|| {
    let mut entries = vec![
        EncoderEntry {
            name: "lisp",
            priority: 100,
            accepts: |v, _, _| matches!(v, Value::Lisp(_)),
            encode: encode_lisp,
        },
        EncoderEntry {
            name: "error",
            priority: 90,
            accepts: |v, tc, _| {
                tc == Some("error") && matches!(v, Value::Dict(_) | Value::Str(_))
            },
            encode: encode_error,
        },
        EncoderEntry {
            name: "keyword",
            priority: 80,
            accepts: |v, tc, _| {
                tc.is_none()
                    && matches!(v, Value::Str(s) if s.len() > 1
                        && s.starts_with(':')
                        && !s.chars().any(char::is_whitespace))
            },
            encode: encode_keyword,
        },
        EncoderEntry {
            name: "date",
            priority: 70,
            accepts: accepts_date,
            encode: encode_date,
        },
        EncoderEntry {
            name: "bool",
            priority: 60,
            accepts: |v, _, _| matches!(v, Value::Bool(_)),
            encode: encode_bool,
        },
        EncoderEntry {
            name: "nil",
            priority: 60,
            accepts: |v, _, _| matches!(v, Value::Nil),
            encode: |_, _, _| Ok(LispType::nil()),
        },
        EncoderEntry {
            name: "number",
            priority: 50,
            accepts: |v, _, _| matches!(v, Value::Int(_) | Value::Float(_)),
            encode: encode_number,
        },
        EncoderEntry {
            name: "list",
            priority: 40,
            accepts: |v, _, _| matches!(v, Value::List(_)),
            encode: encode_list,
        },
        EncoderEntry {
            name: "dict",
            priority: 40,
            accepts: |v, _, _| matches!(v, Value::Dict(_)),
            encode: encode_dict,
        },
        EncoderEntry {
            name: "string",
            priority: 10,
            accepts: |v, _, _| matches!(v, Value::Str(_)),
            encode: encode_string,
        },
    ];
    // Stable sort keeps registration order among equal priorities.
    entries.sort_by(|a, b| b.priority.cmp(&a.priority));
    entries
});

/// The registered encoders, highest priority first
pub fn encoders() -> &'static [EncoderEntry] {
    &ENCODERS
}

/// Encodes a scraped value as a typed answer
///
/// `typecode` forces a type when set (`yyyymmdd` demands a date); `attr` is the
/// attribute the value answers, which lets date-shaped attributes (`date`,
/// `*-date`) parse their text as dates.
///
/// # Errors
///
/// * `UnsupportedEncoding` when no encoder accepts the value
/// * `NoDateFound` when a date is demanded and the text holds none
///
/// # Examples
///
/// ```
/// use wikipediabase::lisp::{lispify, Value};
///
/// let answer = lispify(Value::from("{{birth date|1946|8|19}}"), None, Some("birth-date")).unwrap();
/// assert_eq!(answer.to_string(), "(:yyyymmdd 19460819)");
///
/// let answer = lispify(Value::from("8848"), Some("code"), Some("elevation-m")).unwrap();
/// assert_eq!(answer.to_string(), r#"(:html "8848")"#);
/// ```
pub fn lispify(
    value: Value,
    typecode: Option<&str>,
    attr: Option<&str>,
) -> Result<LispType, EncodeError> {
    let entry = ENCODERS
        .iter()
        .find(|e| (e.accepts)(&value, typecode, attr))
        .ok_or_else(|| EncodeError::UnsupportedEncoding {
            value: value.describe(),
            typecode: typecode.map(str::to_string),
        })?;

    tracing::trace!("Encoding {} with {}", value.describe(), entry.name);
    (entry.encode)(value, typecode, attr)
}

fn is_date_attr(attr: Option<&str>) -> bool {
    attr.map(|a| a.to_lowercase())
        .is_some_and(|a| a == "date" || a.ends_with("-date") || a.ends_with("_date"))
}

fn accepts_date(value: &Value, typecode: Option<&str>, attr: Option<&str>) -> bool {
    match value {
        Value::Date(_) => true,
        Value::Str(_) | Value::Int(_) if typecode == Some("yyyymmdd") => true,
        // An attribute that merely looks date-shaped only takes text that parses.
        Value::Str(s) if typecode != Some("error") && is_date_attr(attr) => {
            best_date(s, None).is_some()
        }
        _ => false,
    }
}

fn encode_lisp(value: Value, _: Option<&str>, _: Option<&str>) -> Result<LispType, EncodeError> {
    match value {
        Value::Lisp(l) => Ok(*l),
        other => Err(unsupported(&other, None)),
    }
}

fn encode_error(value: Value, _: Option<&str>, _: Option<&str>) -> Result<LispType, EncodeError> {
    match value {
        Value::Str(symbol) => Ok(LispType::error(&symbol, vec![])),
        Value::Dict(entries) => {
            let mut symbol = "error".to_string();
            let mut fields = BTreeMap::new();
            for (key, v) in entries {
                match (key.as_str(), v) {
                    ("symbol", Value::Str(s)) => symbol = s,
                    (_, Value::Nil) => {}
                    (_, v) => {
                        fields.insert(key, lispify(v, None, None)?);
                    }
                }
            }
            Ok(LispType::new(
                Some("error"),
                LispBody::Error { symbol, fields },
            ))
        }
        other => Err(unsupported(&other, Some("error"))),
    }
}

fn encode_keyword(value: Value, _: Option<&str>, _: Option<&str>) -> Result<LispType, EncodeError> {
    match value {
        Value::Str(s) => Ok(LispType::keyword(&s)),
        other => Err(unsupported(&other, None)),
    }
}

fn encode_date(value: Value, _: Option<&str>, _: Option<&str>) -> Result<LispType, EncodeError> {
    let date = match value {
        Value::Date(d) => d,
        Value::Int(n) => Date::from_yyyymmdd(n).ok_or_else(|| EncodeError::NoDateFound(n.to_string()))?,
        Value::Str(s) => best_date(&s, None).ok_or(EncodeError::NoDateFound(s))?,
        other => return Err(unsupported(&other, Some("yyyymmdd"))),
    };
    Ok(LispType::date(date))
}

fn encode_bool(value: Value, typecode: Option<&str>, _: Option<&str>) -> Result<LispType, EncodeError> {
    match value {
        Value::Bool(b) => Ok(LispType::bool(typecode, b)),
        other => Err(unsupported(&other, typecode)),
    }
}

fn encode_number(value: Value, typecode: Option<&str>, _: Option<&str>) -> Result<LispType, EncodeError> {
    let number = match value {
        Value::Int(n) => Number::Int(n),
        Value::Float(x) => Number::Float(x),
        other => return Err(unsupported(&other, typecode)),
    };
    Ok(LispType::new(typecode, LispBody::Number(number)))
}

fn encode_list(value: Value, typecode: Option<&str>, _: Option<&str>) -> Result<LispType, EncodeError> {
    match value {
        Value::List(items) => {
            let encoded = items
                .into_iter()
                .map(|item| lispify(item, None, None))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(LispType::list(typecode, encoded))
        }
        other => Err(unsupported(&other, typecode)),
    }
}

fn encode_dict(value: Value, typecode: Option<&str>, _: Option<&str>) -> Result<LispType, EncodeError> {
    match value {
        Value::Dict(entries) => {
            let mut fields = BTreeMap::new();
            for (key, v) in entries {
                if v == Value::Nil {
                    continue;
                }
                fields.insert(key, lispify(v, None, None)?);
            }
            Ok(LispType::new(typecode, LispBody::Dict(fields)))
        }
        other => Err(unsupported(&other, typecode)),
    }
}

fn encode_string(value: Value, typecode: Option<&str>, attr: Option<&str>) -> Result<LispType, EncodeError> {
    let Value::Str(s) = value else {
        return Err(unsupported(&value, typecode));
    };

    let typecode = match typecode {
        Some(tc) if attr.is_some() && SOURCE_TYPECODES.contains(&tc) => Some("html"),
        other => other,
    };

    Ok(LispType::string(typecode, clean_text(&s)))
}

/// Drops footnote markers like `[3]` and flattens wiki links
fn clean_text(s: &str) -> String {
    let unlinked = unlink(s);
    REFERENCE_RE.replace_all(&unlinked, "").trim().to_string()
}

fn unsupported(value: &Value, typecode: Option<&str>) -> EncodeError {
    EncodeError::UnsupportedEncoding {
        value: value.describe(),
        typecode: typecode.map(str::to_string),
    }
}
