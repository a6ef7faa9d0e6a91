//! Query evaluation
//!
//! A query is one s-expression `(op arg …)`. Arguments are strings, bare
//! symbols or keyword wrappers such as `(:code "ELEVATION_M")`. Every query
//! produces exactly one [`LispType`]; failures become error answers.
//!
//! | Operation | Answer |
//! |-----------|--------|
//! | `(get [class] symbol attr)` | `(ANSWER)` |
//! | `(get-classes symbol)` | list of class tags |
//! | `(get-attributes [class] symbol)` | list of `(:code … :rendered …)` |
//! | `(sort-symbols s …)` | symbols, longest article first |
//! | `(sort-symbols-named name s …)` | symbols, best title match first |

use crate::knowledge::{miss, Knowledgebase};
use crate::lisp::{lispify, parse, LispType, Sexp};
use crate::resolver::Attribute;
use crate::symbol::Symbol;
use crate::{error_symbol, WikibaseError};
use std::sync::Arc;

/// Evaluates queries against a shared knowledgebase
#[derive(Clone)]
pub struct Evaluator {
    kb: Arc<Knowledgebase>,
}

impl Evaluator {
    pub fn new(kb: Arc<Knowledgebase>) -> Self {
        Self { kb }
    }

    pub fn knowledgebase(&self) -> &Arc<Knowledgebase> {
        &self.kb
    }

    /// Parses and evaluates one query line
    pub async fn eval_str(&self, query: &str) -> LispType {
        match parse(query) {
            Ok(form) => self.eval(&form).await,
            Err(e) => {
                tracing::debug!("Rejecting {:?}: {}", query, e);
                reply(&WikibaseError::Syntax(e))
            }
        }
    }

    pub async fn eval(&self, form: &Sexp) -> LispType {
        match self.apply(form).await {
            Ok(answer) => answer,
            Err(e) => reply(&e),
        }
    }

    async fn apply(&self, form: &Sexp) -> crate::Result<LispType> {
        // A bare keyword form evaluates to itself.
        if form.typed().is_some() {
            let (value, typecode) = form.decode()?;
            return Ok(lispify(value, typecode.as_deref(), None)?);
        }

        let Sexp::List(items) = form else {
            return Err(WikibaseError::BadArguments {
                op: form.to_string(),
                message: "a query must be a list".to_string(),
            });
        };
        let Some((head, args)) = items.split_first() else {
            return Err(WikibaseError::BadArguments {
                op: "()".to_string(),
                message: "empty query".to_string(),
            });
        };
        let Sexp::Symbol(op) = head else {
            return Err(WikibaseError::UnknownOperation(head.to_string()));
        };

        tracing::debug!("Evaluating {}", form);
        match op.as_str() {
            "get" => self.get(args).await,
            "get-classes" => self.get_classes(args).await,
            "get-attributes" => self.get_attributes(args).await,
            "sort-symbols" => self.sort_symbols(args).await,
            "sort-symbols-named" => self.sort_symbols_named(args).await,
            other => Err(WikibaseError::UnknownOperation(other.to_string())),
        }
    }

    async fn get(&self, args: &[Sexp]) -> crate::Result<LispType> {
        let (cls, symbol, attr) = match args {
            [symbol, attr] => (None, symbol, attr),
            [cls, symbol, attr] => (Some(text_arg("get", cls)?), symbol, attr),
            _ => return Err(arity("get", "2 or 3", args.len())),
        };
        let symbol = Symbol::new(&text_arg("get", symbol)?);
        let attr = attribute_arg(attr)?;

        let answer = self.kb.resolve(cls.as_deref(), &symbol, &attr).await;
        Ok(LispType::list(None, vec![answer]))
    }

    async fn get_classes(&self, args: &[Sexp]) -> crate::Result<LispType> {
        let [symbol] = args else {
            return Err(arity("get-classes", "1", args.len()));
        };
        let symbol = Symbol::new(&text_arg("get-classes", symbol)?);

        match self.kb.classify(&symbol).await {
            Ok(classes) => Ok(LispType::list(
                None,
                classes.into_iter().map(|c| LispType::string(None, c)).collect(),
            )),
            Err(e) => Ok(miss(&e)),
        }
    }

    async fn get_attributes(&self, args: &[Sexp]) -> crate::Result<LispType> {
        let (cls, symbol) = match args {
            [symbol] => (None, symbol),
            [cls, symbol] => (Some(text_arg("get-attributes", cls)?), symbol),
            _ => return Err(arity("get-attributes", "1 or 2", args.len())),
        };
        let symbol = Symbol::new(&text_arg("get-attributes", symbol)?);

        match self.kb.attributes(cls.as_deref(), &symbol).await {
            Ok(descriptors) => Ok(LispType::list(None, descriptors)),
            Err(e) => Ok(miss(&e)),
        }
    }

    /// Article length of every symbol; missing articles count as empty
    async fn lengths(&self, op: &str, args: &[Sexp]) -> crate::Result<Vec<(String, usize)>> {
        let mut lengths = Vec::with_capacity(args.len());
        for arg in args {
            let name = text_arg(op, arg)?;
            let length = match self.kb.article(&Symbol::new(&name)).await {
                Ok(article) => article.length(),
                Err(e) => {
                    tracing::debug!("Ranking {} as empty: {}", name, e);
                    0
                }
            };
            lengths.push((name, length));
        }
        Ok(lengths)
    }

    async fn sort_symbols(&self, args: &[Sexp]) -> crate::Result<LispType> {
        let mut ranked = self.lengths("sort-symbols", args).await?;
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        Ok(symbol_list(ranked))
    }

    async fn sort_symbols_named(&self, args: &[Sexp]) -> crate::Result<LispType> {
        let Some((name, symbols)) = args.split_first() else {
            return Err(arity("sort-symbols-named", "at least 1", 0));
        };
        let name = text_arg("sort-symbols-named", name)?;

        let mut ranked = self.lengths("sort-symbols-named", symbols).await?;
        ranked.sort_by(|a, b| {
            name_rank(&name, &a.0)
                .cmp(&name_rank(&name, &b.0))
                .then_with(|| b.1.cmp(&a.1))
        });
        Ok(symbol_list(ranked))
    }
}

/// 0 for an exact title match, 1 ignoring case, 2 otherwise
fn name_rank(name: &str, symbol: &str) -> u8 {
    if symbol == name {
        0
    } else if symbol.to_lowercase() == name.to_lowercase() {
        1
    } else {
        2
    }
}

fn symbol_list(ranked: Vec<(String, usize)>) -> LispType {
    LispType::list(
        None,
        ranked
            .into_iter()
            .map(|(name, _)| LispType::string(None, name))
            .collect(),
    )
}

/// A string, symbol or single-operand keyword wrapper, as text
fn text_arg(op: &str, arg: &Sexp) -> crate::Result<String> {
    if let Some(text) = arg.as_text() {
        return Ok(text.to_string());
    }
    if let Some((_, [operand])) = arg.typed() {
        if let Some(text) = operand.as_text() {
            return Ok(text.to_string());
        }
    }
    Err(WikibaseError::BadArguments {
        op: op.to_string(),
        message: format!("expected a name, got {}", arg),
    })
}

/// `"BIRTH-DATE"` or `(:code "ELEVATION_M")`
fn attribute_arg(arg: &Sexp) -> crate::Result<Attribute> {
    if let Some(text) = arg.as_text() {
        return Ok(Attribute::new(text, None));
    }
    match arg.typed() {
        Some((typecode, [operand])) => match operand.as_text() {
            Some(text) => Ok(Attribute::new(text, Some(typecode))),
            None => Err(bad_attribute(arg)),
        },
        _ => Err(bad_attribute(arg)),
    }
}

fn bad_attribute(arg: &Sexp) -> WikibaseError {
    WikibaseError::BadArguments {
        op: "get".to_string(),
        message: format!("expected an attribute, got {}", arg),
    }
}

fn arity(op: &str, expected: &str, found: usize) -> WikibaseError {
    WikibaseError::BadArguments {
        op: op.to_string(),
        message: format!("takes {} arguments, got {}", expected, found),
    }
}

/// Error answer for a failed query
///
/// Input errors carry a `:reply` for the user; everything else carries the
/// error's `:message`.
fn reply(err: &WikibaseError) -> LispType {
    match err {
        WikibaseError::Syntax(_)
        | WikibaseError::UnknownOperation(_)
        | WikibaseError::BadArguments { .. } => {
            LispType::error_reply(&error_symbol(err.type_name()), &err.to_string())
        }
        WikibaseError::Fetch(_) => miss(err),
        other => {
            tracing::error!("Query failed: {}", other);
            LispType::from_error(other)
        }
    }
}
