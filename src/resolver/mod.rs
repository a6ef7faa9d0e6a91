//! Resolver chain
//!
//! Resolvers are polled in descending priority. Each one declares which
//! class tags it applies to; the first applicable resolver that produces an
//! answer wins and the rest are not consulted. [`ErrorResolver`] sits at the
//! bottom and always answers, so the chain never comes back empty.

mod error;
mod fixed;
mod infobox;
mod lifespan;
mod person;
mod section;
mod term;

pub use error::ErrorResolver;
pub use fixed::StaticResolver;
pub use infobox::InfoboxResolver;
pub use lifespan::{lifespan_dates, parenthesized_spans, LifespanResolver};
pub use person::{gender_of, pronoun_counts, Gender, PersonResolver, PronounCounts};
pub use section::SectionResolver;
pub use term::{parse_coordinates, TermResolver};

pub(crate) use person::has_birth_date;

use crate::article::Article;
use crate::config::ResolverConfig;
use crate::infobox::{normalize_key, InfoboxTree};
use crate::lisp::LispType;

/// Class every article belongs to
pub const TERM_CLASS: &str = "wikibase-term";
/// Class of articles with headed sections
pub const SECTIONS_CLASS: &str = "wikibase-sections";
/// Class of articles about people
pub const PERSON_CLASS: &str = "wikibase-person";

/// The attribute a query asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    raw: String,
    key: String,
    typecode: Option<String>,
}

impl Attribute {
    /// `typecode` is the keyword the attribute was wrapped in, e.g. `code`
    /// for `(:code "ELEVATION_M")`
    pub fn new(raw: &str, typecode: Option<&str>) -> Self {
        Self {
            raw: raw.to_string(),
            key: normalize_key(raw),
            typecode: typecode.map(str::to_string),
        }
    }

    /// The attribute as written in the query
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Normalised key (`ELEVATION_M` → `elevation-m`)
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn typecode(&self) -> Option<&str> {
        self.typecode.as_deref()
    }
}

/// Code form of a normalised key (`birth-date` → `BIRTH_DATE`)
pub fn attribute_code(key: &str) -> String {
    key.to_uppercase().replace('-', "_")
}

/// Everything a resolver may look at for one query
pub struct Context<'a> {
    pub article: &'a Article,
    /// Candidate classes, explicit or classified
    pub classes: &'a [String],
    pub config: &'a ResolverConfig,
    pub tree: &'a InfoboxTree,
}

impl Context<'_> {
    pub fn has_class(&self, cls: &str) -> bool {
        self.classes.iter().any(|c| c == cls)
    }
}

/// A source of typed answers for `(symbol, attribute)` pairs
pub trait Resolver: Send + Sync {
    fn name(&self) -> &'static str;

    /// Higher runs first
    fn priority(&self) -> i32;

    fn applies_to(&self, cls: &str) -> bool;

    /// Answers the attribute, or `None` to let the next resolver try
    fn resolve(&self, ctx: &Context<'_>, cls: &str, attr: &Attribute) -> crate::Result<Option<LispType>>;

    /// Attribute descriptors this resolver can answer for the article
    fn attributes(&self, _ctx: &Context<'_>, _cls: &str) -> Vec<LispType> {
        Vec::new()
    }
}

/// Priority-ordered resolvers, fixed once built
pub struct ResolverRegistry {
    resolvers: Vec<Box<dyn Resolver>>,
}

impl ResolverRegistry {
    pub fn empty() -> Self {
        Self {
            resolvers: Vec::new(),
        }
    }

    /// Every built-in resolver
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(InfoboxResolver));
        registry.register(Box::new(TermResolver));
        registry.register(Box::new(PersonResolver));
        registry.register(Box::new(LifespanResolver));
        registry.register(Box::new(SectionResolver));
        registry.register(Box::new(StaticResolver));
        registry.register(Box::new(ErrorResolver));
        registry
    }

    /// Adds a resolver, keeping registration order among equal priorities
    pub fn register(&mut self, resolver: Box<dyn Resolver>) {
        let at = self
            .resolvers
            .iter()
            .position(|r| r.priority() < resolver.priority())
            .unwrap_or(self.resolvers.len());
        self.resolvers.insert(at, resolver);
    }

    /// Resolver names, in polling order
    pub fn names(&self) -> Vec<&'static str> {
        self.resolvers.iter().map(|r| r.name()).collect()
    }

    /// Polls resolvers by priority; the first answer wins
    ///
    /// A resolver is consulted once, with the first candidate class it
    /// applies to. Resolver errors end the chain as error answers.
    pub fn resolve(&self, ctx: &Context<'_>, attr: &Attribute) -> LispType {
        for resolver in &self.resolvers {
            let Some(cls) = ctx.classes.iter().find(|c| resolver.applies_to(c)) else {
                continue;
            };

            match resolver.resolve(ctx, cls, attr) {
                Ok(Some(answer)) => {
                    tracing::debug!(
                        "{} answered {} of {} as {}",
                        resolver.name(),
                        attr.raw(),
                        ctx.article.symbol(),
                        answer
                    );
                    return answer;
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::error!(
                        "{} failed on {} of {}: {}",
                        resolver.name(),
                        attr.raw(),
                        ctx.article.symbol(),
                        e
                    );
                    return LispType::from_error(&e);
                }
            }
        }

        LispType::error_reply(
            "attribute-value-not-found",
            &format!("No resolver answered {}", attr.raw()),
        )
    }

    /// Union of the descriptors every applicable resolver offers, first seen wins
    pub fn attributes(&self, ctx: &Context<'_>) -> Vec<LispType> {
        let mut seen: Vec<LispType> = Vec::new();
        for resolver in &self.resolvers {
            let Some(cls) = ctx.classes.iter().find(|c| resolver.applies_to(c)) else {
                continue;
            };
            for descriptor in resolver.attributes(ctx, cls) {
                if !seen.contains(&descriptor) {
                    seen.push(descriptor);
                }
            }
        }
        seen
    }
}

impl Default for ResolverRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
