use super::person::person_date;
use super::{Attribute, Context, Resolver, PERSON_CLASS};
use crate::lisp::LispType;

/// Last in the chain; turns a miss into an explanatory error
///
/// Asking for a `death-*` attribute of a person with a known birth date
/// answers `"Currently alive"`; anything else is a plain miss.
pub struct ErrorResolver;

impl Resolver for ErrorResolver {
    fn name(&self) -> &'static str {
        "error"
    }

    fn priority(&self) -> i32 {
        i32::MIN
    }

    fn applies_to(&self, _cls: &str) -> bool {
        true
    }

    fn resolve(&self, ctx: &Context<'_>, _cls: &str, attr: &Attribute) -> crate::Result<Option<LispType>> {
        let alive = attr.key().starts_with("death")
            && ctx.has_class(PERSON_CLASS)
            && person_date(ctx, "birth-date").is_some();

        let reply = if alive {
            "Currently alive".to_string()
        } else {
            format!("No value for {} of {}", attr.raw(), ctx.article.symbol())
        };
        Ok(Some(LispType::error_reply("attribute-value-not-found", &reply)))
    }
}
