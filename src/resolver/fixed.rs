use super::{Attribute, Context, Resolver, TERM_CLASS};
use crate::lisp::LispType;

/// Fixed fallbacks for term attributes nothing else could answer
pub struct StaticResolver;

impl Resolver for StaticResolver {
    fn name(&self) -> &'static str {
        "static"
    }

    fn priority(&self) -> i32 {
        1
    }

    fn applies_to(&self, cls: &str) -> bool {
        cls == TERM_CLASS
    }

    fn resolve(&self, _ctx: &Context<'_>, _cls: &str, attr: &Attribute) -> crate::Result<Option<LispType>> {
        let answer = match attr.key() {
            "coordinates" => Some(LispType::list(
                Some("coordinates"),
                vec![LispType::int(0), LispType::int(0)],
            )),
            _ => None,
        };
        Ok(answer)
    }
}
