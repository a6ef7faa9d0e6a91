use super::{Attribute, Context, Resolver, SECTIONS_CLASS};
use crate::infobox::normalize_key;
use crate::lisp::{lispify, LispType, Value};

/// Headings and the text under them
///
/// `sections` lists the headings; any other attribute naming a heading
/// (`EARLY-LIFE` for "Early life") returns that section's paragraphs.
pub struct SectionResolver;

impl Resolver for SectionResolver {
    fn name(&self) -> &'static str {
        "section"
    }

    fn priority(&self) -> i32 {
        5
    }

    fn applies_to(&self, cls: &str) -> bool {
        cls == SECTIONS_CLASS
    }

    fn resolve(&self, ctx: &Context<'_>, _cls: &str, attr: &Attribute) -> crate::Result<Option<LispType>> {
        let sections = ctx.article.sections();

        if attr.key() == "sections" {
            if sections.is_empty() {
                return Ok(None);
            }
            let headings = sections
                .into_iter()
                .map(|s| Value::Str(s.heading))
                .collect();
            return Ok(Some(lispify(Value::List(headings), None, None)?));
        }

        let Some(section) = sections
            .into_iter()
            .find(|s| normalize_key(&s.heading) == attr.key() && !s.text.is_empty())
        else {
            return Ok(None);
        };
        Ok(Some(lispify(Value::Str(section.text), Some("html"), None)?))
    }
}
