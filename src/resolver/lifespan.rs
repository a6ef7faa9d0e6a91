use super::term::short_article;
use super::{Attribute, Context, Resolver, PERSON_CLASS};
use crate::date::{best_date, best_range, Date, Favor};
use crate::lisp::LispType;

/// Reads birth and death dates out of the opening sentence
///
/// Biographies open with `Name (born August 4, 1961) is …` or
/// `Name (c. 1537 – 1608) was …`; the parenthesised spans of that sentence
/// carry the lifespan.
pub struct LifespanResolver;

/// Top-level parenthesised spans that close before the first full stop
///
/// ```
/// use wikipediabase::resolver::parenthesized_spans;
///
/// let spans = parenthesized_spans("Ada (born 1815 (London)) wrote. Later (1843) notes.");
/// assert_eq!(spans, vec!["born 1815 (London)"]);
/// ```
pub fn parenthesized_spans(text: &str) -> Vec<&str> {
    let mut spans = Vec::new();
    let mut depth = 0usize;
    let mut open = 0usize;

    for (i, c) in text.char_indices() {
        match c {
            '(' => {
                if depth == 0 {
                    open = i + 1;
                }
                depth += 1;
            }
            ')' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    spans.push(&text[open..i]);
                }
            }
            '.' if depth == 0 => break,
            _ => {}
        }
    }
    spans
}

/// `(birth, death)` read from the spans of a first paragraph
///
/// A range gives both ends; otherwise a lone date is taken as the birth.
pub fn lifespan_dates(paragraph: &str) -> (Option<Date>, Option<Date>) {
    for span in parenthesized_spans(paragraph) {
        if let Some(range) = best_range(span) {
            return (Some(range.from.date), range.to.map(|to| to.date));
        }
        if let Some(date) = best_date(span, Some(Favor::Start)) {
            return (Some(date), None);
        }
    }
    (None, None)
}

impl Resolver for LifespanResolver {
    fn name(&self) -> &'static str {
        "lifespan"
    }

    fn priority(&self) -> i32 {
        6
    }

    fn applies_to(&self, cls: &str) -> bool {
        cls == PERSON_CLASS
    }

    fn resolve(&self, ctx: &Context<'_>, _cls: &str, attr: &Attribute) -> crate::Result<Option<LispType>> {
        let Some(paragraph) = ctx.article.first_paragraph() else {
            return Ok(None);
        };

        let answer = match attr.key() {
            "birth-date" => lifespan_dates(paragraph).0.map(LispType::date),
            "death-date" => lifespan_dates(paragraph).1.map(LispType::date),
            "short-article" => short_article(ctx),
            _ => None,
        };
        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_born_only() {
        let (birth, death) = lifespan_dates(
            "Barack Hussein Obama II (born August 4, 1961) is an American politician who served as the 44th president of the U.S.",
        );
        assert_eq!(birth, Some(Date::new(4, 8, 1961)));
        assert_eq!(death, None);
    }

    #[test]
    fn test_year_range() {
        let (birth, death) = lifespan_dates(
            "Mary Shakespeare (née Arden; c. 1537 – 1608) was the mother of William Shakespeare.",
        );
        assert_eq!(birth.map(|d| d.year), Some(1537));
        assert_eq!(death.map(|d| d.year), Some(1608));
    }

    #[test]
    fn test_spans_after_full_stop_ignored() {
        assert_eq!(
            lifespan_dates("Batman is a superhero. He first appeared in Detective Comics (May 1939)."),
            (None, None)
        );
    }

    #[test]
    fn test_unbalanced_parenthesis() {
        assert_eq!(parenthesized_spans("Unclosed (born 1900 is here"), Vec::<&str>::new());
    }
}
