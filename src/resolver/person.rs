use super::infobox::infobox_matches;
use super::lifespan::lifespan_dates;
use super::{Attribute, Context, Resolver, PERSON_CLASS};
use crate::article::Article;
use crate::infobox::{Infobox, InfoboxTree};
use crate::lisp::{lispify, LispType, Value};

/// Infobox class every biography infobox inherits from
const INFOBOX_PERSON_CLASS: &str = "wikipedia-person";

const MASCULINE: &[&str] = &["he", "him", "his", "himself"];
const FEMININE: &[&str] = &["she", "her", "hers", "herself"];
const NEUTER: &[&str] = &["it", "its", "itself", "they", "them", "their", "theirs", "themselves"];

/// Person-specific attributes
///
/// Dates come from the first person infobox that has them, then from the
/// opening sentence. `gender` is a pronoun vote over the whole text.
pub struct PersonResolver;

/// Pronoun frequencies of a text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PronounCounts {
    pub masculine: usize,
    pub feminine: usize,
    pub neuter: usize,
}

impl PronounCounts {
    pub fn total(&self) -> usize {
        self.masculine + self.feminine + self.neuter
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gender {
    Masculine,
    Feminine,
    Neuter,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Masculine => "masculine",
            Self::Feminine => "feminine",
            Self::Neuter => "neuter",
        }
    }

    /// Class tag emitted by the person classifier
    pub fn class(&self) -> &'static str {
        match self {
            Self::Masculine => "wikibase-male",
            Self::Feminine => "wikibase-female",
            Self::Neuter => "wikibase-neuter",
        }
    }
}

/// Counts gendered pronouns, case-insensitively, as whole words
pub fn pronoun_counts(text: &str) -> PronounCounts {
    let mut counts = PronounCounts::default();
    for word in text.split(|c: char| !c.is_alphabetic()) {
        if word.is_empty() {
            continue;
        }
        let word = word.to_lowercase();
        if MASCULINE.contains(&word.as_str()) {
            counts.masculine += 1;
        } else if FEMININE.contains(&word.as_str()) {
            counts.feminine += 1;
        } else if NEUTER.contains(&word.as_str()) {
            counts.neuter += 1;
        }
    }
    counts
}

/// The winning gender, or `None` when no pronoun was seen
///
/// Masculine must win outright; ties otherwise go to feminine, then neuter.
///
/// ```
/// use wikipediabase::resolver::{gender_of, Gender, PronounCounts};
///
/// let tie = PronounCounts { masculine: 3, feminine: 3, neuter: 1 };
/// assert_eq!(gender_of(&tie), Some(Gender::Feminine));
/// ```
pub fn gender_of(counts: &PronounCounts) -> Option<Gender> {
    if counts.total() == 0 {
        return None;
    }
    if counts.masculine > counts.feminine && counts.masculine > counts.neuter {
        Some(Gender::Masculine)
    } else if counts.feminine >= counts.neuter {
        Some(Gender::Feminine)
    } else {
        Some(Gender::Neuter)
    }
}

/// Infoboxes whose class is or inherits from the person infobox
fn person_infoboxes<'a>(article: &'a Article, tree: &'a InfoboxTree) -> impl Iterator<Item = &'a Infobox> {
    article
        .infoboxes()
        .iter()
        .filter(move |ib| infobox_matches(tree, ib, INFOBOX_PERSON_CLASS))
}

fn infobox_date(infobox: &Infobox, key: &str) -> Option<LispType> {
    let value = infobox.get(key)?;
    lispify(Value::Str(value), Some("html"), Some(key))
        .ok()
        .filter(|date| date.typecode() == Some("yyyymmdd"))
}

/// A date attribute from the person infoboxes, then from the opening sentence
pub(crate) fn person_date(ctx: &Context<'_>, key: &str) -> Option<LispType> {
    if let Some(date) = person_infoboxes(ctx.article, ctx.tree).find_map(|ib| infobox_date(ib, key)) {
        return Some(date);
    }

    let (birth, death) = lifespan_dates(ctx.article.first_paragraph()?);
    match key {
        "birth-date" => birth.map(LispType::date),
        "death-date" => death.map(LispType::date),
        _ => None,
    }
}

/// Whether the article reads as a biography
pub(crate) fn has_birth_date(article: &Article, tree: &InfoboxTree) -> bool {
    let in_infobox = person_infoboxes(article, tree).any(|ib| infobox_date(ib, "birth-date").is_some());

    in_infobox
        || article
            .first_paragraph()
            .is_some_and(|p| lifespan_dates(p).0.is_some())
}

impl Resolver for PersonResolver {
    fn name(&self) -> &'static str {
        "person"
    }

    fn priority(&self) -> i32 {
        7
    }

    fn applies_to(&self, cls: &str) -> bool {
        cls == PERSON_CLASS
    }

    fn resolve(&self, ctx: &Context<'_>, _cls: &str, attr: &Attribute) -> crate::Result<Option<LispType>> {
        let answer = match attr.key() {
            key @ ("birth-date" | "death-date") => person_date(ctx, key),
            "gender" => gender_of(&pronoun_counts(&ctx.article.text()))
                .map(|g| LispType::string(Some("calculated"), g.as_str())),
            _ => None,
        };
        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResolverConfig;
    use crate::infobox::InfoboxTree;
    use crate::resolver::tests::article;

    const OBAMA_HTML: &str = "<p>Barack Hussein Obama II (born August 4, 1961) is an American politician. He served as the 44th president. His wife is Michelle Obama; she is a lawyer.</p>";

    #[test]
    fn test_pronoun_counts() {
        let counts = pronoun_counts("He said his piece. She nodded; it was late. HIMSELF");
        assert_eq!(
            counts,
            PronounCounts {
                masculine: 3,
                feminine: 1,
                neuter: 1
            }
        );
        assert_eq!(gender_of(&counts), Some(Gender::Masculine));
        assert_eq!(gender_of(&PronounCounts::default()), None);
    }

    #[test]
    fn test_neuter_wins_over_feminine_only_when_larger() {
        let counts = PronounCounts {
            masculine: 0,
            feminine: 2,
            neuter: 2,
        };
        assert_eq!(gender_of(&counts), Some(Gender::Feminine));
        let counts = PronounCounts {
            masculine: 0,
            feminine: 1,
            neuter: 2,
        };
        assert_eq!(gender_of(&counts), Some(Gender::Neuter));
    }

    #[test]
    fn test_birth_date_from_opening_sentence() {
        let article = article("Barack Obama", "'''Barack Obama'''", OBAMA_HTML);
        let classes = vec![PERSON_CLASS.to_string()];
        let ctx = Context {
            article: &article,
            classes: &classes,
            config: &ResolverConfig::default(),
            tree: InfoboxTree::bundled(),
        };

        let birth = PersonResolver
            .resolve(&ctx, PERSON_CLASS, &Attribute::new("BIRTH-DATE", None))
            .unwrap()
            .unwrap();
        assert_eq!(birth.to_string(), "(:yyyymmdd 19610804)");

        let death = PersonResolver
            .resolve(&ctx, PERSON_CLASS, &Attribute::new("DEATH-DATE", None))
            .unwrap();
        assert!(death.is_none());

        let gender = PersonResolver
            .resolve(&ctx, PERSON_CLASS, &Attribute::new("GENDER", None))
            .unwrap()
            .unwrap();
        assert_eq!(gender.to_string(), r#"(:calculated "masculine")"#);
        assert!(has_birth_date(&article, ctx.tree));
    }

    #[test]
    fn test_infobox_date_wins() {
        let markup = "{{Infobox officeholder\n| name = Bill Clinton\n| birth_date = {{birth date and age|1946|8|19}}\n}}";
        let html = r#"<table class="infobox"><tr><th>Born</th><td>William Jefferson Blythe III (1946-08-19) August 19, 1946 (age 78) Hope, Arkansas, U.S.</td></tr></table>
            <p>William Jefferson Clinton (born 1950) is an American politician.</p>"#;
        let article = article("Bill Clinton", markup, html);
        let classes = vec![PERSON_CLASS.to_string()];
        let ctx = Context {
            article: &article,
            classes: &classes,
            config: &ResolverConfig::default(),
            tree: InfoboxTree::bundled(),
        };

        let birth = person_date(&ctx, "birth-date").unwrap();
        assert_eq!(birth.to_string(), "(:yyyymmdd 19460819)");
    }

    #[test]
    fn test_only_person_infoboxes_give_dates() {
        let markup = "{{Infobox ship\n| name = Titanic\n| birth_date = 31 May 1911\n}}";
        let html = r#"<table class="infobox"><tr><th>Launched</th><td>31 May 1911</td></tr></table>
            <p>Edward John Smith (27 January 1850 - 15 April 1912) was a captain.</p>"#;
        let smith = article("Edward Smith", markup, html);
        let classes = vec![PERSON_CLASS.to_string()];
        let ctx = Context {
            article: &smith,
            classes: &classes,
            config: &ResolverConfig::default(),
            tree: InfoboxTree::bundled(),
        };

        let birth = person_date(&ctx, "birth-date").unwrap();
        assert_eq!(birth.to_string(), "(:yyyymmdd 18500127)");
        assert!(has_birth_date(&smith, ctx.tree));

        let ship_only = article("Titanic", markup, "<p>A liner.</p>");
        assert!(!has_birth_date(&ship_only, InfoboxTree::bundled()));
    }
}
