use super::{attribute_code, Attribute, Context, Resolver};
use crate::infobox::{class_of, normalize_key, Infobox, InfoboxTree, INFOBOX_CLASS_PREFIX};
use crate::lisp::{lispify, LispType, Value};

/// Answers attributes straight from the article's infoboxes
///
/// Applies to infobox classes (`wikipedia-*`). Infoboxes of the class being
/// asked about are consulted first, then the rest in article order.
pub struct InfoboxResolver;

impl InfoboxResolver {
    fn lookup(infobox: &Infobox, attr: &Attribute) -> Option<String> {
        match attr.typecode() {
            Some("code") => infobox.get_code(attr.raw()),
            Some("rendered") => infobox
                .get_rendered(attr.raw())
                .or_else(|| infobox.get(attr.raw())),
            _ => infobox.get(attr.raw()),
        }
    }
}

/// Whether `infobox` belongs to `cls`, directly or through its template redirect
pub(crate) fn infobox_matches(tree: &InfoboxTree, infobox: &Infobox, cls: &str) -> bool {
    if infobox.cls() == cls {
        return true;
    }
    let canonical = infobox.meta().map(|m| class_of(m.canonical()));
    if canonical.as_deref() == Some(cls) {
        return true;
    }
    tree.ancestors(infobox.cls()).iter().any(|a| a == cls)
        || canonical.is_some_and(|c| tree.ancestors(&c).iter().any(|a| a == cls))
}

/// The article's infoboxes, those matching `cls` first
pub(crate) fn ordered_infoboxes<'a>(ctx: &Context<'a>, cls: &str) -> Vec<&'a Infobox> {
    let (mut matching, rest): (Vec<&Infobox>, Vec<&Infobox>) = ctx
        .article
        .infoboxes()
        .iter()
        .partition(|ib| infobox_matches(ctx.tree, ib, cls));
    matching.extend(rest);
    matching
}

impl Resolver for InfoboxResolver {
    fn name(&self) -> &'static str {
        "infobox"
    }

    fn priority(&self) -> i32 {
        10
    }

    fn applies_to(&self, cls: &str) -> bool {
        cls.starts_with(INFOBOX_CLASS_PREFIX)
    }

    fn resolve(&self, ctx: &Context<'_>, cls: &str, attr: &Attribute) -> crate::Result<Option<LispType>> {
        let typecode = attr.typecode().unwrap_or("html");

        for infobox in ordered_infoboxes(ctx, cls) {
            let Some(value) = Self::lookup(infobox, attr) else {
                continue;
            };
            match lispify(Value::Str(value), Some(typecode), Some(attr.key())) {
                Ok(answer) => return Ok(Some(answer)),
                Err(e) => tracing::debug!("Skipping {} of {}: {}", attr.raw(), infobox.template(), e),
            }
        }
        Ok(None)
    }

    /// `(:code "KEY" :rendered "Label")` for every key of the matching infoboxes
    ///
    /// `:rendered` is left out when the label is just the key again. A class
    /// no infobox belongs to (e.g. `wikibase-person`) describes every infobox.
    fn attributes(&self, ctx: &Context<'_>, cls: &str) -> Vec<LispType> {
        let infoboxes: Vec<&Infobox> = ctx
            .article
            .infoboxes()
            .iter()
            .filter(|ib| infobox_matches(ctx.tree, ib, cls))
            .collect();
        let infoboxes = if infoboxes.is_empty() {
            ctx.article.infoboxes().iter().collect()
        } else {
            infoboxes
        };

        let mut descriptors = Vec::new();
        for infobox in infoboxes {
            for (key, label) in infobox.attributes() {
                let rendered = if normalize_key(&label) == key {
                    Value::Nil
                } else {
                    Value::Str(label)
                };
                let descriptor = Value::Dict(vec![
                    ("code".to_string(), Value::Str(attribute_code(&key))),
                    ("rendered".to_string(), rendered),
                ]);
                match lispify(descriptor, None, None) {
                    Ok(d) if !descriptors.contains(&d) => descriptors.push(d),
                    Ok(_) => {}
                    Err(e) => tracing::debug!("Dropping descriptor {}: {}", key, e),
                }
            }
        }
        descriptors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::article::Article;
    use crate::config::ResolverConfig;
    use crate::html::XmlString;
    use crate::infobox::{build_infoboxes, InfoboxTree, MetaInfobox};
    use crate::resolver::tests::article;
    use crate::symbol::{MarkupString, Symbol};
    use std::collections::HashMap;
    use std::sync::Arc;

    const MARKUP: &str = "{{Infobox mountain\n| name = Mount Everest\n| elevation_m = 8848\n| first_ascent = 29 May 1953\n}}\n'''Mount Everest''' is Earth's highest mountain.";
    const HTML: &str = r#"<table class="infobox"><tbody>
        <tr><th>Elevation</th><td>8,848 m (29,029 ft)</td></tr>
        <tr><th>First ascent</th><td>29 May 1953</td></tr>
    </tbody></table><p>Mount Everest is Earth's highest mountain.</p>"#;

    fn classes() -> Vec<String> {
        vec!["wikipedia-mountain".to_string()]
    }

    #[test]
    fn test_code_typecode_prefers_markup() {
        let article = article("Mount Everest", MARKUP, HTML);
        let classes = classes();
        let ctx = Context {
            article: &article,
            classes: &classes,
            config: &ResolverConfig::default(),
            tree: InfoboxTree::bundled(),
        };

        let answer = InfoboxResolver
            .resolve(&ctx, "wikipedia-mountain", &Attribute::new("ELEVATION_M", Some("code")))
            .unwrap()
            .unwrap();
        assert_eq!(answer.to_string(), r#"(:html "8848")"#);
    }

    #[test]
    fn test_date_attribute_becomes_date() {
        let article = article("Mount Everest", MARKUP, HTML);
        let classes = classes();
        let ctx = Context {
            article: &article,
            classes: &classes,
            config: &ResolverConfig::default(),
            tree: InfoboxTree::bundled(),
        };

        let answer = InfoboxResolver
            .resolve(&ctx, "wikipedia-mountain", &Attribute::new("FIRST-ASCENT-DATE", None))
            .unwrap();
        // No such key: the resolver declines rather than guessing.
        assert!(answer.is_none());

        let answer = InfoboxResolver
            .resolve(&ctx, "wikipedia-mountain", &Attribute::new("FIRST_ASCENT", None))
            .unwrap()
            .unwrap();
        assert_eq!(answer.to_string(), r#"(:html "29 May 1953")"#);
    }

    #[test]
    fn test_attribute_descriptors() {
        let article = article("Mount Everest", MARKUP, HTML);
        let classes = classes();
        let ctx = Context {
            article: &article,
            classes: &classes,
            config: &ResolverConfig::default(),
            tree: InfoboxTree::bundled(),
        };

        let rendered: Vec<String> = InfoboxResolver
            .attributes(&ctx, "wikipedia-mountain")
            .iter()
            .map(|d| d.to_string())
            .collect();
        assert!(rendered.contains(&r#"(:code "ELEVATION_M")"#.to_string()));
        assert!(rendered.contains(&r#"(:code "FIRST_ASCENT")"#.to_string()));
        assert_eq!(rendered.len(), 3);
    }

    #[test]
    fn test_meta_labels_in_descriptors() {
        let symbol = Symbol::new("Bill Clinton");
        let template = Symbol::template("Infobox officeholder");
        let markup = MarkupString::new(
            "{{Infobox officeholder\n| birth_date = {{birth date and age|1946|8|19}}\n| spouse = [[Hillary Clinton]]\n}}",
        );
        let html = XmlString::new(
            r#"<table class="infobox"><tr><th>Born</th><td>August 19, 1946</td></tr><tr><th>Spouse</th><td>Hillary Clinton</td></tr></table>"#,
        );
        let meta = MetaInfobox::from_rendered(
            template.clone(),
            &XmlString::new(
                r#"<table class="infobox"><tr><th>Born</th><td>!!!!!birth_date!!!!!</td></tr><tr><th>Spouse</th><td>!!!!!spouse!!!!!</td></tr></table>"#,
            ),
        );
        let metas = HashMap::from([(template, Arc::new(meta))]);
        let infoboxes = build_infoboxes(&symbol, &markup, &html, &metas);
        let article = Article::new(symbol, markup, html, String::new(), infoboxes);

        let classes = vec!["wikipedia-officeholder".to_string()];
        let ctx = Context {
            article: &article,
            classes: &classes,
            config: &ResolverConfig::default(),
            tree: InfoboxTree::bundled(),
        };
        let rendered: Vec<String> = InfoboxResolver
            .attributes(&ctx, "wikipedia-officeholder")
            .iter()
            .map(|d| d.to_string())
            .collect();
        assert_eq!(
            rendered,
            vec![
                r#"(:code "BIRTH_DATE" :rendered "Born")"#.to_string(),
                r#"(:code "SPOUSE")"#.to_string(),
            ]
        );

        let born = InfoboxResolver
            .resolve(&ctx, "wikipedia-officeholder", &Attribute::new("BIRTH-DATE", None))
            .unwrap()
            .unwrap();
        assert_eq!(born.to_string(), "(:yyyymmdd 19460819)");
    }

    #[test]
    fn test_only_infobox_classes() {
        assert!(InfoboxResolver.applies_to("wikipedia-president"));
        assert!(!InfoboxResolver.applies_to("wikibase-person"));
    }
}
