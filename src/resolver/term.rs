use super::{Attribute, Context, Resolver, TERM_CLASS};
use crate::lisp::{lispify, LispType, Value};
use regex::Regex;
use std::sync::LazyLock;

/// Computed features any article has
///
/// | Attribute | Answer |
/// |-----------|--------|
/// | `coordinates` | `(:coordinates LAT LON)` from the coordinates span |
/// | `image-data` | `((0 "File.jpg" "Caption"))` from the first infobox image |
/// | `number` | `(:calculated t)` when the opening paragraph reads plural |
/// | `proper` | `(:calculated t)` when mid-sentence mentions are capitalised |
/// | `short-article` | `(:html …)`, the opening paragraphs |
/// | `url` | `(:url …)` |
pub struct TermResolver;

static DMS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(\d+(?:\.\d+)?)°\s*(?:(\d+(?:\.\d+)?)[′']\s*)?(?:(\d+(?:\.\d+)?)[″\x22]\s*)?([NSEW])",
    )
    .expect("valid coordinate regex")
});

static FILE_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:File|Image)\s*:\s*([^|\]\n]+)").expect("valid file link regex")
});

const SINGULAR_VERBS: &[&str] = &[" is ", " was ", " has "];
const PLURAL_VERBS: &[&str] = &[" are ", " were ", " have "];

/// Mentions of the title inspected when judging capitalisation
const PROPER_SAMPLE: usize = 20;

/// Reads `(latitude, longitude)` from degree/minute/second text
///
/// South and west are negative.
///
/// ```
/// use wikipediabase::resolver::parse_coordinates;
///
/// assert_eq!(parse_coordinates("44°N 35°E"), Some((44.0, 35.0)));
/// assert_eq!(parse_coordinates("33°51′S 151°12′E"), Some((-33.85, 151.2)));
/// ```
pub fn parse_coordinates(text: &str) -> Option<(f64, f64)> {
    let mut latitude = None;
    let mut longitude = None;

    for caps in DMS_RE.captures_iter(text) {
        let part = |i: usize| {
            caps.get(i)
                .and_then(|m| m.as_str().parse::<f64>().ok())
                .unwrap_or(0.0)
        };
        let value = part(1) + part(2) / 60.0 + part(3) / 3600.0;
        let value = (value * 1e6).round() / 1e6;

        match &caps[4] {
            "N" if latitude.is_none() => latitude = Some(value),
            "S" if latitude.is_none() => latitude = Some(-value),
            "E" if longitude.is_none() => longitude = Some(value),
            "W" if longitude.is_none() => longitude = Some(-value),
            _ => {}
        }
        if latitude.is_some() && longitude.is_some() {
            break;
        }
    }

    Some((latitude?, longitude?))
}

/// The opening paragraphs, at least the configured number of characters
pub(crate) fn short_article(ctx: &Context<'_>) -> Option<LispType> {
    let mut text = String::new();
    for paragraph in ctx.article.paragraphs() {
        if text.chars().count() >= ctx.config.short_article_chars {
            break;
        }
        if !text.is_empty() {
            text.push_str("\n\n");
        }
        text.push_str(paragraph);
    }

    if text.is_empty() {
        return None;
    }
    lispify(Value::Str(text), Some("html"), None).ok()
}

fn coordinates(ctx: &Context<'_>) -> Option<LispType> {
    let text = ctx
        .article
        .html()
        .select("#coordinates")
        .into_iter()
        .chain(
            ctx.article
                .infoboxes()
                .iter()
                .flat_map(|ib| ib.html().select(".geo-dms")),
        )
        .find_map(|node| parse_coordinates(&node.text()));

    let (latitude, longitude) = text?;
    Some(LispType::list(
        Some("coordinates"),
        vec![LispType::float(latitude), LispType::float(longitude)],
    ))
}

/// File name of an infobox image value, underscored
fn image_file(raw: &str) -> Option<String> {
    let name = match FILE_LINK_RE.captures(raw) {
        Some(caps) => caps[1].to_string(),
        None => raw
            .split(['|', '<', '{'])
            .next()
            .unwrap_or_default()
            .to_string(),
    };
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some(name.replace(' ', "_"))
}

fn image_data(ctx: &Context<'_>) -> Option<LispType> {
    let infobox = ctx
        .article
        .infoboxes()
        .iter()
        .find(|ib| ib.get_raw("image").and_then(image_file).is_some())?;

    let file = infobox.get_raw("image").and_then(image_file)?;
    let mut entry = vec![LispType::int(0), LispType::string(None, file)];
    if let Some(caption) = infobox.get("caption") {
        entry.push(LispType::string(None, caption));
    }
    Some(LispType::list(None, vec![LispType::list(None, entry)]))
}

fn plural(ctx: &Context<'_>) -> Option<LispType> {
    let text = ctx.article.first_paragraph()?;
    let count = |verbs: &[&str]| verbs.iter().map(|v| text.matches(v).count()).sum::<usize>();
    let plural = count(PLURAL_VERBS) > count(SINGULAR_VERBS);
    Some(LispType::bool(Some("calculated"), plural))
}

fn proper(ctx: &Context<'_>) -> crate::Result<Option<LispType>> {
    let title = ctx.article.symbol().title();
    let pattern = format!(r"(?i)\b{}\b", regex::escape(title));
    let re = Regex::new(&pattern).map_err(|e| crate::WikibaseError::Internal(e.to_string()))?;
    let text = ctx.article.text();

    let mut capitalised = 0usize;
    let mut lowercase = 0usize;
    for m in re.find_iter(&text).take(PROPER_SAMPLE) {
        let before = text[..m.start()].trim_end();
        if before.is_empty() || before.ends_with(['.', '!', '?', '"']) {
            continue;
        }
        if m.as_str().chars().next().is_some_and(char::is_uppercase) {
            capitalised += 1;
        } else {
            lowercase += 1;
        }
    }

    Ok(Some(LispType::bool(Some("calculated"), capitalised > lowercase)))
}

impl Resolver for TermResolver {
    fn name(&self) -> &'static str {
        "term"
    }

    fn priority(&self) -> i32 {
        8
    }

    fn applies_to(&self, cls: &str) -> bool {
        cls == TERM_CLASS
    }

    fn resolve(&self, ctx: &Context<'_>, _cls: &str, attr: &Attribute) -> crate::Result<Option<LispType>> {
        let answer = match attr.key() {
            "coordinates" => coordinates(ctx),
            "image-data" => image_data(ctx),
            "number" => plural(ctx),
            "proper" => return proper(ctx),
            "short-article" => short_article(ctx),
            "url" => Some(LispType::string(Some("url"), ctx.article.url())),
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

    const BLACK_SEA_MARKUP: &str = "{{Infobox body of water\n| name = Black Sea\n| image = Black Sea map.png\n| caption = Map of the Black Sea\n| coords = {{coord|44|N|35|E}}\n}}\nThe '''Black Sea''' is a marginal sea.";
    const BLACK_SEA_HTML: &str = r#"<span id="coordinates">Coordinates: <span class="geo-dms"><span class="latitude">44°N</span> <span class="longitude">35°E</span></span></span>
        <table class="infobox"><tr><th>Coordinates</th><td>44°N 35°E</td></tr></table>
        <p>The Black Sea is a marginal sea of the Atlantic Ocean. Rivers such as the Danube flow into the Black Sea.</p>
        <p>The Black Sea has an area of 436,400 km2.</p>"#;

    fn resolve(attr: &str) -> Option<String> {
        let article = article("Black Sea", BLACK_SEA_MARKUP, BLACK_SEA_HTML);
        let classes = vec![TERM_CLASS.to_string()];
        let config = ResolverConfig {
            short_article_chars: 40,
        };
        let ctx = Context {
            article: &article,
            classes: &classes,
            config: &config,
            tree: InfoboxTree::bundled(),
        };
        TermResolver
            .resolve(&ctx, TERM_CLASS, &Attribute::new(attr, None))
            .unwrap()
            .map(|answer| answer.to_string())
    }

    #[test]
    fn test_coordinates() {
        assert_eq!(resolve("COORDINATES").as_deref(), Some("(:coordinates 44 35)"));
    }

    #[test]
    fn test_image_data() {
        assert_eq!(
            resolve("IMAGE-DATA").as_deref(),
            Some(r#"((0 "Black_Sea_map.png" "Map of the Black Sea"))"#)
        );
    }

    #[test]
    fn test_url_and_proper() {
        assert_eq!(
            resolve("URL").as_deref(),
            Some(r#"(:url "https://en.wikipedia.org/wiki/Black_Sea")"#)
        );
        assert_eq!(resolve("PROPER").as_deref(), Some("(:calculated t)"));
        assert_eq!(resolve("NUMBER").as_deref(), Some("(:calculated nil)"));
    }

    #[test]
    fn test_short_article_stops_once_long_enough() {
        let answer = resolve("SHORT-ARTICLE").unwrap();
        assert!(answer.starts_with("(:html \"The Black Sea is a marginal sea"));
        assert!(!answer.contains("436,400"));
    }

    #[test]
    fn test_unknown_attribute_declines() {
        assert_eq!(resolve("WINGSPAN"), None);
    }

    #[test]
    fn test_image_file_forms() {
        assert_eq!(image_file("[[File:Bill Clinton.jpg|220px]]").as_deref(), Some("Bill_Clinton.jpg"));
        assert_eq!(image_file("Bill Clinton.jpg"), Some("Bill_Clinton.jpg".to_string()));
        assert_eq!(image_file("  "), None);
    }
}
