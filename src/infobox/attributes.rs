use super::normalize_key;
use crate::html::XmlString;
use regex::Regex;
use std::sync::LazyLock;

/// Tags whose structure survives text extraction of rendered values
const KEPT_TAGS: &[&str] = &["br", "ul", "li"];

/// A normalised markup key: lowercase words joined by `-`, digits allowed
/// after the first letter for numbered fields like `term-start2`
static KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9\-]*$").expect("valid attribute key regex"));

/// `(normalised key, raw value)` pairs of an infobox block, in source order
///
/// Values run up to the next `|` outside nested templates and links, or to
/// the closing braces.
///
/// ```
/// use wikipediabase::infobox::markup_attributes;
///
/// let attrs = markup_attributes("{{Infobox person\n| birth_date = {{birth date|1946|8|19}}\n| spouse = [[Hillary Clinton|Hillary]]\n}}");
/// assert_eq!(attrs[0], ("birth-date".to_string(), "{{birth date|1946|8|19}}".to_string()));
/// assert_eq!(attrs[1], ("spouse".to_string(), "[[Hillary Clinton|Hillary]]".to_string()));
/// ```
pub fn markup_attributes(block: &str) -> Vec<(String, String)> {
    let inner = block
        .trim()
        .strip_prefix("{{")
        .and_then(|b| b.strip_suffix("}}"))
        .unwrap_or(block);

    split_top_level(inner)
        .into_iter()
        .skip(1)
        .filter_map(|field| {
            let (key, value) = field.split_once('=')?;
            let key = normalize_key(key);
            if !KEY_RE.is_match(&key) {
                return None;
            }
            Some((key, value.trim().to_string()))
        })
        .collect()
}

/// `(label, value)` pairs of the rows of a rendered infobox table
///
/// Only rows with both a `<th>` label and a `<td>` value count. Line breaks
/// and list items are kept in the value as literal tags.
pub fn html_attributes(table: &XmlString) -> Vec<(String, String)> {
    table
        .rows()
        .iter()
        .filter_map(|row| {
            let label = row.select("th").into_iter().next()?.text();
            let value = row.select("td").into_iter().next()?;
            if label.is_empty() {
                return None;
            }
            Some((label, value.ignoring(KEPT_TAGS).text()))
        })
        .collect()
}

/// Splits on `|` outside `{{…}}` and `[[…]]`
fn split_top_level(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut parts = Vec::new();
    let mut braces = 0usize;
    let mut brackets = 0usize;
    let mut start = 0usize;
    let mut i = 0usize;

    while i < bytes.len() {
        let pair = bytes.get(i + 1).map(|next| (bytes[i], *next));
        match pair {
            Some((b'{', b'{')) => {
                braces += 1;
                i += 2;
                continue;
            }
            Some((b'}', b'}')) if braces > 0 => {
                braces -= 1;
                i += 2;
                continue;
            }
            Some((b'[', b'[')) => {
                brackets += 1;
                i += 2;
                continue;
            }
            Some((b']', b']')) if brackets > 0 => {
                brackets -= 1;
                i += 2;
                continue;
            }
            _ => {}
        }

        if bytes[i] == b'|' && braces == 0 && brackets == 0 {
            parts.push(&text[start..i]);
            start = i + 1;
        }
        i += 1;
    }
    parts.push(&text[start..]);
    parts
}
