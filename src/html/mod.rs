//! HTML fragments
//!
//! [`XmlString`] wraps a fragment of rendered wiki HTML. Script and style
//! subtrees are pruned on construction so they never leak into extracted text.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

static SCRIPT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script\b.*?</script\s*>").expect("valid script regex"));

static STYLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<style\b.*?</style\s*>").expect("valid style regex"));

/// An HTML fragment
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct XmlString {
    html: String,
}

impl XmlString {
    /// Wraps an HTML fragment, pruning `<script>` and `<style>` subtrees
    pub fn new(html: impl AsRef<str>) -> Self {
        let without_scripts = SCRIPT_RE.replace_all(html.as_ref(), "");
        let pruned = STYLE_RE.replace_all(&without_scripts, "");
        Self {
            html: pruned.into_owned(),
        }
    }

    /// The raw (pruned) HTML
    pub fn as_str(&self) -> &str {
        &self.html
    }

    pub fn is_empty(&self) -> bool {
        self.html.trim().is_empty()
    }

    /// Text content with whitespace runs collapsed
    ///
    /// ```
    /// use wikipediabase::html::XmlString;
    ///
    /// let xml = XmlString::new("<p>Hello <b>big</b>\n world<script>x()</script></p>");
    /// assert_eq!(xml.text(), "Hello big world");
    /// ```
    pub fn text(&self) -> String {
        let (fragment, _) = self.parse();
        let raw: String = fragment.root_element().text().collect();
        collapse_whitespace(&raw)
    }

    /// Attribute of the outermost element
    pub fn get(&self, attr: &str) -> Option<String> {
        let (fragment, depth) = self.parse();
        let first = first_element(&fragment, depth)?;
        first.value().attr(attr).map(str::to_string)
    }

    /// Name of the outermost element
    pub fn tag(&self) -> Option<String> {
        let (fragment, depth) = self.parse();
        first_element(&fragment, depth).map(|el| el.value().name().to_string())
    }

    /// Every element matching a CSS selector, in document order
    ///
    /// Invalid selectors match nothing.
    pub fn select(&self, css: &str) -> Vec<XmlString> {
        let Ok(selector) = Selector::parse(css) else {
            tracing::warn!("Invalid selector: {}", css);
            return Vec::new();
        };
        let (fragment, _) = self.parse();
        fragment
            .select(&selector)
            .map(|el| XmlString { html: el.html() })
            .collect()
    }

    /// Like [`XmlString::select`], skipping matches nested inside any `outside` element
    ///
    /// ```
    /// use wikipediabase::html::XmlString;
    ///
    /// let xml = XmlString::new("<p>lead</p><table><tr><td><p>boxed</p></td></tr></table>");
    /// let texts: Vec<String> = xml.select_outside("p", "table").iter().map(|p| p.text()).collect();
    /// assert_eq!(texts, vec!["lead"]);
    /// ```
    pub fn select_outside(&self, css: &str, outside: &str) -> Vec<XmlString> {
        let Ok(selector) = Selector::parse(css) else {
            tracing::warn!("Invalid selector: {}", css);
            return Vec::new();
        };
        let (fragment, _) = self.parse();
        fragment
            .select(&selector)
            .filter(|el| {
                !el.ancestors()
                    .filter_map(ElementRef::wrap)
                    .any(|a| a.value().name() == outside)
            })
            .map(|el| XmlString { html: el.html() })
            .collect()
    }

    /// Rows of the outermost table, without descending into nested tables
    ///
    /// Rows under `<thead>`, `<tbody>` and `<tfoot>` are included in order.
    pub fn rows(&self) -> Vec<XmlString> {
        let (fragment, depth) = self.parse();
        let Some(table) = first_element(&fragment, depth) else {
            return Vec::new();
        };

        let mut rows = Vec::new();
        for child in table.children().filter_map(ElementRef::wrap) {
            match child.value().name() {
                "tr" => rows.push(XmlString { html: child.html() }),
                "thead" | "tbody" | "tfoot" => rows.extend(
                    child
                        .children()
                        .filter_map(ElementRef::wrap)
                        .filter(|el| el.value().name() == "tr")
                        .map(|el| XmlString { html: el.html() }),
                ),
                _ => {}
            }
        }
        rows
    }

    /// Escapes the named tags so they survive [`XmlString::text`] as literal markup
    ///
    /// ```
    /// use wikipediabase::html::XmlString;
    ///
    /// let xml = XmlString::new("<td>Chelsea<br/>Hillary</td>");
    /// assert_eq!(xml.ignoring(&["br"]).text(), "Chelsea<br>Hillary");
    /// ```
    pub fn ignoring(&self, tags: &[&str]) -> XmlString {
        if tags.is_empty() {
            return self.clone();
        }
        let names = tags
            .iter()
            .map(|t| regex::escape(t))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = format!(r"(?i)<(/?)({})\b[^>]*>", names);
        match Regex::new(&pattern) {
            Ok(re) => XmlString {
                html: re.replace_all(&self.html, "&lt;$1$2&gt;").into_owned(),
            },
            Err(e) => {
                tracing::warn!("Could not build ignore pattern for {:?}: {}", tags, e);
                self.clone()
            }
        }
    }
}

impl XmlString {
    /// Parses the fragment, wrapping bare table parts so the HTML parser keeps them
    ///
    /// Returns the document and how many wrapper elements sit above the
    /// fragment's own outermost element.
    fn parse(&self) -> (Html, usize) {
        let head = self.html.trim_start().get(..3).unwrap_or("").to_ascii_lowercase();
        match head.as_str() {
            "<tr" => (
                Html::parse_fragment(&format!("<table><tbody>{}</tbody></table>", self.html)),
                2,
            ),
            "<td" | "<th" => (
                Html::parse_fragment(&format!(
                    "<table><tbody><tr>{}</tr></tbody></table>",
                    self.html
                )),
                3,
            ),
            _ => (Html::parse_fragment(&self.html), 0),
        }
    }
}

impl From<&str> for XmlString {
    fn from(html: &str) -> Self {
        Self::new(html)
    }
}

/// First element inside a parsed fragment, below `depth` wrapper elements
fn first_element(fragment: &Html, depth: usize) -> Option<ElementRef<'_>> {
    let mut current = fragment.root_element();
    for _ in 0..=depth {
        current = current.children().filter_map(ElementRef::wrap).next()?;
    }
    Some(current)
}

/// Collapses whitespace runs into single spaces and trims
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prunes_style() {
        let xml = XmlString::new("<div><style>.a{color:red}</style>visible</div>");
        assert_eq!(xml.text(), "visible");
        assert!(!xml.as_str().contains("color"));
    }

    #[test]
    fn test_get_attribute_of_root() {
        let xml = XmlString::new(r#"<span id="coordinates" class="geo">44°N</span>"#);
        assert_eq!(xml.get("id"), Some("coordinates".to_string()));
        assert_eq!(xml.get("missing"), None);
        assert_eq!(xml.tag(), Some("span".to_string()));
    }

    #[test]
    fn test_select_yields_fragments() {
        let xml = XmlString::new("<div><p>one</p><p>two</p></div>");
        let texts: Vec<String> = xml.select("p").iter().map(|p| p.text()).collect();
        assert_eq!(texts, vec!["one", "two"]);
    }

    #[test]
    fn test_invalid_selector_matches_nothing() {
        let xml = XmlString::new("<div><p>one</p></div>");
        assert!(xml.select("p[[").is_empty());
    }

    #[test]
    fn test_row_fragments_keep_cells() {
        let xml = XmlString::new("<table><tr><th>Born</th><td>1946</td></tr></table>");
        let rows = xml.rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].tag(), Some("tr".to_string()));
        assert_eq!(rows[0].select("th")[0].text(), "Born");
        assert_eq!(rows[0].select("td")[0].tag(), Some("td".to_string()));
    }

    #[test]
    fn test_rows_skip_nested_tables() {
        let xml = XmlString::new(
            "<table><tr><th>A</th><td><table><tr><td>inner</td></tr></table></td></tr><tr><td>B</td></tr></table>",
        );
        assert_eq!(xml.rows().len(), 2);
    }

    #[test]
    fn test_ignoring_keeps_list_structure() {
        let xml = XmlString::new("<td><ul><li>Chelsea</li><li>Hillary</li></ul></td>");
        assert_eq!(
            xml.ignoring(&["ul", "li"]).text(),
            "<ul><li>Chelsea</li><li>Hillary</li></ul>"
        );
    }
}
