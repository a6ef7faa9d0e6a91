use super::normalize_key;
use crate::html::XmlString;
use crate::symbol::Symbol;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Delimiter around a parameter name in sentinel values
pub const SENTINEL_MARK: &str = "!!!!!";

static SENTINEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!!!!!([^!<>]+?)!!!!!").expect("valid sentinel regex"));

static PARAM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\{\s*([^{}|]+?)\s*[|}]").expect("valid template parameter regex"));

/// Parameter names a template's source refers to, deduplicated in order
///
/// ```
/// use wikipediabase::infobox::template_params;
///
/// let source = "{{Infobox | label1 = Born | data1 = {{{birth_date|}}} {{{birth_place|}}} | data2 = {{{spouse}}} }}";
/// assert_eq!(template_params(source), vec!["birth_date", "birth_place", "spouse"]);
/// ```
pub fn template_params(template_markup: &str) -> Vec<String> {
    let mut params: Vec<String> = Vec::new();
    for caps in PARAM_RE.captures_iter(template_markup) {
        let name = caps[1].trim();
        if !name.is_empty() && !params.iter().any(|p| p == name) {
            params.push(name.to_string());
        }
    }
    params
}

/// Markup key ↔ rendered label mapping for one infobox template
///
/// Built by rendering the template with every parameter set to a sentinel
/// (`!!!!!key!!!!!`) and reading back which row label each sentinel landed
/// under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaInfobox {
    template: Symbol,
    canonical: Option<Symbol>,
    labels: BTreeMap<String, String>,
}

impl MetaInfobox {
    /// A mapping that knows no labels; lookups fall back to markup keys
    pub fn empty(template: Symbol) -> Self {
        Self {
            template,
            canonical: None,
            labels: BTreeMap::new(),
        }
    }

    /// Records the template this one redirects to
    pub fn with_canonical(mut self, canonical: Symbol) -> Self {
        if canonical != self.template {
            self.canonical = Some(canonical);
        }
        self
    }

    /// Markup invoking `template` with a sentinel for every parameter
    ///
    /// ```
    /// use wikipediabase::infobox::MetaInfobox;
    /// use wikipediabase::Symbol;
    ///
    /// let markup = MetaInfobox::sentinel_markup(
    ///     &Symbol::template("Infobox mountain"),
    ///     &["elevation_m".to_string()],
    /// );
    /// assert_eq!(markup, "{{Infobox mountain\n| elevation_m = !!!!!elevation_m!!!!!\n}}");
    /// ```
    pub fn sentinel_markup(template: &Symbol, params: &[String]) -> String {
        let mut markup = format!("{{{{{}", template.title());
        for param in params {
            markup.push_str(&format!(
                "\n| {} = {}{}{}",
                param, SENTINEL_MARK, param, SENTINEL_MARK
            ));
        }
        markup.push_str("\n}}");
        markup
    }

    /// Reads the label each sentinel was rendered under
    pub fn from_rendered(template: Symbol, rendered: &XmlString) -> Self {
        let table = rendered
            .select("table.infobox")
            .into_iter()
            .next()
            .or_else(|| rendered.select("table").into_iter().next());

        let mut labels = BTreeMap::new();
        let Some(table) = table else {
            tracing::debug!("No table rendered for {}", template);
            return Self::empty(template);
        };

        for row in table.rows() {
            let Some(label) = row.select("th").into_iter().next().map(|th| th.text()) else {
                continue;
            };
            let Some(value) = row.select("td").into_iter().next().map(|td| td.text()) else {
                continue;
            };
            if label.is_empty() || SENTINEL_RE.is_match(&label) {
                continue;
            }
            for caps in SENTINEL_RE.captures_iter(&value) {
                labels
                    .entry(normalize_key(&caps[1]))
                    .or_insert_with(|| label.clone());
            }
        }

        Self {
            template,
            canonical: None,
            labels,
        }
    }

    pub fn template(&self) -> &Symbol {
        &self.template
    }

    /// The redirect target of the template, or the template itself
    pub fn canonical(&self) -> &Symbol {
        self.canonical.as_ref().unwrap_or(&self.template)
    }

    /// Rendered label for a markup key
    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels.get(&normalize_key(key)).map(String::as_str)
    }

    /// Every `(key, label)` pair, ordered by key
    pub fn labels(&self) -> impl Iterator<Item = (&str, &str)> {
        self.labels.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
