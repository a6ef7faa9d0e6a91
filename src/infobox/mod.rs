//! Infobox model
//!
//! An article carries zero or more `{{Infobox …}}` blocks in its markup and
//! the matching rendered tables in its HTML. This module pairs the two up,
//! splits tables shared by sub-template families, and answers attribute
//! lookups against either side, using a [`MetaInfobox`] to translate markup
//! keys into rendered labels.

mod attributes;
mod extract;
mod group;
mod meta;
mod split;
mod tree;

pub use attributes::{html_attributes, markup_attributes};
pub use extract::{extract_blocks, InfoboxBlock};
pub use group::{group_blocks, template_root};
pub use meta::{template_params, MetaInfobox, SENTINEL_MARK};
pub use split::{split_table, HEADER_STYLE_RE};
pub use tree::InfoboxTree;

use crate::html::XmlString;
use crate::symbol::{clean, MarkupString, Symbol};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Prefix on every class tag derived from an infobox template
pub const INFOBOX_CLASS_PREFIX: &str = "wikipedia-";

/// Normalises an attribute key: lowercase, hyphens for underscores and spaces
///
/// ```
/// use wikipediabase::infobox::normalize_key;
///
/// assert_eq!(normalize_key(" Birth_Date "), "birth-date");
/// assert_eq!(normalize_key("ELEVATION_M"), "elevation-m");
/// ```
pub fn normalize_key(key: &str) -> String {
    key.trim()
        .to_lowercase()
        .split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Normalised key with trailing digits dropped (`term-start3` → `term-start`)
pub fn fuzzy_key(key: &str) -> String {
    normalize_key(key)
        .trim_end_matches(|c: char| c.is_ascii_digit())
        .trim_end_matches('-')
        .to_string()
}

/// Class tag for an infobox template
///
/// ```
/// use wikipediabase::infobox::class_of;
/// use wikipediabase::Symbol;
///
/// let template = Symbol::template("Infobox martial artist");
/// assert_eq!(class_of(&template), "wikipedia-martial-artist");
/// ```
pub fn class_of(template: &Symbol) -> String {
    let title = template.title();
    let name = title
        .get(..8)
        .filter(|head| head.eq_ignore_ascii_case("infobox "))
        .map_or(title, |_| &title[8..]);

    format!(
        "{}{}",
        INFOBOX_CLASS_PREFIX,
        name.trim().to_lowercase().split_whitespace().collect::<Vec<_>>().join("-")
    )
}

/// One infobox of an article
#[derive(Debug, Clone)]
pub struct Infobox {
    symbol: Symbol,
    template: Symbol,
    cls: String,
    markup: String,
    html: XmlString,
    markup_attrs: Vec<(String, String)>,
    rendered_attrs: Vec<(String, String)>,
    meta: Option<Arc<MetaInfobox>>,
}

impl Infobox {
    pub fn new(
        symbol: Symbol,
        block: &InfoboxBlock,
        html: XmlString,
        meta: Option<Arc<MetaInfobox>>,
    ) -> Self {
        let rendered_attrs = html_attributes(&html);
        Self {
            symbol,
            cls: class_of(&block.template),
            template: block.template.clone(),
            markup_attrs: markup_attributes(&block.markup),
            markup: block.markup.clone(),
            html,
            rendered_attrs,
            meta,
        }
    }

    /// The article this infobox belongs to
    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub fn template(&self) -> &Symbol {
        &self.template
    }

    pub fn cls(&self) -> &str {
        &self.cls
    }

    /// The exact `{{Infobox …}}` block
    pub fn markup(&self) -> &str {
        &self.markup
    }

    /// The rendered table (empty when the article HTML had none to spare)
    pub fn html(&self) -> &XmlString {
        &self.html
    }

    pub fn meta(&self) -> Option<&MetaInfobox> {
        self.meta.as_deref()
    }

    /// Normalised markup key → rendered label
    ///
    /// Keys the meta infobox cannot place fall back to a label found directly
    /// in the rendered table, then to the key itself.
    pub fn attributes(&self) -> BTreeMap<String, String> {
        let rendered: HashMap<String, &str> = self
            .rendered_attrs
            .iter()
            .map(|(label, _)| (normalize_key(label), label.as_str()))
            .collect();

        self.markup_attrs
            .iter()
            .map(|(key, _)| {
                let label = self
                    .meta
                    .as_ref()
                    .and_then(|m| m.label(key))
                    .or_else(|| rendered.get(key).copied())
                    .unwrap_or(key.as_str());
                (key.clone(), label.to_string())
            })
            .collect()
    }

    /// Looks up an attribute, preferring the rendered table
    ///
    /// Order: the meta label for the key in the rendered table, a rendered
    /// label equal to the key, the markup key, then the markup key with
    /// trailing digits ignored.
    pub fn get(&self, attr: &str) -> Option<String> {
        let key = normalize_key(attr);
        self.get_meta_rendered(&key)
            .or_else(|| self.get_rendered(&key))
            .or_else(|| self.get_markup(&key))
            .or_else(|| self.get_fuzzy(&key))
    }

    /// Looks up a raw markup key, falling back to [`Infobox::get`]
    pub fn get_code(&self, attr: &str) -> Option<String> {
        let key = normalize_key(attr);
        self.get_markup(&key).or_else(|| self.get(&key))
    }

    /// Markup value of a key exactly as written, links and footnotes intact
    pub fn get_raw(&self, attr: &str) -> Option<&str> {
        let key = normalize_key(attr);
        self.markup_attrs
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Value of the rendered row whose label normalises to `label`
    pub fn get_rendered(&self, label: &str) -> Option<String> {
        let wanted = normalize_key(label);
        self.rendered_attrs
            .iter()
            .find(|(l, _)| normalize_key(l) == wanted)
            .map(|(_, v)| v.clone())
            .filter(|v| !v.is_empty())
    }

    fn get_meta_rendered(&self, key: &str) -> Option<String> {
        let label = self.meta.as_ref()?.label(key)?;
        self.get_rendered(label)
    }

    fn get_markup(&self, key: &str) -> Option<String> {
        self.markup_attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| clean(v))
            .filter(|v| !v.is_empty())
    }

    fn get_fuzzy(&self, key: &str) -> Option<String> {
        let wanted = fuzzy_key(key);
        self.markup_attrs
            .iter()
            .find(|(k, _)| fuzzy_key(k) == wanted)
            .map(|(_, v)| clean(v))
            .filter(|v| !v.is_empty())
    }
}

/// Builds every infobox of an article
///
/// Blocks are grouped into sub-template families; each group takes the next
/// `table.infobox` of the HTML in order. Groups of several templates split
/// their table by header rows, or share the whole table when it cannot be
/// split.
pub fn build_infoboxes(
    symbol: &Symbol,
    markup: &MarkupString,
    html: &XmlString,
    metas: &HashMap<Symbol, Arc<MetaInfobox>>,
) -> Vec<Infobox> {
    let blocks = extract_blocks(markup.as_str());
    if blocks.is_empty() {
        return Vec::new();
    }

    let tables = html.select("table.infobox");
    let mut infoboxes = Vec::with_capacity(blocks.len());

    for (gi, group) in group_blocks(&blocks).into_iter().enumerate() {
        let table = tables.get(gi).cloned().unwrap_or_default();

        let parts = if group.len() > 1 {
            match split_table(&table, group.len()) {
                Ok(parts) => parts,
                Err(e) => {
                    tracing::debug!(
                        "Sharing whole table across {} templates of {}: {}",
                        group.len(),
                        symbol,
                        e
                    );
                    vec![table.clone(); group.len()]
                }
            }
        } else {
            vec![table]
        };

        for (index, part) in group.into_iter().zip(parts) {
            let block = &blocks[index];
            let meta = metas.get(&block.template).cloned();
            infoboxes.push(Infobox::new(symbol.clone(), block, part, meta));
        }
    }

    infoboxes
}
