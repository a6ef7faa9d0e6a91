//! Articles
//!
//! An [`Article`] bundles everything fetched for one symbol: raw markup,
//! rendered HTML, the canonical URL and the parsed infoboxes. It is built
//! once by the knowledgebase and is immutable afterwards.

use crate::html::XmlString;
use crate::infobox::Infobox;
use crate::symbol::{MarkupString, Symbol};

/// A heading of the article with the paragraph text beneath it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub heading: String,
    /// 2 for `<h2>`, 3 for `<h3>`
    pub level: u8,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct Article {
    symbol: Symbol,
    markup: MarkupString,
    html: XmlString,
    url: String,
    infoboxes: Vec<Infobox>,
    paragraphs: Vec<String>,
}

impl Article {
    pub fn new(
        symbol: Symbol,
        markup: MarkupString,
        html: XmlString,
        url: String,
        infoboxes: Vec<Infobox>,
    ) -> Self {
        let paragraphs = html
            .select_outside("p", "table")
            .iter()
            .map(XmlString::text)
            .filter(|text| !text.is_empty())
            .collect();

        Self {
            symbol,
            markup,
            html,
            url,
            infoboxes,
            paragraphs,
        }
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub fn markup(&self) -> &MarkupString {
        &self.markup
    }

    pub fn html(&self) -> &XmlString {
        &self.html
    }

    /// Canonical `/wiki/` URL
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn infoboxes(&self) -> &[Infobox] {
        &self.infoboxes
    }

    /// Text of every non-empty paragraph outside tables, in order
    pub fn paragraphs(&self) -> &[String] {
        &self.paragraphs
    }

    pub fn first_paragraph(&self) -> Option<&str> {
        self.paragraphs.first().map(String::as_str)
    }

    /// All paragraph text joined by blank lines
    pub fn text(&self) -> String {
        self.paragraphs.join("\n\n")
    }

    /// Total paragraph length in characters
    pub fn length(&self) -> usize {
        self.paragraphs.iter().map(|p| p.chars().count()).sum()
    }

    pub fn categories(&self) -> Vec<String> {
        self.markup.categories()
    }

    /// `<h2>`/`<h3>` sections in document order
    pub fn sections(&self) -> Vec<Section> {
        let mut sections: Vec<Section> = Vec::new();

        for node in self.html.select_outside("h2, h3, p", "table") {
            match node.tag().as_deref() {
                Some(tag @ ("h2" | "h3")) => sections.push(Section {
                    heading: heading_text(&node),
                    level: if tag == "h2" { 2 } else { 3 },
                    text: String::new(),
                }),
                Some("p") => {
                    let Some(current) = sections.last_mut() else {
                        continue;
                    };
                    let text = node.text();
                    if text.is_empty() {
                        continue;
                    }
                    if !current.text.is_empty() {
                        current.text.push_str("\n\n");
                    }
                    current.text.push_str(&text);
                }
                _ => {}
            }
        }

        sections.retain(|s| !s.heading.is_empty());
        sections
    }
}

/// Heading text without the trailing `[edit]` link
fn heading_text(node: &XmlString) -> String {
    let text = node.text();
    text.strip_suffix("[edit]")
        .unwrap_or(&text)
        .trim()
        .to_string()
}
