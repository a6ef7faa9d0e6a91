//! Article titles and raw wiki markup
//!
//! A [`Symbol`] is the canonical title of an article, used as the lookup key
//! everywhere in the system. [`MarkupString`] wraps raw wiki source and knows
//! how to spot redirects and flatten links.

mod markup;

pub use markup::{clean, unlink, MarkupString};

use std::fmt;

/// Namespace prefixes recognised on symbols
const PREFIXES: &[&str] = &[
    "Template:",
    "Category:",
    "File:",
    "Image:",
    "Wikipedia:",
    "Help:",
    "Portal:",
];

/// Leading articles dropped from the reduced form
const ARTICLES: &[&str] = &["a", "an", "the"];

/// A canonical article title
///
/// Symbols are immutable. Two symbols with the same [`Symbol::reduced`] form
/// are treated as the same target when following redirects.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol {
    prefix: Option<&'static str>,
    title: String,
}

impl Symbol {
    /// Creates a symbol from raw title text
    ///
    /// Underscores become spaces, runs of whitespace collapse and a known
    /// namespace prefix is split off.
    ///
    /// # Examples
    ///
    /// ```
    /// use wikipediabase::Symbol;
    ///
    /// let symbol = Symbol::new("Template:Infobox_officeholder");
    /// assert_eq!(symbol.prefix(), Some("Template:"));
    /// assert_eq!(symbol.title(), "Infobox officeholder");
    /// assert_eq!(symbol.url_friendly(), "Template:Infobox_officeholder");
    /// ```
    pub fn new(raw: &str) -> Self {
        let literal = collapse_whitespace(&raw.replace('_', " "));

        for prefix in PREFIXES {
            if literal.len() > prefix.len()
                && literal.is_char_boundary(prefix.len())
                && literal[..prefix.len()].eq_ignore_ascii_case(prefix)
            {
                return Self {
                    prefix: Some(prefix),
                    title: literal[prefix.len()..].trim().to_string(),
                };
            }
        }

        Self {
            prefix: None,
            title: literal,
        }
    }

    /// Creates a `Template:` symbol, adding the prefix if missing
    pub fn template(name: &str) -> Self {
        let symbol = Self::new(name);
        if symbol.prefix.is_some() {
            return symbol;
        }
        Self {
            prefix: Some("Template:"),
            title: symbol.title,
        }
    }

    /// Namespace prefix, if any
    pub fn prefix(&self) -> Option<&'static str> {
        self.prefix
    }

    /// Title without the namespace prefix
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Full title with spaces (`Template:Infobox person`)
    pub fn literal(&self) -> String {
        format!("{}{}", self.prefix.unwrap_or(""), self.title)
    }

    /// Full title with spaces replaced by underscores
    pub fn url_friendly(&self) -> String {
        self.literal().replace(' ', "_")
    }

    /// Lowercased title with punctuation and a leading article removed
    ///
    /// ```
    /// use wikipediabase::Symbol;
    ///
    /// assert_eq!(Symbol::new("The Beatles!").reduced(), "beatles");
    /// ```
    pub fn reduced(&self) -> String {
        let stripped: String = self
            .literal()
            .to_lowercase()
            .chars()
            .map(|c| if c.is_alphanumeric() || c.is_whitespace() { c } else { ' ' })
            .collect();

        let mut words = stripped.split_whitespace().peekable();
        if let Some(first) = words.peek() {
            if ARTICLES.contains(first) {
                words.next();
            }
        }
        words.collect::<Vec<_>>().join(" ")
    }

    /// True when both symbols reduce to the same form
    pub fn same_target(&self, other: &Symbol) -> bool {
        self.reduced() == other.reduced()
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.prefix.unwrap_or(""), self.title)
    }
}

impl From<&str> for Symbol {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_symbol() {
        let symbol = Symbol::new("  Bill   Clinton ");
        assert_eq!(symbol.prefix(), None);
        assert_eq!(symbol.title(), "Bill Clinton");
        assert_eq!(symbol.url_friendly(), "Bill_Clinton");
        assert_eq!(symbol.literal(), "Bill Clinton");
    }

    #[test]
    fn test_prefix_is_case_insensitive() {
        let symbol = Symbol::new("template:Infobox mountain");
        assert_eq!(symbol.prefix(), Some("Template:"));
        assert_eq!(symbol.to_string(), "Template:Infobox mountain");
    }

    #[test]
    fn test_template_constructor_adds_prefix() {
        assert_eq!(
            Symbol::template("Infobox person").to_string(),
            "Template:Infobox person"
        );
        assert_eq!(
            Symbol::template("Template:Infobox person").to_string(),
            "Template:Infobox person"
        );
    }

    #[test]
    fn test_reduced_form() {
        assert_eq!(Symbol::new("A Tale of Two Cities").reduced(), "tale of two cities");
        assert_eq!(Symbol::new("Anarchy").reduced(), "anarchy");
        assert_eq!(Symbol::new("Mount_Everest").reduced(), "mount everest");
        assert!(Symbol::new("The Black Sea").same_target(&Symbol::new("black sea")));
    }
}
