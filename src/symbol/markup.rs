use crate::symbol::Symbol;
use regex::Regex;
use std::sync::LazyLock;

static REDIRECT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*#REDIRECT\s*:?\s*\[\[([^\]|#]+)").expect("valid redirect regex")
});

static LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[\[(?:[^\[\]|]*\|)?([^\[\]|]*)\]\]").expect("valid link regex")
});

static REF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<ref[^>/]*/>|<ref[^>]*>.*?</ref>").expect("valid ref regex")
});

static COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("valid comment regex"));

static CATEGORY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\[\[\s*Category\s*:\s*([^\]|]+)").expect("valid category regex")
});

/// Raw wiki markup
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MarkupString(String);

impl MarkupString {
    pub fn new(markup: impl Into<String>) -> Self {
        Self(markup.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Target of a `#REDIRECT [[Target]]` page, if this is one
    ///
    /// ```
    /// use wikipediabase::symbol::MarkupString;
    ///
    /// let markup = MarkupString::new("#redirect [[Template:Infobox officeholder]]");
    /// assert_eq!(
    ///     markup.redirect_target().unwrap().to_string(),
    ///     "Template:Infobox officeholder"
    /// );
    /// ```
    pub fn redirect_target(&self) -> Option<Symbol> {
        REDIRECT_RE
            .captures(&self.0)
            .map(|caps| Symbol::new(caps[1].trim()))
    }

    /// Replaces `[[target|label]]` with `label` and `[[target]]` with `target`
    pub fn unlink(&self) -> String {
        unlink(&self.0)
    }

    /// Drops comments and `<ref>` footnotes, then unlinks
    pub fn clean(&self) -> String {
        clean(&self.0)
    }

    /// Category names from `[[Category:…]]` links, in source order
    pub fn categories(&self) -> Vec<String> {
        CATEGORY_RE
            .captures_iter(&self.0)
            .map(|caps| caps[1].trim().to_string())
            .collect()
    }
}

impl From<String> for MarkupString {
    fn from(markup: String) -> Self {
        Self(markup)
    }
}

/// Link flattening on a plain string
pub fn unlink(text: &str) -> String {
    // Nested links (image captions) need more than one pass.
    let mut current = text.to_string();
    loop {
        let next = LINK_RE.replace_all(&current, "$1").into_owned();
        if next == current {
            return next;
        }
        current = next;
    }
}

/// Comment/footnote stripping plus link flattening on a plain string
pub fn clean(text: &str) -> String {
    let without_comments = COMMENT_RE.replace_all(text, "");
    let without_refs = REF_RE.replace_all(&without_comments, "");
    unlink(&without_refs).trim().to_string()
}
