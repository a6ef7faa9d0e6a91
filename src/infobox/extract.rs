use crate::symbol::Symbol;
use std::ops::Range;

/// A top-level `{{Infobox …}}` block found in article markup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoboxBlock {
    /// `Template:Infobox <name>`, sub-template suffix included
    pub template: Symbol,
    /// The exact block, braces included
    pub markup: String,
    /// Byte range of the block within the article markup
    pub span: Range<usize>,
}

/// Finds every top-level infobox block, in source order
///
/// Template nesting is tracked by brace depth; infoboxes nested inside other
/// templates are not captured, so the returned spans never overlap.
///
/// ```
/// use wikipediabase::infobox::extract_blocks;
///
/// let markup = "{{Infobox person | name = {{lang|en|Bill}} }} text {{cite}}";
/// let blocks = extract_blocks(markup);
/// assert_eq!(blocks.len(), 1);
/// assert_eq!(blocks[0].template.to_string(), "Template:Infobox person");
/// assert_eq!(blocks[0].markup, "{{Infobox person | name = {{lang|en|Bill}} }}");
/// ```
pub fn extract_blocks(markup: &str) -> Vec<InfoboxBlock> {
    let bytes = markup.as_bytes();
    let mut blocks = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    let mut i = 0usize;

    while i + 1 < bytes.len() {
        match (bytes[i], bytes[i + 1]) {
            (b'{', b'{') => {
                if depth == 0 {
                    start = i;
                }
                depth += 1;
                i += 2;
            }
            (b'}', b'}') if depth > 0 => {
                depth -= 1;
                i += 2;
                if depth == 0 {
                    let text = &markup[start..i];
                    if let Some(template) = infobox_template(text) {
                        blocks.push(InfoboxBlock {
                            template,
                            markup: text.to_string(),
                            span: start..i,
                        });
                    }
                }
            }
            _ => i += 1,
        }
    }

    if depth > 0 {
        tracing::debug!("Unbalanced template braces from offset {}", start);
    }
    blocks
}

/// Template of a `{{…}}` block when its opening token is `Infobox <name>`
fn infobox_template(block: &str) -> Option<Symbol> {
    let inner = block.strip_prefix("{{")?;
    let end = inner
        .find(|c: char| c == '|' || c == '}' || c == '\n')
        .unwrap_or(inner.len());
    let name = inner[..end].replace('_', " ");
    let name = name.trim();

    let head = name.get(..8)?;
    if !head.eq_ignore_ascii_case("infobox ") || name[8..].trim().is_empty() {
        return None;
    }
    Some(Symbol::template(name))
}
