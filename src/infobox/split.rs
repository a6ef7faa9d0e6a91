use crate::html::XmlString;
use crate::InfoboxError;
use regex::Regex;
use std::sync::LazyLock;

/// The purple header background sub-templates open their section with
pub static HEADER_STYLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)background(?:-color)?\s*:\s*(?:#ccf\b|#ccccff|#ddf\b|#ddddff|lavender)")
        .expect("valid header style regex")
});

/// Splits a shared infobox table into `expected` sub-tables
///
/// Each sub-table starts at a header row and is re-wrapped in a table with
/// the original class. Rows before the first header belong to the first
/// sub-table.
///
/// # Errors
///
/// `Unsplittable` unless exactly `expected` header rows are found.
pub fn split_table(table: &XmlString, expected: usize) -> Result<Vec<XmlString>, InfoboxError> {
    let rows = table.rows();
    let headers: Vec<usize> = rows
        .iter()
        .enumerate()
        .filter(|(_, row)| is_header(row))
        .map(|(i, _)| i)
        .collect();

    if headers.len() != expected || expected == 0 {
        return Err(InfoboxError::Unsplittable {
            expected,
            found: headers.len(),
        });
    }

    let class = table.get("class").unwrap_or_else(|| "infobox".to_string());
    let mut bounds = headers.clone();
    bounds[0] = 0;
    bounds.push(rows.len());

    Ok(bounds
        .windows(2)
        .map(|w| {
            let body: String = rows[w[0]..w[1]].iter().map(XmlString::as_str).collect();
            XmlString::new(format!(r#"<table class="{}"><tbody>{}</tbody></table>"#, class, body))
        })
        .collect())
}

fn is_header(row: &XmlString) -> bool {
    let styled = |el: &XmlString| {
        el.get("style")
            .is_some_and(|style| HEADER_STYLE_RE.is_match(&style))
    };
    styled(row) || row.select("th, td").iter().any(styled)
}
