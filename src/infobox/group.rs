use super::InfoboxBlock;

/// Suffixes that mark sibling templates rendered into one shared table
const SUB_SUFFIXES: &[&str] = &[
    "begin",
    "image",
    "career",
    "characteristics",
    "class overview",
    "end",
];

/// Root of a sub-template family, if the template belongs to one
///
/// Roots are lowercased: `Infobox animanga/Print` and `Infobox ship career`
/// root at `infobox animanga` and `infobox ship`.
///
/// ```
/// use wikipediabase::infobox::template_root;
///
/// assert_eq!(template_root("Infobox animanga/Video"), Some("infobox animanga".to_string()));
/// assert_eq!(template_root("Infobox ship class overview"), Some("infobox ship".to_string()));
/// assert_eq!(template_root("Infobox person"), None);
/// ```
pub fn template_root(title: &str) -> Option<String> {
    if let Some((root, _)) = title.rsplit_once('/') {
        return Some(root.trim().to_lowercase());
    }

    let lower = title.to_lowercase();
    SUB_SUFFIXES.iter().find_map(|suffix| {
        lower
            .strip_suffix(*suffix)
            .filter(|rest| rest.ends_with(' '))
            .map(|rest| rest.trim().to_string())
            .filter(|rest| rest.len() > "infobox".len())
    })
}

/// Groups block indices into families that share one rendered table
///
/// Adjacent blocks with the same root form one group; every other block is
/// a group of its own.
pub fn group_blocks(blocks: &[InfoboxBlock]) -> Vec<Vec<usize>> {
    let mut groups: Vec<Vec<usize>> = Vec::new();
    let mut current_root: Option<String> = None;

    for (i, block) in blocks.iter().enumerate() {
        let root = template_root(block.template.title());
        match groups.last_mut() {
            Some(last) if root.is_some() && root == current_root => last.push(i),
            _ => groups.push(vec![i]),
        }
        current_root = root;
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infobox::extract_blocks;

    #[test]
    fn test_slash_family_grouped() {
        let markup = "{{Infobox animanga/Header|name=A}}{{Infobox animanga/Print|type=manga}}{{Infobox animanga/Video|type=tv}}{{Infobox animanga/Footer}}{{Infobox person|name=B}}";
        let groups = group_blocks(&extract_blocks(markup));
        assert_eq!(groups, vec![vec![0, 1, 2, 3], vec![4]]);
    }

    #[test]
    fn test_named_suffix_family_grouped() {
        let markup = "{{Infobox ship begin}}{{Infobox ship image|Ship image=x}}{{Infobox ship career|Ship name=y}}{{Infobox ship end}}";
        let groups = group_blocks(&extract_blocks(markup));
        assert_eq!(groups, vec![vec![0, 1, 2, 3]]);
    }

    #[test]
    fn test_unrelated_templates_stay_apart() {
        let markup = "{{Infobox officeholder|name=A}}{{Infobox military person|name=B}}";
        let groups = group_blocks(&extract_blocks(markup));
        assert_eq!(groups, vec![vec![0], vec![1]]);
    }

    #[test]
    fn test_bare_suffix_is_not_a_family() {
        assert_eq!(template_root("Infobox image"), None);
        assert_eq!(template_root("Infobox career"), None);
    }
}
