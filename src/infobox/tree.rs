use super::class_of;
use crate::symbol::Symbol;
use std::collections::HashMap;
use std::sync::LazyLock;

const BUNDLED: &str = include_str!("../../data/infobox_tree.txt");

static BUNDLED_TREE: LazyLock<InfoboxTree> = LazyLock::new(|| InfoboxTree::parse(BUNDLED));

/// Ancestry of infobox templates, as class tags
///
/// Parsed from lines like `Infobox person > Infobox officeholder > Infobox
/// president`, most general first. Blank lines and `#` comments are skipped.
#[derive(Debug, Clone, Default)]
pub struct InfoboxTree {
    parents: HashMap<String, Vec<String>>,
}

impl InfoboxTree {
    /// The tree shipped with the crate
    pub fn bundled() -> &'static InfoboxTree {
        &BUNDLED_TREE
    }

    pub fn parse(text: &str) -> Self {
        let mut parents: HashMap<String, Vec<String>> = HashMap::new();

        for line in text.lines().map(str::trim) {
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let chain: Vec<String> = line
                .split('>')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(|name| class_of(&Symbol::template(name)))
                .collect();

            for pair in chain.windows(2) {
                let entry = parents.entry(pair[1].clone()).or_default();
                if !entry.contains(&pair[0]) {
                    entry.push(pair[0].clone());
                }
            }
        }

        Self { parents }
    }

    /// Every ancestor of a class, nearest first, without repeats
    ///
    /// ```
    /// use wikipediabase::infobox::InfoboxTree;
    ///
    /// let tree = InfoboxTree::parse("Infobox person > Infobox officeholder > Infobox president");
    /// assert_eq!(
    ///     tree.ancestors("wikipedia-president"),
    ///     vec!["wikipedia-officeholder", "wikipedia-person"]
    /// );
    /// ```
    pub fn ancestors(&self, cls: &str) -> Vec<String> {
        let mut found: Vec<String> = Vec::new();
        let mut pending = vec![cls.to_string()];

        while let Some(current) = pending.pop() {
            let Some(parents) = self.parents.get(&current) else {
                continue;
            };
            for parent in parents {
                if parent != cls && !found.contains(parent) {
                    found.push(parent.clone());
                    pending.insert(0, parent.clone());
                }
            }
        }
        found
    }

    pub fn len(&self) -> usize {
        self.parents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_tree_knows_presidents() {
        let tree = InfoboxTree::bundled();
        assert!(!tree.is_empty());
        let ancestors = tree.ancestors("wikipedia-president");
        assert!(ancestors.contains(&"wikipedia-officeholder".to_string()));
        assert!(ancestors.contains(&"wikipedia-person".to_string()));
    }

    #[test]
    fn test_multiple_lines_merge() {
        let tree = InfoboxTree::parse(
            "# people\nInfobox person > Infobox martial artist\n\nInfobox sportsperson > Infobox martial artist\n",
        );
        assert_eq!(
            tree.ancestors("wikipedia-martial-artist"),
            vec!["wikipedia-person", "wikipedia-sportsperson"]
        );
    }

    #[test]
    fn test_cycles_terminate() {
        let tree = InfoboxTree::parse("Infobox a > Infobox b\nInfobox b > Infobox a");
        assert_eq!(tree.ancestors("wikipedia-a"), vec!["wikipedia-b"]);
    }

    #[test]
    fn test_root_has_no_ancestors() {
        let tree = InfoboxTree::parse("Infobox person > Infobox officeholder");
        assert!(tree.ancestors("wikipedia-person").is_empty());
    }
}
