//! Classifiers
//!
//! A classifier tags an article with class names such as `wikibase-person`
//! or `wikipedia-officeholder`. Every registered classifier runs on each
//! article; their tags are unioned in priority order with duplicates
//! dropped, so the result is stable across calls.

use crate::article::Article;
use crate::infobox::{class_of, InfoboxTree};
use crate::resolver::{gender_of, pronoun_counts, PERSON_CLASS, SECTIONS_CLASS, TERM_CLASS};

/// A source of class tags for an article
pub trait Classifier: Send + Sync {
    fn name(&self) -> &'static str;

    /// Higher runs first and comes first in the union
    fn priority(&self) -> i32;

    fn classify(&self, article: &Article, tree: &InfoboxTree) -> Vec<String>;
}

/// Every article is a term with sections
pub struct StaticClassifier;

impl Classifier for StaticClassifier {
    fn name(&self) -> &'static str {
        "static"
    }

    fn priority(&self) -> i32 {
        3
    }

    fn classify(&self, _article: &Article, _tree: &InfoboxTree) -> Vec<String> {
        vec![TERM_CLASS.to_string(), SECTIONS_CLASS.to_string()]
    }
}

/// Infobox classes plus their ancestors in the template tree
///
/// A template that redirects (`Infobox President` to `Infobox officeholder`)
/// contributes both names.
pub struct InfoboxClassifier;

impl Classifier for InfoboxClassifier {
    fn name(&self) -> &'static str {
        "infobox"
    }

    fn priority(&self) -> i32 {
        2
    }

    fn classify(&self, article: &Article, tree: &InfoboxTree) -> Vec<String> {
        let mut classes = Vec::new();
        for infobox in article.infoboxes() {
            let mut own = vec![infobox.cls().to_string()];
            if let Some(meta) = infobox.meta() {
                own.push(class_of(meta.canonical()));
            }
            for cls in own {
                let ancestors = tree.ancestors(&cls);
                classes.push(cls);
                classes.extend(ancestors);
            }
        }
        classes
    }
}

/// `wikibase-person` for biographies, plus a gender tag
pub struct PersonClassifier;

impl Classifier for PersonClassifier {
    fn name(&self) -> &'static str {
        "person"
    }

    fn priority(&self) -> i32 {
        1
    }

    fn classify(&self, article: &Article, tree: &InfoboxTree) -> Vec<String> {
        if !crate::resolver::has_birth_date(article, tree) {
            return Vec::new();
        }

        let mut classes = vec![PERSON_CLASS.to_string()];
        if let Some(gender) = gender_of(&pronoun_counts(&article.text())) {
            classes.push(gender.class().to_string());
        }
        classes
    }
}

/// Priority-ordered classifiers, fixed once built
pub struct ClassifierRegistry {
    classifiers: Vec<Box<dyn Classifier>>,
}

impl ClassifierRegistry {
    pub fn empty() -> Self {
        Self {
            classifiers: Vec::new(),
        }
    }

    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(StaticClassifier));
        registry.register(Box::new(InfoboxClassifier));
        registry.register(Box::new(PersonClassifier));
        registry
    }

    pub fn register(&mut self, classifier: Box<dyn Classifier>) {
        let at = self
            .classifiers
            .iter()
            .position(|c| c.priority() < classifier.priority())
            .unwrap_or(self.classifiers.len());
        self.classifiers.insert(at, classifier);
    }

    /// Union of every classifier's tags, first occurrence kept
    pub fn classify(&self, article: &Article, tree: &InfoboxTree) -> Vec<String> {
        let mut classes: Vec<String> = Vec::new();
        for classifier in &self.classifiers {
            for cls in classifier.classify(article, tree) {
                if !classes.contains(&cls) {
                    classes.push(cls);
                }
            }
        }
        tracing::debug!("Classified {} as {:?}", article.symbol(), classes);
        classes
    }
}

impl Default for ClassifierRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
