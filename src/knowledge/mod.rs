//! Knowledgebase
//!
//! The [`Knowledgebase`] owns the fetcher, the registries and the per-process
//! memo tables. Concurrent queries for the same symbol wait for the first
//! build. The most recently built articles and meta infoboxes are kept, up to
//! `[cache] memo-size` of each; older ones are rebuilt on demand.

use crate::article::Article;
use crate::classifier::ClassifierRegistry;
use crate::config::{Config, ResolverConfig};
use crate::fetcher::{wiki_url, Fetcher, OnceMap};
use crate::html::XmlString;
use crate::infobox::{build_infoboxes, extract_blocks, template_params, InfoboxTree, MetaInfobox};
use crate::lisp::LispType;
use crate::resolver::{Attribute, Context, ResolverRegistry};
use crate::symbol::{MarkupString, Symbol};
use crate::{FetchError, WikibaseError};
use std::collections::HashMap;
use std::sync::Arc;

pub struct Knowledgebase {
    fetcher: Arc<dyn Fetcher>,
    config: ResolverConfig,
    tree: &'static InfoboxTree,
    classifiers: ClassifierRegistry,
    resolvers: ResolverRegistry,
    articles: OnceMap<Symbol, Arc<Article>>,
    metas: OnceMap<Symbol, Arc<MetaInfobox>>,
}

impl Knowledgebase {
    /// A knowledgebase with every built-in classifier and resolver
    pub fn new(config: &Config, fetcher: Arc<dyn Fetcher>) -> Self {
        Self::with_registries(
            config,
            fetcher,
            ClassifierRegistry::with_defaults(),
            ResolverRegistry::with_defaults(),
        )
    }

    pub fn with_registries(
        config: &Config,
        fetcher: Arc<dyn Fetcher>,
        classifiers: ClassifierRegistry,
        resolvers: ResolverRegistry,
    ) -> Self {
        Self {
            fetcher,
            config: config.resolver.clone(),
            tree: InfoboxTree::bundled(),
            classifiers,
            resolvers,
            articles: OnceMap::bounded(config.cache.memo_size),
            metas: OnceMap::bounded(config.cache.memo_size),
        }
    }

    pub fn fetcher(&self) -> &Arc<dyn Fetcher> {
        &self.fetcher
    }

    /// The article for `symbol`, redirects followed
    pub async fn article(&self, symbol: &Symbol) -> crate::Result<Arc<Article>> {
        self.articles
            .get_or_try_init(symbol.clone(), || async {
                self.load_article(symbol).await.map(Arc::new)
            })
            .await
    }

    async fn load_article(&self, symbol: &Symbol) -> crate::Result<Article> {
        let (target, markup) = self.fetcher.resolve(symbol).await?;
        let markup = MarkupString::new(markup);
        let html = XmlString::new(self.fetcher.raw_html(&target).await?);
        let url = wiki_url(self.fetcher.base_url(), &target);

        let mut metas: HashMap<Symbol, Arc<MetaInfobox>> = HashMap::new();
        for block in extract_blocks(markup.as_str()) {
            if !metas.contains_key(&block.template) {
                let meta = self.meta(&block.template).await;
                metas.insert(block.template, meta);
            }
        }

        let infoboxes = build_infoboxes(&target, &markup, &html, &metas);
        tracing::debug!(
            "Loaded {} as {} with {} infoboxes",
            symbol,
            target,
            infoboxes.len()
        );
        Ok(Article::new(target, markup, html, url, infoboxes))
    }

    /// The meta infobox of a template
    ///
    /// Never fails: a template that cannot be fetched or rendered yields an
    /// empty mapping, so lookups fall back to markup keys. Fetch failures are
    /// not remembered; a later article retries them.
    pub async fn meta(&self, template: &Symbol) -> Arc<MetaInfobox> {
        let built = self
            .metas
            .get_or_try_init(template.clone(), || async {
                self.load_meta(template).await.map(Arc::new)
            })
            .await;

        built.unwrap_or_else(|e| {
            tracing::warn!("No meta infobox for {}: {}", template, e);
            Arc::new(MetaInfobox::empty(template.clone()))
        })
    }

    async fn load_meta(&self, template: &Symbol) -> Result<MetaInfobox, FetchError> {
        let (canonical, source) = self.fetcher.resolve(template).await?;

        let params = template_params(&source);
        if params.is_empty() {
            tracing::debug!("Template {} takes no parameters", canonical);
            return Ok(MetaInfobox::empty(template.clone()).with_canonical(canonical));
        }

        let markup = MetaInfobox::sentinel_markup(&canonical, &params);
        let rendered = self.fetcher.render(&markup, Some(&canonical.literal())).await?;
        let meta = MetaInfobox::from_rendered(template.clone(), &XmlString::new(rendered))
            .with_canonical(canonical);
        tracing::debug!("Meta infobox for {} knows {} labels", template, meta.labels().count());
        Ok(meta)
    }

    /// Class tags of the article, classifier union order
    pub async fn classify(&self, symbol: &Symbol) -> crate::Result<Vec<String>> {
        let article = self.article(symbol).await?;
        Ok(self.classifiers.classify(&article, self.tree))
    }

    /// Resolves an attribute, returning an error answer instead of failing
    ///
    /// With an explicit class only that class is offered to the resolvers;
    /// otherwise the article is classified first.
    pub async fn resolve(&self, cls: Option<&str>, symbol: &Symbol, attr: &Attribute) -> LispType {
        let article = match self.article(symbol).await {
            Ok(article) => article,
            Err(e) => return miss(&e),
        };

        let classes = match cls {
            Some(cls) => vec![cls.to_string()],
            None => self.classifiers.classify(&article, self.tree),
        };
        let ctx = Context {
            article: &article,
            classes: &classes,
            config: &self.config,
            tree: self.tree,
        };
        self.resolvers.resolve(&ctx, attr)
    }

    /// Attribute descriptors for the article under the given or classified classes
    pub async fn attributes(&self, cls: Option<&str>, symbol: &Symbol) -> crate::Result<Vec<LispType>> {
        let article = self.article(symbol).await?;
        let classes = match cls {
            Some(cls) => vec![cls.to_string()],
            None => self.classifiers.classify(&article, self.tree),
        };
        let ctx = Context {
            article: &article,
            classes: &classes,
            config: &self.config,
            tree: self.tree,
        };
        Ok(self.resolvers.attributes(&ctx))
    }
}

/// Error answer for an article that could not be loaded
pub fn miss(err: &WikibaseError) -> LispType {
    match err {
        WikibaseError::Fetch(missing @ FetchError::NotFound { .. }) => {
            LispType::error_reply("attribute-value-not-found", &missing.to_string())
        }
        other => LispType::from_error(other),
    }
}
