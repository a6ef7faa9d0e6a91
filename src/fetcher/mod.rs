//! Fetchers
//!
//! Everything the system knows about the wiki comes through the [`Fetcher`]
//! trait. Implementations supply the raw per-page operations; redirect
//! following and canonical URLs are shared by every implementation.
//!
//! - [`WikiFetcher`] talks to a live MediaWiki over HTTP
//! - [`CachedFetcher`] wraps any fetcher with a single-flight, SQLite-backed cache
//! - [`MemoryFetcher`] serves fixture pages from memory

mod cached;
mod http;
mod memory;
mod once_map;

pub use cached::CachedFetcher;
pub use http::{build_http_client, WikiFetcher};
pub use memory::MemoryFetcher;
pub use once_map::OnceMap;

use crate::config::Config;
use crate::storage::SqliteCache;
use crate::symbol::{MarkupString, Symbol};
use crate::{FetchError, FetchResult};
use async_trait::async_trait;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

/// Source of article markup, rendered HTML and template renders
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Markup of exactly this page, without following redirects
    async fn raw_markup(&self, symbol: &Symbol) -> FetchResult<String>;

    /// Rendered HTML of exactly this page, without following redirects
    async fn raw_html(&self, symbol: &Symbol) -> FetchResult<String>;

    /// Renders arbitrary markup through the wiki's parser
    ///
    /// `key` names the render for caching; the same key must always carry
    /// the same markup.
    async fn render(&self, markup: &str, key: Option<&str>) -> FetchResult<String>;

    /// Script path of the wiki (`https://en.wikipedia.org/w/`)
    fn base_url(&self) -> &str;

    /// Longest redirect chain followed before giving up
    fn max_redirects(&self) -> usize {
        8
    }

    /// Follows `#REDIRECT` pages to the final target
    ///
    /// Returns the target and its markup. Titles are compared by reduced
    /// form, so a chain that comes back to any earlier page is a loop.
    async fn resolve(&self, symbol: &Symbol) -> FetchResult<(Symbol, String)> {
        let mut visited = HashSet::new();
        let mut current = symbol.clone();

        loop {
            if !visited.insert(current.reduced()) || visited.len() > self.max_redirects() + 1 {
                return Err(FetchError::RedirectLoop {
                    symbol: current.to_string(),
                });
            }

            let markup = self.raw_markup(&current).await?;
            match MarkupString::new(markup.as_str()).redirect_target() {
                Some(target) => {
                    tracing::debug!("{} redirects to {}", current, target);
                    current = target;
                }
                None => return Ok((current, markup)),
            }
        }
    }

    /// Wiki markup with redirects silently followed
    async fn markup_source(&self, symbol: &Symbol) -> FetchResult<String> {
        Ok(self.resolve(symbol).await?.1)
    }

    /// Rendered article HTML with redirects followed
    async fn html_source(&self, symbol: &Symbol) -> FetchResult<String> {
        let (target, _) = self.resolve(symbol).await?;
        self.raw_html(&target).await
    }

    /// Canonical `/wiki/` URL of the page a symbol ends up at
    async fn redirect_url(&self, symbol: &Symbol) -> FetchResult<String> {
        let (target, _) = self.resolve(symbol).await?;
        Ok(wiki_url(self.base_url(), &target))
    }
}

#[async_trait]
impl<F: Fetcher + ?Sized> Fetcher for Arc<F> {
    async fn raw_markup(&self, symbol: &Symbol) -> FetchResult<String> {
        (**self).raw_markup(symbol).await
    }

    async fn raw_html(&self, symbol: &Symbol) -> FetchResult<String> {
        (**self).raw_html(symbol).await
    }

    async fn render(&self, markup: &str, key: Option<&str>) -> FetchResult<String> {
        (**self).render(markup, key).await
    }

    fn base_url(&self) -> &str {
        (**self).base_url()
    }

    fn max_redirects(&self) -> usize {
        (**self).max_redirects()
    }
}

/// Canonical article URL: `<site>/wiki/<Url_friendly_title>`
///
/// ```
/// use wikipediabase::fetcher::wiki_url;
/// use wikipediabase::Symbol;
///
/// assert_eq!(
///     wiki_url("https://en.wikipedia.org/w/", &Symbol::new("Black Sea")),
///     "https://en.wikipedia.org/wiki/Black_Sea"
/// );
/// ```
pub fn wiki_url(base_url: &str, symbol: &Symbol) -> String {
    let title = symbol.url_friendly();
    let base = if base_url.ends_with('/') {
        base_url.to_string()
    } else {
        format!("{}/", base_url)
    };

    match url::Url::parse(&base).and_then(|b| b.join(&format!("../wiki/{}", title))) {
        Ok(url) => url.to_string(),
        Err(_) => format!("{}wiki/{}", base, title),
    }
}

/// Builds the fetcher described by the configuration
///
/// The HTTP fetcher is wrapped in a cache unless caching is disabled.
pub fn build_fetcher(config: &Config) -> crate::Result<Arc<dyn Fetcher>> {
    let wiki = WikiFetcher::new(&config.fetcher, &config.user_agent)?;

    if !config.cache.enabled {
        tracing::info!("Response cache disabled");
        return Ok(Arc::new(wiki));
    }

    let cache = SqliteCache::open(Path::new(&config.cache.database_path))?;
    tracing::info!("Response cache at {}", config.cache.database_path);
    Ok(Arc::new(CachedFetcher::new(wiki, Arc::new(cache))))
}
