use super::{Fetcher, OnceMap};
use crate::storage::{fingerprint, CachedResponse, ResponseStore};
use crate::symbol::Symbol;
use crate::{FetchError, FetchResult};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

/// Wraps a fetcher with a persistent response cache
///
/// Concurrent requests for the same `(operation, key)` fingerprint wait for
/// the first. Bodies live only in the store once that request finishes;
/// failures are never cached. A store that cannot be read or written only
/// costs a refetch.
pub struct CachedFetcher<F> {
    inner: F,
    store: Arc<dyn ResponseStore>,
    responses: OnceMap<String, String>,
}

impl<F: Fetcher> CachedFetcher<F> {
    pub fn new(inner: F, store: Arc<dyn ResponseStore>) -> Self {
        Self {
            inner,
            store,
            responses: OnceMap::bounded(0),
        }
    }

    pub fn inner(&self) -> &F {
        &self.inner
    }

    async fn cached<'a, Fut>(&'a self, operation: &str, key: &str, fetch: Fut) -> FetchResult<String>
    where
        Fut: std::future::Future<Output = FetchResult<String>> + Send + 'a,
    {
        let fp = fingerprint(operation, key);

        self.responses
            .get_or_try_init(fp.clone(), || async {
                match self.store.get(&fp) {
                    Ok(Some(hit)) => {
                        tracing::trace!("Cache hit for {} {}", operation, key);
                        return Ok(hit.body);
                    }
                    Ok(None) => {}
                    Err(e) => tracing::warn!("Cache read failed for {} {}: {}", operation, key, e),
                }

                let body = fetch.await?;
                let response = CachedResponse {
                    fingerprint: fp.clone(),
                    operation: operation.to_string(),
                    key: key.to_string(),
                    body: body.clone(),
                    fetched_at: Utc::now().to_rfc3339(),
                };
                if let Err(e) = self.store.put(&response) {
                    tracing::warn!("Cache write failed for {} {}: {}", operation, key, e);
                }
                Ok::<_, FetchError>(body)
            })
            .await
    }
}

#[async_trait]
impl<F: Fetcher> Fetcher for CachedFetcher<F> {
    async fn raw_markup(&self, symbol: &Symbol) -> FetchResult<String> {
        let key = symbol.to_string();
        self.cached("markup", &key, self.inner.raw_markup(symbol)).await
    }

    async fn raw_html(&self, symbol: &Symbol) -> FetchResult<String> {
        let key = symbol.to_string();
        self.cached("html", &key, self.inner.raw_html(symbol)).await
    }

    async fn render(&self, markup: &str, key: Option<&str>) -> FetchResult<String> {
        // Unkeyed renders are cached by their full markup.
        let cache_key = key.unwrap_or(markup);
        self.cached("render", cache_key, self.inner.render(markup, key)).await
    }

    fn base_url(&self) -> &str {
        self.inner.base_url()
    }

    fn max_redirects(&self) -> usize {
        self.inner.max_redirects()
    }
}
