use super::Fetcher;
use crate::symbol::Symbol;
use crate::{FetchError, FetchResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Fetcher serving pages held in memory
///
/// Used by tests and offline runs. Renders are looked up by their key, so
/// fixtures must register the sentinel render of each template under the
/// template's title.
pub struct MemoryFetcher {
    base_url: String,
    markup: HashMap<Symbol, String>,
    html: HashMap<Symbol, String>,
    renders: HashMap<String, String>,
    requests: AtomicUsize,
}

impl MemoryFetcher {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            markup: HashMap::new(),
            html: HashMap::new(),
            renders: HashMap::new(),
            requests: AtomicUsize::new(0),
        }
    }

    pub fn with_markup(mut self, title: &str, markup: &str) -> Self {
        self.markup.insert(Symbol::new(title), markup.to_string());
        self
    }

    pub fn with_html(mut self, title: &str, html: &str) -> Self {
        self.html.insert(Symbol::new(title), html.to_string());
        self
    }

    pub fn with_render(mut self, key: &str, html: &str) -> Self {
        self.renders.insert(render_key(key), html.to_string());
        self
    }

    /// Loads fixture pages from a directory
    ///
    /// | File | Serves |
    /// |------|--------|
    /// | `<Title>.wiki` | markup of `Title` |
    /// | `<Title>.html` | rendered page of `Title` |
    /// | `render/<Key>.html` | render registered under `Key` |
    ///
    /// Titles use underscores for spaces (`Template:Infobox_person.wiki`).
    pub fn from_dir(base_url: &str, dir: &Path) -> std::io::Result<Self> {
        let mut fetcher = Self::new(base_url);

        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            let (Some(stem), Some(ext)) = (
                path.file_stem().and_then(|s| s.to_str()),
                path.extension().and_then(|s| s.to_str()),
            ) else {
                continue;
            };
            let content = std::fs::read_to_string(&path)?;
            match ext {
                "wiki" => fetcher.markup.insert(Symbol::new(stem), content),
                "html" => fetcher.html.insert(Symbol::new(stem), content),
                _ => continue,
            };
        }

        let renders = dir.join("render");
        if renders.is_dir() {
            for entry in std::fs::read_dir(&renders)? {
                let path = entry?.path();
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    let content = std::fs::read_to_string(&path)?;
                    fetcher.renders.insert(render_key(stem), content);
                }
            }
        }

        tracing::debug!(
            "Loaded {} markup pages, {} rendered pages and {} renders from {}",
            fetcher.markup.len(),
            fetcher.html.len(),
            fetcher.renders.len(),
            dir.display()
        );
        Ok(fetcher)
    }

    /// Number of raw page and render requests served or refused so far
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    fn lookup(&self, pages: &HashMap<Symbol, String>, symbol: &Symbol) -> FetchResult<String> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        pages.get(symbol).cloned().ok_or_else(|| FetchError::NotFound {
            symbol: symbol.to_string(),
        })
    }
}

fn render_key(key: &str) -> String {
    Symbol::new(key).url_friendly()
}

#[async_trait]
impl Fetcher for MemoryFetcher {
    async fn raw_markup(&self, symbol: &Symbol) -> FetchResult<String> {
        self.lookup(&self.markup, symbol)
    }

    async fn raw_html(&self, symbol: &Symbol) -> FetchResult<String> {
        self.lookup(&self.html, symbol)
    }

    async fn render(&self, _markup: &str, key: Option<&str>) -> FetchResult<String> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let key = key.unwrap_or_default();
        self.renders
            .get(&render_key(key))
            .cloned()
            .ok_or_else(|| FetchError::NotFound {
                symbol: key.to_string(),
            })
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }
}
