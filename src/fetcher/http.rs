//! HTTP fetcher for a live MediaWiki
//!
//! Markup comes from `index.php?action=raw`, rendered pages from
//! `index.php?action=render` and sandbox renders from `api.php?action=parse`.

use super::Fetcher;
use crate::config::{FetcherConfig, UserAgentConfig};
use crate::symbol::Symbol;
use crate::{FetchError, FetchResult};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tokio::time::sleep;
use url::Url;

/// Builds an HTTP client identifying itself with the configured user agent
///
/// # Example
///
/// ```no_run
/// use wikipediabase::config::{FetcherConfig, UserAgentConfig};
/// use wikipediabase::fetcher::build_http_client;
///
/// let client = build_http_client(&FetcherConfig::default(), &UserAgentConfig::default()).unwrap();
/// ```
pub fn build_http_client(
    fetcher: &FetcherConfig,
    user_agent: &UserAgentConfig,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(Duration::from_secs(fetcher.timeout_secs))
        .connect_timeout(Duration::from_secs(fetcher.timeout_secs.min(10)))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Response of `api.php?action=parse&format=json`
#[derive(Debug, Deserialize)]
struct ParseResponse {
    parse: Option<ParsedPage>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ParsedPage {
    text: ParsedText,
}

#[derive(Debug, Deserialize)]
struct ParsedText {
    #[serde(rename = "*")]
    html: String,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: String,
    #[serde(default)]
    info: String,
}

/// Fetcher backed by a MediaWiki installation
pub struct WikiFetcher {
    client: Client,
    base_url: String,
    index_url: Url,
    api_url: Url,
    retries: u32,
    retry_delay: Duration,
    max_redirects: usize,
}

impl WikiFetcher {
    pub fn new(config: &FetcherConfig, user_agent: &UserAgentConfig) -> FetchResult<Self> {
        let client = build_http_client(config, user_agent).map_err(|source| FetchError::Http {
            url: config.base_url.clone(),
            source,
        })?;

        let base_url = if config.base_url.ends_with('/') {
            config.base_url.clone()
        } else {
            format!("{}/", config.base_url)
        };
        let base = Url::parse(&base_url).map_err(|e| FetchError::Decode {
            url: base_url.clone(),
            message: e.to_string(),
        })?;
        let join = |path: &str| {
            base.join(path).map_err(|e| FetchError::Decode {
                url: base_url.clone(),
                message: e.to_string(),
            })
        };

        Ok(Self {
            index_url: join("index.php")?,
            api_url: join("api.php")?,
            client,
            base_url: base_url.clone(),
            retries: config.retries,
            retry_delay: Duration::from_millis(config.retry_delay_ms),
            max_redirects: config.max_redirects as usize,
        })
    }

    fn page_url(&self, symbol: &Symbol, action: &str) -> Url {
        let mut url = self.index_url.clone();
        url.query_pairs_mut()
            .append_pair("title", &symbol.url_friendly())
            .append_pair("action", action);
        url
    }

    /// Sends a request, retrying transport errors, 429 and 5xx responses
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | 2xx | body returned |
    /// | 404 | `NotFound` immediately |
    /// | 429, 5xx, transport error | retried with linear back-off |
    /// | other status | `Status` immediately |
    async fn send_with_retry<B>(&self, url: &str, missing: &str, build: B) -> FetchResult<String>
    where
        B: Fn() -> RequestBuilder,
    {
        let mut attempt = 0u32;
        loop {
            let outcome = build().send().await;
            let retryable = match outcome {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return response.text().await.map_err(|source| FetchError::Http {
                            url: url.to_string(),
                            source,
                        });
                    }
                    if status == StatusCode::NOT_FOUND {
                        return Err(FetchError::NotFound {
                            symbol: missing.to_string(),
                        });
                    }
                    if status != StatusCode::TOO_MANY_REQUESTS && !status.is_server_error() {
                        return Err(FetchError::Status {
                            url: url.to_string(),
                            status: status.as_u16(),
                        });
                    }
                    FetchError::Status {
                        url: url.to_string(),
                        status: status.as_u16(),
                    }
                }
                Err(source) => FetchError::Http {
                    url: url.to_string(),
                    source,
                },
            };

            if attempt >= self.retries {
                tracing::warn!("Giving up on {} after {} attempts: {}", url, attempt + 1, retryable);
                return Err(retryable);
            }
            attempt += 1;
            tracing::debug!("Retrying {} ({}/{}): {}", url, attempt, self.retries, retryable);
            sleep(self.retry_delay * attempt).await;
        }
    }
}

#[async_trait]
impl Fetcher for WikiFetcher {
    async fn raw_markup(&self, symbol: &Symbol) -> FetchResult<String> {
        let url = self.page_url(symbol, "raw");
        tracing::debug!("Fetching markup of {}", symbol);
        self.send_with_retry(url.as_str(), &symbol.to_string(), || {
            self.client.get(url.clone())
        })
        .await
    }

    async fn raw_html(&self, symbol: &Symbol) -> FetchResult<String> {
        let url = self.page_url(symbol, "render");
        tracing::debug!("Fetching rendered page of {}", symbol);
        self.send_with_retry(url.as_str(), &symbol.to_string(), || {
            self.client.get(url.clone())
        })
        .await
    }

    async fn render(&self, markup: &str, key: Option<&str>) -> FetchResult<String> {
        let url = self.api_url.to_string();
        let title = key.unwrap_or("API");
        tracing::debug!("Rendering markup for {}", title);

        let form = [
            ("action", "parse"),
            ("format", "json"),
            ("contentmodel", "wikitext"),
            ("disablelimitreport", "1"),
            ("title", title),
            ("text", markup),
        ];
        let body = self
            .send_with_retry(&url, title, || self.client.post(url.as_str()).form(&form))
            .await?;

        let parsed: ParseResponse =
            serde_json::from_str(&body).map_err(|e| FetchError::Decode {
                url: url.clone(),
                message: e.to_string(),
            })?;

        match (parsed.parse, parsed.error) {
            (Some(page), _) => Ok(page.text.html),
            (None, Some(error)) => Err(FetchError::Decode {
                url,
                message: format!("{}: {}", error.code, error.info),
            }),
            (None, None) => Err(FetchError::Decode {
                url,
                message: "response has neither parse nor error".to_string(),
            }),
        }
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn max_redirects(&self) -> usize {
        self.max_redirects
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetcher(base: &str) -> WikiFetcher {
        let config = FetcherConfig {
            base_url: base.to_string(),
            ..FetcherConfig::default()
        };
        WikiFetcher::new(&config, &UserAgentConfig::default()).unwrap()
    }

    #[test]
    fn test_page_url() {
        let f = fetcher("https://en.wikipedia.org/w");
        assert_eq!(
            f.page_url(&Symbol::new("Bill Clinton"), "raw").as_str(),
            "https://en.wikipedia.org/w/index.php?title=Bill_Clinton&action=raw"
        );
        assert_eq!(f.base_url(), "https://en.wikipedia.org/w/");
        assert_eq!(f.api_url.as_str(), "https://en.wikipedia.org/w/api.php");
    }

    #[test]
    fn test_parse_response_shapes() {
        let ok: ParseResponse =
            serde_json::from_str(r#"{"parse":{"title":"API","text":{"*":"<table></table>"}}}"#).unwrap();
        assert_eq!(ok.parse.unwrap().text.html, "<table></table>");

        let err: ParseResponse =
            serde_json::from_str(r#"{"error":{"code":"missingtitle","info":"nope"}}"#).unwrap();
        assert!(err.parse.is_none());
        assert_eq!(err.error.unwrap().code, "missingtitle");
    }
}
