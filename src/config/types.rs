use serde::Deserialize;

/// Main configuration structure for WikipediaBase
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub fetcher: FetcherConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub resolver: ResolverConfig,
}

/// Telnet-style query server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address to bind
    #[serde(default = "default_host")]
    pub host: String,

    /// TCP port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Line that terminates a session
    #[serde(default = "default_safeword")]
    pub safeword: String,

    /// Prompt written after every answer
    #[serde(default = "default_prompt")]
    pub prompt: String,
}

/// Wiki fetcher configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FetcherConfig {
    /// Script path of the wiki, e.g. `https://en.wikipedia.org/w/`
    #[serde(rename = "base-url", default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout (seconds)
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Number of retries after the first failed attempt
    #[serde(default = "default_retries")]
    pub retries: u32,

    /// Base delay between retries (milliseconds); grows linearly per attempt
    #[serde(rename = "retry-delay-ms", default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Longest chain of `#REDIRECT` pages followed for one symbol
    #[serde(rename = "max-redirects", default = "default_max_redirects")]
    pub max_redirects: u32,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the client
    #[serde(rename = "client-name", default = "default_client_name")]
    pub client_name: String,

    /// Version of the client
    #[serde(rename = "client-version", default = "default_client_version")]
    pub client_version: String,

    /// URL with information about the client
    #[serde(rename = "contact-url", default = "default_contact_url")]
    pub contact_url: String,

    /// Email address for operator contact
    #[serde(rename = "contact-email", default = "default_contact_email")]
    pub contact_email: String,
}

/// Response cache configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Whether fetched responses are persisted at all
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,

    /// Path to the SQLite database file
    #[serde(rename = "database-path", default = "default_database_path")]
    pub database_path: String,

    /// How many parsed articles, and separately meta infoboxes, stay in memory
    #[serde(rename = "memo-size", default = "default_memo_size")]
    pub memo_size: usize,
}

/// Resolver tuning
#[derive(Debug, Clone, Deserialize)]
pub struct ResolverConfig {
    /// Minimum number of characters returned for `short-article`
    #[serde(rename = "short-article-chars", default = "default_short_article_chars")]
    pub short_article_chars: usize,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    1984
}

fn default_safeword() -> String {
    "quit".to_string()
}

fn default_prompt() -> String {
    "\n> ".to_string()
}

fn default_base_url() -> String {
    "https://en.wikipedia.org/w/".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_retries() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    500
}

fn default_max_redirects() -> u32 {
    8
}

fn default_client_name() -> String {
    "WikipediaBase".to_string()
}

fn default_client_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_contact_url() -> String {
    "https://example.org/wikipediabase".to_string()
}

fn default_contact_email() -> String {
    "admin@example.org".to_string()
}

fn default_cache_enabled() -> bool {
    true
}

fn default_database_path() -> String {
    "./wikipediabase-cache.db".to_string()
}

fn default_memo_size() -> usize {
    512
}

fn default_short_article_chars() -> usize {
    350
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            safeword: default_safeword(),
            prompt: default_prompt(),
        }
    }
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            retries: default_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            max_redirects: default_max_redirects(),
        }
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            client_name: default_client_name(),
            client_version: default_client_version(),
            contact_url: default_contact_url(),
            contact_email: default_contact_email(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            database_path: default_database_path(),
            memo_size: default_memo_size(),
        }
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            short_article_chars: default_short_article_chars(),
        }
    }
}

impl UserAgentConfig {
    /// Formats the header value: `Name/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.client_name, self.client_version, self.contact_url, self.contact_email
        )
    }
}
