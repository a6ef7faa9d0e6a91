//! WikipediaBase: structured question answering over a live MediaWiki
//!
//! This crate answers s-expression queries such as
//! `(get "wikibase-person" "Bill Clinton" "BIRTH-DATE")` by fetching article
//! markup and rendered HTML, parsing infoboxes, classifying the article and
//! resolving attributes through a priority-ordered resolver chain.

pub mod article;
pub mod classifier;
pub mod config;
pub mod date;
pub mod evaluator;
pub mod fetcher;
pub mod html;
pub mod infobox;
pub mod knowledge;
pub mod lisp;
pub mod resolver;
pub mod server;
pub mod storage;
pub mod symbol;

use thiserror::Error;

/// Main error type for WikipediaBase operations
#[derive(Debug, Error)]
pub enum WikibaseError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Encoding error: {0}")]
    Encode(#[from] EncodeError),

    #[error("Infobox error: {0}")]
    Infobox(#[from] InfoboxError),

    #[error("Syntax error: {0}")]
    Syntax(#[from] lisp::SyntaxError),

    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    #[error("Bad arguments for {op}: {message}")]
    BadArguments { op: String, message: String },

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Errors raised while talking to the wiki
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Unexpected status {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("No article named {symbol}")]
    NotFound { symbol: String },

    #[error("Redirect loop detected at {symbol}")]
    RedirectLoop { symbol: String },

    #[error("Could not decode response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("Cache error: {0}")]
    Cache(String),
}

/// Errors from the on-disk response cache
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cache lock poisoned")]
    Lock,
}

/// Errors raised by the typed-value encoder
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EncodeError {
    #[error("No encoder accepts {value} (typecode {typecode:?})")]
    UnsupportedEncoding {
        value: String,
        typecode: Option<String>,
    },

    #[error("No date found in {0:?}")]
    NoDateFound(String),
}

/// Errors raised while modelling infoboxes
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InfoboxError {
    #[error("Expected {expected} sub-infobox headers, found {found}")]
    Unsplittable { expected: usize, found: usize },
}

/// Maps Rust error type names onto the symbols START expects after `:error`
const ERROR_SYMBOLS: &[(&str, &str)] = &[
    ("ConfigError", "config-error"),
    ("FetchError", "fetch-error"),
    ("NotFound", "attribute-value-not-found"),
    ("StorageError", "fetch-error"),
    ("UnsupportedEncoding", "unsupported-encoding"),
    ("NoDateFound", "no-date-found"),
    ("UnsplittableInfobox", "unsplittable-infobox"),
    ("SyntaxError", "syntax-error"),
    ("UnknownOperation", "unknown-op"),
    ("BadArguments", "syntax-error"),
    ("InternalError", "internal-error"),
    ("IoError", "internal-error"),
];

/// Translates an error type name into its lisp error symbol
///
/// Names missing from the table are kebab-cased (`FooBar` becomes `foo-bar`).
pub fn error_symbol(type_name: &str) -> String {
    if let Some((_, symbol)) = ERROR_SYMBOLS.iter().find(|(name, _)| *name == type_name) {
        return symbol.to_string();
    }

    let mut out = String::new();
    for (i, c) in type_name.chars().enumerate() {
        if c.is_uppercase() && i > 0 {
            out.push('-');
        }
        out.extend(c.to_lowercase());
    }
    out
}

impl WikibaseError {
    /// The type name used to pick the lisp error symbol
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Config(_) => "ConfigError",
            Self::Fetch(FetchError::NotFound { .. }) => "NotFound",
            Self::Fetch(_) => "FetchError",
            Self::Storage(_) => "StorageError",
            Self::Encode(EncodeError::UnsupportedEncoding { .. }) => "UnsupportedEncoding",
            Self::Encode(EncodeError::NoDateFound(_)) => "NoDateFound",
            Self::Infobox(_) => "UnsplittableInfobox",
            Self::Syntax(_) => "SyntaxError",
            Self::UnknownOperation(_) => "UnknownOperation",
            Self::BadArguments { .. } => "BadArguments",
            Self::Internal(_) => "InternalError",
            Self::Io(_) => "IoError",
        }
    }
}

/// Result type alias for WikipediaBase operations
pub type Result<T> = std::result::Result<T, WikibaseError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for fetcher operations
pub type FetchResult<T> = std::result::Result<T, FetchError>;

// Re-export commonly used types
pub use article::Article;
pub use config::Config;
pub use knowledge::Knowledgebase;
pub use lisp::{lispify, LispType, Value};
pub use symbol::Symbol;
