//! Storage trait for cached responses

use crate::StorageError;

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// A cached wiki response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResponse {
    /// Hex SHA-256 of `(operation, key)`
    pub fingerprint: String,
    /// Fetcher operation (`markup`, `html`, `redirect`, `render`)
    pub operation: String,
    pub key: String,
    pub body: String,
    /// RFC 3339 timestamp
    pub fetched_at: String,
}

/// Backend for the response cache
///
/// Implementations must be safe to share between connection tasks. Each
/// `put` replaces the whole entry atomically.
pub trait ResponseStore: Send + Sync {
    /// Looks up a response by fingerprint
    fn get(&self, fingerprint: &str) -> StorageResult<Option<CachedResponse>>;

    /// Stores a response, replacing any entry with the same fingerprint
    fn put(&self, response: &CachedResponse) -> StorageResult<()>;

    /// Drops a response; returns whether one existed
    fn remove(&self, fingerprint: &str) -> StorageResult<bool>;

    /// Number of cached responses
    fn len(&self) -> StorageResult<usize>;

    fn is_empty(&self) -> StorageResult<bool> {
        Ok(self.len()? == 0)
    }
}
