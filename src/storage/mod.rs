//! Storage module for cached wiki responses
//!
//! Fetched markup, rendered HTML, redirect targets and sandbox renders are
//! kept in a SQLite database keyed by a fingerprint of the fetch, so a
//! restarted server does not hit the wiki again for pages it has seen.

mod schema;
mod sqlite;
mod traits;

pub use schema::get_schema_version;
pub use sqlite::SqliteCache;
pub use traits::{CachedResponse, ResponseStore, StorageResult};

use sha2::{Digest, Sha256};
use std::path::Path;

/// Opens or creates the response cache database
pub fn open_cache(path: &Path) -> StorageResult<SqliteCache> {
    SqliteCache::open(path)
}

/// Hex SHA-256 fingerprint of a fetch
///
/// ```
/// use wikipediabase::storage::fingerprint;
///
/// assert_eq!(fingerprint("html", "Black Sea"), fingerprint("html", "Black Sea"));
/// assert_ne!(fingerprint("html", "Black Sea"), fingerprint("markup", "Black Sea"));
/// ```
pub fn fingerprint(operation: &str, key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(operation.as_bytes());
    hasher.update([0u8]);
    hasher.update(key.as_bytes());
    hex::encode(hasher.finalize())
}
