//! Database schema for the response cache

/// SQL schema for the response cache
pub const SCHEMA_SQL: &str = r#"
-- One row per fetched response, keyed by (operation, key) fingerprint
CREATE TABLE IF NOT EXISTS responses (
    fingerprint TEXT PRIMARY KEY,
    operation TEXT NOT NULL,
    key TEXT NOT NULL,
    body TEXT NOT NULL,
    fetched_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_responses_operation ON responses(operation);

CREATE TABLE IF NOT EXISTS schema_info (
    version INTEGER NOT NULL
);
"#;

/// Initializes the database schema
///
/// Safe to run against an already initialised database.
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;

    let recorded: i64 = conn.query_row("SELECT COUNT(*) FROM schema_info", [], |row| row.get(0))?;
    if recorded == 0 {
        conn.execute(
            "INSERT INTO schema_info (version) VALUES (?1)",
            [get_schema_version()],
        )?;
    }
    Ok(())
}

/// Gets the current schema version
pub fn get_schema_version() -> u32 {
    1
}
