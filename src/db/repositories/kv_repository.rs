use std::convert::TryFrom;

use rusqlite::{named_params, Connection, OptionalExtension, Row};

use crate::error::AppResult;

#[derive(Debug, Clone)]
pub struct KvEntryRow {
    pub key: String,
    pub value: String,
    pub revision: i64,
    pub updated_at: String,
}

impl TryFrom<&Row<'_>> for KvEntryRow {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'_>) -> Result<Self, Self::Error> {
        Ok(Self {
            key: row.get("key")?,
            value: row.get("value")?,
            revision: row.get("revision")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

pub struct KvRepository;

impl KvRepository {
    pub fn get(conn: &Connection, key: &str) -> AppResult<Option<KvEntryRow>> {
        let mut stmt = conn
            .prepare("SELECT key, value, revision, updated_at FROM kv_entries WHERE key = ?1")?;

        let row = stmt
            .query_row([key], |row| KvEntryRow::try_from(row))
            .optional()?;

        Ok(row)
    }

    pub fn put(conn: &Connection, key: &str, value: &str) -> AppResult<()> {
        conn.execute(
            r#"
                INSERT INTO kv_entries (key, value)
                VALUES (:key, :value)
                ON CONFLICT(key) DO UPDATE SET
                    value = excluded.value,
                    revision = kv_entries.revision + 1,
                    updated_at = CURRENT_TIMESTAMP
            "#,
            named_params! {":key": key, ":value": value},
        )?;

        Ok(())
    }

    /// Inserts only when the key is absent. Returns whether a row was written.
    pub fn put_if_absent(conn: &Connection, key: &str, value: &str) -> AppResult<bool> {
        let written = conn.execute(
            "INSERT OR IGNORE INTO kv_entries (key, value) VALUES (?1, ?2)",
            [key, value],
        )?;
        Ok(written > 0)
    }
}
