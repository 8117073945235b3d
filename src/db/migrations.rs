use chrono::Utc;
use rusqlite::Connection;
use tracing::info;

use crate::error::AppResult;

const USER_VERSION: i32 = 1;

pub fn run(conn: &Connection) -> AppResult<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS migration_history (
            version INTEGER PRIMARY KEY,
            description TEXT NOT NULL,
            applied_at TEXT NOT NULL
        );
        "#,
    )?;

    let mut current_version: i32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;

    if current_version < 1 {
        info!(target: "app::db", version = current_version, "running migration v1");
        migrate_to_v1(conn)?;
        current_version = 1;
        conn.execute_batch(&format!("PRAGMA user_version = {}", current_version))?;
        record_migration(conn, 1, "Add revision counter to kv entries")?;
    }

    if current_version != USER_VERSION {
        conn.execute_batch(&format!("PRAGMA user_version = {}", USER_VERSION))?;
    }

    Ok(())
}

fn migrate_to_v1(conn: &Connection) -> AppResult<()> {
    conn.execute_batch(
        "ALTER TABLE kv_entries ADD COLUMN revision INTEGER NOT NULL DEFAULT 0;",
    )?;
    Ok(())
}

fn record_migration(conn: &Connection, version: i32, description: &str) -> AppResult<()> {
    let now = Utc::now().to_rfc3339();
    conn.execute(
        "INSERT OR REPLACE INTO migration_history (version, description, applied_at) VALUES (?1, ?2, ?3)",
        (version, description, now),
    )?;
    Ok(())
}

pub fn current_version(conn: &Connection) -> AppResult<i32> {
    let version = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    Ok(version)
}
