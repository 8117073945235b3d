use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rusqlite::Connection;
use tracing::info;

use crate::error::{AppError, AppResult};

pub mod migrations;

pub mod repositories;

const SCHEMA_SQL: &str = include_str!("schema.sql");

/// One SQLite connection per database file, shared by every store handle
/// cloned from this pool. Schema and migrations run once, when it opens.
#[derive(Clone, Debug)]
pub struct DbPool {
    conn: Arc<Mutex<Connection>>,
}

impl DbPool {
    pub fn new<P: Into<PathBuf>>(path: P) -> AppResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(&path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.execute_batch(SCHEMA_SQL)?;
        migrations::run(&conn)?;

        info!(
            target: "app::db",
            db_path = %path.display(),
            schema_version = migrations::current_version(&conn)?,
            "kv database ready"
        );

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Runs `callback` with exclusive use of the connection. Blocking; async
    /// callers go through `spawn_blocking`.
    pub fn with_connection<F, T>(&self, callback: F) -> AppResult<T>
    where
        F: FnOnce(&Connection) -> AppResult<T>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|_| AppError::database("kv connection lock poisoned"))?;
        callback(&conn)
    }
}
