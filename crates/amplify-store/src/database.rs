//! The SQLite handle.
//!
//! A [`Database`] is only handed out after migrations have run.  The server
//! opens one at startup and shares it behind a mutex; dropping it at
//! shutdown closes the connection.

use std::path::{Path, PathBuf};

use rusqlite::Connection;

use crate::error::Result;
use crate::migrations;

/// Owns the connection; CRUD helpers live in `creators` and `tips`.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database file at `path`, creating it and any missing parent
    /// directories.
    pub fn open_at(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        tracing::info!(path = %path.display(), "opening database");

        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        Self::init(conn)
    }

    /// Open a private in-memory database.  Used by tests and tooling.
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;

        migrations::run_migrations(&conn)?;

        Ok(Self { conn })
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Mutable access, for opening transactions.
    pub fn conn_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }

    /// File backing the connection; `None` for in-memory databases.
    pub fn path(&self) -> Option<PathBuf> {
        self.conn
            .path()
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
    }

    /// Confirm the connection answers queries against the schema.
    pub fn ping(&self) -> Result<()> {
        self.conn
            .query_row("SELECT EXISTS(SELECT 1 FROM creators)", [], |row| {
                row.get::<_, bool>(0)
            })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;

    #[test]
    fn test_open_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("amplify.db");

        let db = Database::open_at(&path).expect("should open");
        assert!(db.path().is_some());
        assert!(path.exists());
        db.ping().unwrap();
    }

    #[test]
    fn test_reopen_keeps_schema_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("amplify.db");

        drop(Database::open_at(&path).unwrap());
        let db = Database::open_at(&path).unwrap();

        let version: u32 = db
            .conn()
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .unwrap();
        assert_eq!(version, migrations::CURRENT_VERSION);
    }

    #[test]
    fn test_in_memory_has_no_path() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.path().is_none());
        db.ping().unwrap();
    }

    #[test]
    fn test_ping_fails_without_schema() {
        let db = Database::open_in_memory().unwrap();
        db.conn().execute_batch("DROP TABLE creators").unwrap();
        assert!(matches!(db.ping(), Err(StoreError::Sqlite(_))));
    }
}
