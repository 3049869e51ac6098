//! Schema migrations.
//!
//! Each entry in [`MIGRATIONS`] moves the schema from version `n - 1` to `n`
//! and is recorded in the `user_version` pragma, so opening a database only
//! applies what it has not seen yet.

pub mod v001_initial;

use rusqlite::Connection;

use crate::error::{Result, StoreError};

type Migration = fn(&Connection) -> rusqlite::Result<()>;

/// Ordered migrations; the index + 1 is the version each one produces.
const MIGRATIONS: &[(&str, Migration)] = &[("v001_initial", v001_initial::up)];

/// Schema version after every migration has been applied.
pub const CURRENT_VERSION: u32 = MIGRATIONS.len() as u32;

/// Bring the schema behind `conn` up to [`CURRENT_VERSION`].
pub fn run_migrations(conn: &Connection) -> Result<()> {
    let found: u32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    tracing::debug!(found, latest = CURRENT_VERSION, "schema version");

    for (version, (name, up)) in (1u32..).zip(MIGRATIONS) {
        if version <= found {
            continue;
        }
        tracing::info!(migration = name, "applying migration");
        up(conn).map_err(|e| StoreError::Migration(format!("{name}: {e}")))?;
        conn.pragma_update(None, "user_version", version)?;
    }

    Ok(())
}
