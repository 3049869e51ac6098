//! v001 -- Initial schema creation.
//!
//! Creates `creators` (identity store) and `tips` (ledger).  A creator's
//! channel identity is a pair of optional keys, `channel_id` (legacy) and
//! `youtube_channel_id` (OAuth-linked).  Each column is unique on its own;
//! the triggers extend uniqueness across the two columns so that a value
//! bound in one key space cannot be claimed by a different creator in the
//! other.  A creator may hold the same value in both of its own columns.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Creators
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS creators (
    id                    TEXT PRIMARY KEY NOT NULL,  -- UUID v4
    channel_id            TEXT UNIQUE,                -- legacy identifier, NULLs allowed
    youtube_channel_id    TEXT UNIQUE,                -- OAuth identifier, NULLs allowed
    youtube_channel_name  TEXT,
    wallet_address        TEXT NOT NULL UNIQUE,
    default_tip_amount    REAL,
    youtube_connected     INTEGER NOT NULL DEFAULT 0, -- boolean 0/1
    youtube_access_token  TEXT,
    youtube_refresh_token TEXT,
    registered_at         TEXT NOT NULL,              -- RFC-3339, UTC, micros
    connected_at          TEXT
);

CREATE TRIGGER IF NOT EXISTS creators_legacy_id_cross_insert
BEFORE INSERT ON creators
WHEN NEW.channel_id IS NOT NULL
 AND EXISTS (SELECT 1 FROM creators WHERE youtube_channel_id = NEW.channel_id)
BEGIN
    SELECT RAISE(ABORT, 'creators.channel_id already bound to another creator');
END;

CREATE TRIGGER IF NOT EXISTS creators_youtube_id_cross_insert
BEFORE INSERT ON creators
WHEN NEW.youtube_channel_id IS NOT NULL
 AND EXISTS (SELECT 1 FROM creators WHERE channel_id = NEW.youtube_channel_id)
BEGIN
    SELECT RAISE(ABORT, 'creators.youtube_channel_id already bound to another creator');
END;

CREATE TRIGGER IF NOT EXISTS creators_legacy_id_cross_update
BEFORE UPDATE OF channel_id ON creators
WHEN NEW.channel_id IS NOT NULL
 AND EXISTS (SELECT 1 FROM creators WHERE youtube_channel_id = NEW.channel_id AND id <> NEW.id)
BEGIN
    SELECT RAISE(ABORT, 'creators.channel_id already bound to another creator');
END;

CREATE TRIGGER IF NOT EXISTS creators_youtube_id_cross_update
BEFORE UPDATE OF youtube_channel_id ON creators
WHEN NEW.youtube_channel_id IS NOT NULL
 AND EXISTS (SELECT 1 FROM creators WHERE channel_id = NEW.youtube_channel_id AND id <> NEW.id)
BEGIN
    SELECT RAISE(ABORT, 'creators.youtube_channel_id already bound to another creator');
END;

-- ----------------------------------------------------------------
-- Tips (append-only)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS tips (
    id          TEXT PRIMARY KEY NOT NULL,    -- UUID v4
    from_wallet TEXT NOT NULL,
    to_wallet   TEXT NOT NULL,
    channel_id  TEXT NOT NULL,
    amount      REAL NOT NULL,
    signature   TEXT NOT NULL,
    timestamp   TEXT NOT NULL                 -- RFC-3339, UTC, micros
);

CREATE INDEX IF NOT EXISTS idx_tips_channel_ts ON tips(channel_id, timestamp DESC);
CREATE INDEX IF NOT EXISTS idx_tips_to_wallet_ts ON tips(to_wallet, timestamp DESC);

CREATE TRIGGER IF NOT EXISTS tips_no_update
BEFORE UPDATE ON tips
BEGIN
    SELECT RAISE(ABORT, 'tips are immutable');
END;

CREATE TRIGGER IF NOT EXISTS tips_no_delete
BEFORE DELETE ON tips
BEGIN
    SELECT RAISE(ABORT, 'tips are immutable');
END;
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
