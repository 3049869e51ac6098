use thiserror::Error;

/// Which uniqueness rule a write violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    /// Another creator already owns the wallet address.
    Wallet,
    /// Another creator already owns the channel id (legacy or YouTube).
    Channel,
}

impl std::fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Wallet => f.write_str("wallet address"),
            Self::Channel => f.write_str("channel id"),
        }
    }
}

/// Errors produced by the store layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQLite error.
    #[error("Database error: {0}")]
    Sqlite(rusqlite::Error),

    /// Generic I/O error (e.g. creating the database directory).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A query expected exactly one row but found none.
    #[error("Record not found")]
    NotFound,

    /// A uniqueness constraint rejected the write.
    #[error("Duplicate {0}")]
    Conflict(ConflictKind),

    /// Migration failure.
    #[error("Migration error: {0}")]
    Migration(String),

    /// UUID parsing error.
    #[error("UUID error: {0}")]
    Uuid(#[from] uuid::Error),

    /// Chrono parsing error.
    #[error("Timestamp parse error: {0}")]
    ChronoParse(#[from] chrono::ParseError),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        if matches!(err, rusqlite::Error::QueryReturnedNoRows) {
            return StoreError::NotFound;
        }
        match conflict_kind(&err) {
            Some(kind) => StoreError::Conflict(kind),
            None => StoreError::Sqlite(err),
        }
    }
}

/// Classify a uniqueness failure raised either by a `UNIQUE` index or by
/// the cross-key-space triggers installed in `v001_initial`.
fn conflict_kind(err: &rusqlite::Error) -> Option<ConflictKind> {
    let rusqlite::Error::SqliteFailure(failure, Some(message)) = err else {
        return None;
    };
    if failure.code != rusqlite::ErrorCode::ConstraintViolation {
        return None;
    }
    let is_uniqueness =
        message.starts_with("UNIQUE constraint failed") || message.contains("already bound");
    if !is_uniqueness {
        return None;
    }
    if message.contains("wallet_address") {
        Some(ConflictKind::Wallet)
    } else if message.contains("channel_id") {
        Some(ConflictKind::Channel)
    } else {
        None
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;
