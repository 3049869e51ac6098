//! CRUD operations for [`Creator`] records.

use rusqlite::{params, OptionalExtension, Transaction, TransactionBehavior};

use crate::database::Database;
use crate::error::{ConflictKind, Result, StoreError};
use crate::models::{decode_opt_time, decode_time, decode_uuid, encode_time, Creator, YoutubeLink};

const CREATOR_COLUMNS: &str = "id, channel_id, youtube_channel_id, youtube_channel_name, \
     wallet_address, default_tip_amount, youtube_connected, youtube_access_token, \
     youtube_refresh_token, registered_at, connected_at";

/// Which branch [`Database::link_youtube`] took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOutcome {
    /// The wallet had no creator; one was created.
    Created,
    /// The wallet's existing creator was updated.
    Updated,
}

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Insert a new creator.
    ///
    /// Fails with [`StoreError::Conflict`] when the wallet or any of the
    /// channel ids is already bound to another creator.  Channel ids are
    /// checked first, so a request that collides on both reports
    /// [`ConflictKind::Channel`].
    pub fn insert_creator(&self, creator: &Creator) -> Result<()> {
        let tx = Transaction::new_unchecked(self.conn(), TransactionBehavior::Immediate)?;

        for channel_id in creator.identity().ids() {
            if channel_bound(&tx, channel_id)? {
                return Err(StoreError::Conflict(ConflictKind::Channel));
            }
        }
        insert_creator_on(&tx, creator)?;

        tx.commit()?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// Fetch the creator owning `wallet_address`.
    pub fn get_creator_by_wallet(&self, wallet_address: &str) -> Result<Creator> {
        self.conn()
            .query_row(
                &format!("SELECT {CREATOR_COLUMNS} FROM creators WHERE wallet_address = ?1"),
                params![wallet_address],
                row_to_creator,
            )
            .map_err(StoreError::from)
    }

    /// Find the creator bound to `channel_id` in either key space.
    ///
    /// The legacy and YouTube columns are searched together; they are
    /// disjoint across creators so at most one row can match.
    pub fn find_creator_by_channel(&self, channel_id: &str) -> Result<Option<Creator>> {
        let creator = self
            .conn()
            .query_row(
                &format!(
                    "SELECT {CREATOR_COLUMNS} FROM creators
                     WHERE channel_id = ?1 OR youtube_channel_id = ?1
                     LIMIT 1"
                ),
                params![channel_id],
                row_to_creator,
            )
            .optional()?;
        Ok(creator)
    }

    /// List every creator, oldest registration first.
    pub fn list_creators(&self) -> Result<Vec<Creator>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {CREATOR_COLUMNS} FROM creators ORDER BY registered_at ASC"
        ))?;

        let rows = stmt.query_map([], row_to_creator)?;

        let mut creators = Vec::new();
        for row in rows {
            creators.push(row?);
        }
        Ok(creators)
    }

    // ------------------------------------------------------------------
    // Update
    // ------------------------------------------------------------------

    /// Bind a YouTube channel to `wallet_address`, creating the creator if
    /// the wallet is unknown.
    ///
    /// Runs as one immediate transaction: the ownership check against other
    /// wallets happens first, then exactly one of the create/update branches.
    /// A legacy channel id already held by the wallet's creator is kept.
    pub fn link_youtube(
        &mut self,
        wallet_address: &str,
        link: &YoutubeLink,
    ) -> Result<(Creator, LinkOutcome)> {
        let tx = self
            .conn_mut()
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let held_elsewhere: bool = tx.query_row(
            "SELECT EXISTS(
                 SELECT 1 FROM creators
                 WHERE (channel_id = ?1 OR youtube_channel_id = ?1)
                   AND wallet_address <> ?2)",
            params![link.channel_id, wallet_address],
            |row| row.get(0),
        )?;
        if held_elsewhere {
            return Err(StoreError::Conflict(ConflictKind::Channel));
        }

        let existing = tx
            .query_row(
                &format!("SELECT {CREATOR_COLUMNS} FROM creators WHERE wallet_address = ?1"),
                params![wallet_address],
                row_to_creator,
            )
            .optional()?;

        let (creator, outcome) = match existing {
            Some(mut creator) => {
                tx.execute(
                    "UPDATE creators
                     SET youtube_channel_id = ?1,
                         youtube_channel_name = ?2,
                         youtube_access_token = ?3,
                         youtube_refresh_token = ?4,
                         youtube_connected = 1,
                         connected_at = ?5
                     WHERE wallet_address = ?6",
                    params![
                        link.channel_id,
                        link.channel_name,
                        link.access_token,
                        link.refresh_token,
                        encode_time(&link.connected_at),
                        wallet_address,
                    ],
                )?;
                apply_link(&mut creator, link);
                (creator, LinkOutcome::Updated)
            }
            None => {
                let mut creator = Creator::unregistered(wallet_address, link.connected_at);
                apply_link(&mut creator, link);
                insert_creator_on(&tx, &creator)?;
                (creator, LinkOutcome::Created)
            }
        };

        tx.commit()?;
        Ok((creator, outcome))
    }

    /// Set the default tip amount of the creator owning `wallet_address`.
    /// Returns `false` when no creator owns the wallet.
    pub fn set_default_tip_amount(&self, wallet_address: &str, amount: f64) -> Result<bool> {
        let affected = self.conn().execute(
            "UPDATE creators SET default_tip_amount = ?1 WHERE wallet_address = ?2",
            params![amount, wallet_address],
        )?;
        Ok(affected > 0)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Whether any creator holds `channel_id` in either key space.
fn channel_bound(conn: &rusqlite::Connection, channel_id: &str) -> Result<bool> {
    let bound = conn.query_row(
        "SELECT EXISTS(
             SELECT 1 FROM creators WHERE channel_id = ?1 OR youtube_channel_id = ?1)",
        params![channel_id],
        |row| row.get(0),
    )?;
    Ok(bound)
}

fn insert_creator_on(conn: &rusqlite::Connection, creator: &Creator) -> Result<()> {
    conn.execute(
        &format!(
            "INSERT INTO creators ({CREATOR_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"
        ),
        params![
            creator.id.to_string(),
            creator.channel_id,
            creator.youtube_channel_id,
            creator.youtube_channel_name,
            creator.wallet_address,
            creator.default_tip_amount,
            creator.youtube_connected,
            creator.youtube_access_token,
            creator.youtube_refresh_token,
            encode_time(&creator.registered_at),
            creator.connected_at.as_ref().map(encode_time),
        ],
    )?;
    Ok(())
}

fn apply_link(creator: &mut Creator, link: &YoutubeLink) {
    creator.youtube_channel_id = Some(link.channel_id.clone());
    creator.youtube_channel_name = Some(link.channel_name.clone());
    creator.youtube_access_token = Some(link.access_token.clone());
    creator.youtube_refresh_token = link.refresh_token.clone();
    creator.youtube_connected = true;
    creator.connected_at = Some(link.connected_at);
}

/// Map a `rusqlite::Row` selected with `CREATOR_COLUMNS` to a [`Creator`].
fn row_to_creator(row: &rusqlite::Row<'_>) -> rusqlite::Result<Creator> {
    Ok(Creator {
        id: decode_uuid(row, 0)?,
        channel_id: row.get(1)?,
        youtube_channel_id: row.get(2)?,
        youtube_channel_name: row.get(3)?,
        wallet_address: row.get(4)?,
        default_tip_amount: row.get(5)?,
        youtube_connected: row.get(6)?,
        youtube_access_token: row.get(7)?,
        youtube_refresh_token: row.get(8)?,
        registered_at: decode_time(row, 9)?,
        connected_at: decode_opt_time(row, 10)?,
    })
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn link(channel_id: &str) -> YoutubeLink {
        YoutubeLink {
            channel_id: channel_id.to_string(),
            channel_name: format!("{channel_id} name"),
            access_token: "access".to_string(),
            refresh_token: Some("refresh".to_string()),
            connected_at: Utc::now(),
        }
    }

    #[test]
    fn test_insert_and_fetch_by_wallet() {
        let db = Database::open_in_memory().unwrap();
        let creator = Creator::new_legacy("chan1", "walletA");
        db.insert_creator(&creator).unwrap();

        let loaded = db.get_creator_by_wallet("walletA").unwrap();
        assert_eq!(loaded.id, creator.id);
        assert_eq!(loaded.channel_id.as_deref(), Some("chan1"));
        assert!(!loaded.youtube_connected);
        assert!(loaded.connected_at.is_none());
    }

    #[test]
    fn test_missing_wallet_is_not_found() {
        let db = Database::open_in_memory().unwrap();
        assert!(matches!(
            db.get_creator_by_wallet("nobody"),
            Err(StoreError::NotFound)
        ));
    }

    #[test]
    fn test_duplicate_channel_is_conflict() {
        let db = Database::open_in_memory().unwrap();
        db.insert_creator(&Creator::new_legacy("chan1", "walletA")).unwrap();

        let err = db
            .insert_creator(&Creator::new_legacy("chan1", "walletB"))
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(ConflictKind::Channel)));
    }

    #[test]
    fn test_duplicate_wallet_is_conflict() {
        let db = Database::open_in_memory().unwrap();
        db.insert_creator(&Creator::new_legacy("chan1", "walletA")).unwrap();

        let err = db
            .insert_creator(&Creator::new_legacy("chan2", "walletA"))
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(ConflictKind::Wallet)));
    }

    #[test]
    fn test_same_pair_twice_reports_channel() {
        let db = Database::open_in_memory().unwrap();
        db.insert_creator(&Creator::new_legacy("chan1", "walletA")).unwrap();

        let err = db
            .insert_creator(&Creator::new_legacy("chan1", "walletA"))
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(ConflictKind::Channel)));
        assert_eq!(db.list_creators().unwrap().len(), 1);
    }

    #[test]
    fn test_legacy_id_cannot_shadow_youtube_id_of_other_creator() {
        let mut db = Database::open_in_memory().unwrap();
        db.link_youtube("walletA", &link("UC1")).unwrap();

        let err = db
            .insert_creator(&Creator::new_legacy("UC1", "walletB"))
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(ConflictKind::Channel)));
    }

    #[test]
    fn test_youtube_id_cannot_shadow_legacy_id_of_other_creator() {
        let db = Database::open_in_memory().unwrap();
        db.insert_creator(&Creator::new_legacy("UC1", "walletA")).unwrap();

        let mut other = Creator::new_legacy("chan2", "walletB");
        other.youtube_channel_id = Some("UC1".to_string());
        let err = db.insert_creator(&other).unwrap_err();
        assert!(matches!(err, StoreError::Conflict(ConflictKind::Channel)));

        // The schema trigger rejects it even without the pre-insert check.
        let err = insert_creator_on(db.conn(), &other).unwrap_err();
        assert!(matches!(err, StoreError::Conflict(ConflictKind::Channel)));
        assert_eq!(db.list_creators().unwrap().len(), 1);
    }

    #[test]
    fn test_null_channel_ids_do_not_collide() {
        let mut db = Database::open_in_memory().unwrap();
        db.link_youtube("walletA", &link("UC1")).unwrap();
        db.link_youtube("walletB", &link("UC2")).unwrap();

        assert_eq!(db.list_creators().unwrap().len(), 2);
    }

    #[test]
    fn test_find_by_channel_checks_both_key_spaces() {
        let mut db = Database::open_in_memory().unwrap();
        db.insert_creator(&Creator::new_legacy("chan1", "walletA")).unwrap();
        db.link_youtube("walletB", &link("UC2")).unwrap();

        let legacy = db.find_creator_by_channel("chan1").unwrap().unwrap();
        assert_eq!(legacy.wallet_address, "walletA");
        let youtube = db.find_creator_by_channel("UC2").unwrap().unwrap();
        assert_eq!(youtube.wallet_address, "walletB");
        assert!(db.find_creator_by_channel("unknown").unwrap().is_none());
    }

    #[test]
    fn test_link_creates_when_wallet_unknown() {
        let mut db = Database::open_in_memory().unwrap();
        let (creator, outcome) = db.link_youtube("walletA", &link("UC1")).unwrap();

        assert_eq!(outcome, LinkOutcome::Created);
        assert!(creator.channel_id.is_none());
        assert!(creator.youtube_connected);

        let loaded = db.get_creator_by_wallet("walletA").unwrap();
        assert_eq!(loaded.youtube_channel_id.as_deref(), Some("UC1"));
        assert_eq!(loaded.youtube_channel_name.as_deref(), Some("UC1 name"));
        assert_eq!(loaded.youtube_refresh_token.as_deref(), Some("refresh"));
        assert!(loaded.connected_at.is_some());
    }

    #[test]
    fn test_link_updates_legacy_creator_and_keeps_legacy_id() {
        let mut db = Database::open_in_memory().unwrap();
        let legacy = Creator::new_legacy("chan1", "walletA");
        db.insert_creator(&legacy).unwrap();

        let (creator, outcome) = db.link_youtube("walletA", &link("UC1")).unwrap();
        assert_eq!(outcome, LinkOutcome::Updated);
        assert_eq!(creator.id, legacy.id);

        let loaded = db.get_creator_by_wallet("walletA").unwrap();
        assert_eq!(loaded.channel_id.as_deref(), Some("chan1"));
        assert_eq!(loaded.youtube_channel_id.as_deref(), Some("UC1"));
        assert!(loaded.identity().is_dual());
    }

    #[test]
    fn test_link_same_value_as_own_legacy_id() {
        let mut db = Database::open_in_memory().unwrap();
        db.insert_creator(&Creator::new_legacy("UC1", "walletA")).unwrap();

        let (_, outcome) = db.link_youtube("walletA", &link("UC1")).unwrap();
        assert_eq!(outcome, LinkOutcome::Updated);
    }

    #[test]
    fn test_link_rejects_channel_owned_by_other_wallet() {
        let mut db = Database::open_in_memory().unwrap();
        db.link_youtube("walletA", &link("UC1")).unwrap();

        let err = db.link_youtube("walletB", &link("UC1")).unwrap_err();
        assert!(matches!(err, StoreError::Conflict(ConflictKind::Channel)));
        assert!(matches!(
            db.get_creator_by_wallet("walletB"),
            Err(StoreError::NotFound)
        ));
    }

    #[test]
    fn test_relink_same_wallet_replaces_channel() {
        let mut db = Database::open_in_memory().unwrap();
        db.link_youtube("walletA", &link("UC1")).unwrap();
        db.link_youtube("walletA", &link("UC2")).unwrap();

        let loaded = db.get_creator_by_wallet("walletA").unwrap();
        assert_eq!(loaded.youtube_channel_id.as_deref(), Some("UC2"));
        assert!(db.find_creator_by_channel("UC1").unwrap().is_none());
    }

    #[test]
    fn test_set_default_tip_amount_reports_missing_wallet() {
        let db = Database::open_in_memory().unwrap();
        assert!(!db.set_default_tip_amount("walletA", 0.25).unwrap());

        db.insert_creator(&Creator::new_legacy("chan1", "walletA")).unwrap();
        assert!(db.set_default_tip_amount("walletA", 0.25).unwrap());
        assert_eq!(
            db.get_creator_by_wallet("walletA").unwrap().default_tip_amount,
            Some(0.25)
        );
    }
}
