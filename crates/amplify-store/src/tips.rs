//! Append-only ledger of [`Tip`] records.
//!
//! There is no update or delete path; the schema rejects both.

use rusqlite::params;

use crate::database::Database;
use crate::error::Result;
use crate::models::{decode_time, decode_uuid, encode_time, Tip, TipTotals};

const TIP_COLUMNS: &str = "id, from_wallet, to_wallet, channel_id, amount, signature, timestamp";

impl Database {
    /// Append a tip to the ledger.
    pub fn insert_tip(&self, tip: &Tip) -> Result<()> {
        self.conn().execute(
            &format!("INSERT INTO tips ({TIP_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"),
            params![
                tip.id.to_string(),
                tip.from_wallet,
                tip.to_wallet,
                tip.channel_id,
                tip.amount,
                tip.signature,
                encode_time(&tip.timestamp),
            ],
        )?;
        Ok(())
    }

    /// Tips attributed to `channel_id`, newest first, at most `limit` rows.
    pub fn list_tips_for_channel(&self, channel_id: &str, limit: u32) -> Result<Vec<Tip>> {
        self.query_tips("channel_id", channel_id, limit)
    }

    /// Tips received by `wallet_address`, newest first, at most `limit` rows.
    pub fn list_tips_for_wallet(&self, wallet_address: &str, limit: u32) -> Result<Vec<Tip>> {
        self.query_tips("to_wallet", wallet_address, limit)
    }

    /// Count and sum of every tip attributed to `channel_id`.
    pub fn channel_tip_totals(&self, channel_id: &str) -> Result<TipTotals> {
        let (count, sum): (i64, f64) = self.conn().query_row(
            "SELECT COUNT(*), COALESCE(SUM(amount), 0.0) FROM tips WHERE channel_id = ?1",
            params![channel_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(TipTotals {
            count: count as u64,
            sum,
        })
    }

    /// `column` is always one of the fixed names above, never caller input.
    fn query_tips(&self, column: &str, value: &str, limit: u32) -> Result<Vec<Tip>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {TIP_COLUMNS} FROM tips
             WHERE {column} = ?1
             ORDER BY timestamp DESC, rowid DESC
             LIMIT ?2"
        ))?;

        let rows = stmt.query_map(params![value, limit], row_to_tip)?;

        let mut tips = Vec::new();
        for row in rows {
            tips.push(row?);
        }
        Ok(tips)
    }
}

/// Map a `rusqlite::Row` selected with `TIP_COLUMNS` to a [`Tip`].
fn row_to_tip(row: &rusqlite::Row<'_>) -> rusqlite::Result<Tip> {
    Ok(Tip {
        id: decode_uuid(row, 0)?,
        from_wallet: row.get(1)?,
        to_wallet: row.get(2)?,
        channel_id: row.get(3)?,
        amount: row.get(4)?,
        signature: row.get(5)?,
        timestamp: decode_time(row, 6)?,
    })
}
