//! Domain model structs persisted in the SQLite database.
//!
//! Structs serialize with camelCase field names because they are returned
//! as-is by the HTTP API.

use amplify_shared::ChannelIdentity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Creator
// ---------------------------------------------------------------------------

/// A registered payee identity binding channel ids to one wallet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Creator {
    /// Surrogate identifier, assigned at creation.
    pub id: Uuid,
    /// Legacy channel id, set by direct registration.
    pub channel_id: Option<String>,
    /// YouTube channel id, set by OAuth linking.
    pub youtube_channel_id: Option<String>,
    /// YouTube channel title, present once linking succeeded.
    pub youtube_channel_name: Option<String>,
    /// Wallet receiving tips.  Unique across creators.
    pub wallet_address: String,
    /// Default amount suggested to supporters.
    pub default_tip_amount: Option<f64>,
    /// Whether a YouTube channel has been linked.
    pub youtube_connected: bool,
    /// OAuth access token.  Never sent to clients.
    #[serde(skip)]
    pub youtube_access_token: Option<String>,
    /// OAuth refresh token.  Never sent to clients.
    #[serde(skip)]
    pub youtube_refresh_token: Option<String>,
    pub registered_at: DateTime<Utc>,
    pub connected_at: Option<DateTime<Utc>>,
}

impl Creator {
    /// A creator registered through the legacy path: OAuth fields unset.
    pub fn new_legacy(channel_id: impl Into<String>, wallet_address: impl Into<String>) -> Self {
        Self {
            channel_id: Some(channel_id.into()),
            ..Self::unregistered(wallet_address, Utc::now())
        }
    }

    /// A creator holding only a wallet, before any channel id is bound.
    pub fn unregistered(wallet_address: impl Into<String>, registered_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            channel_id: None,
            youtube_channel_id: None,
            youtube_channel_name: None,
            wallet_address: wallet_address.into(),
            default_tip_amount: None,
            youtube_connected: false,
            youtube_access_token: None,
            youtube_refresh_token: None,
            registered_at,
            connected_at: None,
        }
    }

    /// The creator's channel ids as one value.
    pub fn identity(&self) -> ChannelIdentity {
        ChannelIdentity {
            legacy: self.channel_id.clone(),
            youtube: self.youtube_channel_id.clone(),
        }
    }
}

/// OAuth-derived fields written when a YouTube channel is linked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YoutubeLink {
    pub channel_id: String,
    pub channel_name: String,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub connected_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Tip
// ---------------------------------------------------------------------------

/// One recorded transfer.  Immutable once stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Tip {
    pub id: Uuid,
    pub from_wallet: String,
    pub to_wallet: String,
    /// Channel id the tip was attributed to, as supplied by the supporter.
    pub channel_id: String,
    pub amount: f64,
    /// Opaque proof string, stored without verification.
    pub signature: String,
    pub timestamp: DateTime<Utc>,
}

/// Count and sum of the tips attributed to one channel id.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TipTotals {
    pub count: u64,
    pub sum: f64,
}

// ---------------------------------------------------------------------------
// Column encoding
// ---------------------------------------------------------------------------

/// Encode a timestamp for storage.  Fixed microsecond precision keeps the
/// lexical order of the column equal to chronological order.
pub(crate) fn encode_time(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}

/// Decode column `idx` of `row` as an RFC-3339 timestamp.
pub(crate) fn decode_time(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    parse_time(idx, &raw)
}

/// Decode nullable column `idx` of `row` as an RFC-3339 timestamp.
pub(crate) fn decode_opt_time(
    row: &rusqlite::Row<'_>,
    idx: usize,
) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| parse_time(idx, &s)).transpose()
}

pub(crate) fn decode_uuid(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let raw: String = row.get(idx)?;
    Uuid::parse_str(&raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn parse_time(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}
