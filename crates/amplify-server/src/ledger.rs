//! Read paths over the tip ledger: per-channel and per-wallet listings and
//! channel statistics, plus the public creator profile view.

use amplify_shared::constants::{DEFAULT_TIP_AMOUNT, DEFAULT_TIP_LIST_LIMIT, MAX_TIP_LIST_LIMIT};
use amplify_store::{Creator, Tip};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::ServerError;
use crate::SharedDatabase;

/// Aggregate view returned by `GET /stats/{channelId}`.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChannelStats {
    /// The channel id as requested.
    pub channel_id: String,
    pub channel_name: Option<String>,
    pub total_tips: u64,
    pub total_amount: f64,
    pub default_tip_amount: f64,
    pub wallet_address: String,
}

/// Public view of a creator returned by `GET /creator`.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreatorProfile {
    /// YouTube channel id once linked, otherwise the legacy one.
    pub channel_id: Option<String>,
    pub channel_name: Option<String>,
    pub wallet_address: String,
    pub default_tip_amount: f64,
    pub youtube_connected: bool,
    pub registered_at: DateTime<Utc>,
}

impl From<&Creator> for CreatorProfile {
    fn from(creator: &Creator) -> Self {
        Self {
            channel_id: creator.identity().primary().map(str::to_string),
            channel_name: creator.youtube_channel_name.clone(),
            wallet_address: creator.wallet_address.clone(),
            default_tip_amount: creator.default_tip_amount.unwrap_or(DEFAULT_TIP_AMOUNT),
            youtube_connected: creator.youtube_connected,
            registered_at: creator.registered_at,
        }
    }
}

/// Clamp a caller-supplied list limit into `1..=MAX_TIP_LIST_LIMIT`.
pub fn effective_limit(limit: Option<u32>) -> u32 {
    limit
        .unwrap_or(DEFAULT_TIP_LIST_LIMIT)
        .clamp(1, MAX_TIP_LIST_LIMIT)
}

#[derive(Clone)]
pub struct LedgerService {
    db: SharedDatabase,
}

impl LedgerService {
    pub fn new(db: SharedDatabase) -> Self {
        Self { db }
    }

    pub async fn list_tips_for_channel(
        &self,
        channel_id: &str,
        limit: Option<u32>,
    ) -> Result<Vec<Tip>, ServerError> {
        let db = self.db.lock().await;
        Ok(db.list_tips_for_channel(channel_id, effective_limit(limit))?)
    }

    pub async fn list_tips_for_wallet(
        &self,
        wallet_address: &str,
        limit: Option<u32>,
    ) -> Result<Vec<Tip>, ServerError> {
        let db = self.db.lock().await;
        Ok(db.list_tips_for_wallet(wallet_address, effective_limit(limit))?)
    }

    /// Count and sum of the tips attributed to `channel_id`.
    ///
    /// The channel must resolve to a creator.  Only tips recorded under
    /// this exact id are counted, so a creator with both a legacy and a
    /// YouTube id has separate totals for each.
    pub async fn channel_stats(&self, channel_id: &str) -> Result<ChannelStats, ServerError> {
        let db = self.db.lock().await;
        let creator = db
            .find_creator_by_channel(channel_id)?
            .ok_or_else(|| ServerError::NotFound("Channel not registered".into()))?;
        let totals = db.channel_tip_totals(channel_id)?;

        Ok(ChannelStats {
            channel_id: channel_id.to_string(),
            channel_name: creator.youtube_channel_name,
            total_tips: totals.count,
            total_amount: totals.sum,
            default_tip_amount: creator.default_tip_amount.unwrap_or(DEFAULT_TIP_AMOUNT),
            wallet_address: creator.wallet_address,
        })
    }
}
