//! Creator identity reconciliation.
//!
//! Creators arrive through two registration paths: legacy direct
//! registration (channel id + wallet) and YouTube OAuth linking (wallet +
//! resolved channel).  This service keeps the wallet and channel id
//! bindings unique across both paths and checks every ledger write against
//! the identity it claims.
//!
//! A creator who uses both paths keeps both identifiers: the legacy channel
//! id stays bound alongside the YouTube one and either resolves to the same
//! creator.  No merge between two existing creators is ever attempted.

use amplify_shared::CreatorLookup;
use amplify_store::{Creator, LinkOutcome, StoreError, Tip, YoutubeLink};
use chrono::Utc;
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::ServerError;
use crate::oauth::LinkedChannel;
use crate::SharedDatabase;

/// A tip as submitted by a supporter.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTip {
    pub from_wallet: String,
    pub to_wallet: String,
    pub channel_id: String,
    pub amount: f64,
    pub signature: String,
}

#[derive(Clone)]
pub struct IdentityService {
    db: SharedDatabase,
}

impl IdentityService {
    pub fn new(db: SharedDatabase) -> Self {
        Self { db }
    }

    /// Register a creator through the legacy path.
    ///
    /// Uniqueness of both the channel id (in either key space) and the
    /// wallet is enforced by the store in the same statement as the insert.
    pub async fn register_legacy(
        &self,
        channel_id: &str,
        wallet_address: &str,
    ) -> Result<Creator, ServerError> {
        require("channelId", channel_id)?;
        require("walletAddress", wallet_address)?;

        let creator = Creator::new_legacy(channel_id, wallet_address);

        let db = self.db.lock().await;
        db.insert_creator(&creator).map_err(|e| {
            if matches!(e, StoreError::Conflict(_)) {
                warn!(channel_id, wallet = wallet_address, error = %e, "Registration rejected");
            }
            ServerError::from(e)
        })?;

        info!(
            creator_id = %creator.id,
            channel_id = %channel_id,
            wallet = %wallet_address,
            "Creator registered"
        );
        Ok(creator)
    }

    /// Bind a resolved YouTube channel to `wallet_address`.
    ///
    /// Rejected when any other wallet already holds the channel id.  An
    /// unknown wallet gets a new creator; a known one (including one
    /// registered through the legacy path) is updated in place.
    pub async fn link_youtube(
        &self,
        wallet_address: &str,
        channel: LinkedChannel,
    ) -> Result<Creator, ServerError> {
        require("wallet_address", wallet_address)?;

        let link = YoutubeLink {
            channel_id: channel.channel_id,
            channel_name: channel.channel_name,
            access_token: channel.access_token,
            refresh_token: channel.refresh_token,
            connected_at: Utc::now(),
        };

        let mut db = self.db.lock().await;
        let (creator, outcome) = db.link_youtube(wallet_address, &link).map_err(|e| match e {
            StoreError::Conflict(_) => ServerError::Conflict(
                "This YouTube channel is already connected to another wallet".into(),
            ),
            other => ServerError::from(other),
        })?;

        if creator.identity().is_dual() {
            info!(
                creator_id = %creator.id,
                legacy_channel_id = ?creator.channel_id,
                youtube_channel_id = %link.channel_id,
                "Creator now addressable by both legacy and YouTube channel ids"
            );
        }

        info!(
            creator_id = %creator.id,
            wallet = %wallet_address,
            youtube_channel_id = %link.channel_id,
            created = outcome == LinkOutcome::Created,
            "YouTube channel linked"
        );
        Ok(creator)
    }

    /// Change the default tip amount of the creator owning `wallet_address`.
    pub async fn update_settings(
        &self,
        wallet_address: &str,
        default_tip_amount: f64,
    ) -> Result<f64, ServerError> {
        if !default_tip_amount.is_finite() {
            return Err(ServerError::BadRequest(
                "defaultTipAmount must be a number".into(),
            ));
        }

        let db = self.db.lock().await;
        if !db.set_default_tip_amount(wallet_address, default_tip_amount)? {
            return Err(ServerError::NotFound("Creator not found".into()));
        }

        info!(wallet = %wallet_address, default_tip_amount, "Creator settings updated");
        Ok(default_tip_amount)
    }

    /// Find the creator addressed by a channel id or a wallet.
    pub async fn resolve_creator(&self, lookup: &CreatorLookup) -> Result<Creator, ServerError> {
        let db = self.db.lock().await;
        let creator = match lookup {
            CreatorLookup::Channel(channel_id) => db.find_creator_by_channel(channel_id)?,
            CreatorLookup::Wallet(wallet) => match db.get_creator_by_wallet(wallet) {
                Ok(creator) => Some(creator),
                Err(StoreError::NotFound) => None,
                Err(e) => return Err(e.into()),
            },
        };
        creator.ok_or_else(|| ServerError::NotFound("Creator not found".into()))
    }

    /// Append a tip to the ledger after checking it against the identity
    /// store.  The channel must resolve and its wallet must be the
    /// recipient.
    pub async fn record_tip(&self, new_tip: NewTip) -> Result<Tip, ServerError> {
        if !(new_tip.amount.is_finite() && new_tip.amount > 0.0) {
            return Err(ServerError::BadRequest(
                "amount must be a positive number".into(),
            ));
        }

        let db = self.db.lock().await;
        let creator = db
            .find_creator_by_channel(&new_tip.channel_id)?
            .ok_or_else(|| ServerError::NotFound("Channel not registered".into()))?;

        if creator.wallet_address != new_tip.to_wallet {
            warn!(
                channel_id = %new_tip.channel_id,
                to_wallet = %new_tip.to_wallet,
                "Tip rejected: recipient is not the channel's wallet"
            );
            return Err(ServerError::BadRequest("Wallet address mismatch".into()));
        }

        let tip = Tip {
            id: Uuid::new_v4(),
            from_wallet: new_tip.from_wallet,
            to_wallet: new_tip.to_wallet,
            channel_id: new_tip.channel_id,
            amount: new_tip.amount,
            signature: new_tip.signature,
            timestamp: Utc::now(),
        };
        db.insert_tip(&tip)?;

        info!(
            tip_id = %tip.id,
            channel_id = %tip.channel_id,
            amount = tip.amount,
            "Tip recorded"
        );
        Ok(tip)
    }
}

fn require(field: &str, value: &str) -> Result<(), ServerError> {
    if value.trim().is_empty() {
        return Err(ServerError::BadRequest(format!("{field} is required")));
    }
    Ok(())
}
