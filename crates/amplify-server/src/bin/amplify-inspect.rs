//! Read-only operator view of an Amplify database.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use amplify_shared::constants::{DEFAULT_TIP_AMOUNT, DEFAULT_TIP_LIST_LIMIT};
use amplify_store::Database;

#[derive(Parser, Debug)]
#[command(name = "amplify-inspect")]
#[command(about = "Inspect creators and tips in an Amplify database", long_about = None)]
struct Cli {
    #[arg(long, env = "DATABASE_PATH", default_value = "./amplify.db")]
    database: PathBuf,

    /// Print JSON instead of a table.
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List every registered creator.
    Creators,
    /// Most recent tips for a channel.
    Tips {
        #[arg(long)]
        channel: String,
        #[arg(long, default_value_t = DEFAULT_TIP_LIST_LIMIT)]
        limit: u32,
    },
    /// Tip count and total for a channel.
    Stats {
        #[arg(long)]
        channel: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let db = Database::open_at(&cli.database)
        .with_context(|| format!("opening {}", cli.database.display()))?;

    match cli.command {
        Command::Creators => {
            let creators = db.list_creators()?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&creators)?);
                return Ok(());
            }
            for c in creators {
                println!(
                    "{}  wallet={}  legacy={}  youtube={}  name={}  default_tip={}",
                    c.id,
                    c.wallet_address,
                    c.channel_id.as_deref().unwrap_or("-"),
                    c.youtube_channel_id.as_deref().unwrap_or("-"),
                    c.youtube_channel_name.as_deref().unwrap_or("-"),
                    c.default_tip_amount.unwrap_or(DEFAULT_TIP_AMOUNT),
                );
            }
        }
        Command::Tips { channel, limit } => {
            let tips = db.list_tips_for_channel(&channel, limit.max(1))?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&tips)?);
                return Ok(());
            }
            for t in tips {
                println!(
                    "{}  {}  {} -> {}  {}",
                    t.timestamp.to_rfc3339(),
                    t.id,
                    t.from_wallet,
                    t.to_wallet,
                    t.amount
                );
            }
        }
        Command::Stats { channel } => {
            let creator = db
                .find_creator_by_channel(&channel)?
                .with_context(|| format!("channel {channel} is not registered"))?;
            let totals = db.channel_tip_totals(&channel)?;
            if cli.json {
                let stats = serde_json::json!({
                    "channelId": channel,
                    "walletAddress": creator.wallet_address,
                    "totalTips": totals.count,
                    "totalAmount": totals.sum,
                });
                println!("{}", serde_json::to_string_pretty(&stats)?);
                return Ok(());
            }
            println!(
                "channel={channel}  wallet={}  tips={}  total={}",
                creator.wallet_address, totals.count, totals.sum
            );
        }
    }

    Ok(())
}
