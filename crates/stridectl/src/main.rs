//! Stride CLI - learner progression from the terminal.

mod client;
mod display;

use anyhow::Result;
use clap::{Parser, Subcommand};
use client::StridedClient;
use serde_json::json;
use stride_core::rpc::RpcMethod;

#[derive(Parser)]
#[command(name = "stridectl", version, about = "Stride progression tracker CLI")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Daemon health
    Status,
    /// Provision an account
    Create {
        /// Name shown on the ranking
        display_name: String,
        /// Supply an id instead of generating one
        #[arg(long)]
        account_id: Option<String>,
    },
    /// Submit a completion event
    Complete {
        account_id: String,
        /// Points to award
        points: i64,
        #[arg(long, default_value_t = 0)]
        units: i64,
        #[arg(long, default_value_t = 0)]
        perfect: i64,
        #[arg(long, default_value_t = 0)]
        camps: i64,
        #[arg(long, default_value_t = 0)]
        ai_sessions: i64,
        /// Upstream event id for dedup correlation
        #[arg(long)]
        event_id: Option<String>,
    },
    /// Account dashboard
    Snapshot { account_id: String },
    /// Global ranking page
    Top {
        #[arg(long, default_value_t = 0)]
        offset: usize,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// One account's rank
    Rank { account_id: String },
    /// Badge catalog with earned status
    Badges { account_id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut client = StridedClient::connect().await?;

    match cli.command {
        Command::Status => {
            let status = client.call(RpcMethod::Status, None).await?;
            display::render_status(&status);
        }
        Command::Create {
            display_name,
            account_id,
        } => {
            let result = client
                .call(
                    RpcMethod::CreateAccount,
                    Some(json!({"account_id": account_id, "display_name": display_name})),
                )
                .await?;
            println!("Created account {}", result["account_id"]);
        }
        Command::Complete {
            account_id,
            points,
            units,
            perfect,
            camps,
            ai_sessions,
            event_id,
        } => {
            let result = client
                .call(
                    RpcMethod::ApplyCompletion,
                    Some(json!({
                        "account_id": account_id,
                        "points_awarded": points,
                        "stat_deltas": {
                            "units_completed": units,
                            "perfect_scores": perfect,
                            "camps_completed": camps,
                            "ai_sessions": ai_sessions,
                        },
                        "event_id": event_id,
                    })),
                )
                .await?;
            display::render_completion(&result);
        }
        Command::Snapshot { account_id } => {
            let snapshot = client
                .call(RpcMethod::GetSnapshot, Some(json!({"account_id": account_id})))
                .await?;
            display::render_snapshot(&snapshot);
        }
        Command::Top { offset, limit } => {
            let page = client
                .call(RpcMethod::GetPage, Some(json!({"offset": offset, "limit": limit})))
                .await?;
            display::render_page(&page, offset);
        }
        Command::Rank { account_id } => {
            let result = client
                .call(RpcMethod::GetRank, Some(json!({"account_id": account_id})))
                .await?;
            println!("#{} {}", result["rank"], result["account_id"].as_str().unwrap_or(""));
        }
        Command::Badges { account_id } => {
            let result = client
                .call(RpcMethod::ListBadges, Some(json!({"account_id": account_id})))
                .await?;
            display::render_badges(&result);
        }
    }

    Ok(())
}
