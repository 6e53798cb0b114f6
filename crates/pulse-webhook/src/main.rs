//! One-shot webhook registration: points the Telegram API at this
//! deployment's `/whook` endpoint.

use anyhow::{bail, Context};
use clap::Parser;
use serde::Deserialize;

const WEBHOOK_PATH: &str = "/whook";
const DEFAULT_API_BASE: &str = "https://api.telegram.org";

#[derive(Parser, Debug)]
#[command(name = "pulse-webhook", about = "Registers the bot webhook URL")]
struct Args {
    /// Public base URL; falls back to the WEBHOOK_URL environment variable.
    #[arg(long, default_value = "")]
    url: String,
    #[arg(long, default_value_t = 18)]
    max_connections: u32,
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    drop_pending_updates: bool,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let token = env_value("TELEGRAM_BOT_TOKEN");
    if token.is_empty() {
        bail!("TELEGRAM_BOT_TOKEN is not set");
    }

    let base = if !args.url.trim().is_empty() {
        args.url.trim().to_string()
    } else {
        env_value("WEBHOOK_URL")
    };
    if base.is_empty() {
        bail!("no webhook URL provided (--url or WEBHOOK_URL)");
    }

    let webhook_url = format!("{}{}", base.trim_end_matches('/'), WEBHOOK_PATH);
    let api_base = {
        let value = env_value("TELEGRAM_API_BASE");
        if value.is_empty() {
            DEFAULT_API_BASE.to_string()
        } else {
            value
        }
    };
    let endpoint = format!("{api_base}/bot{token}/setWebhook");

    println!("Setting webhook to {webhook_url}");

    let client = reqwest::Client::builder()
        .build()
        .context("failed to build HTTP client")?;
    let params = [
        ("url", webhook_url.clone()),
        ("max_connections", args.max_connections.to_string()),
        ("drop_pending_updates", args.drop_pending_updates.to_string()),
    ];
    let response = client
        .post(&endpoint)
        .form(&params)
        .send()
        .await
        .context("webhook request failed")?;
    let result: ApiResponse = response
        .json()
        .await
        .context("invalid Telegram API response")?;

    if result.ok {
        println!("Webhook set successfully");
        Ok(())
    } else {
        bail!(
            "failed to set webhook: {}",
            result.description.unwrap_or_else(|| "unknown error".to_string())
        )
    }
}

fn env_value(key: &str) -> String {
    std::env::var(key)
        .map(|value| value.trim().to_string())
        .unwrap_or_default()
}
