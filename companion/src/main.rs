//! Avatar Companion binary
//!
//! # Usage
//!
//! ```bash
//! # Talk to a relay on the default port
//! avatar-companion
//!
//! # Remote relay, chat only
//! avatar-companion --relay-url http://10.0.0.5:3000 --no-avatar
//! ```
//!
//! Type a message and press enter to chat. `/wave` summons the avatar,
//! `/status` prints its pose state, `/quit` exits.

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tokio::io::BufReader;
use tracing::info;

use avatar_companion::{AppConfig, CompanionApp, RelayClient};

/// Terminal companion for the chat relay
#[derive(Parser, Debug)]
#[command(name = "avatar-companion")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Chat relay base URL
    #[arg(
        short = 'r',
        long,
        env = "COMPANION_RELAY_URL",
        default_value = "http://127.0.0.1:3000"
    )]
    relay_url: String,

    /// Animation frame rate
    #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u32).range(1..=240))]
    fps: u32,

    /// Seed for the blink schedule
    #[arg(long)]
    seed: Option<u64>,

    /// Run without an avatar rig (chat only)
    #[arg(long)]
    no_avatar: bool,

    /// Relay request timeout in seconds
    #[arg(long, default_value_t = 60)]
    timeout_secs: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, env = "COMPANION_LOG_LEVEL", default_value = "warn")]
    log_level: String,
}

/// Initialize logging on stderr so chat output stays readable
fn init_logging(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!(
            "avatar_companion={level},animator_core={level}"
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level);

    let client = RelayClient::new(&args.relay_url, Duration::from_secs(args.timeout_secs))?;
    let config = AppConfig {
        fps: args.fps,
        seed: args.seed,
        avatar: !args.no_avatar,
        ..AppConfig::default()
    };

    let mut app = CompanionApp::new(client, &config, std::io::stdout());
    app.connect().await;
    info!(persona = app.persona(), fps = config.fps, "Companion started");
    println!("Chatting with {}. /wave to summon, /quit to leave.", app.persona());

    app.run(BufReader::new(tokio::io::stdin())).await
}
