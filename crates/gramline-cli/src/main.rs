//! gramline - a fast terminal client for Instagram.
//!
//! Authenticate once, keep the session on disk, and read or post from the
//! terminal. All remote work lives in `gramline-core`; this binary only
//! parses arguments and renders results.

mod commands;
mod output;

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "gramline", version, about = "A fast terminal client for Instagram")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Login and save a session for later commands
    Login {
        /// Username (prompted when omitted)
        #[arg(short, long)]
        username: Option<String>,
    },

    /// Logout and remove the saved session
    Logout,

    /// Show follower/following/post counts for your account
    Stats,

    /// Show the profile you are logged in as
    Whoami,

    /// Look up a user's profile
    User {
        /// Username to look up (with or without a leading @)
        username: String,
    },

    /// Search for users
    Search {
        /// Search term (username or name)
        query: String,

        /// Maximum number of results to show
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },

    /// Show recent posts from your timeline
    Feed {
        /// Number of posts to show
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },

    /// Post a photo with an optional caption
    Post {
        /// Path to the photo file (JPG, JPEG, or PNG)
        photo: PathBuf,

        /// Caption for the photo
        #[arg(short, long, default_value = "")]
        caption: String,
    },
}

/// Initialize the tracing subscriber for logging.
/// Use RUST_LOG to control the level (e.g. RUST_LOG=debug).
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Login { username } => commands::login(username).await,
        Commands::Logout => commands::logout(),
        Commands::Stats => commands::stats().await,
        Commands::Whoami => commands::whoami().await,
        Commands::User { username } => commands::user(&username).await,
        Commands::Search { query, limit } => commands::search(&query, limit).await,
        Commands::Feed { limit } => commands::feed(limit).await,
        Commands::Post { photo, caption } => commands::post(&photo, &caption).await,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            output::error(&format!("{err:#}"));
            ExitCode::FAILURE
        }
    }
}
