//! navwatch entry point.
//!
//! Thin: loads dotenv files, sets up tracing, parses the command line and
//! hands off to `commands`. With no subcommand it performs a full monitor
//! run, which is what the cron entry invokes.

mod commands;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "navwatch")]
#[command(about = "Money-market ETF discount monitor", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Option<Commands>,
}

/// Options shared by every command that loads configuration.
#[derive(Args, Clone, Debug, Default)]
pub struct ConfigArgs {
    /// YAML overlays in merge order, applied on top of the built-in defaults
    #[arg(long = "config")]
    pub config_paths: Vec<String>,

    /// Fund code override (e.g. 511880)
    #[arg(long)]
    pub fund: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Full run: wait for the session, bootstrap, poll until close (default)
    Run(ConfigArgs),

    /// Fetch history and print the snapshot + projected NAV, no polling
    Estimate(ConfigArgs),

    /// Classify a date as trading / non-trading
    CheckDay {
        #[command(flatten)]
        cfg: ConfigArgs,

        /// Date to classify (YYYY-MM-DD); defaults to today in the exchange timezone
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Send a test message through every configured channel
    NotifyTest {
        #[command(flatten)]
        cfg: ConfigArgs,

        #[arg(long, default_value = "navwatch notify test")]
        title: String,

        #[arg(long, default_value = "- channel check from **navwatch**")]
        body: String,
    },

    /// Print the merged config hash and canonical JSON
    ConfigHash(ConfigArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    // Silent if absent; production injects env vars directly.
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::dotenv();

    init_tracing();

    let cli = Cli::parse();
    match cli.cmd.unwrap_or_else(|| Commands::Run(ConfigArgs::default())) {
        Commands::Run(cfg) => commands::run::run_monitor(&cfg).await,
        Commands::Estimate(cfg) => commands::inspect::estimate(&cfg).await,
        Commands::CheckDay { cfg, date } => commands::inspect::check_day(&cfg, date).await,
        Commands::NotifyTest { cfg, title, body } => {
            commands::run::notify_test(&cfg, &title, &body).await
        }
        Commands::ConfigHash(cfg) => commands::inspect::config_hash(&cfg),
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}
