//! # Roster CLI
//!
//! Command-line client for the Roster people directory.
//!
//! ```bash
//! roster login
//! roster people list --page 2 --limit 10
//! roster people add --photo ./me.png
//! roster --format json people search ada
//! roster people export --format csv --out people.csv
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};

mod commands;
mod config;
mod output;
mod prompt;
mod state;
mod telemetry;

use config::AppConfig;
use output::OutputFormat;
use roster_shared::dto::ExportFormat;
use state::{AppState, Connectivity};
use telemetry::TelemetryConfig;

#[derive(Parser)]
#[command(name = "roster")]
#[command(version)]
#[command(about = "Manage the Roster people directory", long_about = None)]
struct Cli {
    /// API base URL (overrides ROSTER_API_URL)
    #[arg(long)]
    api_url: Option<String>,

    /// Output format
    #[arg(long, short, value_enum, default_value = "table")]
    format: OutputFormat,

    /// Treat the network as unavailable
    #[arg(long)]
    offline: bool,

    /// Keep the session and drafts in memory for this run only
    #[arg(long)]
    ephemeral: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the API is reachable
    Health,
    /// Create an account and sign in
    Register,
    /// Sign in
    Login,
    /// Sign out and forget the stored token
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Upload an image and print its URL
    Upload { path: PathBuf },
    /// Manage people
    People {
        #[command(subcommand)]
        action: PeopleCommands,
    },
}

#[derive(Subcommand)]
enum PeopleCommands {
    /// List people, optionally one page at a time
    List {
        #[arg(long)]
        page: Option<u32>,
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Show one person
    Show { id: String },
    /// Add a person interactively
    Add {
        /// Image to use as the photo
        #[arg(long)]
        photo: Option<PathBuf>,
    },
    /// Edit a person interactively
    Edit { id: String },
    /// Delete a person
    Delete {
        id: String,
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },
    /// Search people by name, address or phone
    Search { query: String },
    /// Export the directory
    Export {
        #[arg(long, value_enum)]
        format: ExportArg,
        /// Write to a file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ExportArg {
    Csv,
    Json,
}

impl From<ExportArg> for ExportFormat {
    fn from(arg: ExportArg) -> Self {
        match arg {
            ExportArg::Csv => ExportFormat::Csv,
            ExportArg::Json => ExportFormat::Json,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present
    dotenvy::dotenv().ok();

    telemetry::init_telemetry(&TelemetryConfig::from_env());

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = ?e, "Command failed");
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = AppConfig::from_env();
    if let Some(api_url) = cli.api_url {
        config.api_url = api_url;
    }

    let state = AppState::new(&config, cli.ephemeral)?;

    let connectivity = match (&cli.command, cli.offline) {
        (_, true) => Connectivity::Forced,
        (Commands::Health, false) => Connectivity::Assume,
        _ => Connectivity::Probe,
    };
    state.connect(connectivity).await;

    let format = cli.format;
    match cli.command {
        Commands::Health => commands::auth::health(&state, format).await,
        Commands::Register => commands::auth::register(&state, format).await,
        Commands::Login => commands::auth::login(&state, format).await,
        Commands::Logout => commands::auth::logout(&state, format).await,
        Commands::Whoami => commands::auth::whoami(&state, format).await,
        Commands::Upload { path } => commands::people::upload(&state, &path, format).await,
        Commands::People { action } => commands::people::handle(action, &state, format).await,
    }
}
