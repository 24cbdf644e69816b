mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, Level};
use tracing_subscriber::EnvFilter;

use lineage::LineageConfig;

#[derive(Parser)]
#[clap(author, version, about)]
struct Cli {
    #[clap(short, long, global = true)]
    log_level: Option<String>,
    /// YAML config file; defaults apply when it does not exist
    #[clap(short, long, global = true, default_value = "lineage.yaml")]
    config: PathBuf,
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a nodes/edges file pair into the database
    Seed {
        #[clap(short, long)]
        nodes: PathBuf,
        #[clap(short, long)]
        edges: PathBuf,
        /// SQLite file; falls back to `storage.database` from the config
        #[clap(short, long)]
        database: Option<String>,
    },
    /// Parse a nodes/edges file pair and report structural problems
    Validate {
        #[clap(short, long)]
        nodes: PathBuf,
        #[clap(short, long)]
        edges: PathBuf,
        /// Also fail on dangling edges and unresolved parents
        #[clap(long)]
        strict: bool,
    },
    /// Write the database contents as nodes.json and edges.json
    Export {
        #[clap(short, long)]
        database: Option<String>,
        #[clap(short, long)]
        out_dir: PathBuf,
        #[clap(long)]
        compact: bool,
    },
    /// Summarise the graph held by the configured storage backend
    Stats,
    Db {
        #[clap(subcommand)]
        command: DbCommands,
    },
}

#[derive(Subcommand, Debug)]
enum DbCommands {
    /// Create or upgrade the schema
    Init {
        #[clap(short, long)]
        database: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Cli::parse();
    setup_logging(&args.log_level);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Cli) -> Result<()> {
    let config = LineageConfig::load(&args.config)?;
    let database_for =
        |database: Option<String>| database.unwrap_or_else(|| config.storage.database.clone());

    match args.command {
        Commands::Seed {
            nodes,
            edges,
            database,
        } => commands::seed(&nodes, &edges, &database_for(database)).await,
        Commands::Validate {
            nodes,
            edges,
            strict,
        } => commands::validate(&nodes, &edges, strict),
        Commands::Export {
            database,
            out_dir,
            compact,
        } => commands::export(&database_for(database), &out_dir, !compact).await,
        Commands::Stats => commands::stats(&config).await,
        Commands::Db { command } => match command {
            DbCommands::Init { database } => commands::init_database(&database_for(database)).await,
        },
    }
}

fn setup_logging(log_level: &Option<String>) {
    let log_level = match log_level
        .as_ref()
        .unwrap_or(&"info".to_string())
        .to_lowercase()
        .as_str()
    {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(format!(
            "sqlx=warn,sea_orm_migration=warn,{}",
            log_level
        )))
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}
