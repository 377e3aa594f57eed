//! Tablink command-line client
//!
//! # Examples
//!
//! ```bash
//! # Resolve a filter to ids
//! tablink -d proj_big find shot_task --filter '[["pipeline", "=", "comp"]]'
//!
//! # Read fields
//! tablink -d proj_big get shot_task --id 1 --id 2 artist status
//!
//! # Write fields
//! tablink -d proj_big set shot_task --id 1 artist=carol status=Check
//!
//! # History count
//! tablink -d proj_big history shot_task --id 1 --count
//! ```

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tablink::{Client, ClientConfig, Datum, FilterList, Module};
use tracing::{debug, info};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Tablink - query a remote tabular data service
#[derive(Parser, Debug)]
#[command(name = "tablink")]
#[command(version = tablink::VERSION)]
#[command(about = "Tablink - query a remote tabular data service", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Server endpoint, overrides the configuration
    #[arg(long, global = true)]
    server_url: Option<String>,

    /// Authentication token, overrides the configuration
    #[arg(long, global = true)]
    token: Option<String>,

    /// Database name, overrides the configuration
    #[arg(short, long, global = true)]
    database: Option<String>,

    /// Account id used to pick between duplicate matches
    #[arg(long, global = true)]
    account_id: Option<String>,

    /// Also write logs to daily files in this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn", env = "RUST_LOG")]
    log_level: String,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve a filter and print matching ids
    Find {
        /// Module (table) name
        module: String,

        /// Filter in wire form, e.g. '[["status", "=", "Work"]]'
        #[arg(short, long)]
        filter: String,
    },

    /// Print fields of records
    Get {
        #[command(flatten)]
        target: Target,

        /// Field names
        #[arg(required = true)]
        fields: Vec<String>,
    },

    /// Set fields on records
    Set {
        #[command(flatten)]
        target: Target,

        /// Assignments as field=value; values are parsed as JSON when possible
        #[arg(required = true)]
        values: Vec<String>,
    },

    /// Delete records
    Delete {
        #[command(flatten)]
        target: Target,

        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },

    /// Show history of records
    History {
        #[command(flatten)]
        target: Target,

        /// Extra filter in wire form
        #[arg(short, long)]
        filter: Option<String>,

        /// Print the number of records only
        #[arg(long)]
        count: bool,
    },

    /// List pipelines of a module
    Pipelines {
        /// Module (table) name
        module: String,
    },

    /// Show version information
    Version,
}

#[derive(Args, Debug)]
struct Target {
    /// Module (table) name
    module: String,

    /// Record id, repeatable
    #[arg(long = "id", required = true)]
    ids: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(&cli)?;

    if let Commands::Version = cli.command {
        println!("tablink {}", tablink::VERSION);
        return Ok(());
    }

    let config = load_config(&cli)?;
    debug!(server_url = %config.server_url, database = ?config.database, "Configuration loaded");
    let client = Client::from_config(&config)?;
    let database = config
        .database
        .clone()
        .context("No database given; use --database or set it in the configuration")?;
    let db = client.database(database);

    match cli.command {
        Commands::Find { module, filter } => {
            let filters = parse_filter(&filter)?;
            let selection = db.module(module).filter(filters).await?;
            for id in selection.ids() {
                println!("{}", id);
            }
            Ok(())
        }
        Commands::Get { target, fields } => {
            let selection = target.module(&db).select(target.ids.clone());
            let result = selection.get_fields(&fields).await?;
            println!("{}", result.columns().join("\t"));
            for row in &result {
                let cells: Vec<String> = row.iter().map(Datum::to_plain_string).collect();
                println!("{}", cells.join("\t"));
            }
            Ok(())
        }
        Commands::Set { target, values } => {
            let values = values
                .iter()
                .map(|v| parse_assignment(v))
                .collect::<anyhow::Result<Vec<_>>>()?;
            let selection = target.module(&db).select(target.ids.clone());
            selection.set_fields(values).await?;
            info!(records = selection.len(), "Fields set");
            println!("Updated {} record(s)", selection.len());
            Ok(())
        }
        Commands::Delete { target, force } => {
            let module = target.module(&db);
            if !force {
                print!(
                    "Delete {} record(s) from '{}'? (yes/no): ",
                    target.ids.len(),
                    module.name()
                );
                use std::io::{self, Write};
                io::stdout().flush()?;
                let mut input = String::new();
                io::stdin().read_line(&mut input)?;
                if input.trim().to_lowercase() != "yes" {
                    return Ok(());
                }
            }
            module.select(target.ids.clone()).delete().await?;
            println!("Deleted {} record(s)", target.ids.len());
            Ok(())
        }
        Commands::History {
            target,
            filter,
            count,
        } => {
            let extra = filter.as_deref().map(parse_filter).transpose()?;
            let selection = target.module(&db).select(target.ids.clone());
            let history = selection.history();
            if count {
                println!("{}", history.count(extra).await?);
            } else {
                for record in history.get(extra).await? {
                    println!(
                        "{}\t{}\t{}\t{}\t{}",
                        record.time, record.step, record.status, record.create_by, record.text
                    );
                }
            }
            Ok(())
        }
        Commands::Pipelines { module } => {
            for pipeline in db.module(module).pipelines().await? {
                println!("{}\t{}", pipeline.id, pipeline.name);
            }
            Ok(())
        }
        Commands::Version => Ok(()),
    }
}

impl Target {
    fn module(&self, db: &tablink::Database) -> Module {
        db.module(self.module.as_str())
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<ClientConfig> {
    let mut config = ClientConfig::load(cli.config.as_deref())?;
    if let Some(url) = &cli.server_url {
        config.server_url = url.clone();
    }
    if cli.token.is_some() {
        config.token = cli.token.clone();
    }
    if cli.database.is_some() {
        config.database = cli.database.clone();
    }
    if cli.account_id.is_some() {
        config.account_id = cli.account_id.clone();
    }
    Ok(config)
}

fn parse_filter(text: &str) -> anyhow::Result<FilterList> {
    let value: serde_json::Value =
        serde_json::from_str(text).with_context(|| format!("Filter is not JSON: {}", text))?;
    Ok(FilterList::from_wire(&value)?)
}

fn parse_assignment(text: &str) -> anyhow::Result<(String, Datum)> {
    let Some((field, value)) = text.split_once('=') else {
        bail!("Expected field=value, got '{}'", text);
    };
    let value = serde_json::from_str::<serde_json::Value>(value)
        .map(Datum::from)
        .unwrap_or_else(|_| Datum::from(value));
    Ok((field.to_string(), value))
}

/// Logs go to stderr, and to rolling files when a log directory is given
fn setup_logging(cli: &Cli) -> anyhow::Result<()> {
    let file_layer = match &cli.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let appender = RollingFileAppender::new(Rotation::DAILY, dir, "tablink.log");
            Some(fmt::layer().with_writer(appender).with_ansi(false))
        }
        None => None,
    };

    let log_level = cli
        .log_level
        .parse::<tracing::Level>()
        .unwrap_or(tracing::Level::WARN);

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(!cli.no_color),
        )
        .with(file_layer)
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .init();

    Ok(())
}
