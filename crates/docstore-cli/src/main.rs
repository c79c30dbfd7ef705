//! DocStore Command-Line Interface
//!
//! Inserts and queries schemaless records from the shell.
//!
//! # Usage
//!
//! ```bash
//! # Insert a record into a PostgreSQL-backed collection
//! docstore -H localhost -d docs -U postgres insert people '{"name": "Ada", "age": 36}'
//!
//! # Query with structured filters (all must match)
//! docstore -d docs query people --where 'age>=18' --where 'name?'
//!
//! # Use a local SQLite file instead of a server
//! docstore --sqlite docs.db -o json query people
//!
//! # Replay the walkthrough on a scratch collection
//! docstore --sqlite docs.db demo
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use docstore_client::Connection;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod formatter;

use config::CliConfig;
use formatter::OutputFormat;

/// DocStore command-line interface
#[derive(Parser, Debug)]
#[command(
    name = "docstore",
    version,
    about = "Command-line interface for DocStore collections",
    long_about = "Insert, query and truncate schemaless collections stored in PostgreSQL\n\
                  or SQLite. Columns are created on demand from the fields you insert."
)]
struct Args {
    /// Server hostname
    #[arg(short = 'H', long, env = "DOCSTORE_HOST")]
    host: Option<String>,

    /// Server port
    #[arg(short = 'p', long, env = "DOCSTORE_PORT")]
    port: Option<u16>,

    /// Database name
    #[arg(short = 'd', long, env = "DOCSTORE_DATABASE")]
    database: Option<String>,

    /// Username
    #[arg(short = 'U', long, env = "DOCSTORE_USER")]
    user: Option<String>,

    /// Password (use DOCSTORE_PASSWORD env var for security)
    #[arg(short = 'W', long, env = "DOCSTORE_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Use an SQLite database file instead of a server (":memory:" for a scratch database)
    #[arg(long, value_name = "FILE", env = "DOCSTORE_SQLITE")]
    sqlite: Option<PathBuf>,

    /// Output format
    #[arg(short = 'o', long, value_enum)]
    output: Option<OutputFormatArg>,

    /// Enable verbose output
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Configuration file path
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Insert one JSON object as a record
    Insert {
        /// Collection name
        collection: String,
        /// Record as a JSON object
        record: String,
    },
    /// Query a collection
    Query {
        /// Collection name
        collection: String,
        /// Filter such as `age>=18`, `name=Ada` or `tags?` (repeatable, all must match)
        #[arg(short = 'w', long = "where", value_name = "FILTER")]
        filters: Vec<String>,
        /// Trusted WHERE clause passed through verbatim
        #[arg(long, value_name = "CLAUSE")]
        raw: Option<String>,
    },
    /// Remove every record from a collection
    Truncate {
        /// Collection name
        collection: String,
    },
    /// Show a collection's columns and types
    Columns {
        /// Collection name
        collection: String,
    },
    /// Run a walkthrough of inserts and queries on a scratch collection
    Demo {
        /// Collection to use (truncated first)
        #[arg(default_value = "test")]
        collection: String,
    },
    /// Write the effective configuration (without password) to the config file
    InitConfig,
}

/// Output format argument
#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormatArg {
    /// Display results in a formatted table
    Table,
    /// Display results as JSON
    Json,
    /// Display results as CSV
    Csv,
    /// Display raw values
    Raw,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Table => OutputFormat::Table,
            OutputFormatArg::Json => OutputFormat::Json,
            OutputFormatArg::Csv => OutputFormat::Csv,
            OutputFormatArg::Raw => OutputFormat::Raw,
        }
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let args = Args::parse();

    init_logging(args.verbose);

    let config = load_config(&args)?;
    let format = match args.output {
        Some(arg) => arg.into(),
        None => OutputFormat::from_name(&config.output_format).with_context(|| {
            format!("unknown output format `{}` in configuration", config.output_format)
        })?,
    };

    if let Command::InitConfig = args.command {
        let path = match &args.config {
            Some(path) => path.clone(),
            None => CliConfig::default_config_path()
                .context("no configuration directory on this platform")?,
        };
        config.save(&path)?;
        println!("wrote {}", path.display());
        return Ok(());
    }

    let mut conn = Connection::open(config.connection_config())?;
    info!(location = %conn.config().location(), "connected");

    let output = match &args.command {
        Command::Insert { collection, record } => commands::insert(&mut conn, collection, record),
        Command::Query {
            collection,
            filters,
            raw,
        } => commands::build_predicate(filters, raw.as_deref())
            .and_then(|predicate| commands::query(&mut conn, collection, predicate, format)),
        Command::Truncate { collection } => commands::truncate(&mut conn, collection),
        Command::Columns { collection } => commands::columns(&mut conn, collection, format),
        Command::Demo { collection } => commands::demo(&mut conn, collection, format),
        Command::InitConfig => Ok(String::new()),
    };

    let closed = conn.close();
    let output = output?;
    closed?;

    print!("{output}");
    if !output.is_empty() && !output.ends_with('\n') {
        println!();
    }
    Ok(())
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("docstore=debug,docstore_client=debug,docstore_engine=debug")
    } else {
        EnvFilter::new("docstore=warn,docstore_client=warn,docstore_engine=warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(args: &Args) -> Result<CliConfig> {
    let mut config = if let Some(path) = &args.config {
        if path.exists() {
            CliConfig::from_file(path)
                .with_context(|| format!("reading configuration {}", path.display()))?
        } else {
            CliConfig::default()
        }
    } else {
        CliConfig::load_default()?
    };

    if let Some(host) = &args.host {
        config.host = host.clone();
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(db) = &args.database {
        config.database = Some(db.clone());
    }
    if let Some(user) = &args.user {
        config.username = Some(user.clone());
    }
    if let Some(pass) = &args.password {
        config.password = Some(pass.clone());
    }
    if let Some(path) = &args.sqlite {
        config.sqlite = Some(path.clone());
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_args_are_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_query_args() {
        let args = Args::try_parse_from([
            "docstore", "--sqlite", "x.db", "-o", "csv", "query", "people", "-w", "age>=18",
            "--where", "name?",
        ])
        .unwrap();
        assert_eq!(args.sqlite, Some(PathBuf::from("x.db")));
        assert!(matches!(args.output, Some(OutputFormatArg::Csv)));
        match args.command {
            Command::Query {
                collection,
                filters,
                raw,
            } => {
                assert_eq!(collection, "people");
                assert_eq!(filters, vec!["age>=18", "name?"]);
                assert!(raw.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_flags_override_config() {
        let args = Args::try_parse_from([
            "docstore", "-H", "db.internal", "-p", "6543", "-d", "docs", "truncate", "t",
        ])
        .unwrap();
        let config = load_config(&args).unwrap();
        assert_eq!(config.host, "db.internal");
        assert_eq!(config.port, 6543);
        assert_eq!(config.database.as_deref(), Some("docs"));
    }
}
