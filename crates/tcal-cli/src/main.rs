use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

mod commands;

use commands::{defaults, query, Engine};

#[derive(Parser)]
#[command(name = "tcal")]
#[command(about = "Trading calendar CLI", long_about = None)]
struct Cli {
    /// Config YAML paths in merge order (base -> overlay ...)
    #[arg(long = "config", global = true)]
    config_paths: Vec<String>,

    /// Install a local defaults payload before running the command.
    #[arg(long = "defaults-file", global = true)]
    defaults_file: Option<String>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the day containing a time, or the day for a date / day id.
    Day {
        #[command(flatten)]
        target: query::ScheduleArgs,

        /// Epoch millis or RFC3339 time.
        #[arg(long, conflicts_with_all = ["ymd", "id"])]
        time: Option<String>,

        /// YearMonthDay, e.g. 20241225 (rolls forward to the next existing day).
        #[arg(long, conflicts_with = "id")]
        ymd: Option<i32>,

        /// Day id (days since 1970-01-01).
        #[arg(long)]
        id: Option<i32>,

        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Show the session containing a time, or the nearest one matching a filter.
    Session {
        #[command(flatten)]
        target: query::ScheduleArgs,

        /// Epoch millis or RFC3339 time.
        #[arg(long)]
        time: String,

        /// any | trading | non-trading | no-trading | pre-market | regular | after-market
        #[arg(long, default_value = "any")]
        filter: String,

        #[arg(long, value_enum, default_value_t = query::SessionMode::Containing)]
        mode: query::SessionMode,

        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// List the venues a schedule declares.
    Venues {
        #[command(flatten)]
        target: query::ScheduleArgs,
    },

    /// Defaults payload commands
    Defaults {
        #[command(subcommand)]
        cmd: defaults::DefaultsCmd,
    },

    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order (base -> overlay ...)
        #[arg(required = true)]
        paths: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // dev-time convenience; a missing file is fine.
    let _ = dotenvy::from_filename(".env.local");

    let cli = Cli::parse();

    if let Commands::ConfigHash { paths } = &cli.cmd {
        let path_refs: Vec<&str> = paths.iter().map(String::as_str).collect();
        let loaded = tcal_config::load_layered_yaml(&path_refs)?;
        println!("config_hash={}", loaded.config_hash);
        println!("{}", loaded.canonical_json);
        return Ok(());
    }

    let path_refs: Vec<&str> = cli.config_paths.iter().map(String::as_str).collect();
    let loaded = tcal_config::load_layered_yaml(&path_refs).context("config load failed")?;
    init_tracing(&loaded.config.log.filter);

    let engine = Engine::start(&loaded.config, cli.defaults_file.as_deref()).await?;

    match cli.cmd {
        Commands::Day {
            target,
            time,
            ymd,
            id,
            json,
        } => query::day(&engine, &target, time.as_deref(), ymd, id, json)?,
        Commands::Session {
            target,
            time,
            filter,
            mode,
            json,
        } => query::session(&engine, &target, &time, &filter, mode, json)?,
        Commands::Venues { target } => query::venues(&engine, &target)?,
        Commands::Defaults { cmd } => defaults::run(&engine, cmd).await?,
        Commands::ConfigHash { .. } => {}
    }

    engine.shutdown();
    Ok(())
}

/// `RUST_LOG` wins when set; otherwise the configured filter.
fn init_tracing(configured: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(configured));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
