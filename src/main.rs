use bankcap::{EtlConfig, EtlError, cli};
use clap::{Parser, Subcommand, builder::styling};
use eyre::Result;
use owo_colors::OwoColorize;
use std::path::Path;

// CLI Styling
const STYLES: styling::Styles = styling::Styles::styled()
    .header(styling::AnsiColor::BrightWhite.on_default())
    .usage(styling::AnsiColor::BrightWhite.on_default())
    .literal(styling::AnsiColor::Green.on_default())
    .placeholder(styling::AnsiColor::Cyan.on_default());

/// bankcap: snapshot the world's largest banks by market capitalization into CSV and SQLite
#[derive(Parser)]
#[command(name = "bankcap", version, styles = STYLES)]
struct Cli {
    /// The dotenv file to source BANKCAP_* settings from (skipped if missing)
    #[arg(short, long, global = true, default_value = ".env")]
    env: String,

    /// More verbose logging
    #[arg(long, global = true)]
    debug: bool,

    /// Command to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract, convert and save the bank table, then run the demo queries
    Run {
        /// Page to scrape: an http(s) URL, a file:// URL or a local HTML file
        #[arg(short, long)]
        source: Option<String>,
    },

    /// Run SQL queries against the database saved by a previous run
    Query {
        /// One or more read-only SQL statements
        #[arg(required = true)]
        sql: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    if Path::new(&cli.env).exists() {
        dotenvy::from_filename(&cli.env)?;
    }

    let log_level = match cli.debug {
        true => "debug",
        false => "info",
    };
    let env = env_logger::Env::default().filter_or("LOG_LEVEL", log_level);
    env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .init();

    let mut config = EtlConfig::from_env();

    match cli.command {
        Commands::Run { source } => {
            if let Some(source) = source {
                config.source_url = source;
            }
            log::info!(
                "Snapshotting {} into {} and {}",
                config.source_url.bright_black(),
                config.csv_output_path.display().cyan(),
                config.database_path.display().cyan(),
            );

            let summary = cli::run_etl(&config).await.inspect_err(|err| {
                if let Some(stage) = err.downcast_ref::<EtlError>().map(EtlError::stage) {
                    log::error!("Run aborted in the {} stage", stage.red());
                }
            })?;

            log::info!(
                "Saved {} banks to table {}",
                summary.records.green(),
                summary.table.cyan()
            );
            println!("Process Complete.");
        }
        Commands::Query { sql } => {
            log::info!(
                "Querying {} in {}",
                config.table_name.cyan(),
                config.database_path.display().bright_black()
            );
            cli::run_queries(&config, &sql)?;
        }
    }

    Ok(())
}
