use clap::{Parser, Subcommand, builder::styling};
use eyre::{Context, Result};
use owo_colors::OwoColorize;
use shopify_data_etl::batch::BatchDate;
use shopify_data_etl::cli;
use shopify_data_etl::config::PipelineConfig;
use shopify_data_etl::error::EtlError;
use shopify_data_etl::etl::{ExtractOutcome, LoadOutcome, PipelineOutcome};
use std::path::PathBuf;

// CLI Styling
const STYLES: styling::Styles = styling::Styles::styled()
    .header(styling::AnsiColor::BrightWhite.on_default())
    .usage(styling::AnsiColor::BrightWhite.on_default())
    .literal(styling::AnsiColor::Green.on_default())
    .placeholder(styling::AnsiColor::Cyan.on_default());

/// Shopify Data ETL: pulls one day's CSV export from the object store, cleans it, and appends it to the warehouse exactly once
#[derive(Parser)]
#[command(name = "shopetl", version, styles = STYLES)]
struct Cli {
    /// The dotenv file to source configuration from
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
    /// Run the full extract-transform-load pipeline for one batch date
    Run {
        /// Batch date (YYYY-MM-DD), also the name of the source object
        date: String,
    },

    /// Fetch a batch's raw CSV from the object store and print it
    Extract {
        /// Batch date (YYYY-MM-DD)
        date: String,
    },

    /// Transform a raw CSV payload from a file (or stdin) and print it
    Transform {
        /// Input file; reads stdin when omitted
        input: Option<PathBuf>,
    },

    /// Load an already-transformed CSV payload from a file (or stdin)
    Load {
        /// Input file; reads stdin when omitted
        input: Option<PathBuf>,
    },

    /// Probe object store and database connectivity
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match dotenvy::from_filename(&cli.env) {
        Ok(_) => {}
        // A missing default .env is fine: schedulers inject real env vars
        Err(_) if cli.env == ".env" => {}
        Err(err) => {
            return Err(err).with_context(|| format!("Failed to load env file {}", cli.env));
        }
    }

    let log_level = match cli.debug {
        true => "debug",
        false => "info",
    };
    let env = env_logger::Env::default().filter_or("LOG_LEVEL", log_level);
    env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .init();

    match cli.command {
        Commands::Run { date } => {
            let date = parse_date(&date);
            let config = PipelineConfig::from_env()?;
            log::info!(
                "Running pipeline for {} from bucket {}",
                date,
                config.store.bucket.bright_black()
            );
            match cli::run_batch(&config, &date).await {
                Ok(PipelineOutcome::Loaded(count)) => {
                    log::info!("✓ Loaded {} row(s) for {}", count, date);
                }
                Ok(PipelineOutcome::SkippedMissingBatch) => {
                    log::warn!("No batch object for {}, skipped", date);
                }
                Ok(PipelineOutcome::SkippedDuplicate) => {
                    log::info!("Batch {} already loaded, skipped", date);
                }
                Err(err) => fail(err),
            }
        }
        Commands::Extract { date } => {
            let date = parse_date(&date);
            let config = PipelineConfig::from_env()?;
            match cli::extract_batch(&config, &date).await {
                Ok(ExtractOutcome::Batch(raw)) => print!("{raw}"),
                Ok(ExtractOutcome::NotFound) => {
                    log::warn!("No batch object for {}", date);
                }
                Err(err) => fail(err),
            }
        }
        Commands::Transform { input } => {
            let raw = cli::read_input(input.as_deref())?;
            match cli::transform_text(&raw) {
                Ok(transformed) => print!("{transformed}"),
                Err(err) => fail(err),
            }
        }
        Commands::Load { input } => {
            let config = PipelineConfig::from_env()?;
            let transformed = cli::read_input(input.as_deref())?;
            match cli::load_batch(&config, &transformed).await {
                Ok(LoadOutcome::Inserted(count)) => {
                    log::info!("✓ Inserted {} row(s)", count);
                }
                Ok(LoadOutcome::SkippedDuplicate) => {
                    log::info!("Duplicates found, no rows inserted");
                }
                Err(err) => fail(err),
            }
        }
        Commands::Check => {
            let config = PipelineConfig::from_env()?;
            if let Err(err) = cli::check(&config).await {
                fail(err);
            }
        }
    }

    Ok(())
}

fn parse_date(raw: &str) -> BatchDate {
    match raw.parse() {
        Ok(date) => date,
        Err(err) => fail(err),
    }
}

/// Map failures onto sysexits-style codes the scheduler can act on:
/// 75 (EX_TEMPFAIL) means retry the run, 65 (EX_DATAERR) means the input
/// needs an operator.
fn fail(err: EtlError) -> ! {
    if err.is_retriable() {
        log::error!("Retriable failure: {err}");
        std::process::exit(75);
    }
    log::error!("Terminal failure: {err}");
    std::process::exit(65)
}
