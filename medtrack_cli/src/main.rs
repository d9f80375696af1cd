use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use medtrack_api::AppState;
use medtrack_core::*;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "medtrack")]
#[command(about = "Medication and dose adherence tracker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Read configuration from this file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the HTTP API (default)
    Serve {
        /// Address to listen on, e.g. 127.0.0.1:8000
        #[arg(long)]
        bind: Option<String>,
    },

    /// Print the adherence rate of a medication
    Adherence {
        /// Medication id
        id: u64,

        /// First day of the period (YYYY-MM-DD)
        #[arg(long, requires = "end")]
        start: Option<NaiveDate>,

        /// Last day of the period (YYYY-MM-DD)
        #[arg(long, requires = "start")]
        end: Option<NaiveDate>,
    },

    /// Print how many doses a medication calls for over a number of days
    ExpectedDoses {
        /// Medication id
        id: u64,

        /// Number of days, at least 1
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        days: u32,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_with_verbosity(cli.verbose);

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(data_dir) = cli.data_dir {
        config.data.data_dir = data_dir;
    }

    match cli.command {
        Some(Commands::Serve { bind }) => cmd_serve(config, bind),
        Some(Commands::Adherence { id, start, end }) => cmd_adherence(&config, id, start, end),
        Some(Commands::ExpectedDoses { id, days }) => cmd_expected_doses(&config, id, days),
        None => cmd_serve(config, None),
    }
}

fn cmd_serve(config: Config, bind: Option<String>) -> Result<()> {
    std::fs::create_dir_all(&config.data.data_dir)?;
    let store = JsonStore::open(config.store_path())?;
    let client = OpenFdaClient::from_config(&config.drug_info)?;
    let state = AppState::new(store, Arc::new(client));

    let bind = bind.unwrap_or_else(|| config.server.bind.clone());
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(medtrack_api::serve(&bind, state))
}

fn cmd_adherence(
    config: &Config,
    id: u64,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<()> {
    let store = JsonStore::open(config.store_path())?;
    let medication = store.medication(id)?;
    let logs = store.logs_for(id);

    match (start, end) {
        (Some(start), Some(end)) => {
            let rate = adherence_rate_over_period(&medication, &logs, start, end)?;
            println!("{}: {:.2}% adherence from {} to {}", medication, rate, start, end);
        }
        _ => {
            let rate = adherence_rate(&medication, &logs);
            println!(
                "{}: {:.2}% adherence over {} logged doses",
                medication,
                rate,
                logs.len()
            );
        }
    }
    Ok(())
}

fn cmd_expected_doses(config: &Config, id: u64, days: u32) -> Result<()> {
    let store = JsonStore::open(config.store_path())?;
    let medication = store.medication(id)?;
    let expected = expected_doses(&medication, days)?;
    println!("{}: {} doses expected over {} days", medication, expected, days);
    Ok(())
}
