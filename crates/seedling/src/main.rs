//! Seedling CLI: overwrites the Bronze seed tables and prints the verification report.

use std::process::ExitCode;

use clap::Parser;
use tracing::info;

use seedling::{CliArgs, Config, RunError, SeedSummary, init_tracing};

async fn seed(args: &CliArgs) -> Result<SeedSummary, RunError> {
    let config = Config::from_args(args)?;
    info!(
        "Seeding schema '{}' in {}",
        config.schema, config.warehouse_uri
    );
    seedling::run(&config).await
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let args = CliArgs::parse();

    match seed(&args).await {
        Ok(summary) => {
            print!("{}", summary.report);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
