mod run;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::run::RunArgs;

#[derive(Debug, Parser)]
#[command(name = "ysdeals")]
#[command(about = "Youth sports deal digest pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Fetch every configured source and write the ranked digest
    Run {
        /// Pipeline config file (defaults to `YSD_CONFIG_PATH`)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Only keep deals classified as youth
        #[arg(long)]
        youth_only: bool,

        /// Cap each sport group at N entries
        #[arg(long, value_name = "N")]
        top_per_sport: Option<usize>,

        /// Minimum discount fraction, e.g. 0.3 for 30% off
        #[arg(long, value_parser = parse_fraction)]
        min_discount: Option<f64>,

        /// Write the digest JSON here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Load and validate the pipeline config without fetching anything
    CheckConfig {
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn parse_fraction(raw: &str) -> Result<f64, String> {
    let value: f64 = raw
        .parse()
        .map_err(|e| format!("'{raw}' is not a number: {e}"))?;
    if (0.0..1.0).contains(&value) {
        Ok(value)
    } else {
        Err(format!("'{raw}' must be in [0, 1)"))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = ysdeals_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Some(Commands::Run {
            config: config_path,
            youth_only,
            top_per_sport,
            min_discount,
            output,
        }) => {
            let args = RunArgs {
                config: config_path,
                youth_only,
                top_per_sport,
                min_discount,
                output,
            };
            run::run_digest(&config, args).await?;
        }
        Some(Commands::CheckConfig {
            config: config_path,
        }) => run::check_config(&config, config_path.as_deref())?,
        None => println!("nothing to do; try `ysdeals run` or `ysdeals --help`"),
    }

    Ok(())
}
