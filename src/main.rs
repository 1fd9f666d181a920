use clap::Parser;
use propedge::cli::{Cli, Commands};
use propedge::config::AppConfig;
use tracing::debug;

mod main_runtime;

use main_runtime::{init_logging, init_logging_simple};

fn load_config(cli: &Cli) -> anyhow::Result<AppConfig> {
    let config = AppConfig::load_from(&cli.config_dir)?;
    if let Err(errors) = config.validate() {
        anyhow::bail!("Invalid configuration: {}", errors.join("; "));
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Odds(args) => {
            init_logging_simple();
            args.run()?;
        }
        Commands::Score(args) => {
            let config = load_config(&cli)?;
            init_logging(&config.logging);
            debug!("Weights {} loaded", config.weights.version);
            args.run(&config)?;
        }
        Commands::Backtest(args) => {
            let config = load_config(&cli)?;
            init_logging(&config.logging);
            debug!("Weights {} loaded", config.weights.version);
            args.run(&config).await?;
        }
    }

    Ok(())
}
