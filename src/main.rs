use clap::Parser;
use price_oracle::cli::{Cli, Commands};
use price_oracle::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(&cli.config)?;

    // Initialize telemetry
    price_oracle::telemetry::init_telemetry(&config.telemetry)?;

    match cli.command {
        Commands::Validate(args) => args.execute(&config).await?,
        Commands::Sources(args) => args.execute(&config).await?,
        Commands::Replay(args) => args.execute(&config).await?,
        Commands::Run(args) => {
            tracing::info!("Starting price oracle");
            args.execute(&config).await?;
        }
    }

    Ok(())
}
