use adwatch_core::Config;
use adwatch_rules::RuleThresholds;
use adwatch_server::cli::{self, Cli};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_level(true)
        .init();

    let cli = Cli::parse();

    adwatch_core::config::load_dotenv();
    let config = Config::from_env()?;
    let thresholds = RuleThresholds::load(config.rules_file.as_deref())?;

    cli::dispatch(cli, config, thresholds).await
}
