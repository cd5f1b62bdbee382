use std::process::ExitCode;

use chrono::Utc;
use check_certs::{
    cli::Cli,
    config::Config,
    scan::{Pipeline, Policy, expand_patterns},
    telemetry,
};

#[tokio::main]
async fn main() -> color_eyre::Result<ExitCode> {
    color_eyre::install()?;
    dotenvy::dotenv().ok();
    telemetry::init_tracing();

    // Usage errors exit with status 2 from here
    let cli = Cli::parse_args();

    let config = Config::load(&cli.overrides())?;
    tracing::debug!("Loaded configuration: {:?}", config);

    let files = expand_patterns(&cli.globs)?;
    if files.is_empty() {
        tracing::debug!("No files matched {:?}", cli.globs);
        return Ok(ExitCode::from(1));
    }

    let policy = Policy::from_config(&config, Utc::now()).await?;
    let mut scan = Pipeline::new(policy).run(files);

    while let Some(message) = scan.next_message().await {
        println!("{message}");
    }

    scan.finish().await?.log();
    Ok(ExitCode::SUCCESS)
}
