use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use veracode_target_urls::client::{self, ApiClient};
use veracode_target_urls::config::Config;
use veracode_target_urls::report;

/// veracode-target-urls — collect every Dynamic Analysis target URL into one JSON report.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "veracode-target-urls",
    version,
    about = "Collects every Dynamic Analysis target URL from the Veracode API into a JSON report.",
    long_about = None
)]
struct Cli {
    /// Write the aggregated report as pretty JSON to this path.
    #[arg(long, default_value = "veracode_target_urls.json")]
    output: PathBuf,

    /// API base URL override; defaults to the public production endpoint.
    #[arg(long, env = "VERACODE_API_BASE_URL")]
    base_url: Option<String>,

    /// Per-request timeout in seconds.
    #[arg(long = "timeout-secs", default_value_t = 30)]
    timeout_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env(
        cli.base_url.as_deref(),
        Duration::from_secs(cli.timeout_secs),
    )?;

    println!("veracode-target-urls configuration:");
    println!("  base_url     : {}", config.base_url);
    println!("  output       : {}", cli.output.display());
    println!("  timeout_secs : {}", cli.timeout_secs);

    let client = ApiClient::new(config)?;
    let groups = client::collect_target_urls(&client).await?;

    let doc = report::build_document(groups);
    report::print_summary(&doc);
    report::write_json(&cli.output, &doc)?;
    println!("Wrote JSON results to {}", cli.output.display());

    Ok(())
}
