mod cache;
mod cancel;
mod config;
mod isopsephy;
mod lgpn;

use clap::Parser;
use color_eyre::Result;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "isopsephos")]
#[command(about = "Finds Greek personal names encoded as a number using isopsephy")]
#[command(version)]
struct Args {
  /// The isopsephy value to search for
  number: i64,

  /// Base URL of the LGPN server (scheme and host)
  #[arg(long, default_value = config::DEFAULT_ENDPOINT)]
  endpoint: String,

  /// Directory for the name cache (default: platform cache directory)
  #[arg(long)]
  cache_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("isopsephos=info")),
    )
    .with_writer(std::io::stderr)
    .init();

  let args = Args::parse();

  let config = config::Config::new(&args.endpoint, args.cache_dir)?;
  let client = lgpn::Client::new(&config)?;

  let cancel = cancel::CancellationToken::new();
  let mut names = client.names(cancel).await?;

  while let Some(name) = names.recv().await {
    // Names the calculator doesn't recognize are skipped, not fatal.
    if let Ok(n) = isopsephy::calculate(&name) {
      if i64::from(n) == args.number {
        println!("{name}");
      }
    }
  }

  Ok(())
}
