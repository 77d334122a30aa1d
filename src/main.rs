use std::process;

use anyhow::Result;
use clap::Parser;
use k8s_resource_collector::{
  cli::Cli,
  config::{self, Config},
};
use tracing_log::AsTrace;

async fn try_main(cli: &Cli) -> Result<()> {
  let settings = config::load(cli.config.as_deref())?;
  let config = Config::new(cli, &settings)?;

  k8s_resource_collector::run(&config).await
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
  let cli = Cli::parse();

  tracing_subscriber::fmt()
    .with_max_level(cli.verbose.log_level_filter().as_trace())
    .with_writer(std::io::stderr)
    .init();

  if let Err(err) = try_main(&cli).await {
    eprintln!("Error: {err:#}");
    process::exit(1);
  }

  Ok(())
}
