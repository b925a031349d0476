//! CSE CLI - Command line tool for finding critical storms in hydraulic
//! model ensembles.

use clap::Parser;
use env_logger::Env;

#[derive(Parser)]
#[command(
    name = "cse-cli",
    version,
    about = "Critical storm selection for hydraulic model ensembles"
)]
struct Cli {
    #[command(subcommand)]
    command: cse_cmd::Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    let result = cse_cmd::run(cli.command).await;
    if let Err(e) = &result {
        log::error!("{:#}", e);
    }
    result
}
