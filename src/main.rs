use clap::Parser;

use solar_launcher::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    solar_launcher::run(Cli::parse()).await
}
