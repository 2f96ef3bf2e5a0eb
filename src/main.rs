use anyhow::Result;
use clap::Parser;

use pgmeta::cli::{self, Cli};
use pgmeta::logging;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(&cli.log_level());
    let debug = cli.debug;

    if let Err(err) = cli::run(cli).await {
        if debug {
            eprintln!("error: {err:#}");
        } else {
            eprintln!("error: {err}");
        }
        std::process::exit(1);
    }

    Ok(())
}
