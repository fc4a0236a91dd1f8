//! songplay-dwh CLI
//!
//! Schema manager and load driver for the song play warehouse

use clap::Parser;
use songplay_dwh::cli::{init_logging, Cli, Runner};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let runner = Runner::new(cli);

    if let Err(e) = runner.run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
