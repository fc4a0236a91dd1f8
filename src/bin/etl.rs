//! Stage raw JSON from object storage and fill the star tables

use songplay_dwh::cli::{init_logging, Cli, Commands, Runner};

#[tokio::main]
async fn main() {
    let cli = Cli::for_command(Commands::Etl);
    init_logging(cli.verbose);

    if let Err(e) = Runner::new(cli).run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
