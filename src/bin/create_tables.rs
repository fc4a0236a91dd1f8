//! Drop and recreate every warehouse table

use songplay_dwh::cli::{init_logging, Cli, Commands, Runner};

#[tokio::main]
async fn main() {
    let cli = Cli::for_command(Commands::CreateTables);
    init_logging(cli.verbose);

    if let Err(e) = Runner::new(cli).run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
