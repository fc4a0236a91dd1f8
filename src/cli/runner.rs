//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat, PlanTarget};
use crate::config::DwhConfig;
use crate::database;
use crate::engine::{self, Procedure, RunReport};
use crate::error::Result;
use crate::queries::Statement;
use tracing::{error, info, warn};

/// Initialise the tracing subscriber
///
/// `RUST_LOG` wins when set; otherwise `--verbose` selects DEBUG (every SQL
/// statement is logged) and the default is INFO.
pub fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    let filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        let config = self.load_config()?;

        match self.cli.command {
            Commands::CreateTables => self.execute(Procedure::CreateTables, &config).await,
            Commands::Etl => self.execute(Procedure::Etl, &config).await,
            Commands::Run => self.execute(Procedure::Full, &config).await,
            Commands::Plan { target } => self.plan(procedure_for(target), &config),
        }
    }

    /// Load the config file, applying CLI overrides
    fn load_config(&self) -> Result<DwhConfig> {
        let mut config = DwhConfig::load(&self.cli.config)?;
        if self.cli.truncate_staging {
            config = config.with_truncate_staging(true);
        }
        Ok(config)
    }

    /// Connect, run the procedure, close, and print the report
    async fn execute(&self, procedure: Procedure, config: &DwhConfig) -> Result<()> {
        let mut warehouse = database::connect(config).await?;
        info!(
            procedure = %procedure,
            warehouse = %warehouse.describe(),
            "Starting run"
        );

        let outcome = engine::run_procedure(procedure, warehouse.as_mut(), config).await;

        // Close on success and failure alike
        if let Err(e) = warehouse.close().await {
            warn!("Failed to close warehouse connection: {}", e);
        }
        let report = match outcome {
            Ok(report) => report,
            Err(e) => {
                if let Some(step) = e.step() {
                    error!(
                        step = %step,
                        rejected_by_warehouse = e.is_warehouse_error(),
                        "Run stopped; statements before this step stay committed"
                    );
                }
                return Err(e);
            }
        };
        self.output_report(&report);
        Ok(())
    }

    /// Print the statements a procedure would run
    fn plan(&self, procedure: Procedure, config: &DwhConfig) -> Result<()> {
        let statements = engine::plan(procedure, config)?;
        self.output_statements(&statements);
        Ok(())
    }

    fn output_report(&self, report: &RunReport) {
        match self.cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(report).unwrap_or_default());
            }
            OutputFormat::Pretty => println!("{report}"),
        }
    }

    fn output_statements(&self, statements: &[Statement]) {
        match self.cli.format {
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::to_string_pretty(statements).unwrap_or_default()
                );
            }
            OutputFormat::Pretty => {
                for statement in statements {
                    println!("{statement}\n");
                }
            }
        }
    }
}

fn procedure_for(target: PlanTarget) -> Procedure {
    match target {
        PlanTarget::CreateTables => Procedure::CreateTables,
        PlanTarget::Etl => Procedure::Etl,
        PlanTarget::Run => Procedure::Full,
    }
}
