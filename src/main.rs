use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use refsearch::cli::{Cli, Commands};
use refsearch::commands::literal::LiteralArgs;
use refsearch::config::Config;
use refsearch::logging::{init_early_logging, init_logging};
use refsearch::metrics;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let project_root = match &cli.command {
        Commands::Literal {
            path: Some(path), ..
        } => path.clone(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    };

    // Keep the guard until exit so pending log lines are flushed
    let _logging_guard = match Config::load(&project_root) {
        Ok(config) => Some(init_logging(&config.logging, &project_root)?),
        Err(e) => {
            init_early_logging();
            tracing::warn!("Using default configuration: {:#}", e);
            None
        }
    };

    tracing::debug!("Project root: {}", project_root.display());
    metrics::register_metrics();

    match cli.command {
        Commands::Init { force } => {
            refsearch::commands::init::run(force).await?;
        }
        Commands::Literal {
            pattern,
            path,
            include,
            ignore_case,
            substring,
            metrics,
        } => {
            refsearch::commands::literal::run(LiteralArgs {
                pattern,
                path,
                include,
                ignore_case,
                substring,
                metrics,
            })
            .await?;
        }
    }

    Ok(())
}
