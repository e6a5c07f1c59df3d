//! CLI entry point for process-templates.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

/// process-templates — render API-level dependent source templates.
#[derive(Parser, Debug)]
#[command(name = "process-templates", version, about)]
struct Cli {
    /// Path to the process-templates.toml configuration file.
    #[arg(default_value = "process-templates.toml")]
    config: PathBuf,

    /// Output directory (overrides config).
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Target API level (overrides config).
    #[arg(long)]
    api_level: Option<u32>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("process_templates=info")),
        )
        .init();

    let cli = Cli::parse();
    let overrides = process_templates::Overrides {
        output_directory: cli.output,
        api_level: cli.api_level,
    };
    let written = process_templates::run(&cli.config, &overrides)
        .with_context(|| format!("processing templates from {}", cli.config.display()))?;

    println!("Rendered {} template(s)", written.len());
    Ok(())
}
