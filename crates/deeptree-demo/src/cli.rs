use clap::{Parser, Subcommand};

use crate::app::Variant;
use crate::config::{DemoConfig, OutputFormat, RunArgs};
use crate::error::Result;
use crate::{logging, report, runner};

#[derive(Debug, Parser)]
#[command(
    name = "deeptree",
    about = "Watch scoped channel writes propagate through deep node chains",
    version
)]
pub struct Cli {
    /// Log at debug level unless RUST_LOG is set.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines on stderr.
    #[arg(long, global = true, env = "DEEPTREE_LOG_JSON")]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Mount a variant, apply its trigger script and print the report.
    Run(RunArgs),

    /// Print the built-in variants.
    #[command(name = "list-variants")]
    ListVariants,
}

pub fn run_from_env() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.log_json)?;
    run(cli)
}

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Run(args) => {
            print!("{}", render(&args)?);
            Ok(())
        }
        Commands::ListVariants => {
            print!("{}", variants_text());
            Ok(())
        }
    }
}

/// Run the configured demo and format its report.
pub fn render(args: &RunArgs) -> Result<String> {
    let config = DemoConfig::from_args(args)?;
    let report = runner::run(&config)?;
    match config.format {
        OutputFormat::Text => Ok(report::render_text(&report)),
        OutputFormat::Json => report::render_json(&report),
    }
}

#[must_use]
pub fn variants_text() -> String {
    Variant::ALL
        .iter()
        .map(|variant| format!("{:<13} {}\n", variant.name(), variant.describe()))
        .collect()
}
