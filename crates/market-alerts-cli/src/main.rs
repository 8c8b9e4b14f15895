//! `market-alerts` binary entrypoint.

use std::io;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use market_alerts_cli::cli::{Cli, Commands};
use market_alerts_cli::commands::{EvaluateCommand, ValidateCommand};
use market_alerts_cli::output::OutputFormat;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_tracing(cli.verbose) {
        eprintln!("Failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr so JSON output on stdout stays parseable.
fn init_tracing(verbose: bool) -> anyhow::Result<()> {
    let level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(format!("market_alerts={level}").parse()?)
                .add_directive(format!("market_alerts_cli={level}").parse()?),
        )
        .with_writer(io::stderr)
        .init();
    Ok(())
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let format = OutputFormat::new(cli.format);
    let mut stdout = io::stdout().lock();

    match &cli.command {
        Commands::Evaluate(args) => EvaluateCommand::new(args).execute(&mut stdout, &format)?,
        Commands::Validate(args) => ValidateCommand::new(args).execute(&mut stdout, &format)?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use market_alerts_cli::cli::Format;

    #[test]
    fn cli_parses_validate() {
        let cli = Cli::parse_from(["market-alerts", "validate", "-r", "rules.json"]);
        assert!(matches!(cli.command, Commands::Validate(_)));
    }

    #[test]
    fn cli_respects_format_flag() {
        let cli =
            Cli::parse_from(["market-alerts", "--format", "json", "validate", "-r", "rules.json"]);
        assert_eq!(cli.format, Format::Json);
    }

    #[test]
    fn run_missing_rules_fails() {
        let cli = Cli::parse_from(["market-alerts", "validate", "-r", "/nonexistent/rules.json"]);
        assert!(run(&cli).is_err());
    }
}
