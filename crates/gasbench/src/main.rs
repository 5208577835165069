//! gasbench - deploy contract variants side by side and compare their gas

mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use libgasbench_core::{Harness, ScriptedEnvironment, SuiteConfig};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "gasbench")]
#[command(about = "Replay one scenario against several implementations and compare gas")]
#[command(version)]
struct Cli {
    /// Suite file (TOML)
    #[arg(short = 'c', long)]
    config: PathBuf,

    /// Run only this scenario
    #[arg(short = 's', long)]
    scenario: Option<String>,

    /// Output JSON report to file
    #[arg(short = 'j', long)]
    json_report: Option<PathBuf>,

    /// Treat inconclusive assertions as failures
    #[arg(long)]
    strict_inconclusive: bool,

    /// Load and validate the suite, then exit
    #[arg(long)]
    validate_only: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(&cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(err) => {
            output::print_error(&err);
            ExitCode::from(err.exit_code() as u8)
        }
    }
}

/// Returns whether the suite passed
async fn run(cli: &Cli) -> libgasbench_core::Result<bool> {
    let mut config = SuiteConfig::load(&cli.config)?;
    info!(config = %cli.config.display(), variants = config.variants.len(), "Suite loaded");

    if cli.validate_only {
        output::print_validated(&config);
        return Ok(true);
    }
    if cli.strict_inconclusive {
        config.run.inconclusive_fails = true;
    }

    let inconclusive_fails = config.run.inconclusive_fails;
    let script = config.environment.clone();
    let harness = Harness::new(config)?;
    let report = harness
        .run(cli.scenario.as_deref(), || ScriptedEnvironment::new(script.clone()))
        .await?;

    print!("{}", report.render());
    if let Some(ref path) = cli.json_report {
        report.write_json(path)?;
        info!(path = %path.display(), "JSON report written");
    }

    Ok(report.passed(inconclusive_fails))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_level_defaults_to_warn() {
        let cli = Cli::parse_from(["gasbench", "-c", "suite.toml"]);
        assert_eq!(cli.log_level, "warn");
        assert!(!cli.validate_only);
    }

    #[test]
    fn log_level_flag_overrides_default() {
        let cli = Cli::parse_from(["gasbench", "-c", "suite.toml", "--log-level", "debug"]);
        assert_eq!(cli.log_level, "debug");
    }
}
