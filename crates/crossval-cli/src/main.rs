use clap::{Parser, Subcommand};
use colored::Colorize;
use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crossval_core::{Config, ConnectionKind, Credentials, Report, TestOutcome, ValidationSpec, ValidationStatus};
use crossval_runner::{ConfigProvider, TestRunner, TestSuite};

const DEFAULT_CONFIG: &str = "crossval.toml";

/// Crossval - cross-database validation
#[derive(Parser)]
#[command(name = "crossval")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: crossval.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a test suite
    Run {
        /// Test suite file ([[test]] tables)
        #[arg(short, long)]
        suite: PathBuf,

        /// Output file for report.json
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Only run tests of this category
        #[arg(long)]
        category: Option<String>,
    },

    /// Parse a parameter string and print the result
    Parse {
        /// Parameters, e.g. "source_table=a;target_table=b;tolerance=5%"
        params: String,
    },

    /// List configured connections
    Connections,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // A missing .env is fine
    dotenvy::dotenv().ok();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .init();

    match cli.command {
        Commands::Run { suite, output, category } => {
            let config = load_config(cli.config.as_deref(), cli.verbose)?;
            run_command(config, &suite, output.as_deref(), category.as_deref(), cli.verbose).await
        }
        Commands::Parse { params } => parse_command(&params),
        Commands::Connections => {
            let config = load_config(cli.config.as_deref(), cli.verbose)?;
            connections_command(&config)
        }
    }
}

fn load_config(path: Option<&Path>, verbose: bool) -> Result<Config> {
    if let Some(path) = path {
        return Ok(Config::from_file(path)?);
    }

    let default_path = Path::new(DEFAULT_CONFIG);
    if default_path.exists() {
        Ok(Config::from_file(default_path)?)
    } else {
        if verbose {
            eprintln!("{}", "No config file found, using defaults".yellow());
        }
        Ok(Config::default())
    }
}

/// Run command - execute a suite and report
async fn run_command(
    config: Config,
    suite_path: &Path,
    output: Option<&Path>,
    category: Option<&str>,
    verbose: bool,
) -> Result<()> {
    let mut suite = TestSuite::from_file(suite_path)
        .map_err(|e| anyhow::anyhow!("Failed to load suite {}: {}", suite_path.display(), e))?;

    if let Some(category) = category {
        suite.retain_category(category);
    }

    if verbose {
        eprintln!(
            "{} {} test(s) from {}",
            "Running".cyan(),
            suite.len(),
            suite_path.display()
        );
    }

    let sample_size = config.sample_size;
    let runner = TestRunner::new(ConfigProvider::new(config)).with_sample_size(sample_size);

    let mut report = Report::new();
    for case in &suite.tests {
        let outcome = runner.run_case(case).await;
        print_outcome(&outcome, verbose);
        report.add_outcome(outcome);
    }

    if let Some(name) = &suite.name {
        report = report.with_metadata(serde_json::json!({ "suite": name }));
    }

    if let Some(output) = output {
        report.save_to_file(output)?;
        if verbose {
            eprintln!("{} {}", "Report saved to:".green(), output.display());
        }
    }

    print_report_summary(&report);

    // Exit with error code if any test failed
    if report.has_failures() {
        std::process::exit(1);
    }

    Ok(())
}

/// Parse command - show how a parameter string is understood
fn parse_command(params: &str) -> Result<()> {
    let spec = ValidationSpec::parse(params);

    println!("{}", serde_json::to_string_pretty(&spec)?);

    if spec.warnings.is_empty() {
        eprintln!("{}", "✓ No warnings".green());
    } else {
        eprintln!("{}", "Warnings:".yellow().bold());
        for warning in &spec.warnings {
            eprintln!("  {} {}", "⚠".yellow(), warning);
        }
    }
    eprintln!("{} {}", "Canonical:".cyan(), spec.to_param_string());

    Ok(())
}

/// Connections command - list configured connections
fn connections_command(config: &Config) -> Result<()> {
    let mut any = false;

    for (environment, application, connection) in config.iter_connections() {
        any = true;
        let target = match connection.kind {
            ConnectionKind::Postgres => format!(
                "{}:{}/{}{}",
                connection.host,
                connection.port,
                connection.database,
                if connection.tls { " (tls)" } else { "" }
            ),
            ConnectionKind::Memory => match &connection.fixture {
                Some(path) => path.display().to_string(),
                None => "(empty)".to_string(),
            },
        };

        let credentials = match connection.kind {
            ConnectionKind::Memory => "not needed".dimmed(),
            ConnectionKind::Postgres => match Credentials::from_env(environment, application) {
                Ok(_) => "credentials set".green(),
                Err(e) => e.to_string().red(),
            },
        };

        println!(
            "  {}/{} [{}] {} - {}",
            environment.bold(),
            application.bold(),
            connection.kind,
            target,
            credentials
        );
    }

    if !any {
        println!("{}", "No connections configured".yellow());
    }

    Ok(())
}

fn print_outcome(outcome: &TestOutcome, verbose: bool) {
    let status = match outcome.status {
        ValidationStatus::Passed => "PASSED".green().bold(),
        ValidationStatus::Failed => "FAILED".red().bold(),
        ValidationStatus::Skipped => "SKIPPED".yellow(),
    };

    println!(
        "  [{}] {} {} ({} ms)",
        status,
        outcome.test_id.bold(),
        outcome.name,
        outcome.duration_ms
    );
    println!("      {}", outcome.message.dimmed());

    let Some(result) = &outcome.result else {
        return;
    };

    if outcome.status == ValidationStatus::Failed || verbose {
        for finding in result.hard_findings() {
            println!("      {} {}: {}", "✗".red(), finding.code.as_str(), finding.message);
        }
    }
    if verbose {
        for finding in result.soft_findings() {
            println!("      {} {}: {}", "~".yellow(), finding.code.as_str(), finding.message);
        }
    }
}

fn print_report_summary(report: &Report) {
    println!("\n{}", "=".repeat(60).bright_blue());
    println!("{}", "Cross-Database Validation Report".bold().bright_blue());
    println!("{}", "=".repeat(60).bright_blue());
    println!();

    println!("Version: {}", report.version);
    println!("Timestamp: {}", report.timestamp);
    println!();

    println!("{}", "Summary:".bold());
    println!("  Total:   {}", report.summary.total);
    println!("  Passed:  {}", format!("{}", report.summary.passed).green());

    if report.summary.failed > 0 {
        println!("  Failed:  {}", format!("{}", report.summary.failed).red().bold());
    } else {
        println!("  Failed:  {}", format!("{}", report.summary.failed).green());
    }

    println!("  Skipped: {}", report.summary.skipped);
    println!("  Pass rate: {:.1}%", report.summary.pass_rate());
    println!("  Duration: {} ms", report.summary.duration_ms);
    println!();

    if report.has_failures() {
        println!("{}", "✗ Some tests failed".red().bold());
    } else {
        println!("{}", "✓ All tests passed!".green().bold());
    }
}
