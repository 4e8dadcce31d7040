//! xraycov - Jira/Xray test coverage for local test suites
//!
//! xraycov fetches a project's Xray test-case catalog from Jira, scans test
//! files for calls that reference those test cases, and reports how much of
//! the catalog the local suite covers.

use eyre::{Result, WrapErr};
use facet::Facet;
use figue as args;
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use xraycov::config::Config;
use xraycov::jira::{JiraClient, Progress};
use xraycov::output::{OutputFormat, REPORT_FILE_NAME, render_report, render_text};
use xraycov::store::TestCaseStore;
use xraycov_core::CoverageReport;

/// CLI arguments
#[derive(Debug, Facet)]
struct Args {
    /// Subcommand to run
    #[facet(args::subcommand)]
    command: Command,

    /// Path to config file (default: .config/xraycov/config.yaml)
    #[facet(args::named, args::short = 'c', default)]
    config: Option<PathBuf>,

    /// Project root (default: nearest directory with .config/xraycov or .git)
    #[facet(args::named, default)]
    root: Option<PathBuf>,
}

/// Subcommands
#[derive(Debug, Facet)]
#[repr(u8)]
enum Command {
    /// Download the test-case catalog and list it
    Fetch,

    /// Compute coverage and write a report
    Report {
        /// Output file (default: ./test-coverage-report.html; stdout for text/json)
        #[facet(args::named, args::short = 'o', default)]
        output: Option<PathBuf>,

        /// Output format: html, text, json
        #[facet(args::named, args::short = 'f', default)]
        format: Option<String>,

        /// Open the saved report in a browser
        #[facet(args::named, default)]
        open: bool,
    },

    /// Print a coverage summary, exit 1 below the threshold
    Check {
        /// Minimum coverage percentage to pass (default: 0)
        #[facet(args::named, default)]
        threshold: Option<u32>,

        /// Show every reference of covered test cases
        #[facet(args::named, args::short = 'v', default)]
        verbose: bool,
    },

    /// Run the language server over stdio
    Lsp,
}

fn main() -> Result<()> {
    xraycov::init_tracing();

    let args: Args = figue::from_std_args()
        .map_err(|e| eyre::eyre!("{}", e))
        .wrap_err("Failed to parse command line arguments")?;

    let project_root = match &args.root {
        Some(root) => root.clone(),
        None => xraycov::find_project_root()?,
    };
    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| xraycov::default_config_path(&project_root));

    match args.command {
        Command::Fetch => run_fetch_command(&config_path),
        Command::Report {
            output,
            format,
            open,
        } => run_report_command(&project_root, &config_path, output, format, open),
        Command::Check { threshold, verbose } => {
            run_check_command(&project_root, &config_path, threshold.unwrap_or(0), verbose)
        }
        Command::Lsp => {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .wrap_err("Failed to start async runtime")?;
            runtime.block_on(xraycov::lsp::run(Some(project_root), Some(config_path)))
        }
    }
}

fn build_store(config: &Config) -> Result<TestCaseStore> {
    let client = JiraClient::new(&config.atlassian)?;
    Ok(TestCaseStore::new(
        Arc::new(client),
        config.atlassian.sanitize_titles.clone(),
    ))
}

fn print_progress(progress: Progress) {
    eprintln!(
        "   {}/{} test cases",
        progress.fetched.to_string().green(),
        progress.total
    );
}

fn run_fetch_command(config_path: &Path) -> Result<()> {
    let config = xraycov::load_config(config_path)?;
    let store = build_store(&config)?;

    eprintln!(
        "{} Reading Xray test cases for project {}...",
        "->".blue().bold(),
        config.atlassian.project.cyan()
    );
    let cases = store.refresh(print_progress)?;

    for case in cases.iter() {
        println!("{} | {}", case.key, case.summary);
    }
    Ok(())
}

/// Fetch the catalog, scan test files and correlate them
fn compute_report(project_root: &Path, config: &Config) -> Result<CoverageReport> {
    let store = build_store(config)?;

    eprintln!(
        "{} Reading Xray test cases for project {}...",
        "->".blue().bold(),
        config.atlassian.project.cyan()
    );
    let cases = store.get_with_progress(print_progress)?;
    eprintln!("   Found {} test cases", cases.len().to_string().green());

    eprintln!("{} Scanning test files...", "->".blue().bold());
    let refs = xraycov::scan_coverage(project_root, config)?;
    eprintln!(
        "   Found {} test case references",
        refs.len().to_string().green()
    );

    Ok(CoverageReport::compute(
        config.atlassian.project.clone(),
        &cases,
        &refs,
    ))
}

fn run_report_command(
    project_root: &Path,
    config_path: &Path,
    output: Option<PathBuf>,
    format: Option<String>,
    open: bool,
) -> Result<()> {
    let format = match format {
        Some(f) => OutputFormat::from_str(&f)
            .ok_or_else(|| eyre::eyre!("Unknown format '{}' (expected html, text or json)", f))?,
        None => OutputFormat::default(),
    };
    if open && output.is_none() && format != OutputFormat::Html {
        eyre::bail!("--open needs a saved report; pass -o FILE for text and json output");
    }

    let config = xraycov::load_config(config_path)?;
    let report = compute_report(project_root, &config)?;
    let rendered = render_report(&report, format, &config.atlassian);

    let output = match (output, format) {
        (Some(path), _) => path,
        (None, OutputFormat::Html) => std::env::current_dir()
            .wrap_err("Failed to get current directory")?
            .join(REPORT_FILE_NAME),
        (None, _) => {
            print!("{}", rendered);
            return Ok(());
        }
    };

    std::fs::write(&output, &rendered)
        .wrap_err_with(|| format!("Failed to save coverage report to {}", output.display()))?;
    eprintln!(
        "\n{} Coverage {}% - report saved to {}",
        "OK".green().bold(),
        report.coverage_percent(),
        output.display()
    );

    if open {
        open::that(&output)
            .wrap_err_with(|| format!("Failed to open {}", output.display()))?;
    }

    Ok(())
}

fn run_check_command(
    project_root: &Path,
    config_path: &Path,
    threshold: u32,
    verbose: bool,
) -> Result<()> {
    let config = xraycov::load_config(config_path)?;
    let report = compute_report(project_root, &config)?;

    print!("{}", render_text(&report, verbose));

    if !report.is_passing(threshold) {
        eprintln!(
            "{} Coverage {}% is below the threshold of {}%",
            "!".red().bold(),
            report.coverage_percent(),
            threshold
        );
        std::process::exit(1);
    }

    Ok(())
}
