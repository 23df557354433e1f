//! ea-validate CLI entry point
//!
//! Usage:
//!   ea-validate validate [PATH]   Validate a project
//!   ea-validate detect [PATH]     Detect a project's framework
//!   ea-validate frameworks        List framework rules
//!   ea-validate config            Show merged configuration
//!   ea-validate mcp               Start MCP server over stdio

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use ea_validate::cli::{
    commands::{ConfigArgs, DetectArgs, FrameworksArgs, OutputFormat, ValidateArgs},
    run_mcp_server, Cli, Commands,
};
use ea_validate::config::{find_config_files, load_config, Config};
use ea_validate::error::ValidateError;
use ea_validate::framework::project_name;
use ea_validate::validate::{
    resolve_project_root, CheckResult, CheckStatus, Report, StageKind, StageObserver,
    ValidateOptions, ValidationRun, Validator,
};

/// Exit code for unusable configuration, distinct from a FAILED validation
const EXIT_CONFIG_ERROR: u8 = 3;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", "error".red().bold(), e);
            match e.downcast_ref::<ValidateError>() {
                Some(ValidateError::Config(_)) => ExitCode::from(EXIT_CONFIG_ERROR),
                _ => ExitCode::FAILURE,
            }
        }
    }
}

/// Load merged configuration, reporting failures as configuration errors
fn load_settings(config_path: Option<&str>, root: Option<&Path>) -> Result<Config> {
    let config = load_config(config_path, root)
        .map_err(|e| ValidateError::Config(format!("{:#}", e)))?;
    Ok(config)
}

/// Log to stderr so stdout stays clean for reports and the MCP transport
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Validate(args) => validate_project(args, config_path, cli.verbose).await,
        Commands::Detect(args) => {
            detect(args, config_path)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Frameworks(args) => {
            list_frameworks(args, config_path)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Config(args) => {
            show_config(args, config_path)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Mcp => {
            run_mcp_server(config_path).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Shows the running stage on an interactive terminal
struct SpinnerObserver {
    bar: ProgressBar,
}

impl SpinnerObserver {
    fn new() -> Self {
        let bar = if std::io::stderr().is_terminal() {
            ProgressBar::new_spinner()
        } else {
            ProgressBar::hidden()
        };
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner} {msg} [{elapsed}]")
        {
            bar.set_style(style);
        }
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar }
    }
}

impl StageObserver for SpinnerObserver {
    fn stage_started(&mut self, stage: StageKind, command: &str) {
        self.bar.set_message(format!("{}: {}", stage, command));
    }

    fn stage_finished(&mut self, result: &CheckResult) {
        let status = match result.status {
            CheckStatus::Passed => "passed".green(),
            CheckStatus::Failed => "failed".red(),
            CheckStatus::Skipped => "skipped".yellow(),
        };
        self.bar.println(format!("  {} {}", result.name, status));
    }
}

impl Drop for SpinnerObserver {
    fn drop(&mut self) {
        self.bar.finish_and_clear();
    }
}

/// Validate a project and print its report
async fn validate_project(
    args: ValidateArgs,
    config_path: Option<&str>,
    verbose: bool,
) -> Result<ExitCode> {
    let root = match resolve_project_root(args.path.as_deref()) {
        Ok(root) => root,
        // Nothing to detect in a directory that does not exist
        Err(ValidateError::ProjectNotFound { path, .. }) => {
            tracing::warn!("Project directory not found: {}", path);
            let path = PathBuf::from(path);
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| path.display().to_string());
            let run = ValidationRun::undetected(name, path, 0);
            print_report(&Report::from_run(&run, verbose, 0), args.format)?;
            return Ok(ExitCode::from(run.exit_code()));
        }
        Err(e) => return Err(e.into()),
    };
    let config = load_settings(config_path, Some(&root))?;
    let validator = Validator::from_config(&config).context("Invalid framework rules")?;

    let timeout = match args.timeout {
        Some(0) => None,
        Some(secs) => Some(Duration::from_secs(secs)),
        None => config.timeout(),
    };
    let options = ValidateOptions {
        fix: args.fix,
        quick: args.quick,
        verbose,
        timeout,
    };

    tracing::debug!("Validating {} with {:?}", root.display(), options);

    let run = match args.format {
        OutputFormat::Text => {
            let mut observer = SpinnerObserver::new();
            validator
                .validate_with_observer(&root, &options, &mut observer)
                .await
        }
        OutputFormat::Json => validator.validate(&root, &options).await,
    };

    let report = Report::from_run(&run, verbose, config.defaults.summary_lines);
    print_report(&report, args.format)?;

    Ok(ExitCode::from(run.exit_code()))
}

fn print_report(report: &Report, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", report.to_json()?),
        OutputFormat::Text => print!("{}", report.render_text()),
    }
    Ok(())
}

/// Detect a project's framework
fn detect(args: DetectArgs, config_path: Option<&str>) -> Result<()> {
    let root = resolve_project_root(args.path.as_deref())?;
    let config = load_settings(config_path, Some(&root))?;
    let validator = Validator::from_config(&config).context("Invalid framework rules")?;

    let detection = validator.detect(&root);
    let project = project_name(&root);

    match args.format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&serde_json::json!({
                "project": project,
                "path": root.display().to_string(),
                "detected": detection.framework_name(),
                "matching": detection.matching,
                "markers_found": detection.markers_found,
            }))?;
            println!("{}", json);
        }
        OutputFormat::Text => {
            println!("{}: {}", "Project".cyan(), project);
            println!("{}: {}", "Path".cyan(), root.display());
            println!();

            match detection.detected {
                Some(ref rule) => println!("{}: {}", "Detected".green(), rule.name),
                None => println!("{}: {}", "Detected".yellow(), "None"),
            }

            println!();
            println!("{}:", "Matching Frameworks".cyan());
            if detection.matching.is_empty() {
                println!("  None");
            }
            for name in &detection.matching {
                println!("  - {}", name);
            }

            println!();
            println!("{}:", "Markers Found".cyan());
            if detection.markers_found.is_empty() {
                println!("  None");
            }
            for marker in &detection.markers_found {
                println!("  - {}", marker);
            }

            if let Some(ref rule) = detection.detected {
                println!();
                println!("{}:", "Commands".cyan());
                for stage in StageKind::ALL {
                    let command = rule.command_for(stage, false).unwrap_or("-");
                    println!("  {:<10}  {}", stage.label(), command);
                }
            }
        }
    }

    Ok(())
}

/// List the effective framework rules
fn list_frameworks(args: FrameworksArgs, config_path: Option<&str>) -> Result<()> {
    let root = args
        .project
        .as_deref()
        .map(|p| resolve_project_root(Some(p)))
        .transpose()?;
    let config = load_settings(config_path, root.as_deref())?;
    let rules = config.rules().context("Invalid framework rules")?;

    match args.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&rules)?);
        }
        OutputFormat::Text => {
            let width = rules.iter().map(|r| r.name.len()).max().unwrap_or(10);
            for rule in &rules {
                println!(
                    "{:>4}  {:width$}  {}",
                    rule.priority,
                    rule.name.green(),
                    rule.markers.join(" + "),
                    width = width
                );
            }
        }
    }

    Ok(())
}

/// Show the merged configuration
fn show_config(args: ConfigArgs, config_path: Option<&str>) -> Result<()> {
    let root = args
        .project
        .as_deref()
        .map(|p| resolve_project_root(Some(p)))
        .transpose()?;
    let config = load_settings(config_path, root.as_deref())?;

    match args.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        OutputFormat::Text => {
            println!("{}:", "Config Files".cyan());
            let files = find_config_files(root.as_deref());
            if files.is_empty() {
                println!("  None (using defaults)");
            }
            for file in &files {
                println!("  - {}", file.display());
            }
            if let Some(path) = config_path {
                println!("  - {} (override)", path);
            }
            println!();
            print!(
                "{}",
                toml::to_string_pretty(&config).context("Failed to render configuration")?
            );
        }
    }

    Ok(())
}
