//! @ai:module:intent CLI for the theorem prover benchmark harness
//! @ai:module:layer presentation

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use provers_bench::{
    config::BenchmarkConfig,
    metrics::{HardwareInfo, MetricsAggregator, MetricsAggregatorTrait, Report, SessionSummary},
    process::ProcessSupervisor,
    report::{JsonReporter, ReportFormats, ReportGenerator},
    runner::BenchmarkExecutor,
    solver::{ClassifierRegistry, Verdict},
    toolchain::ToolchainValidator,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "provers-bench")]
#[command(about = "Benchmark external theorem provers on a corpus of formulas")]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run benchmarks
    Run {
        /// Path to configuration file
        #[arg(short, long, default_value = "benchmark.toml")]
        config: PathBuf,

        /// Only run the named test suites (repeatable)
        #[arg(short, long)]
        suite: Vec<String>,

        /// Override the per-run timeout in seconds
        #[arg(short, long)]
        timeout: Option<u64>,

        /// Base path for result files (overrides general.result_path)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate a configuration file
    Validate {
        /// Path to configuration file
        #[arg(short, long, default_value = "benchmark.toml")]
        config: PathBuf,
    },

    /// Initialize an example configuration
    Init {
        /// Output path for config file
        #[arg(short, long, default_value = "benchmark.toml")]
        output: PathBuf,
    },

    /// List test suites, inputs and translators of a configuration
    List {
        /// Path to configuration file
        #[arg(short, long, default_value = "benchmark.toml")]
        config: PathBuf,
    },

    /// Generate CSV and Markdown reports from an existing JSON result
    Report {
        /// Path to results JSON file
        #[arg(short, long)]
        results: PathBuf,

        /// Base path for the generated reports (defaults to the results path)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let directive = if cli.verbose {
        "provers_bench=debug"
    } else {
        "provers_bench=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(directive.parse()?),
        )
        .init();

    match cli.command {
        Commands::Run {
            config,
            suite,
            timeout,
            output,
        } => {
            run_benchmarks(RunArgs {
                config,
                suites: suite,
                timeout,
                output,
            })
            .await
        }
        Commands::Validate { config } => validate(config),
        Commands::Init { output } => init_config(output),
        Commands::List { config } => list_config(config),
        Commands::Report { results, output } => generate_reports(results, output),
    }
}

struct RunArgs {
    config: PathBuf,
    suites: Vec<String>,
    timeout: Option<u64>,
    output: Option<PathBuf>,
}

/// @ai:intent Run a full benchmark session and write its reports
/// @ai:effects io, fs:write
async fn run_benchmarks(args: RunArgs) -> Result<()> {
    let mut config = BenchmarkConfig::load(&args.config)?;
    for name in &args.suites {
        if !config.test_suites.iter().any(|s| &s.name == name) {
            bail!("Unknown test suite '{}'", name);
        }
    }
    config.retain_suites(&args.suites);
    if let Some(timeout) = args.timeout {
        config.general.test_timeout = timeout;
    }
    if let Some(output) = args.output {
        config.general.result_path = output;
    }

    let registry = Arc::new(ClassifierRegistry::builtin());
    check_config(&config, &registry)?;

    let hardware = HardwareInfo::capture();
    let result_path = config.general.resolve(&config.general.result_path);
    let formats = ReportFormats {
        json: config.general.result_as_json,
        csv: config.general.result_as_csv,
        markdown: config.general.result_as_markdown,
    };

    let cancel = Arc::new(AtomicBool::new(false));
    let executor = BenchmarkExecutor::new(config, ProcessSupervisor::new(registry))
        .with_cancel_flag(Arc::clone(&cancel));

    let files = match executor.collect_inputs() {
        Ok(files) => files,
        Err(errors) => {
            for e in &errors {
                tracing::error!("{}", e);
            }
            bail!("Failed to collect input files ({} error(s))", errors.len());
        }
    };

    tracing::info!(
        "Starting benchmark: {} test inputs, {} translators, {} files, {} test suites",
        executor.config().test_inputs.len(),
        executor.config().translators.len(),
        files.len(),
        executor.config().test_suites.len()
    );

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping after the current run");
            cancel.store(true, Ordering::SeqCst);
        }
    });

    let started = Instant::now();
    let mut report = Report::new(hardware);
    for record in executor.execute_all(&files).await {
        report.push(record);
    }

    let summary = MetricsAggregator::new().summarize(&report.runs);
    tracing::info!(
        "Benchmark finished: {} runs in {:.1}s ({})",
        summary.total_runs,
        started.elapsed().as_secs_f64(),
        summary.counts
    );

    ReportGenerator::new().generate_all(&report, &result_path, formats)?;
    print_summary(&summary);

    Ok(())
}

/// @ai:intent Log every configuration problem and fail if there is any
/// @ai:effects io
fn check_config(config: &BenchmarkConfig, registry: &ClassifierRegistry) -> Result<()> {
    let errors = config.validate(registry);
    if errors.is_empty() {
        return Ok(());
    }
    for e in &errors {
        tracing::error!("{}", e);
    }
    ToolchainValidator::log_warnings(&ToolchainValidator::validate(config));
    bail!("Configuration has {} error(s)", errors.len());
}

/// @ai:intent Validate a configuration file without running anything
/// @ai:effects fs:read
fn validate(config_path: PathBuf) -> Result<()> {
    let config = BenchmarkConfig::load(&config_path)?;
    check_config(&config, &ClassifierRegistry::builtin())?;

    println!("Configuration validation passed!");
    println!("Test suites: {}", config.test_suites.len());
    println!("Test inputs: {}", config.test_inputs.len());
    println!("Translators: {}", config.translators.len());
    Ok(())
}

/// @ai:intent Initialize example configuration file
/// @ai:effects fs:write
fn init_config(output: PathBuf) -> Result<()> {
    if output.exists() {
        bail!("{} already exists", output.display());
    }
    BenchmarkConfig::example().save(&output)?;
    println!("Configuration saved to {}", output.display());
    Ok(())
}

/// @ai:intent List the contents of a configuration
/// @ai:effects fs:read
fn list_config(config_path: PathBuf) -> Result<()> {
    let config = BenchmarkConfig::load(&config_path)?;
    let status = ToolchainValidator::validate(&config);

    println!("Test suites ({}):", config.test_suites.len());
    println!();
    println!("{:<20} {:<10} {:<10} {:<10} Command", "Name", "Solver", "Format", "Input");
    println!("{}", "-".repeat(80));
    for suite in &config.test_suites {
        println!(
            "{:<20} {:<10} {:<10} {:<10} {}",
            suite.name,
            suite
                .resolved_solver()
                .map(|s| s.to_string())
                .unwrap_or_else(|| "?".to_string()),
            suite.required_format.as_str(),
            format!("{:?}", suite.input_mode).to_lowercase(),
            suite.command
        );
    }

    println!();
    println!("Test inputs ({}):", config.test_inputs.len());
    for input in &config.test_inputs {
        println!("  - {} ({}): {}", input.name, input.format, input.patterns.join(", "));
    }

    println!();
    println!("Translators ({}):", config.translators.len());
    for translator in &config.translators {
        println!(
            "  - {} -> {}: {}",
            translator.from_format, translator.to_format, translator.command
        );
    }

    if !status.is_complete() {
        println!();
        println!("Missing tools:");
        for missing in &status.missing_tools {
            println!("  - {} (used by {})", missing.tool_name, missing.used_by);
        }
    }

    Ok(())
}

/// @ai:intent Regenerate reports from a JSON result file
/// @ai:effects fs:read, fs:write
fn generate_reports(results_path: PathBuf, output: Option<PathBuf>) -> Result<()> {
    let report = JsonReporter::load(&results_path)?;
    let base = output.unwrap_or_else(|| results_path.with_extension(""));

    let formats = ReportFormats {
        json: base.with_extension("json") != results_path,
        ..Default::default()
    };
    let written = ReportGenerator::new().generate_all(&report, &base, formats)?;

    for path in written {
        println!("Report written to {}", path.display());
    }
    Ok(())
}

/// @ai:intent Print summary to console
/// @ai:effects io
fn print_summary(summary: &SessionSummary) {
    println!();
    println!("Theorem Prover Benchmark Results");
    println!("================================");
    println!();

    print!("{:<20} {:>6}", "Suite", "Runs");
    for verdict in Verdict::ALL {
        print!(" {:>14}", verdict.as_str());
    }
    println!();
    println!("{}", "-".repeat(27 + 15 * Verdict::ALL.len()));

    for suite in &summary.suites {
        print!("{:<20} {:>6}", suite.suite, suite.runs);
        for verdict in Verdict::ALL {
            print!(" {:>14}", suite.counts.get(verdict));
        }
        println!();
    }

    print!("{:<20} {:>6}", "Total", summary.total_runs);
    for verdict in Verdict::ALL {
        print!(" {:>14}", summary.counts.get(verdict));
    }
    println!();
}
