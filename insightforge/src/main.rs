//! InsightForge command-line analyzer.
//!
//! This binary reads a CSV or Excel file, runs the deterministic analysis
//! pipeline, validates the resulting report against the embedded JSON Schema
//! and writes it to disk.
//!
//! # Guarantees
//! - Offline operation: no network access
//! - Same input and flags produce the same report (apart from timestamps)
//! - Reports are validated before they are written

mod output;

use clap::{Args, Parser, Subcommand};
use insightforge_core::{
    AnalysisConfig, AnalysisResult, AnomalyConfig, CsvAnalyzer, HeuristicRegistry, InsightError,
    Result, SUPPORTED_EXTENSIONS, initialize_report_validator, logging::init_logging,
};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "insightforge")]
#[command(about = "Statistical analysis and business insights for tabular files")]
#[command(version)]
#[command(long_about = "
InsightForge - Automated tabular data analysis

This tool reads a CSV or Excel file and produces a JSON report containing:
- Descriptive statistics for every numeric column
- Trends, strong correlations and data quality issues
- Isolation forest anomaly detection
- Ranked insights, recommendations and an executive summary
- Histogram data for charting

EXAMPLES:
  insightforge analyze sales.csv --department sales
  insightforge analyze ledger.xlsx --department finance --compress
  insightforge analyze raw.csv --no-headers --output raw-report.json
")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Analyze a CSV or Excel file
    Analyze(AnalyzeArgs),
    /// List supported file types and departments
    List,
}

#[derive(Args)]
pub struct AnalyzeArgs {
    /// Input file
    #[arg(value_name = "FILE", help = "CSV or Excel file to analyze")]
    pub file: PathBuf,

    /// Department hint
    #[arg(
        long,
        env = "INSIGHTFORGE_DEPARTMENT",
        default_value = "general",
        help = "Department whose heuristics apply (finance, sales, ...)"
    )]
    pub department: String,

    /// Data type hint
    #[arg(long, default_value = "general", help = "Free-text data type hint")]
    pub data_type: String,

    /// Treat the first row as data
    #[arg(long, help = "The file has no header row")]
    pub no_headers: bool,

    /// Output file path
    #[arg(
        short,
        long,
        help = "Output file path (default: <stem>.insights.json or .json.zst next to the input file)"
    )]
    pub output: Option<PathBuf>,

    /// Enable compression
    #[arg(long, help = "Compress output using Zstandard (.json.zst)")]
    pub compress: bool,

    /// Time budget for the analysis
    #[arg(long, help = "Abort if the analysis takes longer than this many seconds")]
    pub timeout_secs: Option<u64>,

    /// Anomaly contamination
    #[arg(long, help = "Expected fraction of anomalous values, in (0.0, 0.5]")]
    pub contamination: Option<f64>,

    /// Anomaly detector seed
    #[arg(long, help = "Random seed for the isolation forest")]
    pub seed: Option<u64>,

    /// Disable anomaly detection
    #[arg(long, help = "Disable isolation forest anomaly detection")]
    pub disable_anomaly_detection: bool,
}

#[derive(Args)]
pub struct GlobalArgs {
    /// Increase verbosity
    #[arg(
        short,
        long,
        global = true,
        action = clap::ArgAction::Count,
        help = "Increase verbosity (-v, -vv)"
    )]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, global = true, help = "Suppress all output except errors")]
    pub quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.global.verbose, cli.global.quiet)?;

    initialize_report_validator().map_err(|e| {
        InsightError::configuration(format!("Failed to initialize report validator: {}", e))
    })?;

    match &cli.command {
        Command::Analyze(args) => analyze_file(args).await,
        Command::List => list_supported(),
    }
}

/// Builds the analysis configuration from CLI arguments.
fn build_config(args: &AnalyzeArgs) -> AnalysisConfig {
    let mut anomaly = AnomalyConfig::new().with_enabled(!args.disable_anomaly_detection);
    if let Some(contamination) = args.contamination {
        anomaly = anomaly.with_contamination(contamination);
    }
    if let Some(seed) = args.seed {
        anomaly = anomaly.with_seed(seed);
    }

    AnalysisConfig::new()
        .with_department(args.department.as_str())
        .with_data_type(args.data_type.as_str())
        .with_headers(!args.no_headers)
        .with_anomaly_detection(anomaly)
}

/// Reads, analyzes and saves one file.
async fn analyze_file(args: &AnalyzeArgs) -> Result<()> {
    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| output::default_output_path(&args.file, args.compress));

    info!("Starting analysis...");
    info!("Input: {}", args.file.display());
    info!("Output: {}", output_path.display());

    let raw_bytes = tokio::fs::read(&args.file)
        .await
        .map_err(|e| InsightError::Io {
            context: format!("Failed to read {}", args.file.display()),
            source: e,
        })?;

    let analyzer = CsvAnalyzer::new(build_config(args))?;
    let report = run_pipeline(analyzer, raw_bytes, file_name(&args.file), args.timeout_secs)
        .await
        .map_err(|e| {
            error!("Analysis failed: {}", e);
            e
        })?;

    output::save_report(&report, &output_path, args.compress).await?;

    info!("Report saved to {}", output_path.display());
    println!("Analysis completed successfully");
    println!("Output: {}", output_path.display());
    println!(
        "Rows: {}  Columns: {}",
        report.metadata.total_rows, report.metadata.total_columns
    );
    println!("Insights: {}", report.insights.len());
    println!("Recommendations: {}", report.recommendations.len());
    println!("Anomalies: {}", report.anomalies.len());

    Ok(())
}

/// Runs the blocking pipeline on tokio's blocking pool, optionally under a
/// time budget.
async fn run_pipeline(
    analyzer: CsvAnalyzer,
    raw_bytes: Vec<u8>,
    filename: String,
    timeout_secs: Option<u64>,
) -> Result<AnalysisResult> {
    let task = tokio::task::spawn_blocking(move || analyzer.analyze_bytes(&raw_bytes, &filename));

    let joined = match timeout_secs {
        Some(seconds) => tokio::time::timeout(Duration::from_secs(seconds), task)
            .await
            .map_err(|_| InsightError::Timeout { seconds })?,
        None => task.await,
    };

    joined.map_err(|e| InsightError::execution(format!("analysis task did not complete: {}", e)))?
}

/// File name used for extension dispatch and report metadata.
fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Lists supported file types and registered departments.
fn list_supported() -> Result<()> {
    let registry = HeuristicRegistry::with_defaults()?;

    println!("Supported File Types:");
    for extension in SUPPORTED_EXTENSIONS {
        println!("  {}", extension);
    }
    println!();

    println!("Departments with specialized heuristics:");
    for department in registry.departments() {
        println!("  {}", department);
    }
    println!("  (any other department uses the general analysis only)");
    println!();

    println!("Output Formats:");
    println!("  .json      - Plain JSON (default)");

    #[cfg(feature = "compression")]
    println!("  .json.zst  - Compressed JSON (--compress)");

    Ok(())
}
