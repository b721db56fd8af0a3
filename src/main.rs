mod compare;
mod config;
mod digest;
mod input;
mod number;
mod percentiles;
mod report;
mod status;

use clap::Parser;
use config::{Config, ConfigError, OutputFormat};
use digest::{DigestError, RunDigest};
use input::{InputError, InputSource};
use report::Report;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

const DEFAULT_CONFIG: &str = "chbench.toml";
const DEFAULT_LABELS: [&str; 2] = ["Query 1", "Query 2"];

/// Turn clickhouse-benchmark output into latency and throughput reports.
///
/// Pass one output file to summarize a run, or two to compare them.
/// Use `-` to read from standard input.
#[derive(Parser, Debug)]
#[command(name = "chbench-report", version, about)]
pub struct Cli {
    /// Benchmark output to summarize (`-` for stdin)
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Second benchmark output; enables comparison mode
    #[arg(value_name = "COMPARE_INPUT")]
    compare: Option<PathBuf>,

    /// Config file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output format (overrides config)
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Comma-separated key percentiles, e.g. 50,95,99 (overrides config)
    #[arg(short, long, value_delimiter = ',')]
    percentiles: Option<Vec<f64>>,

    /// Run label, once per input
    #[arg(long = "label", value_name = "NAME")]
    labels: Vec<String>,

    /// SQL text attached to the run, once per input
    #[arg(long = "query", value_name = "SQL")]
    queries: Vec<String>,

    /// Fail if a key percentile is missing from a latency table
    #[arg(long)]
    strict: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Cli {
    fn inputs(&self) -> Vec<InputSource> {
        std::iter::once(&self.input)
            .chain(self.compare.as_ref())
            .map(|p| InputSource::parse(p))
            .collect()
    }

    fn log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            "warn"
        }
    }
}

#[derive(Debug)]
enum AppError {
    Usage(String),
    Config(ConfigError),
    Input(InputError),
    Digest(DigestError),
    Render(serde_json::Error),
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::Usage(msg) => write!(f, "{msg}"),
            AppError::Config(e) => write!(f, "{e}"),
            AppError::Input(e) => write!(f, "{e}"),
            AppError::Digest(e) => write!(f, "{e}"),
            AppError::Render(e) => write!(f, "failed to render report: {e}"),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Usage(_) => None,
            AppError::Config(e) => Some(e),
            AppError::Input(e) => Some(e),
            AppError::Digest(e) => Some(e),
            AppError::Render(e) => Some(e),
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(e: ConfigError) -> Self {
        AppError::Config(e)
    }
}

impl From<InputError> for AppError {
    fn from(e: InputError) -> Self {
        AppError::Input(e)
    }
}

impl From<DigestError> for AppError {
    fn from(e: DigestError) -> Self {
        AppError::Digest(e)
    }
}

/// Load the config file and fold CLI overrides into it.
fn resolve_config(cli: &Cli) -> Result<Config, AppError> {
    let mut cfg = match &cli.config {
        Some(path) => config::load_config(path, true)?,
        None => config::load_config(Path::new(DEFAULT_CONFIG), false)?,
    };

    if let Some(format) = cli.format {
        cfg.report.format = format;
    }
    if let Some(percentiles) = &cli.percentiles {
        cfg.report.key_percentiles = percentiles.clone();
    }
    if cli.strict {
        cfg.report.strict = true;
    }
    cfg.validate()?;
    Ok(cfg)
}

/// Parse every input and render the report.
fn run(cli: &Cli) -> Result<String, AppError> {
    let inputs = cli.inputs();
    if inputs.iter().filter(|i| **i == InputSource::Stdin).count() > 1 {
        return Err(AppError::Usage(
            "only one input may be read from stdin".to_string(),
        ));
    }
    if cli.labels.len() > inputs.len() || cli.queries.len() > inputs.len() {
        return Err(AppError::Usage(format!(
            "got more --label/--query values than inputs ({})",
            inputs.len()
        )));
    }

    let cfg = resolve_config(cli)?;
    tracing::debug!(?cfg, "resolved config");

    let mut runs = Vec::with_capacity(inputs.len());
    for (i, source) in inputs.iter().enumerate() {
        let text = source.read()?;
        let label = cli.labels.get(i).map_or(DEFAULT_LABELS[i], String::as_str);
        tracing::debug!(%source, label, bytes = text.len(), "read benchmark output");

        let digest = RunDigest::from_text(
            label,
            cli.queries.get(i).map(String::as_str),
            &text,
            &cfg.report.key_percentiles,
            cfg.report.strict,
        )?;
        runs.push(digest);
    }

    Report::new(runs)
        .render(&cfg.report)
        .map_err(AppError::Render)
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(cli.log_level())),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .init();

    tracing::debug!(?cli, "parsed CLI arguments");

    match run(&cli) {
        Ok(output) => {
            print!("{output}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
