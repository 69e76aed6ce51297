use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fseq_core::{FseqError, FseqFile, SequenceReport};
use glob::glob;
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "fseq")]
#[command(version)]
#[command(
    about = "Decoder for FSEQ v2 lighting sequence files.",
    long_about = None,
    after_help = "Examples:\n  fseq inspect show.fseq -o report.json\n  fseq inspect show.fseq --stdout --pretty\n  fseq frame show.fseq 120"
)]
struct Cli {
    /// Log decoder activity to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Decode the header sections and write a JSON report.
    Inspect {
        /// Path to a .fseq file
        input: PathBuf,

        /// Output report path (JSON)
        #[arg(short = 'o', long, required_unless_present = "stdout")]
        report: Option<PathBuf>,

        /// Write JSON report to stdout
        #[arg(long, conflicts_with = "report")]
        stdout: bool,

        /// Pretty-print JSON output
        #[arg(long, conflicts_with = "compact")]
        pretty: bool,

        /// Compact JSON output (default)
        #[arg(long)]
        compact: bool,

        /// Suppress non-error output
        #[arg(long)]
        quiet: bool,
    },
    /// Print the channel values of one frame as JSON.
    Frame {
        /// Path to a .fseq file
        input: PathBuf,

        /// Zero-based frame index
        index: u32,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Inspect {
            input,
            report,
            stdout,
            pretty,
            compact,
            quiet,
        } => cmd_inspect(input, report, stdout, pretty, compact, quiet),
        Commands::Frame {
            input,
            index,
            pretty,
        } => cmd_frame(input, index, pretty),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err.message);
            if let Some(hint) = err.hint {
                eprintln!("hint: {}", hint);
            }
            ExitCode::from(2)
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[derive(Debug)]
struct CliError {
    message: String,
    hint: Option<String>,
}

impl CliError {
    fn new(message: impl Into<String>, hint: Option<String>) -> Self {
        Self {
            message: message.into(),
            hint,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::new(format!("{:#}", err), None)
    }
}

impl From<FseqError> for CliError {
    fn from(err: FseqError) -> Self {
        let hint = match &err {
            FseqError::InvalidMagic { .. } | FseqError::UnsupportedVersion { .. } => {
                Some("only FSEQ v2 files are supported".to_string())
            }
            FseqError::UnsupportedCompression { .. } => {
                Some("only uncompressed and zstd payloads can be decoded".to_string())
            }
            FseqError::FrameIndexOutOfRange { frame_count, .. } => Some(format!(
                "valid frame indices are 0..{}",
                frame_count
            )),
            _ => None,
        };
        CliError::new(err.to_string(), hint)
    }
}

#[derive(Debug, Serialize)]
struct FrameOutput {
    index: u32,
    channels: u32,
    data: Vec<u8>,
}

fn cmd_inspect(
    input: PathBuf,
    report: Option<PathBuf>,
    stdout: bool,
    pretty: bool,
    compact: bool,
    quiet: bool,
) -> Result<(), CliError> {
    let resolved_input = resolve_input_path(&input)?;
    validate_input_file(&resolved_input)?;
    let input_abs = fs::canonicalize(&resolved_input)
        .with_context(|| format!("Failed to resolve input path: {}", resolved_input.display()))?;
    let report = if stdout {
        None
    } else {
        Some(report.ok_or_else(|| {
            CliError::new(
                "missing output path",
                Some("use -o/--report or --stdout".to_string()),
            )
        })?)
    };

    if let Some(report_path) = report.as_ref() {
        ensure_distinct_output(report_path, &input_abs)?;
    }

    let meta = fs::metadata(&resolved_input)
        .with_context(|| format!("Failed to read input file: {}", resolved_input.display()))?;
    if !meta.is_file() {
        return Err(CliError::new(
            format!("input is not a file: {}", input.display()),
            Some("use a .fseq file".to_string()),
        ));
    }

    let file = FseqFile::open_path(&resolved_input)?;
    debug!(
        frames = file.frame_count(),
        channels = file.channels_per_frame(),
        "sequence opened"
    );
    let rep = file.report(&resolved_input.display().to_string(), meta.len());
    let json = serialize_report(&rep, pretty, compact)?;

    let Some(report) = report else {
        print!("{}", json);
        return Ok(());
    };

    if let Some(parent) = report.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create output directory: {}", parent.display())
            })?;
        }
    }
    fs::write(&report, json)
        .with_context(|| format!("Failed to write report: {}", report.display()))?;

    if !quiet {
        eprintln!("OK: report written -> {}", report.display());
    }
    Ok(())
}

fn cmd_frame(input: PathBuf, index: u32, pretty: bool) -> Result<(), CliError> {
    let resolved_input = resolve_input_path(&input)?;
    validate_input_file(&resolved_input)?;

    let mut file = FseqFile::open_path(&resolved_input)?;
    let frame = file.get_frame(index)?;
    let stats = file.cache_stats();
    debug!(hits = stats.hits, misses = stats.misses, "frame decoded");

    let out = FrameOutput {
        index: frame.index,
        channels: file.channels_per_frame(),
        data: frame.data,
    };
    let json = if pretty {
        serde_json::to_string_pretty(&out)
    } else {
        serde_json::to_string(&out)
    }
    .context("JSON serialization failed")?;
    println!("{}", json);
    Ok(())
}

fn ensure_distinct_output(report_path: &Path, input_abs: &Path) -> Result<(), CliError> {
    // A directory that does not exist yet cannot hold the input.
    if let Some(parent) = report_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            return Ok(());
        }
    }
    let report_dir = report_path
        .parent()
        .map(|parent| {
            if parent.as_os_str().is_empty() {
                fs::canonicalize(".")
            } else {
                fs::canonicalize(parent)
            }
        })
        .transpose()
        .with_context(|| format!("Failed to resolve output path: {}", report_path.display()))?;
    let Some(report_dir) = report_dir else {
        return Ok(());
    };
    let report_target = report_dir.join(
        report_path
            .file_name()
            .ok_or_else(|| anyhow::anyhow!("Invalid report path"))?,
    );
    if report_target == input_abs {
        return Err(CliError::new(
            format!(
                "report path must differ from input: {}",
                report_path.display()
            ),
            Some("choose a different output path".to_string()),
        ));
    }
    Ok(())
}

fn serialize_report(rep: &SequenceReport, pretty: bool, compact: bool) -> Result<String, CliError> {
    if pretty && compact {
        return Err(CliError::new(
            "cannot use --pretty and --compact together",
            Some("choose one output format".to_string()),
        ));
    }
    if pretty {
        serde_json::to_string_pretty(rep)
            .context("JSON serialization failed")
            .map_err(Into::into)
    } else {
        serde_json::to_string(rep)
            .context("JSON serialization failed")
            .map_err(Into::into)
    }
}

fn validate_input_file(input: &Path) -> Result<(), CliError> {
    if !input.exists() {
        return Err(CliError::new(
            format!("input file not found: {}", input.display()),
            Some("use a .fseq file".to_string()),
        ));
    }
    let ext = input
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    if ext != "fseq" {
        return Err(CliError::new(
            format!("unsupported input format '{}'", input.display()),
            Some("expected a .fseq file".to_string()),
        ));
    }
    Ok(())
}

fn resolve_input_path(input: &Path) -> Result<PathBuf, CliError> {
    let pattern = input.to_string_lossy();
    if !is_glob_pattern(&pattern) {
        return Ok(input.to_path_buf());
    }

    let mut matches = Vec::new();
    let paths = glob(&pattern).map_err(|err| {
        CliError::new(
            format!("invalid input pattern '{}'", pattern),
            Some(format!("pattern error: {}", err.msg)),
        )
    })?;
    for entry in paths {
        let path = entry.map_err(|err| {
            CliError::new(
                format!("invalid input pattern '{}'", pattern),
                Some(format!("pattern error: {}", err)),
            )
        })?;
        if path.is_file() {
            matches.push(path);
        }
    }

    match matches.len() {
        0 => Err(CliError::new(
            format!("no files match pattern '{}'", pattern),
            Some("check the path or quote the pattern; expected .fseq".to_string()),
        )),
        1 => Ok(matches.remove(0)),
        count => {
            let mut listed = matches
                .iter()
                .take(3)
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", ");
            if count > 3 {
                listed.push_str(", ...");
            }
            Err(CliError::new(
                format!(
                    "multiple files match pattern '{}' ({} matches); matches: {}",
                    pattern, count, listed
                ),
                Some("pass a single sequence file, or run once per file".to_string()),
            ))
        }
    }
}

fn is_glob_pattern(input: &str) -> bool {
    input.contains('*') || input.contains('?') || input.contains('[')
}
