// concorso - split an enrollment export into one spreadsheet per class

mod exit_codes;
mod render;

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use concorso_config::Settings;
use concorso_io::{
    inspect, run, write_outputs, DecodeOptions, InputFile, PipelineError, RunConfig, RunSummary, TextEncoding,
};
use log::LevelFilter;
use serde::Serialize;

use exit_codes::{
    EXIT_CONFIG, EXIT_DECODE, EXIT_ERROR, EXIT_MISSING_COLUMN, EXIT_PARTIAL, EXIT_SUCCESS, EXIT_USAGE, EXIT_WRITE,
};

#[derive(Parser)]
#[command(name = "concorso")]
#[command(about = "Split an enrollment file into one spreadsheet per competition class")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// Log progress to stderr (RUST_LOG overrides)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    /// Settings file to use instead of the per-user one
    #[arg(long, global = true, env = "CONCORSO_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Text decoding overrides shared by every command
#[derive(Args)]
struct DecodeArgs {
    /// Encoding to try, in order (repeatable; default from settings)
    #[arg(long = "encoding", value_name = "ENC")]
    encodings: Vec<String>,

    /// Field delimiter for delimited text (a single character or "tab")
    #[arg(long, value_name = "C")]
    delimiter: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Preview a file: detected format, first rows and class counts
    #[command(after_help = "\
Examples:
  concorso inspect iscritti.csv
  concorso inspect iscritti.xlsx --rows 10
  concorso inspect iscritti.csv --encoding utf-8 --json")]
    Inspect {
        /// Enrollment file (csv/txt or xlsx/xls/ods)
        file: PathBuf,

        /// Number of rows to preview
        #[arg(long, default_value_t = 5)]
        rows: usize,

        #[command(flatten)]
        decode: DecodeArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Export one xlsx file per class code
    #[command(after_help = "\
Examples:
  concorso split iscritti.csv
  concorso split iscritti.csv --previous iscritti_maggio.csv
  concorso split iscritti.xlsx --columns Cognome,Nome,Email --timestamp
  concorso split iscritti.csv --zip --only A-01 --only A-02 --out export/
  concorso split iscritti.csv --no-write --json")]
    Split {
        /// Enrollment file (csv/txt or xlsx/xls/ods)
        file: PathBuf,

        /// Earlier export; only records whose CF is not in it are exported
        #[arg(long, value_name = "SNAPSHOT")]
        previous: Option<PathBuf>,

        /// Columns to keep (comma-separated or repeated); Classe is always kept
        #[arg(long, value_delimiter = ',', value_name = "COLS")]
        columns: Vec<String>,

        /// Append a YYYYMMDD_HHMMSS suffix to file names
        #[arg(long)]
        timestamp: bool,

        /// Also bundle the generated files into a zip archive
        #[arg(long)]
        zip: bool,

        /// Class code to include in the archive (repeatable; default all)
        #[arg(long, value_name = "CODE")]
        only: Vec<String>,

        /// Output directory (default from settings)
        #[arg(long, value_name = "DIR")]
        out: Option<PathBuf>,

        /// Generate in memory and report without writing files
        #[arg(long)]
        no_write: bool,

        #[command(flatten)]
        decode: DecodeArgs,

        /// Output the run summary as JSON
        #[arg(long)]
        json: bool,

        /// Suppress the human-readable summary
        #[arg(long, short = 'q')]
        quiet: bool,
    },
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\nengine:  concorso-engine ", env!("CARGO_PKG_VERSION"),
    )
}

fn init_logging(verbose: bool) {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(if verbose { LevelFilter::Info } else { LevelFilter::Warn });
    builder.parse_default_env();
    builder.format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()));
    let _ = builder.try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Inspect { file, rows, decode, json } => cmd_inspect(cli.config, file, rows, decode, json),
        Commands::Split {
            file,
            previous,
            columns,
            timestamp,
            zip,
            only,
            out,
            no_write,
            decode,
            json,
            quiet,
        } => cmd_split(SplitArgs {
            config: cli.config,
            file,
            previous,
            columns,
            timestamp,
            zip,
            only,
            out,
            no_write,
            decode,
            json,
            quiet,
        }),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn args(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::new(EXIT_CONFIG, msg)
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<PipelineError> for CliError {
    fn from(err: PipelineError) -> Self {
        match &err {
            PipelineError::Decode(_) => CliError::new(EXIT_DECODE, err.to_string())
                .with_hint("try --encoding utf-8 or set --delimiter explicitly"),
            PipelineError::MissingColumn { column, .. } => CliError::new(EXIT_MISSING_COLUMN, err.to_string())
                .with_hint(format!("the header row must contain a '{}' column", column)),
            PipelineError::Export(_) => CliError::new(EXIT_WRITE, err.to_string()),
        }
    }
}

// ============================================================================
// Shared helpers
// ============================================================================

fn load_settings(path: Option<&Path>) -> Result<Settings, CliError> {
    match path {
        Some(path) => Settings::load_from(path).map_err(CliError::config),
        None => Ok(Settings::load()),
    }
}

fn parse_delimiter(raw: &str) -> Option<u8> {
    match raw {
        "tab" | "\\t" | "\t" => Some(b'\t'),
        _ => {
            let mut chars = raw.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if c.is_ascii() && c != '"' && c != '\n' && c != '\r' => Some(c as u8),
                _ => None,
            }
        }
    }
}

fn parse_encodings(labels: &[String]) -> Result<Vec<TextEncoding>, String> {
    labels
        .iter()
        .map(|label| TextEncoding::from_label(label).ok_or_else(|| format!("unknown encoding '{}'", label)))
        .collect()
}

const KNOWN_ENCODINGS: &str = "latin1, iso-8859-1, cp1252, utf-8-sig, utf-8";

/// Flags win over settings. Bad flag values are usage errors, bad setting
/// values are config errors.
fn decode_options(args: &DecodeArgs, settings: &Settings) -> Result<DecodeOptions, CliError> {
    let encodings = if args.encodings.is_empty() {
        parse_encodings(&settings.input.encodings)
            .map_err(|e| CliError::config(format!("settings input.encodings: {}", e)))?
    } else {
        parse_encodings(&args.encodings)
            .map_err(|e| CliError::args(e).with_hint(format!("known encodings: {}", KNOWN_ENCODINGS)))?
    };
    if encodings.is_empty() {
        return Err(CliError::config("settings input.encodings is empty"));
    }

    let delimiter = match (&args.delimiter, settings.input.delimiter) {
        (Some(raw), _) => Some(parse_delimiter(raw).ok_or_else(|| {
            CliError::args(format!("invalid delimiter '{}'", raw)).with_hint("use a single character such as ';' or 'tab'")
        })?),
        (None, Some(c)) => Some(
            parse_delimiter(&c.to_string())
                .ok_or_else(|| CliError::config(format!("settings input.delimiter: invalid delimiter '{}'", c)))?,
        ),
        (None, None) => None,
    };

    Ok(DecodeOptions { encodings, delimiter })
}

fn read_input(path: &Path) -> Result<InputFile, CliError> {
    let bytes = fs::read(path).map_err(|e| CliError::args(format!("cannot read {}: {}", path.display(), e)))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(InputFile::new(name, bytes))
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(value).map_err(|e| CliError::new(EXIT_ERROR, e.to_string()))?;
    println!("{}", json);
    Ok(())
}

// ============================================================================
// inspect
// ============================================================================

#[derive(Serialize)]
struct InspectReport<'a> {
    source: &'a str,
    format: String,
    rows: usize,
    columns: &'a [String],
    head: &'a [Vec<concorso_engine::Value>],
    classes: &'a [concorso_engine::ClassSummary],
}

fn cmd_inspect(config: Option<PathBuf>, file: PathBuf, rows: usize, decode: DecodeArgs, json: bool) -> Result<(), CliError> {
    let settings = load_settings(config.as_deref())?;
    let options = decode_options(&decode, &settings)?;
    let input = read_input(&file)?;

    let inspection = inspect(&input, &options)?;

    if json {
        let head = inspection.table.head(rows);
        print_json(&InspectReport {
            source: &input.name,
            format: inspection.format.to_string(),
            rows: inspection.table.len(),
            columns: inspection.table.columns(),
            head: head.rows(),
            classes: &inspection.classes,
        })
    } else {
        print!("{}", render::inspection(&input.name, &inspection, rows));
        Ok(())
    }
}

// ============================================================================
// split
// ============================================================================

struct SplitArgs {
    config: Option<PathBuf>,
    file: PathBuf,
    previous: Option<PathBuf>,
    columns: Vec<String>,
    timestamp: bool,
    zip: bool,
    only: Vec<String>,
    out: Option<PathBuf>,
    no_write: bool,
    decode: DecodeArgs,
    json: bool,
    quiet: bool,
}

#[derive(Serialize)]
struct SplitReport<'a> {
    #[serde(flatten)]
    summary: &'a RunSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    output_dir: Option<String>,
    written: Vec<String>,
}

fn cmd_split(args: SplitArgs) -> Result<(), CliError> {
    let settings = load_settings(args.config.as_deref())?;
    let decode = decode_options(&args.decode, &settings)?;

    let columns: Vec<String> = args
        .columns
        .iter()
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect();

    let config = RunConfig {
        selected_columns: if columns.is_empty() { settings.selected_columns() } else { Some(columns) },
        use_timestamp: args.timestamp || settings.output.timestamp,
        bundle_as_archive: args.zip || settings.output.zip,
        bundle_selection: if args.only.is_empty() { None } else { Some(args.only) },
        decode,
    };

    let input = read_input(&args.file)?;
    let snapshot = args.previous.as_deref().map(read_input).transpose()?;

    let output = run(&input, snapshot.as_ref(), &config, chrono::Local::now().naive_local())?;

    let out_dir = (!args.no_write).then(|| args.out.unwrap_or_else(|| settings.output.dir.clone()));
    let written = match &out_dir {
        Some(dir) => write_outputs(dir, &output.units, output.archive.as_ref())
            .map_err(|e| CliError::new(EXIT_WRITE, e.to_string()))?,
        None => Vec::new(),
    };

    if args.json {
        print_json(&SplitReport {
            summary: &output.summary,
            output_dir: out_dir.as_ref().map(|d| d.display().to_string()),
            written: written.iter().map(|p| p.display().to_string()).collect(),
        })?;
    } else if !args.quiet {
        print!("{}", render::run_summary(&output.summary, out_dir.as_deref(), &written));
    }

    if output.summary.has_failures() {
        let failed: Vec<&str> = output.summary.failures.iter().map(|f| f.code.as_str()).collect();
        return Err(CliError::new(
            EXIT_PARTIAL,
            format!("{} of {} classes failed to export: {}", failed.len(), output.summary.classes.len(), failed.join(", ")),
        ));
    }

    Ok(())
}
